use chrono::NaiveDateTime;

use crate::domain::entity::define_entity;

define_entity! {
    /// A text ad inside an ad group.
    ///
    /// Changing any of the creative texts on update makes the server create a
    /// new ad version with a new id.
    pub struct Ad {
        id: i64 => "id",
        /// Ad group this ad belongs to.
        group_id: i64 => "groupId",
        /// Caller-chosen id echoed back in responses and diagnostics.
        request_id: String => "requestId",
        /// Headline.
        creative1: String => "creative1",
        creative2: String => "creative2",
        creative3: String => "creative3",
        /// Displayed URL.
        clickthru_text: String => "clickthruText",
        /// Target URL.
        clickthru_url: String => "clickthruUrl",
        /// `active` or `suspend`.
        status: String => "status",
        create_date: NaiveDateTime => "createDate",
        premise_mode: String => "premiseMode",
        premise_id: i64 => "premiseId",
        deleted: bool => "deleted",
        deleted_date: NaiveDateTime => "deletedDate",
    }
    updatable = Some(&[
        "id",
        "creative1",
        "creative2",
        "creative3",
        "clickthruText",
        "clickthruUrl",
        "status",
        "premiseMode",
        "premiseId",
    ]);
    nested = &[];
    null_as_missing = &[];
}

impl Ad {
    /// Whether both ads show the same creative (texts and displayed URL).
    pub fn is_same_as(&self, other: &Ad) -> bool {
        self.creative1 == other.creative1
            && self.creative2 == other.creative2
            && self.creative3 == other.creative3
            && self.clickthru_text == other.clickthru_text
    }
}

define_entity! {
    /// A positive or negative keyword.
    pub struct Keyword {
        id: i64 => "id",
        group_id: i64 => "groupId",
        name: String => "name",
        /// e.g. `broad`, `phrase`, `exact`, `negativeBroad`.
        match_type: String => "matchType",
        deleted: bool => "deleted",
        status: String => "status",
        disabled: bool => "disabled",
        /// Max cost per click in halers.
        cpc: i64 => "cpc",
        url: String => "url",
        create_date: NaiveDateTime => "createDate",
        min_cpc: i64 => "minCpc",
    }
    updatable = Some(&["id", "status", "cpc", "url"]);
    nested = &[];
    null_as_missing = &[];
}

define_entity! {
    /// An ad group. Money amounts are in halers.
    pub struct Group {
        id: i64 => "id",
        campaign_id: i64 => "campaignId",
        name: String => "name",
        /// Default max cost per click.
        cpc: i64 => "cpc",
        /// Default max cost per click in the content network.
        cpc_context: i64 => "cpcContext",
        /// Cost per thousand impressions, only for CPM campaigns.
        cpm: i64 => "cpm",
        status: String => "status",
        max_user_daily_impression: i64 => "maxUserDailyImpression",
        deleted: bool => "deleted",
    }
    updatable = Some(&[
        "id",
        "name",
        "cpc",
        "cpcContext",
        "cpm",
        "status",
        "maxUserDailyImpression",
    ]);
    nested = &[];
    null_as_missing = &[];
}

define_entity! {
    /// A polygon corner of a [`Region`].
    pub struct Vertex {
        latitude: f64 => "latitude",
        longitude: f64 => "longitude",
    }
    updatable = None;
    nested = &[];
    null_as_missing = &[];
}

define_entity! {
    /// Geographic targeting: predefined area, circle or polygon.
    pub struct Region {
        kind: String => "type",
        predefined_id: i64 => "predefinedId",
        latitude: f64 => "latitude",
        longitude: f64 => "longitude",
        radius: i64 => "radius",
        vertices: Vec<Vertex> => "vertices",
    }
    updatable = None;
    nested = &[("vertices", "Vertex")];
    null_as_missing = &[];
}

define_entity! {
    pub struct Campaign {
        id: i64 => "id",
        name: String => "name",
        deleted: bool => "deleted",
        status: String => "status",
        day_budget: i64 => "dayBudget",
        exhausted_day_budget: i64 => "exhaustedDayBudget",
        ad_selection: String => "adSelection",
        start_date: NaiveDateTime => "startDate",
        end_date: NaiveDateTime => "endDate",
        create_date: NaiveDateTime => "createDate",
        fulltext: bool => "fulltext",
        context: bool => "context",
        excluded_search_services: Vec<i64> => "excludedSearchServices",
        excluded_urls: Vec<String> => "excludedUrls",
        negative_keywords: Vec<Keyword> => "negativeKeywords",
        user_id: i64 => "userId",
        total_budget: i64 => "totalBudget",
        exhausted_total_budget: i64 => "exhaustedTotalBudget",
        total_clicks: i64 => "totalClicks",
        exhausted_total_clicks: i64 => "exhaustedTotalClicks",
        payment_method: String => "paymentMethod",
        regions: Vec<Region> => "regions",
        premise_id: i64 => "premiseId",
    }
    updatable = Some(&[
        "id",
        "name",
        "status",
        "dayBudget",
        "startDate",
        "endDate",
        "fulltext",
        "context",
        "excludedSearchServices",
        "excludedUrls",
        "negativeKeywords",
        "totalBudget",
        "totalClicks",
        "paymentMethod",
        "regions",
        "premiseId",
    ]);
    nested = &[("negativeKeywords", "Keyword"), ("regions", "Region")];
    null_as_missing = &["regions"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Field};
    use crate::marshalling::{ToWire, Value};

    fn ad() -> Ad {
        Ad {
            creative1: "test ad".into(),
            creative2: "first line".into(),
            creative3: "second line".into(),
            clickthru_text: "http://example.com/".into(),
            clickthru_url: "http://example.com/?utm_source=sklik".into(),
            ..Ad::default()
        }
    }

    #[test]
    fn copy_construction_is_equal() {
        assert_eq!(ad().clone(), ad());
    }

    #[test]
    fn ad_marshalls_to_its_set_fields() {
        let expected = Value::struct_from([
            ("creative1", Value::from("test ad")),
            ("creative2", Value::from("first line")),
            ("creative3", Value::from("second line")),
            ("clickthruText", Value::from("http://example.com/")),
            (
                "clickthruUrl",
                Value::from("http://example.com/?utm_source=sklik"),
            ),
        ]);
        assert_eq!(ad().to_wire(), expected);
        assert_eq!(
            vec![ad()].to_wire(),
            Value::Array(vec![expected.clone()])
        );
        let Value::Struct(mapping) = expected else {
            panic!("expected struct");
        };
        assert_eq!(Ad::marshall_list([mapping]).unwrap(), vec![ad()]);
    }

    #[test]
    fn same_creative_ignores_target_url_and_ids() {
        let mut other = ad();
        other.id = Field::Present(99);
        other.clickthru_url = "http://example.com/other".into();
        assert!(ad().is_same_as(&other));

        other.creative3 = "changed".into();
        assert!(!ad().is_same_as(&other));
    }

    #[test]
    fn region_type_field_uses_wire_name() {
        let region = Region {
            kind: "circle".into(),
            radius: Field::Present(5),
            ..Region::default()
        };
        let mapping = region.to_mapping();
        assert_eq!(mapping.get("type"), Some(&Value::from("circle")));
        assert!(!mapping.contains_key("kind"));
    }

    #[test]
    fn campaign_serialises_nested_keywords() {
        let campaign = Campaign {
            name: "c".into(),
            negative_keywords: Field::Present(vec![Keyword {
                name: "free".into(),
                ..Keyword::default()
            }]),
            ..Campaign::default()
        };
        assert_eq!(
            campaign.to_mapping().get("negativeKeywords"),
            Some(&Value::Array(vec![Value::struct_from([(
                "name",
                Value::from("free")
            )])]))
        );
    }
}
