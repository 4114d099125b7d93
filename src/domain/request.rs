use crate::domain::validation::ValidationError;
use crate::marshalling::{ToWire, Value};

/// Batch size used for `keywords.create` when the server reports no limit.
pub const DEFAULT_KEYWORDS_BATCH: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Filter for `ads.list`.
///
/// `campaign_ids` and `group_ids` are mutually exclusive.
pub struct AdsFilter {
    pub campaign_ids: Option<Vec<i64>>,
    pub group_ids: Option<Vec<i64>>,
    pub include_deleted: bool,
}

impl AdsFilter {
    pub fn by_campaigns(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            campaign_ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn by_groups(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            group_ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.campaign_ids.is_some() && self.group_ids.is_some() {
            return Err(ValidationError::ConflictingFilters {
                first: "campaignIds",
                second: "groupIds",
            });
        }
        Ok(())
    }
}

impl ToWire for AdsFilter {
    fn to_wire(&self) -> Value {
        let mut pairs = Vec::new();
        if let Some(ids) = &self.campaign_ids {
            pairs.push(("campaignIds", ids.to_wire()));
        }
        if let Some(ids) = &self.group_ids {
            pairs.push(("groupIds", ids.to_wire()));
        }
        pairs.push(("includeDeleted", Value::Bool(self.include_deleted)));
        Value::struct_from(pairs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Filter for `campaigns.list`; no ids means every campaign of the account.
pub struct CampaignsFilter {
    pub ids: Option<Vec<i64>>,
    pub include_deleted: bool,
}

impl ToWire for CampaignsFilter {
    fn to_wire(&self) -> Value {
        let mut pairs = Vec::new();
        if let Some(ids) = &self.ids {
            pairs.push(("ids", ids.to_wire()));
        }
        pairs.push(("includeDeleted", Value::Bool(self.include_deleted)));
        Value::struct_from(pairs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Filter for `groups.list`.
pub struct GroupsFilter {
    pub campaign_ids: Vec<i64>,
    pub include_deleted: bool,
}

impl ToWire for GroupsFilter {
    fn to_wire(&self) -> Value {
        Value::struct_from([
            ("campaignIds", self.campaign_ids.to_wire()),
            ("includeDeleted", Value::Bool(self.include_deleted)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Filter for `keywords.list`.
pub struct KeywordsFilter {
    pub group_ids: Vec<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub positive: bool,
    pub negative: bool,
    pub include_deleted: bool,
}

impl KeywordsFilter {
    /// Positive and negative keywords of the given groups, deleted ones excluded.
    pub fn for_groups(group_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            group_ids: group_ids.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Default for KeywordsFilter {
    fn default() -> Self {
        Self {
            group_ids: Vec::new(),
            limit: None,
            offset: None,
            positive: true,
            negative: true,
            include_deleted: false,
        }
    }
}

impl ToWire for KeywordsFilter {
    fn to_wire(&self) -> Value {
        let mut pairs = vec![
            ("groupIds", self.group_ids.to_wire()),
            ("positiveKeywords", Value::Bool(self.positive)),
            ("negativeKeywords", Value::Bool(self.negative)),
            ("includeDeleted", Value::Bool(self.include_deleted)),
        ];
        // zero means "not set", same as omitting the key
        if let Some(limit) = self.limit.filter(|&n| n > 0) {
            pairs.push(("limit", limit.to_wire()));
        }
        if let Some(offset) = self.offset.filter(|&n| n > 0) {
            pairs.push(("offset", offset.to_wire()));
        }
        Value::struct_from(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ads_filter_rejects_campaigns_and_groups_together() {
        let filter = AdsFilter {
            campaign_ids: Some(vec![1]),
            group_ids: Some(vec![2]),
            include_deleted: false,
        };
        assert!(matches!(
            filter.validate(),
            Err(ValidationError::ConflictingFilters { .. })
        ));
        assert!(AdsFilter::by_groups([2]).validate().is_ok());
    }

    #[test]
    fn ads_filter_wire_form_omits_unset_selector() {
        let value = AdsFilter::by_campaigns([7, 8]).include_deleted(true).to_wire();
        assert_eq!(
            value,
            Value::struct_from([
                ("campaignIds", Value::Array(vec![Value::Int(7), Value::Int(8)])),
                ("includeDeleted", Value::Bool(true)),
            ])
        );
    }

    #[test]
    fn keywords_filter_skips_zero_paging() {
        let filter = KeywordsFilter {
            limit: Some(0),
            offset: Some(20),
            ..KeywordsFilter::for_groups([3])
        };
        let value = filter.to_wire();
        assert_eq!(value.get("limit"), None);
        assert_eq!(value.get("offset"), Some(&Value::Int(20)));
        assert_eq!(value.get("positiveKeywords"), Some(&Value::Bool(true)));
        assert_eq!(value.get("negativeKeywords"), Some(&Value::Bool(true)));
    }
}
