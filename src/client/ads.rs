use crate::client::{SklikClient, SklikError};
use crate::domain::{Ad, AdsFilter, Completion, Entity};
use crate::marshalling::{ToWire, Value};

impl SklikClient {
    /// `ads.list`. Fails before any call when both campaign and group ids are set.
    pub async fn list_ads(&mut self, filter: &AdsFilter) -> Result<Vec<Ad>, SklikError> {
        filter.validate()?;
        let mut response = self.call("ads.list", vec![filter.to_wire()]).await?;
        Ok(response.take("ads")?)
    }

    /// `ads.create`: ids of the new ads, in request order.
    pub async fn create_ads(&mut self, ads: &[Ad]) -> Result<Vec<i64>, SklikError> {
        let mut response = self.call("ads.create", vec![ads.to_wire()]).await?;
        Ok(response.take("adIds")?)
    }

    pub async fn get_ads(&mut self, ad_ids: &[i64]) -> Result<Vec<Ad>, SklikError> {
        let mut response = self.call("ads.get", vec![ad_ids.to_wire()]).await?;
        Ok(response.take("ads")?)
    }

    /// `ads.check`: server-side validation without saving.
    pub async fn check_ads(&mut self, ads: &[Ad]) -> Result<(), SklikError> {
        self.call("ads.check", vec![ads.to_wire()]).await?;
        Ok(())
    }

    /// `ads.update`. Changing a creative makes the server replace the ad;
    /// the ids of such replacements are returned.
    pub async fn update_ads(&mut self, ads: &[Ad]) -> Result<Vec<i64>, SklikError> {
        let updates = ads
            .iter()
            .map(|ad| Value::Struct(ad.to_updatable_mapping()))
            .collect::<Vec<_>>();
        let mut response = self.call("ads.update", vec![Value::Array(updates)]).await?;
        Ok(response.take_or_default("newAdIds")?)
    }

    pub async fn remove_ads(&mut self, ad_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self.call("ads.remove", vec![ad_ids.to_wire()]).await?;
        Ok(response.completion())
    }

    pub async fn restore_ads(&mut self, ad_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self.call("ads.restore", vec![ad_ids.to_wire()]).await?;
        Ok(response.completion())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::*;
    use crate::client::SklikError;
    use crate::domain::{Ad, AdsFilter, Completion, Field, ValidationError};
    use crate::marshalling::Value;

    fn ad() -> Ad {
        Ad {
            group_id: Field::Present(12),
            creative1: "test ad".into(),
            creative2: "first line".into(),
            creative3: "second line".into(),
            clickthru_text: "http://example.com/".into(),
            clickthru_url: "http://example.com/?utm_source=sklik".into(),
            ..Ad::default()
        }
    }

    #[tokio::test]
    async fn list_ads_rejects_conflicting_filters_without_calling() {
        let transport = FakeTransport::new();
        let mut client = logged_in(&transport);
        let filter = AdsFilter {
            campaign_ids: Some(vec![1]),
            group_ids: Some(vec![2]),
            include_deleted: false,
        };

        let err = client.list_ads(&filter).await.unwrap_err();
        assert!(matches!(
            err,
            SklikError::Validation(ValidationError::ConflictingFilters { .. })
        ));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn list_ads_sends_filter_and_decodes_ads() {
        let transport = FakeTransport::new();
        transport.reply(response(
            200,
            "OK",
            [(
                "ads",
                Value::Array(vec![Value::struct_from([
                    ("id", Value::Int(5)),
                    ("creative1", Value::from("test ad")),
                    ("mobileOnly", Value::Bool(false)),
                ])]),
            )],
        ));
        let mut client = logged_in(&transport);

        let ads = client.list_ads(&AdsFilter::by_groups([12])).await.unwrap();
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].id, Field::Present(5));
        assert_eq!(ads[0].creative1, Field::from("test ad"));

        let calls = transport.calls();
        let (method, params) = &calls[0];
        assert_eq!(method, "ads.list");
        assert_eq!(
            params[1],
            Value::struct_from([
                ("groupIds", Value::Array(vec![Value::Int(12)])),
                ("includeDeleted", Value::Bool(false)),
            ])
        );
    }

    #[tokio::test]
    async fn create_ads_marshals_entities_and_returns_ids() {
        let transport = FakeTransport::new();
        transport.reply(response(
            200,
            "OK",
            [("adIds", Value::Array(vec![Value::Int(101)]))],
        ));
        let mut client = logged_in(&transport);

        assert_eq!(client.create_ads(&[ad()]).await.unwrap(), vec![101]);

        let calls = transport.calls();
        let (_, params) = &calls[0];
        let Value::Array(items) = &params[1] else {
            panic!("expected ad list");
        };
        assert_eq!(items[0].get("groupId"), Some(&Value::Int(12)));
        assert_eq!(items[0].get("id"), None);
    }

    #[tokio::test]
    async fn update_ads_sends_updatable_fields_only() {
        let transport = FakeTransport::new();
        transport.reply(response(
            200,
            "OK",
            [("newAdIds", Value::Array(vec![Value::Int(102)]))],
        ));
        let mut client = logged_in(&transport);
        let mut changed = ad();
        changed.id = Field::Present(101);

        assert_eq!(client.update_ads(&[changed]).await.unwrap(), vec![102]);

        let calls = transport.calls();
        let (_, params) = &calls[0];
        let Value::Array(items) = &params[1] else {
            panic!("expected ad list");
        };
        assert_eq!(items[0].get("id"), Some(&Value::Int(101)));
        assert_eq!(items[0].get("groupId"), None);
        assert_eq!(items[0].get("creative1"), Some(&Value::from("test ad")));
    }

    #[tokio::test]
    async fn update_without_new_ids_returns_empty_list() {
        let transport = FakeTransport::new();
        transport.reply(ok());
        let mut client = logged_in(&transport);

        assert!(client.update_ads(&[ad()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_of_active_ad_is_no_action() {
        let transport = FakeTransport::new();
        transport
            .reply(response(409, "Ad is not deleted", []))
            .reply(ok());
        let mut client = logged_in(&transport);

        assert_eq!(
            client.restore_ads(&[101]).await.unwrap(),
            Completion::NoAction {
                message: "Ad is not deleted".to_owned()
            }
        );
        assert_eq!(client.remove_ads(&[101]).await.unwrap(), Completion::Done);
        assert_eq!(transport.methods(), ["ads.restore", "ads.remove"]);
        assert_eq!(
            transport.calls()[1].1[1],
            Value::Array(vec![Value::Int(101)])
        );
    }

    #[tokio::test]
    async fn get_and_check_ads() {
        let transport = FakeTransport::new();
        transport
            .reply(response(
                200,
                "OK",
                [("ads", Value::Array(vec![Value::struct_from([(
                    "id",
                    Value::Int(7),
                )])]))],
            ))
            .reply(ok());
        let mut client = logged_in(&transport);

        let ads = client.get_ads(&[7]).await.unwrap();
        assert_eq!(ads[0].id, Field::Present(7));
        client.check_ads(&[ad()]).await.unwrap();
        assert_eq!(transport.methods(), ["ads.get", "ads.check"]);
    }
}
