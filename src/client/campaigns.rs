use crate::client::{SklikClient, SklikError};
use crate::domain::{Campaign, CampaignsFilter, Completion, Entity};
use crate::marshalling::{ToWire, Value};

impl SklikClient {
    /// `campaigns.list`; an empty filter lists every campaign of the account.
    pub async fn list_campaigns(
        &mut self,
        filter: &CampaignsFilter,
    ) -> Result<Vec<Campaign>, SklikError> {
        let mut response = self
            .call("campaigns.list", vec![filter.to_wire()])
            .await?;
        Ok(response.take("campaigns")?)
    }

    pub async fn create_campaigns(
        &mut self,
        campaigns: &[Campaign],
    ) -> Result<Vec<i64>, SklikError> {
        let mut response = self
            .call("campaigns.create", vec![campaigns.to_wire()])
            .await?;
        Ok(response.take("campaignIds")?)
    }

    pub async fn get_campaigns(&mut self, campaign_ids: &[i64]) -> Result<Vec<Campaign>, SklikError> {
        let mut response = self
            .call("campaigns.get", vec![campaign_ids.to_wire()])
            .await?;
        Ok(response.take("campaigns")?)
    }

    pub async fn check_campaigns(&mut self, campaigns: &[Campaign]) -> Result<(), SklikError> {
        self.call("campaigns.check", vec![campaigns.to_wire()])
            .await?;
        Ok(())
    }

    /// `campaigns.update` with each campaign's updatable fields.
    pub async fn update_campaigns(
        &mut self,
        campaigns: &[Campaign],
    ) -> Result<Vec<i64>, SklikError> {
        let updates = campaigns
            .iter()
            .map(|campaign| Value::Struct(campaign.to_updatable_mapping()))
            .collect::<Vec<_>>();
        let mut response = self
            .call("campaigns.update", vec![Value::Array(updates)])
            .await?;
        Ok(response.take_or_default("newCampaignIds")?)
    }

    pub async fn remove_campaigns(&mut self, campaign_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self
            .call("campaigns.remove", vec![campaign_ids.to_wire()])
            .await?;
        Ok(response.completion())
    }

    pub async fn restore_campaigns(
        &mut self,
        campaign_ids: &[i64],
    ) -> Result<Completion, SklikError> {
        let response = self
            .call("campaigns.restore", vec![campaign_ids.to_wire()])
            .await?;
        Ok(response.completion())
    }
}
