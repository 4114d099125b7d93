use crate::client::{SklikClient, SklikError};
use crate::domain::{Completion, Entity, Group, GroupsFilter};
use crate::marshalling::{ToWire, Value};

impl SklikClient {
    pub async fn list_groups(&mut self, filter: &GroupsFilter) -> Result<Vec<Group>, SklikError> {
        let mut response = self.call("groups.list", vec![filter.to_wire()]).await?;
        Ok(response.take("groups")?)
    }

    pub async fn create_groups(&mut self, groups: &[Group]) -> Result<Vec<i64>, SklikError> {
        let mut response = self.call("groups.create", vec![groups.to_wire()]).await?;
        Ok(response.take("groupIds")?)
    }

    pub async fn get_groups(&mut self, group_ids: &[i64]) -> Result<Vec<Group>, SklikError> {
        let mut response = self.call("groups.get", vec![group_ids.to_wire()]).await?;
        Ok(response.take("groups")?)
    }

    pub async fn check_groups(&mut self, groups: &[Group]) -> Result<(), SklikError> {
        self.call("groups.check", vec![groups.to_wire()]).await?;
        Ok(())
    }

    /// `groups.update`; `campaignId` is never sent.
    pub async fn update_groups(&mut self, groups: &[Group]) -> Result<Vec<i64>, SklikError> {
        let updates = groups
            .iter()
            .map(|group| Value::Struct(group.to_updatable_mapping()))
            .collect::<Vec<_>>();
        let mut response = self
            .call("groups.update", vec![Value::Array(updates)])
            .await?;
        Ok(response.take_or_default("newGroupIds")?)
    }

    pub async fn remove_groups(&mut self, group_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self.call("groups.remove", vec![group_ids.to_wire()]).await?;
        Ok(response.completion())
    }

    pub async fn restore_groups(&mut self, group_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self
            .call("groups.restore", vec![group_ids.to_wire()])
            .await?;
        Ok(response.completion())
    }
}
