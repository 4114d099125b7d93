use tracing::debug;

use crate::client::{SklikClient, SklikError};
use crate::domain::{Completion, DEFAULT_KEYWORDS_BATCH, Entity, Keyword, KeywordsFilter};
use crate::marshalling::{ToWire, Value};

impl SklikClient {
    pub async fn list_keywords(
        &mut self,
        filter: &KeywordsFilter,
    ) -> Result<Vec<Keyword>, SklikError> {
        let mut response = self.call("keywords.list", vec![filter.to_wire()]).await?;
        Ok(response.take("keywords")?)
    }

    /// `keywords.create` in batches no larger than the server's limit.
    ///
    /// Returns positive keyword ids followed by negative ones. A failing
    /// batch aborts the rest; earlier batches stay created.
    pub async fn create_keywords(&mut self, keywords: &[Keyword]) -> Result<Vec<i64>, SklikError> {
        let batch = self.keywords_batch_size();
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        for (index, chunk) in keywords.chunks(batch).enumerate() {
            debug!(batch = index, size = chunk.len(), "creating keywords");
            let mut response = self.call("keywords.create", vec![chunk.to_wire()]).await?;
            positive.extend(response.take_or_default::<Vec<i64>>("positiveKeywordIds")?);
            negative.extend(response.take_or_default::<Vec<i64>>("negativeKeywordIds")?);
        }

        positive.extend(negative);
        Ok(positive)
    }

    fn keywords_batch_size(&self) -> usize {
        self.get_batch_limit("keywords.create")
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|&limit| limit > 0)
            .map_or(DEFAULT_KEYWORDS_BATCH, |limit| limit.min(DEFAULT_KEYWORDS_BATCH))
    }

    pub async fn get_keywords(&mut self, keyword_ids: &[i64]) -> Result<Vec<Keyword>, SklikError> {
        let mut response = self
            .call("keywords.get", vec![keyword_ids.to_wire()])
            .await?;
        Ok(response.take("keywords")?)
    }

    pub async fn check_keywords(&mut self, keywords: &[Keyword]) -> Result<(), SklikError> {
        self.call("keywords.check", vec![keywords.to_wire()]).await?;
        Ok(())
    }

    /// `keywords.update` with `id`, `status`, `cpc` and `url` only.
    pub async fn update_keywords(&mut self, keywords: &[Keyword]) -> Result<Vec<i64>, SklikError> {
        let updates = keywords
            .iter()
            .map(|keyword| Value::Struct(keyword.to_updatable_mapping()))
            .collect::<Vec<_>>();
        let mut response = self
            .call("keywords.update", vec![Value::Array(updates)])
            .await?;
        Ok(response.take_or_default("newKeywordIds")?)
    }

    pub async fn remove_keywords(&mut self, keyword_ids: &[i64]) -> Result<Completion, SklikError> {
        let response = self
            .call("keywords.remove", vec![keyword_ids.to_wire()])
            .await?;
        Ok(response.completion())
    }

    pub async fn restore_keywords(
        &mut self,
        keyword_ids: &[i64],
    ) -> Result<Completion, SklikError> {
        let response = self
            .call("keywords.restore", vec![keyword_ids.to_wire()])
            .await?;
        Ok(response.completion())
    }
}
