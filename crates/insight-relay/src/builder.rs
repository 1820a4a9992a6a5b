use anyhow::{anyhow, Result};
use std::sync::Arc;

use insight_llm::ChatClient;
use insight_persist::{DatasetStore, QuotaStore};

use crate::config::RelayConfig;
use crate::relay::AnalysisRelay;

/// Builder for constructing an [`AnalysisRelay`]
#[derive(Default)]
pub struct RelayBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    quota_store: Option<Arc<dyn QuotaStore>>,
    dataset_store: Option<Arc<dyn DatasetStore>>,
    config: RelayConfig,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    pub fn quota_store(mut self, store: Arc<dyn QuotaStore>) -> Self {
        self.quota_store = Some(store);
        self
    }

    pub fn dataset_store(mut self, store: Arc<dyn DatasetStore>) -> Self {
        self.dataset_store = Some(store);
        self
    }

    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AnalysisRelay> {
        let chat_client = self
            .chat_client
            .ok_or_else(|| anyhow!("Chat client is required"))?;
        let quota_store = self
            .quota_store
            .ok_or_else(|| anyhow!("Quota store is required"))?;
        let dataset_store = self
            .dataset_store
            .ok_or_else(|| anyhow!("Dataset store is required"))?;

        if self.config.quota.limit == 0 {
            return Err(anyhow!("Quota limit must be at least 1"));
        }
        if self.config.quota.window <= chrono::Duration::zero() {
            return Err(anyhow!("Quota window must be positive"));
        }

        Ok(AnalysisRelay::new(
            chat_client,
            quota_store,
            dataset_store,
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insight_llm::{ChatRequest, ChatResponse};
    use insight_persist::InMemoryStore;

    struct SilentChat;

    #[async_trait]
    impl ChatClient for SilentChat {
        async fn chat(&self, _request: ChatRequest) -> insight_llm::error::Result<ChatResponse> {
            Ok(ChatResponse::text(""))
        }
    }

    #[test]
    fn test_build_requires_chat_client() {
        let store = Arc::new(InMemoryStore::new());
        let err = RelayBuilder::new()
            .quota_store(store.clone())
            .dataset_store(store)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Chat client is required");
    }

    #[test]
    fn test_build_rejects_empty_window() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = RelayConfig::default();
        config.quota.window = chrono::Duration::zero();

        let err = RelayBuilder::new()
            .chat_client(Arc::new(SilentChat))
            .quota_store(store.clone())
            .dataset_store(store)
            .config(config)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Quota window must be positive");
    }
}
