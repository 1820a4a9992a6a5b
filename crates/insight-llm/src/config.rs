// Configuration layer for provider-agnostic chat client creation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::openai::OpenAIClient;
use crate::retry::{RetryPolicy, RetryingClient};
use crate::traits::ChatClient;

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Base URL for the API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-attempt HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    500
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create a chat client wrapped in the configured retry policy
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let policy = config.retry_policy();

        let mut builder = OpenAIClient::builder()
            .api_key(config.api_key)
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if let Some(base_url) = config.base_url {
            builder = builder.base_url(base_url);
        }
        let client = builder.build().context("Failed to build OpenAI client")?;

        Ok(Arc::new(RetryingClient::new(Arc::new(client), policy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::openai("test-key");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_policy().initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_serde_defaults_fill_in() {
        let config: ProviderConfig = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_factory_rejects_empty_key() {
        assert!(ClientFactory::create_chat_client(ProviderConfig::openai("")).is_err());
    }

    #[test]
    fn test_factory_builds_client() {
        let config = ProviderConfig::openai("test-key").with_base_url("http://localhost:9999/v1");
        assert!(ClientFactory::create_chat_client(config).is_ok());
    }
}
