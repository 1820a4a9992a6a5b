use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use insight_llm::ProviderConfig;
use insight_relay::RelayConfig;
use insight_types::QuotaPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request deadline enforced by the router
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default = "default_database")]
    pub database: String,
    /// Directory of `<table>.json` files loaded by the memory backend
    #[serde(default)]
    pub fixtures_dir: Option<String>,
}

fn default_database() -> String {
    "insight".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    /// Response token ceiling sent to the provider
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_llm_request_timeout")]
    pub request_timeout_secs: u64,
    /// Deadline for the whole call, retries included
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_llm_request_timeout() -> u64 {
    30
}

fn default_overall_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    pub limit: u32,
    pub window_hours: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: insight_types::DEFAULT_QUERY_LIMIT,
            window_hours: insight_types::DEFAULT_WINDOW_HOURS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub excerpt_size: usize,
    pub sample_rows: usize,
    pub max_sample_chars: usize,
    /// 0 fetches every row
    pub max_rows: usize,
    pub max_query_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let relay = RelayConfig::default();
        Self {
            excerpt_size: relay.excerpt_size,
            sample_rows: relay.sample_rows,
            max_sample_chars: relay.max_sample_chars,
            max_rows: relay.max_rows.unwrap_or(0),
            max_query_chars: relay.max_query_chars,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables named `SECTION__KEY`, e.g. `LLM__MAX_TOKENS`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for section in ["SERVER", "CORS", "STORAGE", "LLM", "QUOTA", "ANALYSIS", "LOGGING"] {
            builder = builder.add_source(
                Environment::with_prefix(section)
                    .prefix_separator("__")
                    .keep_prefix(true)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets come from the environment, never from TOML
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message(
                    "MONGODB_URI environment variable is required for the mongodb backend"
                        .to_string(),
                )
            })?;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let mut provider = ProviderConfig::openai(self.openai_api_key.clone());
        if let Some(base_url) = &self.llm.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        provider.request_timeout_secs = self.llm.request_timeout_secs;
        provider.max_retries = self.llm.max_retries;
        provider.initial_backoff_ms = self.llm.initial_backoff_ms;
        provider
    }

    pub fn relay_config(&self) -> RelayConfig {
        let analysis = &self.analysis;
        RelayConfig {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            inference_timeout: Duration::from_secs(self.llm.overall_timeout_secs),
            excerpt_size: analysis.excerpt_size,
            sample_rows: analysis.sample_rows,
            max_sample_chars: analysis.max_sample_chars,
            max_rows: (analysis.max_rows > 0).then_some(analysis.max_rows),
            max_query_chars: analysis.max_query_chars,
            // Out-of-range windows collapse to zero and are refused by the builder
            quota: QuotaPolicy::new(
                self.quota.limit,
                chrono::Duration::try_hours(self.quota.window_hours)
                    .unwrap_or_else(chrono::Duration::zero),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [storage]
        backend = "memory"
        fixtures_dir = "fixtures"

        [llm]
        model = "gpt-4o-mini"
        temperature = 0.3
        max_tokens = 1500

        [quota]
        limit = 3
        window_hours = 12

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 120);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.database, "insight");
        assert_eq!(config.llm.overall_timeout_secs, 60);
        assert_eq!(config.analysis.excerpt_size, 10);
    }

    #[test]
    fn test_relay_config_mapping() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let relay = config.relay_config();
        assert_eq!(relay.quota.limit, 3);
        assert_eq!(relay.quota.window, chrono::Duration::hours(12));
        assert_eq!(relay.inference_timeout, Duration::from_secs(60));
        assert_eq!(relay.max_rows, Some(5000));
    }

    #[test]
    fn test_out_of_range_window_collapses() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.quota.window_hours = i64::MAX;
        assert_eq!(config.relay_config().quota.window, chrono::Duration::zero());
    }

    #[test]
    fn test_provider_config_mapping() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.openai_api_key = "sk-test".to_string();
        config.llm.base_url = Some("http://localhost:9999/v1".to_string());

        let provider = config.provider_config();
        assert_eq!(provider.api_key, "sk-test");
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:9999/v1"));
        assert_eq!(provider.max_retries, 2);
    }
}
