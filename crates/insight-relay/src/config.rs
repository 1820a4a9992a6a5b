use insight_types::QuotaPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub model: String,
    pub temperature: f32,
    /// Response token ceiling sent to the provider
    pub max_tokens: u32,
    /// Deadline for the whole provider call, retries included
    pub inference_timeout: Duration,
    /// Rows returned alongside the answer
    pub excerpt_size: usize,
    /// Rows serialized into the prompt as a sample
    pub sample_rows: usize,
    pub max_sample_chars: usize,
    /// Cap on rows fetched from the primary table; `None` fetches all
    pub max_rows: Option<usize>,
    pub max_query_chars: usize,
    pub quota: QuotaPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 1500,
            inference_timeout: Duration::from_secs(60),
            excerpt_size: 10,
            sample_rows: 2,
            max_sample_chars: 4000,
            max_rows: Some(5000),
            max_query_chars: 2000,
            quota: QuotaPolicy::default(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_quota(mut self, quota: QuotaPolicy) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_excerpt_size(mut self, size: usize) -> Self {
        self.excerpt_size = size;
        self
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }
}
