use chrono::Utc;
use std::sync::Arc;

use insight_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use insight_persist::{DatasetStore, QuotaStore};
use insight_types::{AnalysisRequest, AnalysisResult, DatasetId, DatasetSummary, QuotaStatus};

use crate::config::RelayConfig;
use crate::context::{ContextBuilder, SYSTEM_PROMPT};
use crate::datasets::DatasetResolver;
use crate::error::RelayError;
use crate::excerpt::select_excerpt;
use crate::quota::{CallerLocks, QuotaGate};

/// Quota-gated relay between callers, the dataset tables and the LLM.
///
/// A request is charged only once the provider has answered; a caller's
/// requests are processed one at a time.
pub struct AnalysisRelay {
    chat_client: Arc<dyn ChatClient>,
    gate: QuotaGate,
    resolver: DatasetResolver,
    context: ContextBuilder,
    locks: CallerLocks,
    config: RelayConfig,
}

impl AnalysisRelay {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        quota_store: Arc<dyn QuotaStore>,
        dataset_store: Arc<dyn DatasetStore>,
        config: RelayConfig,
    ) -> Self {
        Self {
            chat_client,
            gate: QuotaGate::new(quota_store, config.quota),
            resolver: DatasetResolver::new(dataset_store, config.max_rows),
            context: ContextBuilder::new(config.sample_rows, config.max_sample_chars),
            locks: CallerLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Answer a natural-language question about one dataset.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, RelayError> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(RelayError::AuthenticationRequired);
        }

        let dataset = DatasetResolver::parse(&request.dataset)?;

        let query = request.query.trim();
        if query.is_empty() {
            return Err(RelayError::InvalidRequest("query must not be empty".to_string()));
        }
        if query.chars().count() > self.config.max_query_chars {
            return Err(RelayError::InvalidRequest(format!(
                "query exceeds {} characters",
                self.config.max_query_chars
            )));
        }

        let _guard = self.locks.acquire(user_id).await;

        let (status, descriptor) = tokio::try_join!(
            self.gate.check(user_id, Utc::now()),
            self.resolver.resolve(dataset),
        )?;

        tracing::info!(
            user_id = %user_id,
            dataset = %dataset,
            rows = descriptor.row_count(),
            remaining = status.remaining,
            "Running analysis"
        );

        let prompt = self.context.build(&descriptor, query);
        let text = self.infer(prompt).await?;

        let excerpt = select_excerpt(dataset, query, &descriptor.rows, self.config.excerpt_size);

        let recorded = self.gate.record(user_id, Utc::now()).await?;
        tracing::debug!(user_id = %user_id, count = recorded.count, "Query recorded");

        Ok(AnalysisResult::text(text).with_table(excerpt))
    }

    pub async fn quota_status(&self, user_id: &str) -> Result<QuotaStatus, RelayError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(RelayError::AuthenticationRequired);
        }
        self.gate.status(user_id, Utc::now()).await
    }

    pub fn datasets(&self) -> Vec<DatasetSummary> {
        DatasetId::ALL.into_iter().map(DatasetSummary::from).collect()
    }

    pub async fn ping_storage(&self) -> Result<(), RelayError> {
        self.resolver.ping().await
    }

    async fn infer(&self, prompt: String) -> Result<String, RelayError> {
        let request = ChatRequest::new(
            self.config.model.clone(),
            vec![Message::system(SYSTEM_PROMPT), Message::human(prompt)],
        )
        .with_options(
            ChatOptions::new()
                .temperature(self.config.temperature)
                .max_tokens(self.config.max_tokens),
        );

        let response = tokio::time::timeout(self.config.inference_timeout, self.chat_client.chat(request))
            .await
            .map_err(|_| {
                tracing::error!(timeout = ?self.config.inference_timeout, "Inference timed out");
                RelayError::InferenceFailure("inference timed out".to_string())
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "Inference failed");
                RelayError::InferenceFailure(e.to_string())
            })?;

        response
            .text_content()
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::error!("Inference returned no content");
                RelayError::InferenceFailure("empty response".to_string())
            })
    }
}
