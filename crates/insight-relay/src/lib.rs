pub mod builder;
pub mod config;
pub mod context;
pub mod datasets;
pub mod error;
pub mod excerpt;
pub mod quota;
pub mod relay;

pub use builder::RelayBuilder;
pub use config::RelayConfig;
pub use context::{ContextBuilder, SYSTEM_PROMPT};
pub use datasets::DatasetResolver;
pub use error::RelayError;
pub use excerpt::{matching_rule, select_excerpt, ExcerptRule, EXCERPT_RULES};
pub use quota::{CallerLocks, QuotaGate};
pub use relay::AnalysisRelay;
