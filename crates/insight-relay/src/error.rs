use insight_persist::PersistError;
use insight_types::UnknownDataset;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Daily query limit reached")]
    QuotaExceeded { limit: u32 },

    #[error(transparent)]
    InvalidDataset(#[from] UnknownDataset),

    /// Carries internal detail for logs; never shown to callers verbatim
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Storage error: {0}")]
    Storage(#[from] PersistError),
}

impl RelayError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidRequest(_) => "invalid_request",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::InvalidDataset(_) => "invalid_dataset",
            Self::InferenceFailure(_) => "inference_failure",
            Self::Storage(_) => "storage",
        }
    }
}
