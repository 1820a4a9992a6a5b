use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to reach provider: {0}")]
    Transport(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse provider response: {0}")]
    Decode(String),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Network failures, timeouts and 5xx are transient. Any 4xx, decode
    /// failure or configuration error is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::EmptyResponse | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
