pub mod config;
pub mod error;
pub mod openai;
pub mod retry;
pub mod traits;
pub mod types;

pub use config::{ClientFactory, ProviderConfig};
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use retry::{RetryPolicy, RetryingClient};
pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
pub use types::{Message, Role};
