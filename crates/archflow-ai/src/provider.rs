use async_trait::async_trait;
use thiserror::Error;

/// Failure classes surfaced by a generative-model provider.
///
/// The fallback loop only distinguishes two of them: a missing model advances
/// to the next candidate, a rejected credential aborts the whole loop.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("provider error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("failed to parse model response: {0}")]
    Parse(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A remote text-generation backend.
///
/// The credential is passed per call rather than at construction so a single
/// shared client can serve caller-supplied keys.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Requests a schema-constrained JSON completion from `model` and
    /// returns the raw response text.
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> ProviderResult<String>;

    fn provider_name(&self) -> &str;
}
