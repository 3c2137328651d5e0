pub mod assessment;
pub mod gemini;
pub mod provider;

pub use assessment::{AssessmentEngine, AssessmentResult, Complexity, ERROR_MODEL, MOCK_MODEL};
pub use gemini::{GeminiClient, GeminiConfig};
pub use provider::{GenerativeProvider, ProviderError, ProviderResult};
