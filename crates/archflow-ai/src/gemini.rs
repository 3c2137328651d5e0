use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::provider::{GenerativeProvider, ProviderError, ProviderResult};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    /// Bound on a single generation attempt, including connect time.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client for Google-style `generateContent` endpoints, requesting
/// schema-constrained JSON output.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Schema for the assessment completion: complexity enum, suggestion list,
/// confidence number.
fn assessment_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "complexity": { "type": "string", "enum": ["low", "medium", "high"] },
            "suggestions": { "type": "array", "items": { "type": "string" } },
            "confidence": { "type": "number" }
        },
        "required": ["complexity", "suggestions", "confidence"]
    })
}

fn classify_failure(status: StatusCode, message: String, model: &str) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(model.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::InvalidApiKey(message),
        // The upstream reports a bad key as a 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if message.contains("API key") => {
            ProviderError::InvalidApiKey(message)
        }
        _ => ProviderError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: assessment_schema(),
            },
        };

        debug!(model, "sending structured generation request");

        let response = timeout(
            self.config.timeout,
            self.client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.config.timeout.as_secs()))?
        .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_failure(status, message, model));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_model_not_found() {
        let err = classify_failure(
            StatusCode::NOT_FOUND,
            "model missing".to_string(),
            "gemini-x",
        );
        assert!(matches!(err, ProviderError::ModelNotFound(m) if m == "gemini-x"));
    }

    #[test]
    fn auth_statuses_map_to_invalid_key() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_failure(status, "denied".to_string(), "gemini-x");
            assert!(matches!(err, ProviderError::InvalidApiKey(_)));
        }
    }

    #[test]
    fn bad_request_mentioning_key_maps_to_invalid_key() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            "API key not valid".to_string(),
            "gemini-x",
        );
        assert!(matches!(err, ProviderError::InvalidApiKey(_)));

        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            "malformed request".to_string(),
            "gemini-x",
        );
        assert!(matches!(err, ProviderError::Upstream { status: 400, .. }));
    }

    #[test]
    fn other_statuses_map_to_upstream() {
        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
            "gemini-x",
        );
        assert!(matches!(err, ProviderError::Upstream { status: 500, .. }));
    }
}
