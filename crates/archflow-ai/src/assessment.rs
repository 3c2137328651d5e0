use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use archflow_core::config::AiConfig;

use crate::provider::{GenerativeProvider, ProviderError};

/// Sentinel model id for the no-credential result.
pub const MOCK_MODEL: &str = "mock";
/// Sentinel model id for the all-candidates-failed result.
pub const ERROR_MODEL: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Normalized assessment of a code snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub complexity: Complexity,
    pub suggestions: Vec<String>,
    pub confidence: f64,
    pub model_used: String,
}

impl AssessmentResult {
    /// Returned when no credential is available; carries a hint instead of
    /// an assessment.
    fn mock() -> Self {
        Self {
            complexity: Complexity::Low,
            suggestions: vec!["Provide an AI API key to enable model-backed analysis".to_string()],
            confidence: 0.0,
            model_used: MOCK_MODEL.to_string(),
        }
    }

    /// Returned when every candidate failed or the credential was rejected.
    fn error(message: &str) -> Self {
        Self {
            complexity: Complexity::High,
            suggestions: vec![format!("AI Error: {}", message)],
            confidence: 0.0,
            model_used: ERROR_MODEL.to_string(),
        }
    }
}

/// The three fields the model is asked to produce; `model_used` is attached
/// locally after a successful parse.
#[derive(Debug, Deserialize)]
struct ParsedAssessment {
    complexity: Complexity,
    suggestions: Vec<String>,
    confidence: f64,
}

/// Outcome of a single candidate attempt.
enum AttemptOutcome {
    Success(ParsedAssessment),
    NextCandidate(ProviderError),
    Fatal(ProviderError),
}

impl AttemptOutcome {
    /// Reducer from a provider failure to a loop transition. A missing model
    /// advances to the next candidate; a rejected credential fails
    /// identically for every candidate, so it aborts the loop. Everything
    /// else advances optimistically. The not-found arm is kept distinct from
    /// the catch-all even though both advance.
    fn classify(err: ProviderError) -> Self {
        match err {
            ProviderError::ModelNotFound(_) => AttemptOutcome::NextCandidate(err),
            ProviderError::InvalidApiKey(_) => AttemptOutcome::Fatal(err),
            _ => AttemptOutcome::NextCandidate(err),
        }
    }
}

/// Walks the candidate model list in priority order until one returns a
/// parseable assessment.
pub struct AssessmentEngine {
    provider: Arc<dyn GenerativeProvider>,
    config: AiConfig,
}

impl AssessmentEngine {
    pub fn new(provider: Arc<dyn GenerativeProvider>, config: AiConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Assesses a code snippet. Never fails: every failure path resolves to
    /// a result value tagged with a sentinel model id.
    pub async fn assess(&self, snippet: &str, caller_key: Option<&str>) -> AssessmentResult {
        let api_key = caller_key
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .or_else(|| self.config.api_key.clone().filter(|k| !k.is_empty()));

        let Some(api_key) = api_key else {
            debug!("no model credential available, returning mock assessment");
            return AssessmentResult::mock();
        };

        let prompt = self.build_prompt(snippet);
        let mut last_error: Option<ProviderError> = None;

        for model in &self.config.model_candidates {
            let outcome = match self.provider.generate(&api_key, model, &prompt).await {
                Ok(text) => match parse_assessment(&text) {
                    Ok(parsed) => AttemptOutcome::Success(parsed),
                    Err(e) => AttemptOutcome::NextCandidate(e),
                },
                Err(e) => AttemptOutcome::classify(e),
            };

            match outcome {
                AttemptOutcome::Success(parsed) => {
                    debug!(model = %model, confidence = parsed.confidence, "assessment succeeded");
                    return AssessmentResult {
                        complexity: parsed.complexity,
                        suggestions: parsed.suggestions,
                        confidence: parsed.confidence,
                        model_used: model.clone(),
                    };
                }
                AttemptOutcome::NextCandidate(err) => {
                    warn!(model = %model, error = %err, "candidate failed, trying next");
                    last_error = Some(err);
                }
                AttemptOutcome::Fatal(err) => {
                    warn!(model = %model, error = %err, "credential rejected, aborting fallback");
                    last_error = Some(err);
                    break;
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no model candidates configured".to_string());
        AssessmentResult::error(&message)
    }

    /// Builds the instruction prompt. Oversized snippets are cut at the
    /// configured character bound here, at request construction, not as a
    /// hidden side effect elsewhere.
    fn build_prompt(&self, snippet: &str) -> String {
        let truncated: String = snippet.chars().take(self.config.max_snippet_chars).collect();
        format!(
            "Analyze the following code snippet and return a JSON object with \
             three fields: \"complexity\" (one of \"low\", \"medium\", \"high\"), \
             \"suggestions\" (an array of short improvement suggestions), and \
             \"confidence\" (a number between 0 and 1).\n\nCode:\n{}",
            truncated
        )
    }
}

/// Model responses sometimes arrive wrapped in a markdown code fence,
/// optionally annotated as JSON. Accept fenced and bare payloads alike.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn parse_assessment(raw: &str) -> Result<ParsedAssessment, ProviderError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| ProviderError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GenerativeProvider, ProviderResult};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that replays a script of outcomes and counts calls.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<ProviderResult<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ProviderResult<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeProvider for ScriptedProvider {
        async fn generate(
            &self,
            _api_key: &str,
            _model: &str,
            _prompt: &str,
        ) -> ProviderResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse))
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }
    }

    fn config_with_key(candidates: &[&str]) -> AiConfig {
        AiConfig {
            api_key: Some("k".to_string()),
            model_candidates: candidates.iter().map(|s| s.to_string()).collect(),
            ..AiConfig::default()
        }
    }

    fn engine(
        responses: Vec<ProviderResult<String>>,
        config: AiConfig,
    ) -> (AssessmentEngine, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(responses));
        (AssessmentEngine::new(provider.clone(), config), provider)
    }

    const GOOD_JSON: &str =
        r#"{"complexity": "medium", "suggestions": ["split it up"], "confidence": 0.87}"#;

    #[tokio::test]
    async fn no_credential_short_circuits_to_mock() {
        let config = AiConfig {
            api_key: None,
            ..AiConfig::default()
        };
        let (engine, provider) = engine(vec![], config);

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, MOCK_MODEL);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn first_candidate_success_is_terminal() {
        let (engine, provider) = engine(
            vec![Ok(GOOD_JSON.to_string())],
            config_with_key(&["model-a", "model-b"]),
        );

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, "model-a");
        assert_eq!(result.complexity, Complexity::Medium);
        assert_eq!(result.suggestions, vec!["split it up"]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_model_falls_through_to_next_candidate() {
        let (engine, provider) = engine(
            vec![
                Err(ProviderError::ModelNotFound("model-a".to_string())),
                Ok(GOOD_JSON.to_string()),
            ],
            config_with_key(&["model-a", "model-b"]),
        );

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, "model-b");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn invalid_key_aborts_without_trying_remaining_candidates() {
        let (engine, provider) = engine(
            vec![
                Err(ProviderError::ModelNotFound("model-a".to_string())),
                Err(ProviderError::InvalidApiKey("API key not valid".to_string())),
            ],
            config_with_key(&["model-a", "model-b", "model-c"]),
        );

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, ERROR_MODEL);
        assert_eq!(result.complexity, Complexity::High);
        assert!(result.suggestions[0].starts_with("AI Error:"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_candidates_yield_error_result_with_last_message() {
        let (engine, provider) = engine(
            vec![
                Err(ProviderError::Upstream {
                    status: 500,
                    message: "first".to_string(),
                }),
                Err(ProviderError::Upstream {
                    status: 503,
                    message: "second".to_string(),
                }),
            ],
            config_with_key(&["model-a", "model-b"]),
        );

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, ERROR_MODEL);
        assert_eq!(result.confidence, 0.0);
        assert!(result.suggestions[0].contains("second"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn unparseable_response_advances_to_next_candidate() {
        let (engine, provider) = engine(
            vec![Ok("not json at all".to_string()), Ok(GOOD_JSON.to_string())],
            config_with_key(&["model-a", "model-b"]),
        );

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, "model-b");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn caller_key_takes_precedence_over_config() {
        let config = AiConfig {
            api_key: None,
            model_candidates: vec!["model-a".to_string()],
            ..AiConfig::default()
        };
        let (engine, provider) = engine(vec![Ok(GOOD_JSON.to_string())], config);

        let result = engine.assess("fn main() {}", Some("caller-key")).await;
        assert_eq!(result.model_used, "model-a");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn fenced_response_parses() {
        let fenced = format!("```json\n{}\n```", GOOD_JSON);
        let (engine, _) = engine(vec![Ok(fenced)], config_with_key(&["model-a"]));

        let result = engine.assess("fn main() {}", None).await;
        assert_eq!(result.model_used, "model-a");
        assert_eq!(result.confidence, 0.87);
    }

    #[test]
    fn strip_code_fences_handles_all_forms() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn prompt_truncates_oversized_snippets() {
        let config = AiConfig {
            max_snippet_chars: 10,
            ..AiConfig::default()
        };
        let engine = AssessmentEngine::new(
            Arc::new(ScriptedProvider::new(vec![])),
            config,
        );

        let prompt = engine.build_prompt(&"x".repeat(100));
        let snippet_part = prompt.rsplit('\n').next().unwrap();
        assert_eq!(snippet_part, "x".repeat(10));
    }
}
