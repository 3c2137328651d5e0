use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::{ArchFlowError, Result};

const CONFIG_FILE: &str = "archflow.toml";

/// Main configuration for ArchFlow.
///
/// Every section has serde defaults so a missing or partial config file still
/// yields a runnable server. Environment variables override file values for
/// the secrets (`JWT_SECRET`, `GEMINI_API_KEY`) and the listen port (`PORT`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ArchFlowConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. The built-in default is for development only.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: SecretString,

    /// Issued-token lifetime in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

impl AuthConfig {
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.expose_secret()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Server-side model credential. Callers may supply their own per
    /// request, which takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Candidate model identifiers tried in order, newest first.
    #[serde(default = "default_model_candidates")]
    pub model_candidates: Vec<String>,

    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// Bound on each model attempt, in seconds.
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,

    /// Snippets are cut at this many characters before being sent upstream,
    /// bounding request size and cost.
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_candidates: default_model_candidates(),
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
            max_snippet_chars: default_max_snippet_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call with credentials, in addition to
    /// local-network development hosts.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path of the flat JSON user database.
    #[serde(default = "default_users_path")]
    pub users_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_path: default_users_path(),
        }
    }
}

impl ArchFlowConfig {
    /// Loads `archflow.toml` from the working directory when present, then
    /// applies environment overrides. A missing file is not an error.
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(Path::new(CONFIG_FILE))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| ArchFlowError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = SecretString::from(secret);
            }
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.ai.api_key = Some(key);
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_jwt_secret() -> SecretString {
    SecretString::from("archflow-dev-secret-change-in-production".to_string())
}

fn default_token_ttl_days() -> i64 {
    7
}

fn default_model_candidates() -> Vec<String> {
    vec![
        "gemini-2.5-flash".to_string(),
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
    ]
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_max_snippet_chars() -> usize {
    4000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://archflow.io".to_string(),
    ]
}

fn default_users_path() -> String {
    "users.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = ArchFlowConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert!(config.ai.api_key.is_none());
        assert!(!config.ai.model_candidates.is_empty());
        assert_eq!(config.ai.max_snippet_chars, 4000);
        assert_eq!(config.storage.users_path, "users.json");
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let config: ArchFlowConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [ai]
            model_candidates = ["gemini-2.5-flash"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ai.model_candidates, vec!["gemini-2.5-flash"]);
        assert_eq!(config.ai.timeout_secs, 30);
        assert_eq!(config.auth.token_ttl_days, 7);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archflow.toml");
        std::fs::write(&path, "server = not-a-table").unwrap();

        let err = ArchFlowConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ArchFlowError::Config(_)));
    }
}
