use std::sync::Arc;
use std::time::Duration;

use archflow_ai::{AssessmentEngine, GeminiClient, GeminiConfig};
use archflow_core::{ArchFlowConfig, JsonFileStore, JwtManager, Result};

use crate::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub engine: Arc<AssessmentEngine>,
    pub config: Arc<ArchFlowConfig>,
}

impl AppState {
    pub async fn new(config: Arc<ArchFlowConfig>) -> Result<Self> {
        let store = Arc::new(JsonFileStore::open(&config.storage.users_path).await?);
        let auth = Arc::new(AuthService::new(
            store,
            JwtManager::new(config.auth.clone()),
        ));
        auth.seed_demo_account().await?;

        let provider = Arc::new(GeminiClient::new(GeminiConfig {
            base_url: config.ai.base_url.clone(),
            timeout: Duration::from_secs(config.ai.timeout_secs),
        }));
        let engine = Arc::new(AssessmentEngine::new(provider, config.ai.clone()));

        Ok(Self {
            auth,
            engine,
            config,
        })
    }
}
