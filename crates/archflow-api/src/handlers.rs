use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use archflow_analysis::{analyze_repository, AnalysisReport};
use archflow_core::{PublicUser, TokenIdentity};

use crate::{ApiError, ApiResult, AppState};

pub const SERVICE_NAME: &str = "ArchFlow API";

/// Header carrying a caller-supplied model credential for `/api/analyze`.
pub const AI_KEY_HEADER: &str = "x-ai-api-key";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub version: String,
}

#[derive(Deserialize, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub repo_url: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub message: String,
    pub data: AnalysisReport,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: option_env!("CARGO_PKG_VERSION")
            .unwrap_or("0.1.0")
            .to_string(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (
        request.email.as_deref().filter(|e| !e.trim().is_empty()),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    let (user, token) = state
        .auth
        .register(email, password, request.name.as_deref())
        .await?;
    Ok(Json(AuthResponse { user, token }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (
        request.email.as_deref().filter(|e| !e.trim().is_empty()),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    let (user, token) = state.auth.login(email, password).await?;
    Ok(Json(AuthResponse { user, token }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<TokenIdentity>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .auth
        .current_user(&identity.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user }))
}

pub async fn analyze(
    State(state): State<AppState>,
    Extension(_identity): Extension<TokenIdentity>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Some(repo_url) = request.repo_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return Err(ApiError::Validation(
            "Repository URL is required".to_string(),
        ));
    };

    let caller_key = headers
        .get(AI_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty());

    let report = analyze_repository(repo_url, &state.engine, caller_key).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        message: "Analysis complete".to_string(),
        data: report,
    }))
}
