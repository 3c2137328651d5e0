use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use archflow_core::{
    hash_password, verify_password, ArchFlowError, JwtManager, PublicUser, Result, TokenIdentity,
    User, UserStore,
};

use crate::{ApiError, AppState};

pub const DEMO_EMAIL: &str = "demo@archflow.io";
const DEMO_PASSWORD: &str = "demo123";

/// Registration, login, and identity lookup over an injected user store.
///
/// Constructed once per process; no global state.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { store, jwt }
    }

    /// Seeds the permanent demo account if absent.
    pub async fn seed_demo_account(&self) -> Result<()> {
        if self.store.exists(DEMO_EMAIL).await? {
            return Ok(());
        }

        info!("seeding demo account");
        self.store
            .insert(User {
                id: "user_demo".to_string(),
                email: DEMO_EMAIL.to_string(),
                name: "Demo User".to_string(),
                created_at: Utc::now(),
                password_hash: hash_password(DEMO_PASSWORD)?,
            })
            .await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<(PublicUser, String)> {
        let user = User {
            id: format!("user_{}", Uuid::new_v4().simple()),
            email: email.to_string(),
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string()),
            created_at: Utc::now(),
            password_hash: hash_password(password)?,
        };

        let public = PublicUser::from(&user);
        self.store.insert(user).await?;

        let token = self.jwt.create_token(&public.id, &public.email)?;
        info!(email = %public.email, "user registered");
        Ok((public, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(PublicUser, String)> {
        // Unknown email and wrong password produce the same error so this
        // endpoint cannot be used to enumerate accounts.
        let Some(user) = self.store.get(email).await? else {
            return Err(ArchFlowError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(ArchFlowError::InvalidCredentials);
        }

        let token = self.jwt.create_token(&user.id, &user.email)?;
        Ok((PublicUser::from(&user), token))
    }

    pub async fn current_user(&self, email: &str) -> Result<Option<PublicUser>> {
        Ok(self.store.get(email).await?.map(|u| PublicUser::from(&u)))
    }

    pub fn verify_token(&self, token: &str) -> Option<TokenIdentity> {
        self.jwt.verify_token(token)
    }
}

/// Rejects requests without a verifiable bearer token; otherwise attaches
/// the token identity to the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return Err(ApiError::Auth("Authentication required".to_string()));
    };

    let Some(identity) = state.auth.verify_token(&token) else {
        return Err(ApiError::Auth("Invalid token".to_string()));
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
