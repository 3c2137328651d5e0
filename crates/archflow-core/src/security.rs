use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, ArchFlowError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// Identity carried by a verified token.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub user_id: String,
    pub email: String,
}

/// Issues and verifies signed, time-limited identity tokens.
///
/// Tokens are stateless; there is no server-side revocation list.
pub struct JwtManager {
    config: AuthConfig,
}

impl JwtManager {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn create_token(&self, user_id: &str, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.config.token_ttl_days)).timestamp(),
        };

        let key = EncodingKey::from_secret(self.config.jwt_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| ArchFlowError::Token(format!("token generation failed: {}", e)))
    }

    /// Verifies a token; any failure (bad signature, expired, malformed)
    /// yields `None`.
    pub fn verify_token(&self, token: &str) -> Option<TokenIdentity> {
        let key = DecodingKey::from_secret(self.config.jwt_secret().as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &key, &validation).ok()?;
        Some(TokenIdentity {
            user_id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Hashes a password with argon2 and a freshly generated salt. Cost
/// parameters come from `Argon2::default()` rather than hardcoded constants.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ArchFlowError::Internal(format!("password hashing failed: {}", e)))
}

/// Verifies a password against a stored hash. An unparseable hash counts as
/// a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let manager = JwtManager::new(AuthConfig::default());
        let token = manager.create_token("user_1", "a@b.io").unwrap();

        let identity = manager.verify_token(&token).expect("valid token");
        assert_eq!(identity.user_id, "user_1");
        assert_eq!(identity.email, "a@b.io");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let manager = JwtManager::new(AuthConfig::default());
        let token = manager.create_token("user_1", "a@b.io").unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(manager.verify_token(&tampered).is_none());
        assert!(manager.verify_token("garbage").is_none());
    }
}
