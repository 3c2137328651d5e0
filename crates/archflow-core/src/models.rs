use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored form of a user record, keyed by email in the store.
///
/// The password hash never leaves the store layer; API responses use
/// [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub password_hash: String,
}

/// Wire form of a user, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}
