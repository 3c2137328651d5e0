use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{models::User, ArchFlowError, Result};

/// Repository interface over user records keyed by email.
///
/// Implementations must make `insert` atomic with respect to the uniqueness
/// check so concurrent registrations for one email serialize.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a new user; fails with [`ArchFlowError::DuplicateUser`] when
    /// the email is already present.
    async fn insert(&self, user: User) -> Result<()>;

    async fn exists(&self, email: &str) -> Result<bool>;
}

/// Flat-file store: a JSON map of email to user record, fully loaded at open
/// and rewritten on every insert.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    users: RwLock<HashMap<String, User>>,
}

impl JsonFileStore {
    /// Opens the store, loading existing records. A missing file yields an
    /// empty store; an unreadable one is an error rather than silent data
    /// loss.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let users = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ArchFlowError::Store(format!("corrupt user database: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "user database missing, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    async fn persist(&self, users: &HashMap<String, User>) -> Result<()> {
        let raw = serde_json::to_string_pretty(users)?;
        tokio::fs::write(&self.path, raw).await.map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to persist user database");
            ArchFlowError::Io(e)
        })
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn get(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(ArchFlowError::DuplicateUser);
        }
        users.insert(user.email.clone(), user);
        self.persist(&users).await
    }

    async fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.users.read().await.contains_key(email))
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(ArchFlowError::DuplicateUser);
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    async fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.users.read().await.contains_key(email))
    }
}
