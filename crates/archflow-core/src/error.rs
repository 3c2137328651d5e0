use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchFlowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    DuplicateUser,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ArchFlowError>;
