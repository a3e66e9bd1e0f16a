use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Delete error: {0}")]
    DeleteError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Space no longer exists: {0}")]
    SpaceRemoved(String),

    #[error("Sweep deadline exceeded")]
    DeadlineExceeded,

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
