use thiserror::Error;

/// Storage-specific error types for the gate controller.
///
/// These cover the SQLite adapter, the audit log files and conversion of
/// stored rows back into domain types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored data failed domain validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Audit log file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<gatewarden_core::Error> for StorageError {
    fn from(e: gatewarden_core::Error) -> Self {
        Self::Validation(e.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
