use gatewarden_gate::ActuationError;
use gatewarden_storage::StorageError;
use thiserror::Error;

/// Why an access attempt did not open the gate.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No usable code. Unknown, inactive and out-of-window codes all land
    /// here so the caller cannot tell them apart.
    #[error("Unknown or expired code")]
    UnknownOrExpiredCode,

    /// The gate could not be pulsed.
    #[error("Gate actuation failed: {0}")]
    Actuation(#[from] ActuationError),

    /// Code lookup failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AccessError {
    /// True for denials, false for faults.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::UnknownOrExpiredCode)
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
