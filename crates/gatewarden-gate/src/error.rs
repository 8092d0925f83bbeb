use gatewarden_hardware::HardwareError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActuationError>;

#[derive(Error, Debug)]
pub enum ActuationError {
    /// No output line configured for the gate.
    #[error("No gate configured")]
    NotConfigured,

    /// The output line could not be claimed.
    #[error("Gate setup failed: {0}")]
    Setup(#[source] HardwareError),

    /// Driving the line high failed. `released` reports whether the
    /// follow-up deassert went through.
    #[error("Gate assert failed (output released: {released}): {source}")]
    AssertFailed {
        #[source]
        source: HardwareError,
        released: bool,
    },

    /// The pulse started but the line could not be released.
    #[error("Gate deassert failed: {0}")]
    DeassertFailed(#[source] HardwareError),
}
