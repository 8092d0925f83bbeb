//! Error types for GPIO and peripheral operations.

use gatewarden_core::LineNumber;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to GPIO lines and peripherals.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reading a line failed. The caller keeps the previous state.
    #[error("Sample failed on line {line}: {message}")]
    SampleFailed { line: LineNumber, message: String },

    /// Driving an output line failed.
    #[error("Drive failed on line {line}: {message}")]
    DriveFailed { line: LineNumber, message: String },

    /// The line was never configured on this backend.
    #[error("Unknown line: {line}")]
    UnknownLine { line: LineNumber },

    /// Backend initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Camera capture failed.
    #[error("Capture failed: {message}")]
    CaptureFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new sample failure.
    pub fn sample_failed(line: LineNumber, message: impl Into<String>) -> Self {
        Self::SampleFailed {
            line,
            message: message.into(),
        }
    }

    /// Create a new drive failure.
    pub fn drive_failed(line: LineNumber, message: impl Into<String>) -> Self {
        Self::DriveFailed {
            line,
            message: message.into(),
        }
    }

    /// Create a new unknown line error.
    pub fn unknown_line(line: LineNumber) -> Self {
        Self::UnknownLine { line }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new capture failure.
    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Line this error refers to, if any.
    pub fn line(&self) -> Option<LineNumber> {
        match self {
            Self::SampleFailed { line, .. }
            | Self::DriveFailed { line, .. }
            | Self::UnknownLine { line } => Some(*line),
            _ => None,
        }
    }
}
