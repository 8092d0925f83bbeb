use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input validation errors
    #[error("Invalid PIN format: {0}")]
    InvalidPinFormat(String),

    #[error("Invalid key digit: {0}")]
    InvalidDigit(u8),

    #[error("Invalid weekday token: {0}")]
    InvalidWeekday(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid carrier: {0}")]
    InvalidCarrier(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
