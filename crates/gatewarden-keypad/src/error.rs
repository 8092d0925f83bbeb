use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeypadError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeypadError {
    /// More than two matrix lines asserted at once. The press is ignored.
    #[error("Ambiguous key press: {asserted} lines asserted")]
    DecodeAmbiguous { asserted: usize },

    /// Enter pressed before enough digits were typed.
    #[error("Incomplete PIN: {len} digits entered, {min} required")]
    IncompletePin { len: usize, min: usize },

    #[error("Invalid keypad layout: {0}")]
    InvalidLayout(String),
}

impl KeypadError {
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout(message.into())
    }
}
