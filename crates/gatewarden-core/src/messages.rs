//! Text shown on the keypad display.
//!
//! ```
//! use gatewarden_core::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::WELCOME, "Welcome!");
//! ```

/// Display messages for keypad and gate feedback.
///
/// These are the only user-facing signals at the gate; denial reasons are
/// never shown, so an expired code and an unknown code read the same.
pub struct DisplayMessages;

impl DisplayMessages {
    /// Shown after the gate has been pulsed.
    pub const WELCOME: &'static str = "Welcome!";

    /// Unknown, inactive or out-of-window code.
    pub const INVALID_PIN: &'static str = "Invalid PIN";

    /// Enter pressed with fewer than the minimum number of digits.
    pub const PIN_NEEDED: &'static str = "PIN Needed";

    /// Buffer cleared by the `*` key or by overflow.
    pub const CLEARED: &'static str = "";

    /// The gate could not be driven.
    pub const GATE_FAULT: &'static str = "Gate Error";
}
