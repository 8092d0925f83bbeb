//! PIN entry buffer.

use crate::error::{KeypadError, Result};
use gatewarden_core::access_code::mask_pin;
use gatewarden_core::constants::{MAX_PIN_LENGTH, MIN_PIN_LENGTH};
use gatewarden_core::{DisplayMessages, KeyEvent};
use gatewarden_hardware::DisplayBackend;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A PIN taken off the keypad on Enter.
///
/// `Debug` and `Display` only show the mask.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmittedPin(String);

impl SubmittedPin {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SubmittedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubmittedPin({})", mask_pin(&self.0))
    }
}

impl fmt::Display for SubmittedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask_pin(&self.0))
    }
}

/// Collects digits until Enter or Clear.
///
/// The buffer is cleared on every terminating key and when it would grow
/// past the maximum PIN length. Each change is mirrored to the display as a
/// masked string.
#[derive(Debug)]
pub struct PinEntryAccumulator {
    buffer: String,
    display: Option<Arc<dyn DisplayBackend>>,
    message_ttl: Duration,
}

impl PinEntryAccumulator {
    pub fn new(display: Option<Arc<dyn DisplayBackend>>, message_ttl: Duration) -> Self {
        Self {
            buffer: String::with_capacity(MAX_PIN_LENGTH + 1),
            display,
            message_ttl,
        }
    }

    /// Digits entered so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn masked(&self) -> String {
        mask_pin(&self.buffer)
    }

    /// Append a digit. Overflowing the buffer clears it.
    pub fn on_digit(&mut self, digit: u8) {
        if digit > 9 {
            warn!(digit, "ignoring out of range digit");
            return;
        }
        self.buffer.push(char::from(b'0' + digit));
        if self.buffer.len() > MAX_PIN_LENGTH {
            debug!(max = MAX_PIN_LENGTH, "PIN buffer overflow, clearing");
            self.buffer.clear();
            self.show(DisplayMessages::CLEARED, None);
            return;
        }
        self.refresh();
    }

    pub fn on_clear(&mut self) {
        self.buffer.clear();
        debug!("PIN buffer cleared");
        self.show(DisplayMessages::CLEARED, None);
    }

    /// Finish entry. Too few digits yields [`KeypadError::IncompletePin`].
    ///
    /// The buffer is empty afterwards either way.
    pub fn on_enter(&mut self) -> Result<SubmittedPin> {
        let pin = std::mem::take(&mut self.buffer);
        if pin.len() < MIN_PIN_LENGTH {
            debug!(len = pin.len(), "Enter with incomplete PIN");
            self.show(DisplayMessages::PIN_NEEDED, Some(self.message_ttl));
            return Err(KeypadError::IncompletePin {
                len: pin.len(),
                min: MIN_PIN_LENGTH,
            });
        }
        debug!(len = pin.len(), "PIN submitted");
        self.refresh();
        Ok(SubmittedPin(pin))
    }

    /// Dispatch a decoded key. Returns the PIN when Enter completes one.
    pub fn on_key(&mut self, key: KeyEvent) -> Result<Option<SubmittedPin>> {
        match key {
            KeyEvent::Digit(d) => {
                self.on_digit(d.get());
                Ok(None)
            }
            KeyEvent::Clear => {
                self.on_clear();
                Ok(None)
            }
            KeyEvent::Enter => self.on_enter().map(Some),
        }
    }

    fn refresh(&self) {
        self.show(&self.masked(), None);
    }

    fn show(&self, text: &str, clear_after: Option<Duration>) {
        if let Some(display) = &self.display
            && let Err(e) = display.show(text, clear_after)
        {
            warn!(error = %e, "display update failed");
        }
    }
}
