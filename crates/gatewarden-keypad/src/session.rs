//! Decoder and PIN buffer bundled for the keypad task.

use crate::accumulator::{PinEntryAccumulator, SubmittedPin};
use crate::decoder::KeypadMatrixDecoder;
use gatewarden_core::ChangeSet;
use tracing::debug;

/// Owns the single decoder and PIN buffer behind one keypad.
///
/// Errors never escape: ambiguous presses and incomplete PINs are logged and
/// the session keeps going.
#[derive(Debug)]
pub struct KeypadSession {
    decoder: KeypadMatrixDecoder,
    accumulator: PinEntryAccumulator,
}

impl KeypadSession {
    pub fn new(decoder: KeypadMatrixDecoder, accumulator: PinEntryAccumulator) -> Self {
        Self {
            decoder,
            accumulator,
        }
    }

    pub fn decoder(&self) -> &KeypadMatrixDecoder {
        &self.decoder
    }

    pub fn accumulator(&self) -> &PinEntryAccumulator {
        &self.accumulator
    }

    /// Feed one change-set. Returns a PIN when it completed one.
    pub fn handle(&mut self, changes: &ChangeSet) -> Option<SubmittedPin> {
        let key = match self.decoder.apply(changes) {
            Ok(Some(key)) => key,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "key press dropped");
                return None;
            }
        };

        match self.accumulator.on_key(key) {
            Ok(pin) => pin,
            Err(e) => {
                debug!(error = %e, "PIN entry rejected");
                None
            }
        }
    }
}
