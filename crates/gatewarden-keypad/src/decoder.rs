//! Matrix keypad decoding.
//!
//! The decoder tracks which watched lines are asserted and how many. A key
//! press shows up as exactly one row line plus one column line. The decoder
//! moves between two states:
//!
//! - `Idle`: fewer than two lines asserted
//! - `Decoding`: two or more lines asserted
//!
//! A key fires only on the change-set that moves the count from below two to
//! exactly two, and only when the asserted pair is a row and a column.
//! Releases never fire. More than two asserted lines is ambiguous and fires
//! nothing until the count drops back below two.
//!
//! ```
//! use gatewarden_core::{ChangeSet, KeyEvent, PinState};
//! use gatewarden_keypad::{KeypadLayout, KeypadMatrixDecoder};
//!
//! let layout = KeypadLayout::new([5, 6, 13, 19], [17, 27, 22]).unwrap();
//! let mut decoder = KeypadMatrixDecoder::new(layout);
//!
//! let press: ChangeSet = [(6, PinState::Asserted), (27, PinState::Asserted)]
//!     .into_iter()
//!     .collect();
//! assert_eq!(decoder.apply(&press), Ok(Some(KeyEvent::digit(5).unwrap())));
//! ```

use crate::error::{KeypadError, Result};
use crate::layout::{KeypadLayout, LineRole};
use gatewarden_core::constants::KEY_PRESS_LINE_COUNT;
use gatewarden_core::{ChangeSet, KeyEvent, LineNumber, PinState};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, trace};

/// Decoder state, derived from the asserted-line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderState {
    Idle,
    Decoding,
}

impl fmt::Display for DecoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderState::Idle => write!(f, "Idle"),
            DecoderState::Decoding => write!(f, "Decoding"),
        }
    }
}

/// Turns change-sets on the keypad lines into key events.
#[derive(Debug, Clone)]
pub struct KeypadMatrixDecoder {
    layout: KeypadLayout,
    asserted: BTreeSet<LineNumber>,
}

impl KeypadMatrixDecoder {
    pub fn new(layout: KeypadLayout) -> Self {
        Self {
            layout,
            asserted: BTreeSet::new(),
        }
    }

    pub fn layout(&self) -> &KeypadLayout {
        &self.layout
    }

    /// Number of watched lines currently asserted.
    pub fn asserted_count(&self) -> usize {
        self.asserted.len()
    }

    pub fn state(&self) -> DecoderState {
        if self.asserted.len() < KEY_PRESS_LINE_COUNT {
            DecoderState::Idle
        } else {
            DecoderState::Decoding
        }
    }

    /// Apply one change-set atomically.
    ///
    /// Lines outside the layout and `Unknown` states are ignored. Returns the
    /// key pressed, if this change-set completed a press, or
    /// [`KeypadError::DecodeAmbiguous`] when it left more than two lines
    /// asserted from a state that was not already ambiguous.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<Option<KeyEvent>> {
        let before = self.asserted.len();

        for (line, state) in changes.iter() {
            if self.layout.role(line).is_none() {
                continue;
            }
            match state {
                PinState::Asserted => {
                    self.asserted.insert(line);
                }
                PinState::Deasserted => {
                    self.asserted.remove(&line);
                }
                PinState::Unknown => trace!(line, "ignoring unknown pin state"),
            }
        }

        let after = self.asserted.len();
        if after == before {
            return Ok(None);
        }
        trace!(before, after, state = %self.state(), "keypad line count changed");

        if after > KEY_PRESS_LINE_COUNT {
            if before <= KEY_PRESS_LINE_COUNT {
                debug!(asserted = after, "ambiguous key press suppressed");
                return Err(KeypadError::DecodeAmbiguous { asserted: after });
            }
            return Ok(None);
        }

        if before < KEY_PRESS_LINE_COUNT && after == KEY_PRESS_LINE_COUNT {
            let key = self.pressed_key();
            match key {
                Some(key) => debug!(%key, "key pressed"),
                None => debug!("two lines asserted without a row/column pair"),
            }
            return Ok(key);
        }

        Ok(None)
    }

    /// The key for the current pair, if it is one row and one column.
    fn pressed_key(&self) -> Option<KeyEvent> {
        let mut row = None;
        let mut col = None;
        for &line in &self.asserted {
            match self.layout.role(line)? {
                LineRole::Row(r) => row = Some(r),
                LineRole::Col(c) => col = Some(c),
            }
        }
        self.layout.key_at(row?, col?)
    }
}
