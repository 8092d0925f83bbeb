//! Keypad decoding and PIN entry.
//!
//! Change-sets from the pin poller flow through [`KeypadMatrixDecoder`],
//! which emits one [`gatewarden_core::KeyEvent`] per physical press, into
//! [`PinEntryAccumulator`], which buffers digits until Enter. A
//! [`KeypadSession`] owns both for the single keypad task.
//!
//! [`StrobedMatrixSource`] scans keypads that need row strobing and presents
//! them as an ordinary pin state source.

pub mod accumulator;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod session;
pub mod strobe;

pub use accumulator::{PinEntryAccumulator, SubmittedPin};
pub use decoder::{DecoderState, KeypadMatrixDecoder};
pub use error::{KeypadError, Result};
pub use layout::{KEY_TABLE, KeypadLayout, LineRole};
pub use session::KeypadSession;
pub use strobe::StrobedMatrixSource;
