//! Gate actuation.
//!
//! [`GateActuator`] owns the gate trigger output and the pulse-in-flight
//! guard. It is shared by handle between the keypad path and the web path.

pub mod actuator;
pub mod error;

pub use actuator::{GateActuator, GateSettings};
pub use error::{ActuationError, Result};
