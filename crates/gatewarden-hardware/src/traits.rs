//! Capability traits for the gate's peripherals.
//!
//! Backends are synchronous: a GPIO read or write is a single ioctl, a
//! display update is a short bus write. Callers on the async side wrap slow
//! operations (camera capture) in `spawn_blocking`.
//!
//! All traits are object safe so concrete backends can be picked at startup
//! by cargo feature or configuration and shared as `Arc<dyn Trait>`.

use crate::error::{HardwareError, Result};
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin, PinState};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

/// Raw access to GPIO lines.
///
/// Levels are logical: `true` means asserted after applying the line's
/// configured [`ActiveLevel`].
pub trait GpioBackend: Send + Sync + Debug {
    /// Claim and configure a line. Must be called before `read` or `write`.
    fn setup(&self, pin: LogicalPin, active: ActiveLevel) -> Result<()>;

    /// Read the logical level of an input line.
    fn read(&self, line: LineNumber) -> Result<bool>;

    /// Drive an output line.
    fn write(&self, line: LineNumber, asserted: bool) -> Result<()>;
}

/// One sampling pass over the watched lines.
///
/// Lines that failed to read are listed in `failures` and are absent from
/// `states`.
#[derive(Debug, Default)]
pub struct Sample {
    pub states: BTreeMap<LineNumber, PinState>,
    pub failures: Vec<HardwareError>,
}

impl Sample {
    pub fn record(&mut self, line: LineNumber, result: Result<bool>) {
        match result {
            Ok(level) => {
                self.states.insert(line, PinState::from_level(level));
            }
            Err(e) => self.failures.push(e),
        }
    }
}

/// Produces snapshots of a fixed set of lines.
pub trait PinStateSource: Send {
    /// Take one snapshot. Never panics on read errors; failed lines are
    /// reported in [`Sample::failures`].
    fn sample(&mut self) -> Sample;
}

/// A text display next to the keypad.
pub trait DisplayBackend: Send + Sync + Debug {
    /// Show `text`, clearing it after `clear_after` when set.
    fn show(&self, text: &str, clear_after: Option<Duration>) -> Result<()>;
}

/// A still camera pointed at the gate.
pub trait CameraBackend: Send + Sync + Debug {
    /// Capture one JPEG still. An empty buffer means nothing was captured.
    fn capture_still(&self) -> Result<Vec<u8>>;
}
