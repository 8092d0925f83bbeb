//! Mock backends for testing and development.
//!
//! These stand in for real GPIO chips, displays and cameras so the whole
//! access path can run on a workstation.

mod gpio;
mod peripherals;

pub use gpio::{MockGpio, MockGpioHandle};
pub use peripherals::{MockCamera, MockDisplay};
