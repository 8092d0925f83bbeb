//! Hardware abstraction for the gate controller.
//!
//! This crate owns everything that touches pins and peripherals:
//!
//! - [`traits::GpioBackend`]: raw line setup, read and write.
//! - [`traits::PinStateSource`]: snapshots of a fixed set of lines.
//! - [`poller::PinStatePoller`]: periodic sampling that turns snapshots into
//!   [`gatewarden_core::ChangeSet`]s on a bounded queue.
//! - [`traits::DisplayBackend`] and [`traits::CameraBackend`] for the
//!   keypad display and the gate camera.
//!
//! Backends are picked at startup. [`mock`] provides scriptable stand-ins for
//! tests and demos, [`console`] logs display text and skips the camera, and
//! the `hardware-gpiod` feature enables the Linux character device backend.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use gatewarden_core::ActiveLevel;
//! use gatewarden_hardware::mock::MockGpio;
//! use gatewarden_hardware::poller::PinStatePoller;
//! use gatewarden_hardware::source::GpioLineSource;
//!
//! let (gpio, handle) = MockGpio::new();
//! let source = GpioLineSource::new(Arc::new(gpio), [5, 6], ActiveLevel::High).unwrap();
//! let mut poller = PinStatePoller::new(source, Duration::from_millis(100)).unwrap();
//!
//! assert!(poller.poll_once().is_empty());
//! handle.set_level(5, true);
//! assert_eq!(poller.poll_once().len(), 1);
//! ```

pub mod console;
pub mod error;
#[cfg(feature = "hardware-gpiod")]
pub mod chardev;
pub mod mock;
pub mod poller;
pub mod source;
pub mod traits;

pub use console::{ConsoleDisplay, NullCamera};
pub use error::{HardwareError, Result};
#[cfg(feature = "hardware-gpiod")]
pub use chardev::GpiodBackend;
pub use poller::PinStatePoller;
pub use source::GpioLineSource;
pub use traits::{CameraBackend, DisplayBackend, GpioBackend, PinStateSource, Sample};
