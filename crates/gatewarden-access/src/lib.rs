//! Access decisions for the gate.
//!
//! [`AccessOrchestrator`] takes a PIN from the keypad or an authenticated
//! web actor, checks the code's validity window, pulses the gate, stores one
//! [`gatewarden_core::GateAccessEvent`] per attempt and hands notifications
//! to a [`Notifier`]. [`run_keypad`] is the task that feeds it from the
//! poller's change-set queue.
//!
//! Denials are uniform: an unknown code, a retired code and a
//! code outside its window all produce [`AccessError::UnknownOrExpiredCode`]
//! and the same `Invalid PIN` on the display.

pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod pipeline;
pub mod state;

pub use error::{AccessError, Result};
pub use notify::{Notifier, NotifyError, RecordingNotifier, SentNotification, TracingNotifier};
pub use orchestrator::{AccessOrchestrator, OrchestratorSettings};
pub use pipeline::run_keypad;
pub use state::{Attempt, AttemptState};
