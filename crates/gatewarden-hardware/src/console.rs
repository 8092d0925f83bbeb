//! Backends for running without a display or camera attached.

use crate::error::Result;
use crate::traits::{CameraBackend, DisplayBackend};
use std::time::Duration;
use tracing::info;

/// Writes display text to the log instead of a screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDisplay;

impl DisplayBackend for ConsoleDisplay {
    fn show(&self, text: &str, clear_after: Option<Duration>) -> Result<()> {
        match clear_after {
            Some(ttl) => info!(text, ttl_ms = ttl.as_millis() as u64, "display"),
            None => info!(text, "display"),
        }
        Ok(())
    }
}

/// Camera that never captures anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCamera;

impl CameraBackend for NullCamera {
    fn capture_still(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}
