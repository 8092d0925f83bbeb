//! Mock display and camera.

use crate::error::{HardwareError, Result};
use crate::traits::{CameraBackend, DisplayBackend};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every message shown.
#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    shown: Arc<Mutex<Vec<(String, Option<Duration>)>>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything shown so far, oldest first.
    pub fn shown(&self) -> Vec<(String, Option<Duration>)> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }

    /// Texts only, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.shown().into_iter().map(|(text, _)| text).collect()
    }

    /// Most recent text.
    pub fn last(&self) -> Option<String> {
        self.texts().pop()
    }
}

impl DisplayBackend for MockDisplay {
    fn show(&self, text: &str, clear_after: Option<Duration>) -> Result<()> {
        self.shown
            .lock()
            .map_err(|_| HardwareError::other("display log poisoned"))?
            .push((text.to_string(), clear_after));
        Ok(())
    }
}

/// Camera returning a fixed image, or failing on demand.
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    image: Arc<Vec<u8>>,
    fail: Arc<AtomicBool>,
    captures: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image: Arc::new(image),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl CameraBackend for MockCamera {
    fn capture_still(&self) -> Result<Vec<u8>> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::capture_failed("injected capture failure"));
        }
        Ok(self.image.as_ref().clone())
    }
}
