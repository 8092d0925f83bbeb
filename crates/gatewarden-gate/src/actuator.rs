//! Gate trigger output.
//!
//! The gate controller opens on a pulse: the output is asserted for a fixed
//! time, then released. Only one pulse runs at a time. A trigger that arrives
//! while a pulse is running is folded into it and returns success at once,
//! so a web click and a keypad entry landing together open the gate once.

use crate::error::{ActuationError, Result};
use gatewarden_core::constants::DEFAULT_PULSE_MS;
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin};
use gatewarden_hardware::GpioBackend;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Output line settings for the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSettings {
    /// Output line. `0` means no gate is wired.
    pub line: LineNumber,
    /// Drive the line low to open.
    pub invert_drive: bool,
    pub pulse: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            line: 0,
            invert_drive: false,
            pulse: Duration::from_millis(DEFAULT_PULSE_MS),
        }
    }
}

/// Releases the output if a pulse is abandoned mid-flight.
struct DriveGuard<'a> {
    backend: &'a dyn GpioBackend,
    line: LineNumber,
    armed: bool,
}

impl DriveGuard<'_> {
    fn release(mut self) -> gatewarden_hardware::Result<()> {
        self.armed = false;
        self.backend.write(self.line, false)
    }
}

impl Drop for DriveGuard<'_> {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = self.backend.write(self.line, false)
        {
            error!(line = self.line, error = %e, "failed to release gate output after cancelled pulse");
        }
    }
}

/// Drives the gate trigger line.
#[derive(Debug)]
pub struct GateActuator {
    backend: Arc<dyn GpioBackend>,
    line: Option<LineNumber>,
    pulse: Duration,
    in_flight: Mutex<()>,
    pulses: AtomicU64,
}

impl GateActuator {
    /// Claim the output line and force it released.
    ///
    /// A settings line of `0` builds an actuator whose triggers fail with
    /// [`ActuationError::NotConfigured`].
    pub fn new(backend: Arc<dyn GpioBackend>, settings: GateSettings) -> Result<Self> {
        let line = if settings.line == 0 {
            warn!("no gate output configured");
            None
        } else {
            let active = if settings.invert_drive {
                ActiveLevel::Low
            } else {
                ActiveLevel::High
            };
            backend
                .setup(LogicalPin::output(settings.line), active)
                .map_err(ActuationError::Setup)?;
            backend
                .write(settings.line, false)
                .map_err(ActuationError::Setup)?;
            info!(line = settings.line, invert = settings.invert_drive, "gate output ready");
            Some(settings.line)
        };

        Ok(Self {
            backend,
            line,
            pulse: settings.pulse,
            in_flight: Mutex::new(()),
            pulses: AtomicU64::new(0),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.line.is_some()
    }

    pub fn pulse_duration(&self) -> Duration {
        self.pulse
    }

    /// Completed pulses since startup.
    pub fn pulse_count(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// True while a pulse is running.
    pub fn is_pulsing(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Pulse the gate open.
    ///
    /// Returns `Ok(())` without touching the line when a pulse is already
    /// running. On failure the output is released before returning. If the
    /// returned future is dropped mid-pulse the output is released as well.
    pub async fn trigger(&self) -> Result<()> {
        let line = self.line.ok_or(ActuationError::NotConfigured)?;

        let Ok(_pulse) = self.in_flight.try_lock() else {
            debug!(line, "gate pulse already in flight, coalescing trigger");
            return Ok(());
        };

        let guard = DriveGuard {
            backend: self.backend.as_ref(),
            line,
            armed: true,
        };

        if let Err(source) = self.backend.write(line, true) {
            let released = guard.release().is_ok();
            error!(line, error = %source, released, "gate assert failed");
            return Err(ActuationError::AssertFailed { source, released });
        }
        debug!(line, pulse_ms = self.pulse.as_millis() as u64, "gate output asserted");

        tokio::time::sleep(self.pulse).await;

        guard.release().map_err(|e| {
            error!(line, error = %e, "gate deassert failed");
            ActuationError::DeassertFailed(e)
        })?;

        let count = self.pulses.fetch_add(1, Ordering::Relaxed) + 1;
        info!(line, count, "gate pulsed");
        Ok(())
    }
}
