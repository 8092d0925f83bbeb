//! Linux GPIO character device backend.
//!
//! Each configured line is requested individually with the consumer name set
//! to the crate name, so `gpioinfo` shows who holds it.

use crate::error::{HardwareError, Result};
use crate::traits::GpioBackend;
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin, PinDirection};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;
use tracing::debug;

impl From<ActiveLevel> for gpiod::Active {
    fn from(level: ActiveLevel) -> Self {
        match level {
            ActiveLevel::High => gpiod::Active::High,
            ActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

#[derive(Default)]
struct Lines {
    inputs: HashMap<LineNumber, gpiod::Lines<gpiod::Input>>,
    outputs: HashMap<LineNumber, gpiod::Lines<gpiod::Output>>,
}

/// GPIO backend on top of a `/dev/gpiochipN` device.
pub struct GpiodBackend {
    chip: gpiod::Chip,
    name: String,
    lines: Mutex<Lines>,
}

impl GpiodBackend {
    /// Open a chip by name (`gpiochip0`) or path (`/dev/gpiochip0`).
    pub fn open(chip: &str) -> Result<Self> {
        let chip = gpiod::Chip::new(chip)
            .map_err(|e| HardwareError::initialization_failed(format!("{chip}: {e}")))?;
        let name = chip.name().to_string();
        debug!(chip = %name, lines = chip.num_lines(), "opened GPIO chip");
        Ok(Self {
            chip,
            name,
            lines: Mutex::new(Lines::default()),
        })
    }

    fn lines(&self) -> Result<std::sync::MutexGuard<'_, Lines>> {
        self.lines
            .lock()
            .map_err(|_| HardwareError::other("GPIO line table poisoned"))
    }
}

impl Debug for GpiodBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodBackend({})", self.name)
    }
}

impl GpioBackend for GpiodBackend {
    fn setup(&self, pin: LogicalPin, active: ActiveLevel) -> Result<()> {
        if pin.line >= self.chip.num_lines() {
            return Err(HardwareError::unknown_line(pin.line));
        }
        let mut lines = self.lines()?;
        match pin.direction {
            PinDirection::Input => {
                let requested = self.chip.request_lines(
                    gpiod::Options::input([pin.line])
                        .consumer(env!("CARGO_PKG_NAME"))
                        .active(active.into()),
                )?;
                lines.inputs.insert(pin.line, requested);
            }
            PinDirection::Output => {
                let requested = self.chip.request_lines(
                    gpiod::Options::output([pin.line])
                        .consumer(env!("CARGO_PKG_NAME"))
                        .active(active.into())
                        .values([false]),
                )?;
                lines.outputs.insert(pin.line, requested);
            }
        }
        debug!(%pin, ?active, "configured line");
        Ok(())
    }

    fn read(&self, line: LineNumber) -> Result<bool> {
        let lines = self.lines()?;
        let input = lines
            .inputs
            .get(&line)
            .ok_or(HardwareError::unknown_line(line))?;
        let values = input
            .get_values([false])
            .map_err(|e| HardwareError::sample_failed(line, e.to_string()))?;
        Ok(values[0])
    }

    fn write(&self, line: LineNumber, asserted: bool) -> Result<()> {
        let lines = self.lines()?;
        let output = lines
            .outputs
            .get(&line)
            .ok_or(HardwareError::unknown_line(line))?;
        output
            .set_values([asserted])
            .map_err(|e| HardwareError::drive_failed(line, e.to_string()))
    }
}
