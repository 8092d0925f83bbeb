//! Mock GPIO backend for testing and development.
//!
//! [`MockGpio`] keeps a shared line table that a [`MockGpioHandle`] can
//! script: set input levels, press matrix keys, inject read or write
//! failures and inspect every write the code under test made.

use crate::error::{HardwareError, Result};
use crate::traits::GpioBackend;
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin, PinDirection};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    configured: HashMap<LineNumber, (LogicalPin, ActiveLevel)>,
    levels: HashMap<LineNumber, bool>,
    /// (row, column) pairs held down; a column reads asserted while its row is driven.
    pressed: HashSet<(LineNumber, LineNumber)>,
    failing_reads: HashSet<LineNumber>,
    failing_writes: HashSet<LineNumber>,
    writes: Vec<(LineNumber, bool)>,
    reads: usize,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // A panicking test thread must not hide the table from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock GPIO chip.
///
/// # Examples
///
/// ```
/// use gatewarden_core::{ActiveLevel, LogicalPin};
/// use gatewarden_hardware::mock::MockGpio;
/// use gatewarden_hardware::traits::GpioBackend;
///
/// let (gpio, handle) = MockGpio::new();
/// gpio.setup(LogicalPin::input(4), ActiveLevel::High).unwrap();
/// handle.set_level(4, true);
/// assert!(gpio.read(4).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MockGpio {
    state: Arc<Mutex<MockState>>,
}

impl MockGpio {
    /// Create a mock chip and the handle that scripts it.
    pub fn new() -> (Self, MockGpioHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let gpio = Self {
            state: Arc::clone(&state),
        };
        (gpio, MockGpioHandle { state })
    }
}

impl GpioBackend for MockGpio {
    fn setup(&self, pin: LogicalPin, active: ActiveLevel) -> Result<()> {
        let mut state = lock(&self.state);
        state.configured.insert(pin.line, (pin, active));
        if pin.direction == PinDirection::Output {
            state.levels.entry(pin.line).or_insert(false);
        }
        Ok(())
    }

    fn read(&self, line: LineNumber) -> Result<bool> {
        let mut state = lock(&self.state);
        if !state.configured.contains_key(&line) {
            return Err(HardwareError::unknown_line(line));
        }
        if state.failing_reads.contains(&line) {
            return Err(HardwareError::sample_failed(line, "injected read failure"));
        }
        state.reads += 1;

        let level = state.levels.get(&line).copied().unwrap_or(false);
        let strobed = state
            .pressed
            .iter()
            .any(|&(row, col)| col == line && state.levels.get(&row).copied().unwrap_or(false));
        Ok(level || strobed)
    }

    fn write(&self, line: LineNumber, asserted: bool) -> Result<()> {
        let mut state = lock(&self.state);
        match state.configured.get(&line) {
            Some((pin, _)) if pin.direction == PinDirection::Output => {}
            Some(_) => {
                return Err(HardwareError::drive_failed(line, "line is configured as input"));
            }
            None => return Err(HardwareError::unknown_line(line)),
        }
        if state.failing_writes.contains(&line) {
            return Err(HardwareError::drive_failed(line, "injected write failure"));
        }
        state.levels.insert(line, asserted);
        state.writes.push((line, asserted));
        Ok(())
    }
}

/// Scripting handle for a [`MockGpio`].
#[derive(Debug, Clone)]
pub struct MockGpioHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockGpioHandle {
    /// Set the logical level of a line.
    pub fn set_level(&self, line: LineNumber, asserted: bool) {
        lock(&self.state).levels.insert(line, asserted);
    }

    /// Current logical level of a line, if it was ever set or written.
    pub fn level(&self, line: LineNumber) -> Option<bool> {
        lock(&self.state).levels.get(&line).copied()
    }

    /// Hold a matrix key down for strobed scanning.
    pub fn press(&self, row: LineNumber, col: LineNumber) {
        lock(&self.state).pressed.insert((row, col));
    }

    /// Release a matrix key.
    pub fn release(&self, row: LineNumber, col: LineNumber) {
        lock(&self.state).pressed.remove(&(row, col));
    }

    /// Make every read of `line` fail until [`MockGpioHandle::restore`].
    pub fn fail_reads(&self, line: LineNumber) {
        lock(&self.state).failing_reads.insert(line);
    }

    /// Make every write to `line` fail until [`MockGpioHandle::restore`].
    pub fn fail_writes(&self, line: LineNumber) {
        lock(&self.state).failing_writes.insert(line);
    }

    /// Clear injected failures for `line`.
    pub fn restore(&self, line: LineNumber) {
        let mut state = lock(&self.state);
        state.failing_reads.remove(&line);
        state.failing_writes.remove(&line);
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(LineNumber, bool)> {
        lock(&self.state).writes.clone()
    }

    /// Successful writes to one line, in order.
    pub fn writes_to(&self, line: LineNumber) -> Vec<bool> {
        lock(&self.state)
            .writes
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Number of successful reads so far.
    pub fn read_count(&self) -> usize {
        lock(&self.state).reads
    }

    /// How a line was configured, if at all.
    pub fn configured(&self, line: LineNumber) -> Option<LogicalPin> {
        lock(&self.state).configured.get(&line).map(|(pin, _)| *pin)
    }

    /// Active level a line was configured with.
    pub fn active_level(&self, line: LineNumber) -> Option<ActiveLevel> {
        lock(&self.state).configured.get(&line).map(|(_, active)| *active)
    }
}
