//! Direct-wired line sampling.

use crate::error::Result;
use crate::traits::{GpioBackend, PinStateSource, Sample};
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin};
use std::sync::Arc;

/// Samples a fixed list of input lines straight from a [`GpioBackend`].
///
/// Used for keypads where each row and column line is read independently.
#[derive(Debug)]
pub struct GpioLineSource {
    backend: Arc<dyn GpioBackend>,
    lines: Vec<LineNumber>,
}

impl GpioLineSource {
    /// Configure every line as an input and build the source.
    pub fn new(
        backend: Arc<dyn GpioBackend>,
        lines: impl IntoIterator<Item = LineNumber>,
        active: ActiveLevel,
    ) -> Result<Self> {
        let lines: Vec<LineNumber> = lines.into_iter().collect();
        for &line in &lines {
            backend.setup(LogicalPin::input(line), active)?;
        }
        Ok(Self { backend, lines })
    }
}

impl PinStateSource for GpioLineSource {
    fn sample(&mut self) -> Sample {
        let mut sample = Sample::default();
        for &line in &self.lines {
            sample.record(line, self.backend.read(line));
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGpio;
    use gatewarden_core::{PinDirection, PinState};

    #[test]
    fn test_setup_configures_inputs() {
        let (gpio, handle) = MockGpio::new();
        let _source = GpioLineSource::new(Arc::new(gpio), [5, 6], ActiveLevel::High).unwrap();

        assert_eq!(handle.configured(5).unwrap().direction, PinDirection::Input);
        assert!(handle.configured(6).is_some());
    }

    #[test]
    fn test_failed_line_is_omitted() {
        let (gpio, handle) = MockGpio::new();
        let mut source = GpioLineSource::new(Arc::new(gpio), [5, 6], ActiveLevel::High).unwrap();
        handle.set_level(5, true);
        handle.fail_reads(6);

        let sample = source.sample();
        assert_eq!(sample.states.get(&5), Some(&PinState::Asserted));
        assert!(!sample.states.contains_key(&6));
        assert_eq!(sample.failures.len(), 1);
    }
}
