//! Row-strobed matrix scanning.
//!
//! Keypads wired without per-line pull-downs are scanned by driving one row
//! at a time and reading the columns. [`StrobedMatrixSource`] folds each
//! scan into the same row/column line states a directly wired keypad would
//! report, so the decoder does not care which wiring is in use.

use crate::layout::KeypadLayout;
use gatewarden_core::constants::{KEYPAD_COLS, KEYPAD_ROWS};
use gatewarden_core::{ActiveLevel, LineNumber, LogicalPin, PinState};
use gatewarden_hardware::error::Result;
use gatewarden_hardware::{GpioBackend, PinStateSource, Sample};
use std::sync::Arc;

/// Scans the matrix by strobing rows.
#[derive(Debug)]
pub struct StrobedMatrixSource {
    backend: Arc<dyn GpioBackend>,
    layout: KeypadLayout,
}

impl StrobedMatrixSource {
    /// Rows become outputs (idle deasserted), columns become inputs.
    pub fn new(
        backend: Arc<dyn GpioBackend>,
        layout: KeypadLayout,
        active: ActiveLevel,
    ) -> Result<Self> {
        for &row in layout.rows() {
            backend.setup(LogicalPin::output(row), active)?;
            backend.write(row, false)?;
        }
        for &col in layout.cols() {
            backend.setup(LogicalPin::input(col), active)?;
        }
        Ok(Self { backend, layout })
    }

    /// Drive one row and read every column. The row is released before
    /// returning, even when a read fails.
    fn scan_row(&self, row: LineNumber) -> Result<[bool; KEYPAD_COLS]> {
        self.backend.write(row, true)?;
        let mut hits = [false; KEYPAD_COLS];
        let mut first_err = None;
        for (c, &col) in self.layout.cols().iter().enumerate() {
            match self.backend.read(col) {
                Ok(level) => hits[c] = level,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        self.backend.write(row, false)?;
        match first_err {
            Some(e) => Err(e),
            None => Ok(hits),
        }
    }
}

impl PinStateSource for StrobedMatrixSource {
    /// A row whose strobe or column reads fail is left out, and so are all
    /// column lines, since their state for this cycle is incomplete.
    fn sample(&mut self) -> Sample {
        let mut sample = Sample::default();
        let mut col_hits = [false; KEYPAD_COLS];
        let mut cols_complete = true;

        for r in 0..KEYPAD_ROWS {
            let row = self.layout.rows()[r];
            match self.scan_row(row) {
                Ok(hits) => {
                    let pressed = hits.iter().any(|&h| h);
                    sample.states.insert(row, PinState::from_level(pressed));
                    for (acc, hit) in col_hits.iter_mut().zip(hits) {
                        *acc |= hit;
                    }
                }
                Err(e) => {
                    cols_complete = false;
                    sample.failures.push(e);
                }
            }
        }

        if cols_complete {
            for (c, &col) in self.layout.cols().iter().enumerate() {
                sample.states.insert(col, PinState::from_level(col_hits[c]));
            }
        }
        sample
    }
}
