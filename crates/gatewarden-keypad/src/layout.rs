//! Physical wiring of the 4x3 keypad matrix.

use crate::error::{KeypadError, Result};
use gatewarden_core::constants::{KEYPAD_COLS, KEYPAD_ROWS};
use gatewarden_core::{Digit, KeyEvent, LineNumber};
use std::collections::HashSet;

/// Key printed at each row/column crossing.
pub const KEY_TABLE: [[KeyEvent; KEYPAD_COLS]; KEYPAD_ROWS] = [
    [digit(1), digit(2), digit(3)],
    [digit(4), digit(5), digit(6)],
    [digit(7), digit(8), digit(9)],
    [KeyEvent::Clear, digit(0), KeyEvent::Enter],
];

// Only evaluated while building `KEY_TABLE`.
const fn digit(d: u8) -> KeyEvent {
    match Digit::new(d) {
        Some(d) => KeyEvent::Digit(d),
        None => panic!("keypad digit out of range"),
    }
}

/// Whether a line is a row or a column, and its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRole {
    Row(usize),
    Col(usize),
}

/// GPIO lines wired to the keypad rows and columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadLayout {
    rows: [LineNumber; KEYPAD_ROWS],
    cols: [LineNumber; KEYPAD_COLS],
}

impl KeypadLayout {
    /// Build a layout. Every line must be distinct.
    pub fn new(rows: [LineNumber; KEYPAD_ROWS], cols: [LineNumber; KEYPAD_COLS]) -> Result<Self> {
        let mut seen = HashSet::new();
        for line in rows.iter().chain(cols.iter()) {
            if !seen.insert(*line) {
                return Err(KeypadError::invalid_layout(format!(
                    "line {line} is used more than once"
                )));
            }
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> &[LineNumber; KEYPAD_ROWS] {
        &self.rows
    }

    pub fn cols(&self) -> &[LineNumber; KEYPAD_COLS] {
        &self.cols
    }

    /// All seven lines, rows first.
    pub fn lines(&self) -> impl Iterator<Item = LineNumber> + '_ {
        self.rows.iter().chain(self.cols.iter()).copied()
    }

    pub fn role(&self, line: LineNumber) -> Option<LineRole> {
        if let Some(i) = self.rows.iter().position(|&l| l == line) {
            return Some(LineRole::Row(i));
        }
        self.cols
            .iter()
            .position(|&l| l == line)
            .map(LineRole::Col)
    }

    /// Key at a row and column index.
    pub fn key_at(&self, row: usize, col: usize) -> Option<KeyEvent> {
        KEY_TABLE.get(row)?.get(col).copied()
    }

    /// Row and column lines that carry `key`.
    pub fn lines_for(&self, key: KeyEvent) -> Option<(LineNumber, LineNumber)> {
        KEY_TABLE.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|k| *k == key)
                .map(|c| (self.rows[r], self.cols[c]))
        })
    }
}
