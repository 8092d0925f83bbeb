use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// GPIO line offset on a chip.
pub type LineNumber = u32;

/// Direction a line has been configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

/// Output drive. Only push-pull is used by the gate circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    #[default]
    PushPull,
}

/// Electrical level that counts as asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveLevel {
    #[default]
    High,
    Low,
}

impl ActiveLevel {
    /// Convert a raw electrical level to its logical state.
    #[inline]
    #[must_use]
    pub fn logical(self, raw_high: bool) -> bool {
        match self {
            ActiveLevel::High => raw_high,
            ActiveLevel::Low => !raw_high,
        }
    }
}

/// A configured GPIO line.
///
/// Owned by whichever component configured it; nothing else drives or
/// reconfigures the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPin {
    pub line: LineNumber,
    pub direction: PinDirection,
    #[serde(default)]
    pub drive: DriveMode,
}

impl LogicalPin {
    #[must_use]
    pub fn input(line: LineNumber) -> Self {
        Self {
            line,
            direction: PinDirection::Input,
            drive: DriveMode::PushPull,
        }
    }

    #[must_use]
    pub fn output(line: LineNumber) -> Self {
        Self {
            line,
            direction: PinDirection::Output,
            drive: DriveMode::PushPull,
        }
    }
}

impl fmt::Display for LogicalPin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dir = match self.direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        write!(f, "line{}/{}", self.line, dir)
    }
}

/// Logical state of a sampled line.
///
/// `Unknown` only exists before the first successful sample and is never
/// treated as a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinState {
    #[default]
    Unknown,
    Asserted,
    Deasserted,
}

impl PinState {
    #[inline]
    #[must_use]
    pub fn from_level(asserted: bool) -> Self {
        if asserted {
            PinState::Asserted
        } else {
            PinState::Deasserted
        }
    }

    #[inline]
    #[must_use]
    pub fn is_asserted(self) -> bool {
        self == PinState::Asserted
    }

    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        self != PinState::Unknown
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinState::Unknown => write!(f, "unknown"),
            PinState::Asserted => write!(f, "asserted"),
            PinState::Deasserted => write!(f, "deasserted"),
        }
    }
}

/// Lines whose state differs from the previous poll, keyed by line number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(BTreeMap<LineNumber, PinState>);

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, line: LineNumber, state: PinState) {
        self.0.insert(line, state);
    }

    #[must_use]
    pub fn get(&self, line: LineNumber) -> Option<PinState> {
        self.0.get(&line).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LineNumber, PinState)> + '_ {
        self.0.iter().map(|(line, state)| (*line, *state))
    }

    /// Fold a newer change-set into this one. Later states win.
    pub fn merge(&mut self, newer: ChangeSet) {
        self.0.extend(newer.0);
    }
}

impl FromIterator<(LineNumber, PinState)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (LineNumber, PinState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ChangeSet {
    type Item = (LineNumber, PinState);
    type IntoIter = std::collections::btree_map::IntoIter<LineNumber, PinState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (line, state)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{line}: {state}")?;
        }
        write!(f, "}}")
    }
}

/// A keypad digit, always in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// `None` for anything above 9.
    #[must_use]
    pub const fn new(d: u8) -> Option<Self> {
        if d <= 9 { Some(Self(d)) } else { None }
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn to_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl TryFrom<u8> for Digit {
    type Error = Error;

    fn try_from(d: u8) -> Result<Self> {
        Digit::new(d).ok_or(Error::InvalidDigit(d))
    }
}

impl From<Digit> for u8 {
    fn from(d: Digit) -> Self {
        d.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded keypad key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEvent {
    Digit(Digit),
    Clear,
    Enter,
}

impl KeyEvent {
    /// Create a digit event, rejecting anything above 9.
    pub fn digit(d: u8) -> Result<Self> {
        Digit::try_from(d).map(KeyEvent::Digit)
    }

    /// Map a keypad label (`0`-`9`, `*`, `#`) to its event.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '*' => Ok(KeyEvent::Clear),
            '#' => Ok(KeyEvent::Enter),
            c => c
                .to_digit(10)
                .and_then(|d| Digit::new(d as u8))
                .map(KeyEvent::Digit)
                .ok_or_else(|| Error::InvalidPinFormat(format!("not a keypad key: {c:?}"))),
        }
    }

    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            KeyEvent::Digit(d) => d.to_char(),
            KeyEvent::Clear => '*',
            KeyEvent::Enter => '#',
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyEvent::Digit(d) => write!(f, "Digit({d})"),
            KeyEvent::Clear => write!(f, "Clear"),
            KeyEvent::Enter => write!(f, "Enter"),
        }
    }
}
