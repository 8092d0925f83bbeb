//! Shared constants for the gate access engine.
//!
//! Timing defaults are expressed in milliseconds or seconds so they can be
//! lifted straight into configuration files as plain numbers.

// ============================================================================
// PIN Entry
// ============================================================================

/// Shortest PIN accepted on Enter.
pub const MIN_PIN_LENGTH: usize = 4;

/// Longest PIN the keypad buffer holds. One more digit clears the buffer.
pub const MAX_PIN_LENGTH: usize = 10;

/// Character used to mask each entered digit on the display.
pub const PIN_MASK_CHAR: char = '*';

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default GPIO poll period in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default gate pulse length in milliseconds.
pub const DEFAULT_PULSE_MS: u64 = 1000;

/// Default lifetime of transient display messages in seconds.
pub const DEFAULT_MESSAGE_SECS: u64 = 2;

/// Default capacity of the change-set queue between poller and keypad task.
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Default retention for pruning inactive codes, contacts and gate logs.
pub const DEFAULT_RETENTION_DAYS: u32 = 365;

// ============================================================================
// Keypad Matrix
// ============================================================================

/// Number of keypad rows.
pub const KEYPAD_ROWS: usize = 4;

/// Number of keypad columns.
pub const KEYPAD_COLS: usize = 3;

/// Number of asserted lines that identifies a single key press.
pub const KEY_PRESS_LINE_COUNT: usize = 2;
