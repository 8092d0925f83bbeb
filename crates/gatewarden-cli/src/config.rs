//! JSON configuration for the gate controller.
//!
//! ```json
//! {
//!   "site_name": "Oak Hollow",
//!   "db_file": "/var/lib/gatewarden/gate.db",
//!   "logs_dir": "/var/lib/gatewarden/logs",
//!   "keypad": { "chip": "gpiochip0", "rows": [5, 6, 13, 19], "cols": [17, 27, 22] },
//!   "gate": { "pin": 26, "pulse_ms": 1000 }
//! }
//! ```
//!
//! Every field is optional.

use anyhow::{Context, Result};
use gatewarden_core::constants::{
    DEFAULT_MESSAGE_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PULSE_MS, DEFAULT_QUEUE_DEPTH,
    DEFAULT_RETENTION_DAYS, KEYPAD_COLS, KEYPAD_ROWS,
};
use gatewarden_core::{ActiveLevel, Error, LineNumber};
use gatewarden_gate::GateSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "GATEWARDEN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_name: String,
    pub db_file: String,
    pub logs_dir: String,
    pub keypad: KeypadConfig,
    pub gate: GateConfig,
    pub display: DisplayConfig,
    pub retention_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_name: "Gatewarden".to_string(),
            db_file: "gatewarden.db".to_string(),
            logs_dir: "logs".to_string(),
            keypad: KeypadConfig::default(),
            gate: GateConfig::default(),
            display: DisplayConfig::default(),
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadConfig {
    pub chip: String,
    pub rows: [LineNumber; KEYPAD_ROWS],
    pub cols: [LineNumber; KEYPAD_COLS],
    pub active_low: bool,
    /// Drive one row at a time and read the columns.
    pub strobe: bool,
    pub poll_interval_ms: u64,
    pub queue_depth: usize,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            chip: "gpiochip0".to_string(),
            rows: [5, 6, 13, 19],
            cols: [17, 27, 22],
            active_low: false,
            strobe: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl KeypadConfig {
    pub fn active_level(&self) -> ActiveLevel {
        if self.active_low {
            ActiveLevel::Low
        } else {
            ActiveLevel::High
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Output line; 0 leaves the gate unconfigured.
    pub pin: LineNumber,
    pub invert_drive: bool,
    pub pulse_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pin: 0,
            invert_drive: false,
            pulse_ms: DEFAULT_PULSE_MS,
        }
    }
}

impl From<&GateConfig> for GateSettings {
    fn from(gate: &GateConfig) -> Self {
        GateSettings {
            line: gate.pin,
            invert_drive: gate.invert_drive,
            pulse: Duration::from_millis(gate.pulse_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub message_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            message_secs: DEFAULT_MESSAGE_SECS,
        }
    }
}

impl DisplayConfig {
    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_secs)
    }
}

/// First CLI argument, then `GATEWARDEN_CONFIG` (from the environment or
/// `.env`), then `config.json`.
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| dotenv::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
        .into()
}

impl Config {
    /// Read and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: Config = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            info!(path = %path.display(), "configuration loaded");
            config
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> gatewarden_core::Result<()> {
        let mut seen = HashSet::new();
        for line in self.keypad.rows.iter().chain(&self.keypad.cols) {
            if !seen.insert(*line) {
                return Err(Error::Config(format!("keypad line {line} is listed twice")));
            }
        }
        if self.gate.pin != 0 && seen.contains(&self.gate.pin) {
            return Err(Error::Config(format!(
                "gate pin {} is also a keypad line",
                self.gate.pin
            )));
        }
        if self.gate.pulse_ms == 0 {
            return Err(Error::Config("gate.pulse_ms must be greater than zero".into()));
        }
        if self.keypad.poll_interval_ms == 0 {
            return Err(Error::Config(
                "keypad.poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.keypad.queue_depth == 0 {
            return Err(Error::Config("keypad.queue_depth must be greater than zero".into()));
        }
        Ok(())
    }
}
