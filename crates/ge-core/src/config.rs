//! Configuration
//!
//! Settings are stored as TOML under the platform config directory
//! (`<config_dir>/gekko-eval/config.toml`). Every section has defaults so a
//! partial or missing file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Guest MEM1 size on retail GameCube hardware (24 MB)
pub const DEFAULT_RAM_SIZE: u32 = 0x0180_0000;

/// How often the call worker checks for a pending request
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Worker poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum instructions per call, 0 for no limit
    pub instruction_limit: u64,
    /// Trace every executed instruction word
    pub trace_instructions: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            instruction_limit: 0,
            trace_instructions: false,
        }
    }
}

/// Guest memory settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Size of the guest RAM window in bytes
    pub ram_size: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_SIZE,
        }
    }
}

/// Debug and logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_to_file: false,
            log_path: PathBuf::from("gekko-eval.log"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interpreter: InterpreterConfig,
    pub memory: MemoryConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Default location of the config file, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gekko-eval").join("config.toml"))
    }

    /// Load from the default location
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Write to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Write to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }
}
