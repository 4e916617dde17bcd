//! Runtime configuration.
//!
//! # Responsibility
//! - Describe unit/display preferences the presentation layer formats with.
//! - Describe logging bootstrap options.
//!
//! # Invariants
//! - Every field has a default, so partial JSON documents load.
//! - Preferences are read-only to the core; persisting them is the host's job.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kilograms,
    Pounds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    #[default]
    Liters,
    CubicFeet,
}

/// Unit system per quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub length: LengthUnit,
    pub temperature: TemperatureUnit,
    pub weight: WeightUnit,
    pub volume: VolumeUnit,
}

impl Units {
    pub fn imperial() -> Self {
        Self {
            length: LengthUnit::Feet,
            temperature: TemperatureUnit::Fahrenheit,
            weight: WeightUnit::Pounds,
            volume: VolumeUnit::CubicFeet,
        }
    }
}

/// Display preferences for the dive list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    pub units: Units,
    /// Append unit suffixes to table cells.
    pub show_units_table: bool,
}

/// Errors from loading configuration documents.
#[derive(Debug)]
pub enum ConfigError {
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid display preferences: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl DisplayPrefs {
    /// Parses preferences from JSON; missing fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Logging bootstrap options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
}

impl LoggingConfig {
    /// Config at the build-mode default level.
    pub fn with_dir(log_dir: impl Into<String>) -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: log_dir.into(),
        }
    }
}
