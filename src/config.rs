//! Configuration for the viewer and exporters
//!
//! Settings are read from an optional JSON file; every field has a default.

use crate::data::RecordGrouping;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Mean Earth radius (IUGG) in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Static chart image settings
    #[serde(default)]
    pub chart: ChartConfig,

    /// NMEA log grouping
    #[serde(default)]
    pub nmea: NmeaConfig,

    /// Radius used for metric deltas
    #[serde(default = "default_earth_radius")]
    pub earth_radius_m: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chart: ChartConfig::default(),
            nmea: NmeaConfig::default(),
            earth_radius_m: EARTH_RADIUS_M,
        }
    }
}

/// PNG size of rendered charts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    #[default]
    Delimited,
    Fixed,
}

/// How NMEA lines are grouped into records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NmeaConfig {
    #[serde(default)]
    pub grouping: GroupingMode,

    /// Lines per record in fixed mode
    #[serde(default = "default_packet_length")]
    pub packet_length: usize,

    /// Keep GSV sentences in fixed mode
    #[serde(default = "default_true")]
    pub include_gsv: bool,
}

impl Default for NmeaConfig {
    fn default() -> Self {
        Self {
            grouping: GroupingMode::default(),
            packet_length: default_packet_length(),
            include_gsv: true,
        }
    }
}

impl NmeaConfig {
    pub fn record_grouping(&self) -> RecordGrouping {
        match self.grouping {
            GroupingMode::Delimited => RecordGrouping::Delimited,
            GroupingMode::Fixed => RecordGrouping::FixedLength {
                lines: self.packet_length,
                include_gsv: self.include_gsv,
            },
        }
    }
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    400
}

fn default_packet_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_earth_radius() -> f64 {
    EARTH_RADIUS_M
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Config file when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
