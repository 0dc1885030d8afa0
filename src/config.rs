use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::data::stations::{default_locations, StationLocation, StationRegistry};

pub const APP_ID: &str = "airq-dashboard";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// ---------------------------------------------------------------------------
// config.toml shape
// ---------------------------------------------------------------------------

/// Dashboard configuration. Every key is optional; unknown keys are ignored.
///
/// ```toml
/// data_path = "dashboard/combined_data.csv"
/// default_start = "2013-03-01"
/// default_end = "2017-02-28"
///
/// [map]
/// center = [39.9, 116.4]
/// marker_scale = 10.0
///
/// [[stations]]
/// name = "Aotizhongxin"
/// lat = 39.982
/// lon = 116.417
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset opened at startup.
    pub data_path: Option<PathBuf>,
    pub default_start: NaiveDate,
    pub default_end: NaiveDate,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    pub map: MapSection,
    /// Replaces the built-in station list when present.
    pub stations: Vec<StationLocation>,
}

/// `[map]` config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapSection {
    /// `[lat, lon]` the map view is centred on.
    pub center: [f64; 2],
    pub marker_scale: f64,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            center: [39.9, 116.4],
            marker_scale: 10.0,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: Some(PathBuf::from("dashboard/combined_data.csv")),
            // Full span of the PRSA multi-site dataset.
            default_start: NaiveDate::from_ymd_opt(2013, 3, 1).unwrap_or_default(),
            default_end: NaiveDate::from_ymd_opt(2017, 2, 28).unwrap_or_default(),
            log_level: None,
            map: MapSection::default(),
            stations: default_locations(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("default_start {start} is after default_end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("station entry with empty name")]
    EmptyStationName,

    #[error("station '{0}' listed more than once")]
    DuplicateStation(String),

    #[error("station '{name}' has out-of-range coordinates ({lat}, {lon})")]
    CoordinateOutOfRange { name: String, lat: f64, lon: f64 },

    #[error("map.marker_scale must be positive, got {0}")]
    InvalidMarkerScale(f64),
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist. Without one, the platform config file is
    /// used when present, otherwise the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match platform_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            other => {
                log::debug!(
                    "No config file at {:?}, using defaults",
                    other.map(|p| p.display().to_string())
                );
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_start > self.default_end {
            return Err(ConfigError::InvalidRange {
                start: self.default_start,
                end: self.default_end,
            });
        }
        if !(self.map.marker_scale > 0.0) {
            return Err(ConfigError::InvalidMarkerScale(self.map.marker_scale));
        }

        let mut seen = BTreeSet::new();
        for loc in &self.stations {
            if loc.name.trim().is_empty() {
                return Err(ConfigError::EmptyStationName);
            }
            if !seen.insert(loc.name.as_str()) {
                return Err(ConfigError::DuplicateStation(loc.name.clone()));
            }
            if !(-90.0..=90.0).contains(&loc.lat) || !(-180.0..=180.0).contains(&loc.lon) {
                return Err(ConfigError::CoordinateOutOfRange {
                    name: loc.name.clone(),
                    lat: loc.lat,
                    lon: loc.lon,
                });
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> StationRegistry {
        StationRegistry::new(self.stations.clone())
    }
}

/// `<platform config dir>/config.toml`, e.g. `~/.config/airq-dashboard/config.toml`.
pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_ID).map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.registry().len(), 2);
    }

    #[test]
    fn stations_section_replaces_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            default_start = "2014-01-01"
            default_end = "2014-12-31"

            [[stations]]
            name = "Dongsi"
            lat = 39.929
            lon = 116.417
            "#,
        )
        .unwrap();
        let registry = config.registry();
        assert_eq!(registry.len(), 1);
        assert!(registry.find("Dongsi").is_some());
        assert!(registry.find("Changping").is_none());
        assert_eq!(config.map.marker_scale, 10.0);
    }

    #[test]
    fn inverted_default_range_is_rejected() {
        let err = DashboardConfig::from_toml_str(
            "default_start = \"2017-01-01\"\ndefault_end = \"2013-01-01\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { .. }));
    }

    #[test]
    fn duplicate_station_is_rejected() {
        let err = DashboardConfig::from_toml_str(
            r#"
            [[stations]]
            name = "Changping"
            lat = 40.2
            lon = 116.2

            [[stations]]
            name = "Changping"
            lat = 40.3
            lon = 116.3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStation(ref s) if s == "Changping"));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = DashboardConfig::from_toml_str(
            "[[stations]]\nname = \"Nowhere\"\nlat = 116.4\nlon = 39.9\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CoordinateOutOfRange { .. }));
    }

    #[test]
    fn non_positive_marker_scale_is_rejected() {
        let err = DashboardConfig::from_toml_str("[map]\nmarker_scale = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMarkerScale(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = DashboardConfig::from_toml_str("default_start = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
