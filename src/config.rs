//! Application Configuration
//! Dashboard settings loaded from an optional JSON file, plus logging setup.

use crate::charts::HexBinner;
use crate::data::DEFAULT_NROWS;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Dataset read when no path is configured.
pub const DEFAULT_DATA_PATH: &str = "Motor_Vehicle_Collisions.zip";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for the hexagon density layer and its initial camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensitySettings {
    /// Hexagon radius in metres.
    pub radius_m: f64,
    pub elevation_scale: f64,
    /// Height of the densest hexagon before scaling.
    pub elevation_max: f64,
    pub zoom: f64,
    pub pitch: f64,
}

impl Default for DensitySettings {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            elevation_scale: 4.0,
            elevation_max: 1000.0,
            zoom: 11.0,
            pitch: 50.0,
        }
    }
}

impl DensitySettings {
    pub fn binner(&self, reference_latitude: f64) -> HexBinner {
        HexBinner::new(
            self.radius_m,
            self.elevation_scale,
            self.elevation_max,
            reference_latitude,
        )
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub nrows: usize,
    pub log_level: String,
    pub density: DensitySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            nrows: DEFAULT_NROWS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            density: DensitySettings::default(),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nrows == 0 {
            bail!("nrows must be positive");
        }
        if self.density.radius_m.is_nan() || self.density.radius_m <= 0.0 {
            bail!("density.radius_m must be positive, got {}", self.density.radius_m);
        }
        Ok(())
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {level}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}
