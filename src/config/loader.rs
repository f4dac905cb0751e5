// src/config/loader.rs
//! Layered configuration loader
//!
//! Sources are merged in order: built-in defaults, each TOML file that
//! exists, then `HWIO_*` environment variables (`HWIO_ADC__RETRY_TICKS=200`).

use crate::config::HardwareConfig;
use crate::error::{HwError, HwResult};
use ::config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_PREFIX: &str = "HWIO";

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Loader reading the standard locations plus the environment
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            use_environment: true,
        }
    }

    /// Loader with custom paths; missing files are skipped
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            use_environment: true,
        }
    }

    /// Disable `HWIO_*` overrides
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Merge all sources and validate the result
    pub fn load(&self) -> HwResult<HardwareConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&HardwareConfig::default())?);

        for path in &self.config_paths {
            debug!(path = %path.display(), "adding configuration source");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if self.use_environment {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: HardwareConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> HwResult<HardwareConfig> {
        let config: HardwareConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a single TOML file, without other sources
    pub fn from_file<P: AsRef<Path>>(path: P) -> HwResult<HardwareConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HwError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&content)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/etc/hwio/hardware.toml"),
            PathBuf::from("hardware.toml"),
        ]
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
