//! Configuration file support for usbenum.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (USBENUM_*)
//! 3. Explicit `--config` file (replaces 4 and 5)
//! 4. Local config file (./usbenum.toml)
//! 5. Global config file (~/.config/usbenum/config.toml)
//!
//! Files that cannot be read or parsed are reported as warnings and skipped.

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "usbenum.toml";

/// Enumeration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumerationConfig {
    /// Bound on a single registry query, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Also list serial ports that are not behind USB.
    #[serde(default)]
    pub include_non_usb: bool,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit JSON by default.
    #[serde(default)]
    pub json: bool,
    /// Show USB metadata by default.
    #[serde(default)]
    pub long: bool,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Enumeration configuration.
    #[serde(default)]
    pub enumeration: EnumerationConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the global and local files.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .map_err(|e| warn!("Failed to parse config file {}: {}", path.display(), e))
                .ok(),
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "usbenum").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one; set values in `other` win.
    fn merge(&mut self, other: Self) {
        if other.enumeration.timeout_ms.is_some() {
            self.enumeration.timeout_ms = other.enumeration.timeout_ms;
        }
        if other.enumeration.include_non_usb {
            self.enumeration.include_non_usb = true;
        }

        if other.output.json {
            self.output.json = true;
        }
        if other.output.long {
            self.output.long = true;
        }
    }
}
