//! Application configuration.
//!
//! Values come from a TOML file, then environment overrides. Every field has
//! a default, so a missing file is not an error.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::slot_utils::{generate, validate_grid_params};
use crate::schedule::SlotGrid;

pub const CONFIG_PATH_ENV: &str = "COURT_BOOKING_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "court-booking.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub venue: VenueConfig,
}

/// The only tunables of the slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_open_hour")]
    pub open_hour: u32,
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_dir")]
    pub dir: PathBuf,
}

/// Timestamps sent with an offset are converted to this venue's local time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl VenueConfig {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidUtcOffset(self.utc_offset_minutes))
    }
}

fn default_open_hour() -> u32 {
    8
}

fn default_close_hour() -> u32 {
    22
}

fn default_slot_minutes() -> u32 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_seed_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            open_hour: default_open_hour(),
            close_hour: default_close_hour(),
            slot_minutes: default_slot_minutes(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dir: default_seed_dir(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_grid_params(self.open_hour, self.close_hour, self.slot_minutes)
    }

    pub fn build_grid(&self) -> Result<SlotGrid, ConfigError> {
        generate(self.open_hour, self.close_hour, self.slot_minutes)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// File named by `COURT_BOOKING_CONFIG`, else `court-booking.toml` when it
    /// exists, else defaults; then environment overrides; then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        config.grid.validate()?;
        config.venue.offset()?;
        Ok(config)
    }

    /// Applies `OPEN_HOUR`, `CLOSE_HOUR`, `SLOT_MINUTES`, `HOST`, `PORT`,
    /// `SEED_DIR` and `UTC_OFFSET_MINUTES` as looked up by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = parsed(&lookup, "OPEN_HOUR")? {
            self.grid.open_hour = v;
        }
        if let Some(v) = parsed(&lookup, "CLOSE_HOUR")? {
            self.grid.close_hour = v;
        }
        if let Some(v) = parsed(&lookup, "SLOT_MINUTES")? {
            self.grid.slot_minutes = v;
        }
        if let Some(v) = parsed(&lookup, "PORT")? {
            self.server.port = v;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(dir) = lookup("SEED_DIR") {
            self.seed.dir = PathBuf::from(dir);
        }
        if let Some(v) = parsed(&lookup, "UTC_OFFSET_MINUTES")? {
            self.venue.utc_offset_minutes = v;
        }
        Ok(())
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        None => Ok(None),
    }
}
