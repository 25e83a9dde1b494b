//! Configuration for the case verifier
//!
//! Layered from, lowest precedence first:
//! - Default values
//! - `verifier.toml`, `.verifier.toml` or `config/verifier.toml`
//! - `verifier.toml` in the user config directory
//! - An explicit file
//! - Environment variables (`VERIFIER__STORE__PATH=...`)
//!
//! ## Example config file (verifier.toml):
//! ```toml
//! [store]
//! path = "./cases"
//! author = "Reviewer A"
//!
//! [holidays]
//! extra_dates = ["2031-01-23", "2031-01-24", "2031-01-25"]
//!
//! [output]
//! format = "pretty"
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::holidays::HolidayCalendar;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub holidays: HolidaysConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where case documents live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Recorded as `updated_by` when saving from the command line
    #[serde(default)]
    pub author: Option<String>,
}

/// Gazetted holidays beyond the built-in calendar
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidaysConfig {
    #[serde(default)]
    pub extra_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn render(&self, value: &serde_json::Value) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("cases")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            author: None,
        }
    }
}

impl VerifierConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["verifier.toml", ".verifier.toml", "config/verifier.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("hk", "judgements", "verifier") {
            let user_config = dirs.config_dir().join("verifier.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("VERIFIER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        tracing::debug!(store = %loaded.store.path.display(), "configuration loaded");
        Ok(loaded)
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Store directory, relative paths resolved against the working directory
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.store.path)
        }
    }

    /// The built-in calendar extended with configured dates
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        HolidayCalendar::new().with_extra_dates(self.holidays.extra_dates.iter().copied())
    }
}
