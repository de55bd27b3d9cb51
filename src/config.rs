// config.rs

use crate::error::{LogError, Result};
use crate::timebase::{MIDI_BAUD_RATE, RESOLUTION_RANGE};
use chrono::{DateTime, TimeZone};
use ::config::{Config, Environment, File};
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding settings, e.g. `MIDILOG_OUTPUT_DIR`
pub const ENV_PREFIX: &str = "MIDILOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Directory for generated output file names
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Ticks per second
    pub resolution: u32,
    pub log_level: String,
    /// Name under which the MIDI client registers
    pub client_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: "capture".to_string(),
            resolution: MIDI_BAUD_RATE,
            log_level: "info".to_string(),
            client_name: "midilogrs".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, a TOML file and `MIDILOG_*` environment
    /// variables, later sources overriding earlier ones.
    ///
    /// An explicitly given `config_file` must exist; the default file in the
    /// user's config directory is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("output_dir", defaults.output_dir.to_string_lossy().into_owned())?
            .set_default("file_prefix", defaults.file_prefix)?
            .set_default("resolution", i64::from(defaults.resolution))?
            .set_default("log_level", defaults.log_level)?
            .set_default("client_name", defaults.client_name)?;

        match config_file {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(path) = default_config_path() {
                    debug!("Looking for settings in {}", path.display());
                    builder = builder.add_source(File::from(path.as_path()).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !RESOLUTION_RANGE.contains(&self.resolution) {
            return Err(LogError::Config(format!(
                "resolution must be between {} and {} ticks per second, got {}",
                RESOLUTION_RANGE.start(),
                RESOLUTION_RANGE.end(),
                self.resolution
            )));
        }
        if self.file_prefix.is_empty() {
            return Err(LogError::Config("file_prefix must not be empty".to_string()));
        }
        if self.client_name.is_empty() {
            return Err(LogError::Config("client_name must not be empty".to_string()));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| LogError::Config(format!("unknown log level '{}'", self.log_level)))
    }

    /// File name for a capture started at `started`:
    /// `<output_dir>/<file_prefix>_<YYYY-MM-DD_HH-MM-SS>.mid`
    pub fn output_path<Tz>(&self, started: DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let timestamp = started.format("%Y-%m-%d_%H-%M-%S");
        self.output_dir.join(format!("{}_{}.mid", self.file_prefix, timestamp))
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("midilogrs")
            .join("config.toml"),
    )
}
