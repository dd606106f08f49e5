//! # configs
//!
//! Layered settings for the story viewer: built-in defaults, then an optional
//! TOML file, then `STORIES__*` environment variables (a `.env` file is read
//! first if present). `STORIES__SESSION__STORY_DURATION_MS=8000` overrides
//! `session.story_duration_ms`.

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/stories.toml";
const ENV_PREFIX: &str = "STORIES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub viewer: ViewerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub story_duration_ms: u64,
    /// How often the host timer reports progress.
    pub tick_interval_ms: u64,
    pub swipe_threshold: f32,
    pub hold_on_activate: bool,
}

impl SessionConfig {
    pub fn story_duration(&self) -> Duration {
        Duration::from_millis(self.story_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    pub read_latency_ms: u64,
    pub list_latency_ms: u64,
    pub write_latency_ms: u64,
    pub seed_fixtures: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewerConfig {
    /// The user the viewer acts as.
    pub viewer_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Settings {
    /// Loads from [`DEFAULT_CONFIG_PATH`] (if it exists) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some(Path::new(DEFAULT_CONFIG_PATH)))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "loaded .env");
        }

        let mut builder = defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        Self::finish(builder)
    }

    /// Defaults overlaid with an in-memory TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let builder = defaults()?.add_source(File::from_str(raw, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.story_duration_ms == 0 {
            return Err(invalid("session.story_duration_ms", "must be greater than zero"));
        }
        if self.session.tick_interval_ms == 0 {
            return Err(invalid("session.tick_interval_ms", "must be greater than zero"));
        }
        if !self.session.swipe_threshold.is_finite() || self.session.swipe_threshold < 0.0 {
            return Err(invalid("session.swipe_threshold", "must be a non-negative number"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("session.story_duration_ms", 5000_i64)?
        .set_default("session.tick_interval_ms", 16_i64)?
        .set_default("session.swipe_threshold", 50.0_f64)?
        .set_default("session.hold_on_activate", false)?
        .set_default("store.read_latency_ms", 200_i64)?
        .set_default("store.list_latency_ms", 300_i64)?
        .set_default("store.write_latency_ms", 400_i64)?
        .set_default("store.seed_fixtures", true)?
        .set_default("viewer.viewer_id", 1_i64)?
        .set_default("log.format", "pretty")?
        .set_default("log.filter", "info")?)
}
