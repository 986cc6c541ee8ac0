/// Application configuration
use crate::error::{CliError, Result};
use heyjack_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "heyjack.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Where the session is restored from and saved to
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Save the session when the player exits
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

/// Simulated backend tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Length reported for tracks without a known duration
    #[serde(default = "default_track_secs")]
    pub default_duration_secs: f64,

    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `heyjack.toml` in the
    /// working directory is read if present. Environment variables prefixed
    /// with `HEYJACK_` override the file, with `__` between nested keys
    /// (`HEYJACK_PLAYBACK__VOLUME=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("HEYJACK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        if !self.backend.default_duration_secs.is_finite() || self.backend.default_duration_secs <= 0.0 {
            return Err(CliError::Config(
                "backend.default_duration_secs must be a positive number".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_autosave() -> bool {
    true
}

fn default_track_secs() -> f64 {
    180.0
}

fn default_load_latency_ms() -> u64 {
    20
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: None,
            autosave: default_autosave(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            default_duration_secs: default_track_secs(),
            load_latency_ms: default_load_latency_ms(),
        }
    }
}
