//! Application-level configuration loading: turn length, scoring and static assets.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCRIBBLE_BACK_CONFIG_PATH";

const DEFAULT_TURN_DURATION_SECS: u64 = 60;
const DEFAULT_CORRECT_GUESS_POINTS: u32 = 100;
const DEFAULT_CHAT_HISTORY_LIMIT: usize = 200;
const DEFAULT_STATIC_DIR: &str = "build";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    turn_duration: Duration,
    correct_guess_points: u32,
    chat_history_limit: usize,
    static_dir: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        turn_secs = app_config.turn_duration.as_secs(),
                        "loaded game settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing keys take their default value.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Length of a drawing turn once the word is chosen.
    pub fn turn_duration(&self) -> Duration {
        self.turn_duration
    }

    /// Points credited for a correct guess.
    pub fn correct_guess_points(&self) -> u32 {
        self.correct_guess_points
    }

    /// Number of chat/guess entries kept in memory.
    pub fn chat_history_limit(&self) -> usize {
        self.chat_history_limit
    }

    /// Directory holding the web client build.
    pub fn static_dir(&self) -> &PathBuf {
        &self.static_dir
    }

    /// Override the turn length.
    pub fn with_turn_duration(mut self, turn_duration: Duration) -> Self {
        self.turn_duration = turn_duration;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    turn_duration_secs: u64,
    correct_guess_points: u32,
    chat_history_limit: usize,
    static_dir: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            turn_duration_secs: DEFAULT_TURN_DURATION_SECS,
            correct_guess_points: DEFAULT_CORRECT_GUESS_POINTS,
            chat_history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
            static_dir: DEFAULT_STATIC_DIR.into(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            // Turns last at least one second.
            turn_duration: Duration::from_secs(value.turn_duration_secs.max(1)),
            correct_guess_points: value.correct_guess_points,
            chat_history_limit: value.chat_history_limit,
            static_dir: PathBuf::from(value.static_dir),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_rules() {
        let config = AppConfig::default();
        assert_eq!(config.turn_duration(), Duration::from_secs(60));
        assert_eq!(config.correct_guess_points(), 100);
        assert_eq!(config.chat_history_limit(), 200);
        assert_eq!(config.static_dir(), &PathBuf::from("build"));
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = AppConfig::from_json_str(r#"{"turn_duration_secs": 90}"#).unwrap();
        assert_eq!(config.turn_duration(), Duration::from_secs(90));
        assert_eq!(config.correct_guess_points(), 100);
    }

    #[test]
    fn zero_turn_duration_is_clamped() {
        let config = AppConfig::from_json_str(r#"{"turn_duration_secs": 0}"#).unwrap();
        assert_eq!(config.turn_duration(), Duration::from_secs(1));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json_str(r#"{"correct_guess_points": "lots"}"#).is_err());
    }
}
