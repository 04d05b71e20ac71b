//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DJ_BINGO_BACK_CONFIG_PATH";

const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_MAX_PARTICIPANTS: usize = 200;
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    poll_interval_ms: u64,
    max_participants_per_game: usize,
    sse_capacity: usize,
}

impl AppConfig {
    /// Read the JSON file at `DJ_BINGO_BACK_CONFIG_PATH` (or [`DEFAULT_CONFIG_PATH`]).
    ///
    /// An absent, unreadable or malformed file yields the defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file; using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read config; using defaults");
                return Self::default();
            }
        };

        Self::from_json(&contents)
            .inspect(|config| {
                info!(
                    path = %path.display(),
                    poll_interval_ms = config.poll_interval_ms,
                    max_participants = config.max_participants_per_game,
                    sse_capacity = config.sse_capacity,
                    "configuration loaded"
                );
            })
            .unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "invalid config; using defaults");
                Self::default()
            })
    }

    /// Parse a JSON document. Missing fields take their default value.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Interval clients should use when polling game state.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Upper bound on participants registered in a single game.
    pub fn max_participants_per_game(&self) -> usize {
        self.max_participants_per_game
    }

    /// Buffer size of the admin event stream.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Override the participant limit.
    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants_per_game = max;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_participants_per_game: DEFAULT_MAX_PARTICIPANTS,
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    poll_interval_ms: u64,
    max_participants_per_game: usize,
    sse_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            poll_interval_ms: defaults.poll_interval_ms,
            max_participants_per_game: defaults.max_participants_per_game,
            sse_capacity: defaults.sse_capacity,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            poll_interval_ms: value.poll_interval_ms.max(1),
            max_participants_per_game: value.max_participants_per_game,
            sse_capacity: value.sse_capacity.max(1),
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
    fn partial_documents_keep_defaults() {
        let config = AppConfig::from_json(r#"{ "poll_interval_ms": 1500 }"#).unwrap();
        assert_eq!(config.poll_interval_ms(), 1500);
        assert_eq!(config.max_participants_per_game(), DEFAULT_MAX_PARTICIPANTS);
        assert_eq!(config.sse_capacity(), DEFAULT_SSE_CAPACITY);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let config = AppConfig::from_json(r#"{ "sse_capacity": 0, "poll_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.sse_capacity(), 1);
        assert_eq!(config.poll_interval_ms(), 1);
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(AppConfig::from_json("{ not json").is_err());
        assert!(AppConfig::from_json(r#"{ "sse_capacity": "many" }"#).is_err());
    }
}
