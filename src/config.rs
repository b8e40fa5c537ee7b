//! Application-level configuration loading: throttle window, fallback hole
//! target, and history query cap.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLAYTRACK_PACE_CONFIG_PATH";

/// Minimum interval between forwarded position samples for a flight.
const DEFAULT_THROTTLE_WINDOW_SECONDS: u64 = 10;
/// Fallback target used when the pace configuration has no entry for a hole
/// or cannot be loaded at all.
const DEFAULT_TARGET_MINUTES: u32 = 14;
/// Upper bound on documents fetched by a history range query.
const DEFAULT_HISTORY_DOC_CAP: usize = 200;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    throttle_window: Duration,
    default_target_minutes: u32,
    history_doc_cap: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        throttle_window_secs = config.throttle_window.as_secs(),
                        default_target_minutes = config.default_target_minutes,
                        "loaded pace configuration"
                    );
                    config
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

    /// Minimum interval between forwarded position samples per flight.
    pub fn throttle_window(&self) -> Duration {
        self.throttle_window
    }

    /// Throttle window in milliseconds, matching device timestamps.
    pub fn throttle_window_ms(&self) -> i64 {
        self.throttle_window.as_millis() as i64
    }

    /// Fallback per-hole target in minutes.
    pub fn default_target_minutes(&self) -> u32 {
        self.default_target_minutes
    }

    /// Document cap applied to history range queries.
    pub fn history_doc_cap(&self) -> usize {
        self.history_doc_cap
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_secs(DEFAULT_THROTTLE_WINDOW_SECONDS),
            default_target_minutes: DEFAULT_TARGET_MINUTES,
            history_doc_cap: DEFAULT_HISTORY_DOC_CAP,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    throttle_window_seconds: Option<u64>,
    default_target_minutes: Option<u32>,
    history_doc_cap: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            throttle_window: value
                .throttle_window_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.throttle_window),
            default_target_minutes: value
                .default_target_minutes
                .unwrap_or(defaults.default_target_minutes),
            history_doc_cap: value.history_doc_cap.unwrap_or(defaults.history_doc_cap),
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
    fn defaults_match_observed_policy() {
        let config = AppConfig::default();
        assert_eq!(config.throttle_window_ms(), 10_000);
        assert_eq!(config.default_target_minutes(), 14);
        assert_eq!(config.history_doc_cap(), 200);
    }

    #[test]
    fn partial_raw_config_keeps_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "throttle_window_seconds": 5 }"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.throttle_window(), Duration::from_secs(5));
        assert_eq!(config.default_target_minutes(), 14);
    }
}
