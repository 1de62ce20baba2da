//! Application-level configuration loading: catalog upstream and picker tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_SHELF_BACK_CONFIG_PATH";

const DEFAULT_CATALOG_URL: &str = "http://localhost:8787";
const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_CATALOG_ATTEMPTS: u32 = 4;
const DEFAULT_CATALOG_RETRY_DELAY_MS: u64 = 2_000;
const DEFAULT_SPIN_DURATION_MS: u64 = 4_000;
const DEFAULT_SPIN_FRAMES: u32 = 24;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub picker: PickerConfig,
}

/// Settings for the third-party game catalog the metadata endpoints proxy.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Maximum number of search candidates returned to clients.
    pub search_limit: usize,
    /// Total attempts for a details request while the upstream reports "processing".
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

/// Timing of the game-night spin reveal.
#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub spin_duration: Duration,
    pub spin_frames: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        catalog = %app_config.catalog.base_url,
                        "loaded configuration"
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
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    catalog: RawCatalog,
    picker: RawPicker,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCatalog {
    base_url: String,
    search_limit: usize,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl Default for RawCatalog {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.into(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            max_attempts: DEFAULT_CATALOG_ATTEMPTS,
            retry_delay_ms: DEFAULT_CATALOG_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawPicker {
    spin_duration_ms: u64,
    spin_frames: u32,
}

impl Default for RawPicker {
    fn default() -> Self {
        Self {
            spin_duration_ms: DEFAULT_SPIN_DURATION_MS,
            spin_frames: DEFAULT_SPIN_FRAMES,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            catalog: CatalogConfig {
                base_url: value.catalog.base_url.trim_end_matches('/').to_owned(),
                search_limit: value.catalog.search_limit,
                // At least one request is always sent.
                max_attempts: value.catalog.max_attempts.max(1),
                retry_delay: Duration::from_millis(value.catalog.retry_delay_ms),
            },
            picker: PickerConfig {
                spin_duration: Duration::from_millis(value.picker.spin_duration_ms),
                spin_frames: value.picker.spin_frames.max(1),
            },
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
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"catalog": {"base_url": "https://catalog.example/"}}"#)
                .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.catalog.base_url, "https://catalog.example");
        assert_eq!(config.catalog.search_limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(config.catalog.max_attempts, DEFAULT_CATALOG_ATTEMPTS);
        assert_eq!(
            config.picker.spin_duration,
            Duration::from_millis(DEFAULT_SPIN_DURATION_MS)
        );
    }

    #[test]
    fn zero_attempts_still_sends_one_request() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"catalog": {"max_attempts": 0}, "picker": {"spin_frames": 0}}"#)
                .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.catalog.max_attempts, 1);
        assert_eq!(config.picker.spin_frames, 1);
    }
}
