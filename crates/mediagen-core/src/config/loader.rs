//! Config loader — reads `~/.mediagen/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.mediagen/config.json`
//! 3. Environment variables `MEDIAGEN_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};
use crate::types::Provider;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `MEDIAGEN_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `MEDIAGEN_DISPATCHER__POLL_INTERVAL_SECS`
/// - `MEDIAGEN_DISPATCHER__MAX_WAIT_SECS`
/// - `MEDIAGEN_DISPATCHER__REQUEST_TIMEOUT_SECS`
/// - `MEDIAGEN_DISPATCHER__MAX_STATUS_ERRORS`
/// - `MEDIAGEN_DISPATCHER__DEFAULT_IMAGE_MODEL`
/// - `MEDIAGEN_DISPATCHER__DEFAULT_VIDEO_MODEL`
/// - `MEDIAGEN_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `MEDIAGEN_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
fn apply_env_overrides(mut config: Config) -> Config {
    let d = &mut config.dispatcher;
    if let Some(n) = env_parse::<u64>("MEDIAGEN_DISPATCHER__POLL_INTERVAL_SECS") {
        d.poll_interval_secs = n;
    }
    if let Some(n) = env_parse::<u64>("MEDIAGEN_DISPATCHER__MAX_WAIT_SECS") {
        d.max_wait_secs = n;
    }
    if let Some(n) = env_parse::<u64>("MEDIAGEN_DISPATCHER__REQUEST_TIMEOUT_SECS") {
        d.request_timeout_secs = n;
    }
    if let Some(n) = env_parse::<u32>("MEDIAGEN_DISPATCHER__MAX_STATUS_ERRORS") {
        d.max_status_errors = n;
    }
    if let Ok(val) = std::env::var("MEDIAGEN_DISPATCHER__DEFAULT_IMAGE_MODEL") {
        d.default_image_model = val;
    }
    if let Ok(val) = std::env::var("MEDIAGEN_DISPATCHER__DEFAULT_VIDEO_MODEL") {
        d.default_video_model = val;
    }

    for provider in Provider::ALL {
        apply_provider_env(config.providers.get_mut(provider), provider);
    }

    config
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let val = std::env::var(key).ok()?;
    match val.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %val, "ignoring unparsable env override");
            None
        }
    }
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, which: Provider) {
    let name = which.name().to_uppercase();
    if let Ok(val) = std::env::var(format!("MEDIAGEN_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("MEDIAGEN_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
