//! Configuration schema.
//!
//! Hierarchy: `Config` → `DispatcherConfig`, `ProvidersConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Provider;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.mediagen/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub providers: ProvidersConfig,
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Polling and fallback defaults. Poll timing can be overridden per call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherConfig {
    /// Fixed delay between status checks.
    pub poll_interval_secs: u64,
    /// Total wait budget before a job is reported as timed out.
    pub max_wait_secs: u64,
    /// Per-HTTP-request timeout.
    pub request_timeout_secs: u64,
    /// Consecutive provider-reported status-check errors tolerated before giving up.
    pub max_status_errors: u32,
    /// Substituted for unknown image model keys.
    pub default_image_model: String,
    /// Substituted for unknown video model keys.
    pub default_video_model: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            max_wait_secs: 120,
            request_timeout_secs: 60,
            max_status_errors: 3,
            default_image_model: "nano-banana-pro".to_string(),
            default_video_model: "kling-2-6".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Credential and endpoint override for one provider.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key, handed to the dispatcher per call.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// Keys must never reach logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &if self.is_configured() { "<redacted>" } else { "" })
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub kie: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Kie => &self.kie,
            Provider::Gemini => &self.gemini,
        }
    }

    pub fn get_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Kie => &mut self.kie,
            Provider::Gemini => &mut self.gemini,
        }
    }

    /// Effective API base: config override, else the provider default.
    pub fn api_base(&self, provider: Provider) -> String {
        self.get(provider)
            .api_base
            .clone()
            .unwrap_or_else(|| provider.default_api_base().to_string())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
