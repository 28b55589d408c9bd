//! Core types for the dispatcher — requests, results, jobs, and the error taxonomy.
//!
//! Requests and results cross the boundary to the hosting web service as JSON,
//! so they serialize with **camelCase** keys. Everything else is plain Rust.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

/// What the caller wants produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    #[default]
    Image,
    Video,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Image => "image",
            GenerationKind::Video => "video",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized generation request, validated upstream by the web layer.
///
/// Immutable for the duration of one dispatch call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Logical model key (e.g. `"nano-banana-pro"`), not the provider's wire id.
    pub model: String,
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Video length in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<f64>,
    /// Reference / input image URLs.
    pub image_urls: Vec<String>,
    /// Last-frame image (video only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_image_url: Option<String>,
    /// Storyboard frame sequence (video only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storyboard: Vec<String>,
}

impl GenerationRequest {
    /// Create a text-only image request.
    pub fn image(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Image,
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Create a text-only video request.
    pub fn video(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Video,
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_images<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// External generative-media vendors the dispatcher can talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// KIE.ai task API (createTask / Veo), asynchronous.
    Kie,
    /// Google Generative Language API, synchronous.
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Kie, Provider::Gemini];

    /// Config / env name (e.g. `"kie"`).
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Kie => "kie",
            Provider::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Kie => "KIE.ai",
            Provider::Gemini => "Google Gemini",
        }
    }

    /// Default API base when config does not override it.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::Kie => "https://api.kie.ai",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────
// Result
// ─────────────────────────────────────────────

/// Successful outcome of one dispatch call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub artifact_url: String,
    pub provider: Provider,
    /// Provider wire model id actually submitted.
    pub model_id: String,
    /// Registry key actually used (differs from the request after a default fallback).
    pub model_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Requested video duration in seconds (video only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Failure taxonomy. Callers branch on this alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Bad user input, caught before any network call.
    Validation,
    /// Credential missing, malformed, or refused.
    Authentication,
    /// Submission refused by the provider (quota, invalid payload, ...).
    ProviderRejected,
    /// Provider reported a terminal failure while polling.
    ProviderFailed,
    /// No terminal state within the wait budget. The job may still finish server-side.
    Timeout,
    /// The caller cancelled the dispatch.
    Cancelled,
    /// Success-shaped payload without a recognizable artifact.
    MalformedResponse,
    /// Network or body-parse failure.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::ProviderRejected => "providerRejected",
            ErrorKind::ProviderFailed => "providerFailed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::MalformedResponse => "malformedResponse",
            ErrorKind::Transport => "transport",
        }
    }

    /// Whether a caller may safely resubmit the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure returned by the dispatcher.
///
/// Provider text is forwarded verbatim in `provider_message`; it is often the
/// only actionable diagnostic ("image required", "unsupported resolution").
#[derive(Clone, Debug, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message: Option<String>,
    /// Raw provider payload, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_code: None,
            provider_message: None,
            raw: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn with_provider_message(mut self, message: impl Into<String>) -> Self {
        self.provider_message = Some(message.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

// ─────────────────────────────────────────────
// Job
// ─────────────────────────────────────────────

/// Lifecycle of one submitted job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Submitted,
    Waiting,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut | JobState::Cancelled
        )
    }
}

/// Per-dispatch job record. Owned by the dispatch call and dropped when it returns.
#[derive(Clone, Debug)]
pub struct Job {
    pub provider: Provider,
    pub model_id: String,
    pub payload: serde_json::Value,
    pub task_id: Option<String>,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    started: Instant,
    /// Status requests issued so far.
    pub polls: u32,
    /// Last raw provider response, for diagnostics only.
    pub last_response: Option<serde_json::Value>,
}

impl Job {
    pub fn new(provider: Provider, model_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            payload,
            task_id: None,
            state: JobState::Submitted,
            submitted_at: Utc::now(),
            started: Instant::now(),
            polls: 0,
            last_response: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move to `next`. Terminal states are sticky.
    pub fn transition(&mut self, next: JobState) {
        if !self.state.is_terminal() {
            self.state = next;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
