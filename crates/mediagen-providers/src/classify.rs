//! Error classifier — the only place `GenerationError`s are built from
//! provider outcomes.
//!
//! Submitter, poller, and normalizer all route through here so callers can
//! branch on `ErrorKind` alone. Provider text is always forwarded verbatim.

use std::fmt::Display;
use std::time::Duration;

use serde_json::Value;

use mediagen_core::types::{ErrorKind, GenerationError};

use crate::traits::{HttpReply, ReplyBody};
use crate::wire::Envelope;

/// Network or body-read failure.
pub fn transport(context: &str, err: &dyn Display) -> GenerationError {
    GenerationError::new(ErrorKind::Transport, format!("{context}: {err}"))
}

/// Map a non-2xx HTTP reply.
///
/// 401/403 → `authentication`; everything else → `providerRejected`.
pub fn http_status(reply: &HttpReply) -> GenerationError {
    let kind = match reply.status {
        401 | 403 => ErrorKind::Authentication,
        _ => ErrorKind::ProviderRejected,
    };
    let detail = reply_message(&reply.body);
    let mut err = GenerationError::new(kind, format!("provider returned HTTP {}", reply.status))
        .with_provider_code(reply.status.to_string());
    if let Some(detail) = detail {
        err = err.with_provider_message(detail);
    }
    if let ReplyBody::Json(raw) = &reply.body {
        err = err.with_raw(raw.clone());
    }
    err
}

/// Accept a reply as JSON, or classify why it can't be used.
pub fn json_reply(reply: HttpReply) -> Result<Value, GenerationError> {
    if !reply.is_success() {
        return Err(http_status(&reply));
    }
    match reply.body {
        ReplyBody::Json(v) => Ok(v),
        ReplyBody::Text(text) => Err(GenerationError::new(
            ErrorKind::Transport,
            "provider returned a non-JSON body",
        )
        .with_provider_message(text)),
    }
}

/// Map a `{code, msg}` envelope. `None` when the envelope reports success.
pub fn envelope(env: &Envelope, raw: &Value) -> Option<GenerationError> {
    if env.is_ok() {
        return None;
    }
    let code = env.code.unwrap_or_default();
    let kind = match code {
        401 | 403 => ErrorKind::Authentication,
        _ => ErrorKind::ProviderRejected,
    };
    let mut err = GenerationError::new(kind, format!("provider rejected the request (code {code})"))
        .with_provider_code(code.to_string())
        .with_raw(raw.clone());
    if let Some(msg) = &env.msg {
        err = err.with_provider_message(msg.clone());
    }
    Some(err)
}

/// Terminal provider-reported failure while polling.
pub fn poll_failure(
    code: Option<String>,
    message: Option<String>,
    raw: &Value,
) -> GenerationError {
    let mut err = GenerationError::new(ErrorKind::ProviderFailed, "provider reported generation failure")
        .with_raw(raw.clone());
    err.provider_code = code;
    err.provider_message = message;
    err
}

/// Status checks kept being refused by the provider.
pub fn repeated_status_errors(count: u32, last: GenerationError) -> GenerationError {
    GenerationError {
        kind: ErrorKind::ProviderFailed,
        message: format!("status check refused {count} times in a row: {}", last.message),
        ..last
    }
}

pub fn timeout(elapsed: Duration, max_wait: Duration, task_id: Option<&str>) -> GenerationError {
    GenerationError::new(
        ErrorKind::Timeout,
        format!(
            "no terminal state after {:.1}s (limit {}s, task {})",
            elapsed.as_secs_f64(),
            max_wait.as_secs(),
            task_id.unwrap_or("-")
        ),
    )
}

pub fn cancelled(task_id: Option<&str>) -> GenerationError {
    GenerationError::new(
        ErrorKind::Cancelled,
        format!("dispatch cancelled (task {})", task_id.unwrap_or("-")),
    )
}

/// Success-shaped payload without what we need.
pub fn malformed(what: &str, raw: &Value) -> GenerationError {
    GenerationError::new(ErrorKind::MalformedResponse, what).with_raw(raw.clone())
}

pub fn missing_credential(provider: &str) -> GenerationError {
    GenerationError::new(
        ErrorKind::Authentication,
        format!("no API key supplied for provider '{provider}'"),
    )
}

/// Best-effort provider message from an error body.
fn reply_message(body: &ReplyBody) -> Option<String> {
    match body {
        ReplyBody::Text(t) => Some(t.trim().to_string()).filter(|t| !t.is_empty()),
        ReplyBody::Json(v) => v
            .get("msg")
            .or_else(|| v.get("message"))
            .or_else(|| v.pointer("/error/message"))
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(String::from),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
