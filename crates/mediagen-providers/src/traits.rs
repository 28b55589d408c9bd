//! Transport trait — the seam between the dispatcher and the network.
//!
//! The production implementation is [`crate::http_transport::HttpTransport`].
//! Tests substitute stubs to script provider replies and count calls.

use async_trait::async_trait;
use serde_json::Value;

use mediagen_core::types::{GenerationError, Provider};

/// How a credential is presented to a provider.
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <key>`.
    Bearer(&'a str),
    /// Key sent in a named header (e.g. `x-goog-api-key`).
    Header { name: &'static str, key: &'a str },
}

impl<'a> Auth<'a> {
    /// The scheme a provider expects.
    pub fn for_provider(provider: Provider, key: &'a str) -> Self {
        match provider {
            Provider::Kie => Auth::Bearer(key),
            Provider::Gemini => Auth::Header {
                name: "x-goog-api-key",
                key,
            },
        }
    }
}

// Never print the key.
impl std::fmt::Debug for Auth<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Auth::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
        }
    }
}

/// Body of an HTTP reply.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyBody {
    Json(Value),
    /// Body that did not parse as JSON, kept verbatim.
    Text(String),
}

/// A completed HTTP exchange. Any status code lands here; only I/O failures are errors.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl HttpReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(body),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(body.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Authenticated JSON transport used by the submitter and the poller.
///
/// Errors are `GenerationError`s of kind `transport` (connection refused,
/// timeouts, unreadable bodies). HTTP error statuses are returned as replies
/// so the classifier can read the provider's own message.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// `POST url` with a JSON body.
    async fn post_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        body: &Value,
    ) -> Result<HttpReply, GenerationError>;

    /// `GET url?query`.
    async fn get_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        query: &[(&str, &str)],
    ) -> Result<HttpReply, GenerationError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
