//! `reqwest`-backed [`JobTransport`].
//!
//! Holds one connection-pooled client that every dispatch shares. No
//! credentials are stored here; each request carries its own [`Auth`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, error};

use mediagen_core::types::GenerationError;

use crate::classify;
use crate::traits::{Auth, HttpReply, JobTransport, ReplyBody};

// ─────────────────────────────────────────────
// HttpTransport
// ─────────────────────────────────────────────

/// Talks to provider APIs over HTTPS.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| classify::transport("building HTTP client", &e))?;
        Ok(Self { client })
    }

    fn authorize(request: RequestBuilder, auth: Auth<'_>) -> RequestBuilder {
        match auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::Header { name, key } => request.header(name, key),
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<HttpReply, GenerationError> {
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!(url, error = %e, "HTTP request failed");
                return Err(classify::transport("sending request", &e));
            }
        };

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| classify::transport("reading response body", &e))?;

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(json) => ReplyBody::Json(json),
            Err(_) => ReplyBody::Text(text),
        };

        debug!(url, status, json = matches!(body, ReplyBody::Json(_)), "HTTP response received");
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        body: &Value,
    ) -> Result<HttpReply, GenerationError> {
        let request = Self::authorize(self.client.post(url), auth).json(body);
        self.send(request, url).await
    }

    async fn get_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        query: &[(&str, &str)],
    ) -> Result<HttpReply, GenerationError> {
        let request = Self::authorize(self.client.get(url), auth).query(query);
        self.send(request, url).await
    }

    fn display_name(&self) -> &str {
        "reqwest"
    }
}

/// Join an API base and an endpoint path, tolerating a trailing slash on the base.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mediagen_core::types::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_display_name() {
        assert_eq!(transport().display_name(), "reqwest");
    }

    #[test]
    fn test_join_url_trailing_slash() {
        assert_eq!(
            join_url("https://api.kie.ai/", "/api/v1/jobs/createTask"),
            "https://api.kie.ai/api/v1/jobs/createTask"
        );
        assert_eq!(
            join_url("https://api.kie.ai", "api/v1/jobs/createTask"),
            "https://api.kie.ai/api/v1/jobs/createTask"
        );
    }

    #[tokio::test]
    async fn test_post_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/jobs/createTask"))
            .and(header("Authorization", "Bearer kie-key"))
            .and(body_partial_json(json!({ "model": "nano-banana-pro" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 200 })))
            .mount(&server)
            .await;

        let url = join_url(&server.uri(), "/api/v1/jobs/createTask");
        let reply = transport()
            .post_json(&url, Auth::Bearer("kie-key"), &json!({ "model": "nano-banana-pro" }))
            .await
            .unwrap();

        assert_eq!(reply, HttpReply::json(200, json!({ "code": 200 })));
    }

    #[tokio::test]
    async fn test_get_sends_header_auth_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .and(header("x-goog-api-key", "g-key"))
            .and(query_param("taskId", "t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let url = join_url(&server.uri(), "/status");
        let auth = Auth::Header {
            name: "x-goog-api-key",
            key: "g-key",
        };
        let reply = transport().get_json(&url, auth, &[("taskId", "t-1")]).await.unwrap();
        assert!(reply.is_success());
    }

    #[tokio::test]
    async fn test_error_status_is_a_reply_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let reply = transport()
            .post_json(&server.uri(), Auth::Bearer("k"), &json!({}))
            .await
            .unwrap();
        assert_eq!(reply, HttpReply::text(502, "bad gateway"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let err = transport()
            .post_json("http://127.0.0.1:1/x", Auth::Bearer("k"), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert!(err.is_retryable());
    }
}
