//! Dispatcher — runs one generation request end to end.
//!
//! lookup (with default fallback) → validate + build payload → submit →
//! poll (async providers only) → normalize → [`GenerationResult`].
//!
//! A `Dispatcher` holds no credentials and no per-job state; it is cheap to
//! share behind an `Arc` and every `dispatch` call is independent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mediagen_core::config::Config;
use mediagen_core::types::{
    ErrorKind, GenerationError, GenerationRequest, GenerationResult, Job, JobState, Provider,
};

use crate::classify;
use crate::http_transport::HttpTransport;
use crate::normalize::extract_artifact_url;
use crate::payload::build_payload;
use crate::poller::{poll_until_done, PollConfig};
use crate::registry::{lookup_or_default, Resolved};
use crate::submitter::{submit, Submission};
use crate::traits::JobTransport;

/// Per-call knobs.
#[derive(Clone, Debug, Default)]
pub struct DispatchOptions {
    pub poll: PollConfig,
    /// Cancelling this token aborts submission or polling with `cancelled`.
    pub cancel: CancellationToken,
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

pub struct Dispatcher {
    transport: Arc<dyn JobTransport>,
    api_bases: HashMap<Provider, String>,
    default_image_model: String,
    default_video_model: String,
    poll: PollConfig,
}

impl Dispatcher {
    /// Build a dispatcher over an existing transport.
    pub fn new(transport: Arc<dyn JobTransport>, config: &Config) -> Self {
        let api_bases = Provider::ALL
            .iter()
            .map(|p| (*p, config.providers.api_base(*p)))
            .collect();
        Self {
            transport,
            api_bases,
            default_image_model: config.dispatcher.default_image_model.clone(),
            default_video_model: config.dispatcher.default_video_model.clone(),
            poll: PollConfig::from(&config.dispatcher),
        }
    }

    /// Build a dispatcher with the production HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let transport = HttpTransport::new(config.dispatcher.request_timeout())?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Override one provider's API base URL.
    pub fn with_api_base(mut self, provider: Provider, base: impl Into<String>) -> Self {
        self.api_bases.insert(provider, base.into());
        self
    }

    pub fn api_base(&self, provider: Provider) -> &str {
        self.api_bases
            .get(&provider)
            .map(String::as_str)
            .unwrap_or_else(|| provider.default_api_base())
    }

    /// Resolve the descriptor `request` will run against, applying the
    /// configured default on unknown keys.
    pub fn resolve(&self, request: &GenerationRequest) -> Resolved {
        lookup_or_default(
            &request.model,
            request.kind,
            &self.default_image_model,
            &self.default_video_model,
        )
    }

    /// Options carrying the configured poll settings and a fresh token.
    pub fn default_options(&self) -> DispatchOptions {
        DispatchOptions {
            poll: self.poll.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Run `request` to a single artifact URL or a typed failure.
    ///
    /// `credential` is the provider key for the model's provider; it is used
    /// for this call only.
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
        credential: &str,
        options: &DispatchOptions,
    ) -> Result<GenerationResult, GenerationError> {
        let outcome = self.run(request, credential, options).await;
        if let Err(e) = &outcome {
            match e.kind {
                ErrorKind::Validation | ErrorKind::Cancelled => {
                    info!(model = %request.model, kind = %e.kind, error = %e, "dispatch stopped")
                }
                _ => error!(
                    model = %request.model,
                    kind = %e.kind,
                    provider_message = ?e.provider_message,
                    error = %e,
                    "dispatch failed"
                ),
            }
        }
        outcome
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        credential: &str,
        options: &DispatchOptions,
    ) -> Result<GenerationResult, GenerationError> {
        let resolved = self.resolve(request);
        let descriptor = resolved.descriptor;
        let payload = build_payload(request, descriptor)?;

        if credential.trim().is_empty() {
            return Err(classify::missing_credential(descriptor.provider.name()));
        }
        if options.cancel.is_cancelled() {
            return Err(classify::cancelled(None));
        }

        let api_base = self.api_base(descriptor.provider);
        let mut job = Job::new(descriptor.provider, payload.model_id, payload.body.clone());

        info!(
            model = descriptor.key,
            provider = %descriptor.provider,
            model_id = payload.model_id,
            substituted = resolved.substituted,
            transport = self.transport.display_name(),
            "dispatching"
        );

        let submission = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => {
                job.transition(JobState::Cancelled);
                return Err(classify::cancelled(None));
            }
            submission = submit(self.transport.as_ref(), api_base, &payload, credential) => submission,
        };

        let success = match submission {
            Ok(Submission::Completed(body)) => {
                job.transition(JobState::Succeeded);
                body
            }
            Ok(Submission::Queued { task_id, raw }) => {
                job.task_id = Some(task_id);
                job.last_response = Some(raw);
                let status_endpoint = payload.status_endpoint.unwrap_or_default();
                poll_until_done(
                    self.transport.as_ref(),
                    api_base,
                    status_endpoint,
                    credential,
                    &mut job,
                    &options.poll,
                    &options.cancel,
                )
                .await?
            }
            Err(e) => {
                job.transition(JobState::Failed);
                return Err(e);
            }
        };

        let artifact_url = extract_artifact_url(&success)?;

        info!(
            model = descriptor.key,
            task_id = ?job.task_id,
            submitted_at = %job.submitted_at,
            polls = job.polls,
            elapsed_ms = job.elapsed().as_millis() as u64,
            "generation complete"
        );

        Ok(GenerationResult {
            artifact_url,
            provider: descriptor.provider,
            model_id: payload.model_id.to_string(),
            model_key: descriptor.key.to_string(),
            task_id: job.task_id,
            duration: payload.duration,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{queued, success, waiting, HangingTransport, MockTransport};
    use crate::traits::HttpReply;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_options() -> DispatchOptions {
        DispatchOptions {
            poll: PollConfig {
                interval: Duration::from_millis(10),
                max_wait: Duration::from_secs(5),
                max_status_errors: 3,
            },
            cancel: CancellationToken::new(),
        }
    }

    fn with_mock(mock: Arc<MockTransport>) -> Dispatcher {
        Dispatcher::new(mock, &Config::default())
    }

    #[tokio::test]
    async fn test_end_to_end_nano_banana_pro_wide() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/jobs/createTask"))
            .and(header("Authorization", "Bearer kie-key"))
            .and(body_partial_json(json!({
                "model": "nano-banana-pro",
                "input": { "aspect_ratio": "21:9" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(queued("t-1")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs/recordInfo"))
            .and(query_param("taskId", "t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(waiting()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs/recordInfo"))
            .and(query_param("taskId", "t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success("https://x/y.png")))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::from_config(&Config::default())
            .unwrap()
            .with_api_base(Provider::Kie, server.uri());
        let request =
            GenerationRequest::image("nano-banana-pro", "a lighthouse at dusk").with_aspect_ratio("21:9");

        let result = dispatcher
            .dispatch(&request, "kie-key", &fast_options())
            .await
            .unwrap();

        assert_eq!(result.artifact_url, "https://x/y.png");
        assert_eq!(result.provider, Provider::Kie);
        assert_eq!(result.model_key, "nano-banana-pro");
        assert_eq!(result.task_id.as_deref(), Some("t-1"));
        let gets = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "GET")
            .count();
        assert_eq!(gets, 2);
    }

    #[tokio::test]
    async fn test_requires_image_fails_before_network() {
        let mock = Arc::new(MockTransport::new());
        let dispatcher = with_mock(mock.clone());
        let request = GenerationRequest::video("kling-2-6-i2v", "a cat jumps");

        let err = dispatcher
            .dispatch(&request, "k", &fast_options())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(mock.post_calls(), 0);
        assert_eq!(mock.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let mock = Arc::new(MockTransport::new());
        let dispatcher = with_mock(mock.clone());
        let request = GenerationRequest::image("nano-banana-pro", "a fox");

        let err = dispatcher.dispatch(&request, " ", &fast_options()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(mock.post_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_key_falls_back_to_default() {
        let mock = Arc::new(
            MockTransport::new()
                .on_post(Ok(HttpReply::json(200, queued("t-1"))))
                .on_get(Ok(HttpReply::json(200, success("https://x/y.png")))),
        );
        let dispatcher = with_mock(mock.clone());
        let request = GenerationRequest::image("retired-model-v0", "a fox");

        let result = dispatcher.dispatch(&request, "k", &fast_options()).await.unwrap();

        assert_eq!(result.model_key, "nano-banana-pro");
        assert_eq!(mock.sent.lock().unwrap()[0]["model"], "nano-banana-pro");
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_polled() {
        let mock = Arc::new(MockTransport::new().on_post(Ok(HttpReply::json(
            200,
            json!({ "code": 402, "msg": "Credits insufficient" }),
        ))));
        let dispatcher = with_mock(mock.clone());
        let request = GenerationRequest::image("nano-banana-pro", "a fox");

        let err = dispatcher.dispatch(&request, "k", &fast_options()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ProviderRejected);
        assert_eq!(err.provider_message.as_deref(), Some("Credits insufficient"));
        assert_eq!(mock.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_video_result_carries_duration() {
        let mock = Arc::new(
            MockTransport::new()
                .on_post(Ok(HttpReply::json(200, queued("t-1"))))
                .on_get(Ok(HttpReply::json(200, success("https://x/clip.mp4")))),
        );
        let dispatcher = with_mock(mock);
        let mut request = GenerationRequest::video("kling-2-6", "waves at night");
        request.duration = Some(10);

        let result = dispatcher.dispatch(&request, "k", &fast_options()).await.unwrap();

        assert_eq!(result.artifact_url, "https://x/clip.mp4");
        assert_eq!(result.duration, Some(10));
    }

    #[tokio::test]
    async fn test_gemini_sync_path_skips_polling() {
        let mock = Arc::new(MockTransport::new().on_post(Ok(HttpReply::json(
            200,
            json!({ "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0" } }
            ] } }] }),
        ))));
        let dispatcher = with_mock(mock.clone());
        let request = GenerationRequest::image("gemini-2-5-flash-image", "a fox");

        let result = dispatcher.dispatch(&request, "g", &fast_options()).await.unwrap();

        assert_eq!(result.artifact_url, "data:image/png;base64,iVBORw0");
        assert_eq!(result.provider, Provider::Gemini);
        assert!(result.task_id.is_none());
        assert_eq!(mock.get_calls(), 0);
        assert!(mock.urls.lock().unwrap()[0].starts_with("https://generativelanguage.googleapis.com/"));
    }

    #[tokio::test]
    async fn test_cancelled_before_submit() {
        let mock = Arc::new(MockTransport::new());
        let dispatcher = with_mock(mock.clone());
        let options = fast_options();
        options.cancel.cancel();

        let err = dispatcher
            .dispatch(&GenerationRequest::image("nano-banana-pro", "a fox"), "k", &options)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(mock.post_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_inflight_submission() {
        let dispatcher = Dispatcher::new(Arc::new(HangingTransport), &Config::default());
        let options = fast_options();
        let trigger = options.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = dispatcher
            .dispatch(&GenerationRequest::image("nano-banana-pro", "a fox"), "k", &options)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_api_base_override() {
        let dispatcher = Dispatcher::new(Arc::new(MockTransport::new()), &Config::default())
            .with_api_base(Provider::Kie, "http://localhost:9999");
        assert_eq!(dispatcher.api_base(Provider::Kie), "http://localhost:9999");
        assert_eq!(dispatcher.api_base(Provider::Gemini), Provider::Gemini.default_api_base());
    }

    #[test]
    fn test_default_options_follow_config() {
        let mut config = Config::default();
        config.dispatcher.max_wait_secs = 30;
        let dispatcher = Dispatcher::new(Arc::new(MockTransport::new()), &config);
        assert_eq!(dispatcher.default_options().poll.max_wait, Duration::from_secs(30));
    }
}
