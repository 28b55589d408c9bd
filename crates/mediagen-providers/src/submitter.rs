//! Job submitter — sends a built payload and interprets the submission reply.
//!
//! Synchronous providers answer with the result itself; asynchronous ones
//! answer with a KIE envelope carrying a task id that the poller follows.

use serde_json::Value;
use tracing::{debug, info};

use mediagen_core::types::GenerationError;

use crate::classify;
use crate::http_transport::join_url;
use crate::payload::BuiltPayload;
use crate::traits::{Auth, JobTransport};
use crate::wire::Envelope;

/// What the provider said after accepting a submission.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    /// The reply already holds the result (synchronous provider).
    Completed(Value),
    /// Accepted for background processing under `task_id`.
    Queued { task_id: String, raw: Value },
}

/// POST `payload` to its endpoint under `api_base`.
///
/// Errors: `transport` on network failure, `authentication` on 401/403,
/// `providerRejected` on other HTTP or envelope errors, `malformedResponse`
/// when an accepted async submission carries no task id.
pub async fn submit(
    transport: &dyn JobTransport,
    api_base: &str,
    payload: &BuiltPayload,
    credential: &str,
) -> Result<Submission, GenerationError> {
    let url = join_url(api_base, payload.endpoint);
    let auth = Auth::for_provider(payload.provider, credential);

    debug!(provider = %payload.provider, model_id = payload.model_id, url = %url, "submitting job");

    let reply = transport.post_json(&url, auth, &payload.body).await?;
    let body = classify::json_reply(reply)?;

    if payload.status_endpoint.is_none() {
        return Ok(Submission::Completed(body));
    }

    let envelope = Envelope::parse(&body);
    if let Some(err) = classify::envelope(&envelope, &body) {
        return Err(err);
    }

    match envelope.task_id() {
        Some(task_id) => {
            info!(provider = %payload.provider, model_id = payload.model_id, task_id = %task_id, "job accepted");
            Ok(Submission::Queued { task_id, raw: body })
        }
        None => Err(classify::malformed(
            "submission accepted but no task id was returned",
            &body,
        )),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
