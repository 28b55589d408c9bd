//! Poller — drives an asynchronous job to a terminal state.
//!
//! Fixed-interval status checks against the provider's record endpoint,
//! bounded by a total wait budget and an external cancellation token.
//!
//! State handling per check:
//! - transport failures are transient and polling continues
//! - 401/403 ends the job with `authentication`
//! - other refusals (HTTP or envelope) are counted; after
//!   `max_status_errors` in a row the job ends with `providerFailed`
//! - `success` / `successFlag: 1` returns the task record
//! - `fail` / `successFlag: 2|3` ends with `providerFailed`, provider text kept

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mediagen_core::config::DispatcherConfig;
use mediagen_core::types::{ErrorKind, GenerationError, Job, JobState};

use crate::classify;
use crate::http_transport::join_url;
use crate::traits::{Auth, JobTransport};
use crate::wire::{task_status, Envelope, TaskStatus};

/// Floor for the delay between status checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polling knobs for one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct PollConfig {
    /// Delay between status checks.
    pub interval: Duration,
    /// Total budget, measured from the first status check.
    pub max_wait: Duration,
    /// Consecutive refused status checks tolerated.
    pub max_status_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(120),
            max_status_errors: 3,
        }
    }
}

impl From<&DispatcherConfig> for PollConfig {
    fn from(cfg: &DispatcherConfig) -> Self {
        Self {
            interval: cfg.poll_interval().max(Duration::from_secs(1)),
            max_wait: cfg.max_wait(),
            max_status_errors: cfg.max_status_errors.max(1),
        }
    }
}

/// Poll `job` until it succeeds, fails, times out, or is cancelled.
///
/// On success returns the provider's task record (the envelope `data`).
/// `job.state`, `job.polls`, and `job.last_response` are updated as it goes.
pub async fn poll_until_done(
    transport: &dyn JobTransport,
    api_base: &str,
    status_endpoint: &str,
    credential: &str,
    job: &mut Job,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Value, GenerationError> {
    let Some(task_id) = job.task_id.clone() else {
        return Err(classify::malformed("job has no task id to poll", &Value::Null));
    };
    let url = join_url(api_base, status_endpoint);
    let auth = Auth::for_provider(job.provider, credential);
    let interval = config.interval.max(MIN_POLL_INTERVAL);
    let deadline = Instant::now() + config.max_wait;
    let mut refusals = 0u32;

    job.transition(JobState::Waiting);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out(job, config, &task_id));
        }

        job.polls += 1;
        let query = [("taskId", task_id.as_str())];
        let fetch = tokio::time::timeout(
            remaining + interval,
            transport.get_json(&url, auth, &query),
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(job, &task_id)),
            outcome = fetch => outcome,
        };

        match outcome {
            Err(_) => return Err(timed_out(job, config, &task_id)),
            Ok(Err(e)) if e.kind == ErrorKind::Authentication => {
                job.transition(JobState::Failed);
                return Err(e);
            }
            Ok(Err(e)) => {
                warn!(task_id = %task_id, poll = job.polls, error = %e, "status check failed, will retry");
            }
            Ok(Ok(reply)) => {
                let refusal = match classify::json_reply(reply) {
                    Err(e) if e.kind == ErrorKind::Authentication => {
                        job.transition(JobState::Failed);
                        return Err(e);
                    }
                    Err(e) => Some(e),
                    Ok(body) => {
                        let envelope = Envelope::parse(&body);
                        match classify::envelope(&envelope, &body) {
                            Some(e) if e.kind == ErrorKind::Authentication => {
                                job.transition(JobState::Failed);
                                return Err(e);
                            }
                            Some(e) => Some(e),
                            None => {
                                refusals = 0;
                                job.last_response = Some(body.clone());
                                match task_status(&envelope.data) {
                                    TaskStatus::Succeeded => {
                                        job.transition(JobState::Succeeded);
                                        info!(
                                            task_id = %task_id,
                                            polls = job.polls,
                                            elapsed_ms = job.elapsed().as_millis() as u64,
                                            "job succeeded"
                                        );
                                        return Ok(envelope.data);
                                    }
                                    TaskStatus::Failed { code, message } => {
                                        job.transition(JobState::Failed);
                                        warn!(task_id = %task_id, code = ?code, message = ?message, "job failed");
                                        return Err(classify::poll_failure(code, message, &body));
                                    }
                                    TaskStatus::Pending(state) => {
                                        debug!(task_id = %task_id, poll = job.polls, state = ?state, "job still running");
                                        None
                                    }
                                }
                            }
                        }
                    }
                };

                if let Some(e) = refusal {
                    refusals += 1;
                    warn!(task_id = %task_id, refusals, error = %e, "status check refused");
                    if refusals >= config.max_status_errors {
                        job.transition(JobState::Failed);
                        return Err(classify::repeated_status_errors(refusals, e));
                    }
                }
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(timed_out(job, config, &task_id));
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(job, &task_id)),
            _ = tokio::time::sleep(interval.min(remaining)) => {}
        }
    }
}

fn timed_out(job: &mut Job, config: &PollConfig, task_id: &str) -> GenerationError {
    job.transition(JobState::TimedOut);
    warn!(task_id, polls = job.polls, "job timed out");
    classify::timeout(job.elapsed(), config.max_wait, Some(task_id))
}

fn cancelled(job: &mut Job, task_id: &str) -> GenerationError {
    job.transition(JobState::Cancelled);
    info!(task_id, polls = job.polls, "job cancelled");
    classify::cancelled(Some(task_id))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
