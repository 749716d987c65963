//! Job status polling
//!
//! [`JobPoller`] queries the status endpoint until the job completes, fails,
//! or the configured poll budget runs out. Each query is a single HTTP request:
//! a transport failure ends polling immediately rather than retrying the attempt.

use crate::client::{RemoteState, StatusResponse, status_text, status_url};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::{PollStep, PollStop, poll_until};
use crate::types::{GenerationJob, JobStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Message used when the service reports a failure without explaining it
pub const GENERIC_FAILURE_MESSAGE: &str = "Job processing failed";

/// Polls a submitted job until it reaches a terminal state
#[derive(Clone)]
pub struct JobPoller {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl JobPoller {
    /// Create a poller sharing the given client and configuration
    pub fn new(http: reqwest::Client, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// Poll `job` until it completes
    ///
    /// `on_progress` is called with the 1-based attempt number after every
    /// non-terminal response. The job's status is updated as responses arrive
    /// and ends in a terminal state whenever this returns an error other than
    /// [`Error::Superseded`].
    ///
    /// # Returns
    ///
    /// The `completed` status response, carrying the raw result payload.
    ///
    /// # Errors
    ///
    /// - [`Error::JobFailed`] for a `failed` or `error` status
    /// - [`Error::PollTransport`] for a non-success HTTP response
    /// - [`Error::PollTimeout`] once the poll budget is spent
    /// - [`Error::Superseded`] when `cancel` fires
    pub async fn poll(
        &self,
        job: &mut GenerationJob,
        cancel: Option<&CancellationToken>,
        mut on_progress: impl FnMut(u32),
    ) -> Result<StatusResponse> {
        let url = status_url(&self.config, job.job_id());
        let url = url.as_str();
        let job_id = job.job_id().clone();
        let mut attempt = 0u32;
        tracing::debug!(
            job_id = %job_id,
            max_attempts = self.config.poll.max_attempts,
            budget = ?self.config.poll.total_wait(),
            "polling job"
        );

        let outcome = poll_until(
            &self.config.poll,
            cancel,
            |n| {
                job.transition(JobStatus::Processing);
                on_progress(n);
            },
            move || {
                let current = attempt;
                attempt += 1;
                self.query(url, current)
            },
        )
        .await;

        match outcome {
            Ok(response) => {
                job.transition(JobStatus::Completed);
                tracing::info!(job_id = %job_id, "job completed");
                Ok(response)
            }
            Err(PollStop::Failed(err)) => {
                if matches!(err, Error::JobFailed(_)) {
                    job.transition(JobStatus::Failed);
                }
                tracing::error!(job_id = %job_id, error = %err, "polling failed");
                Err(err)
            }
            Err(PollStop::Exhausted { attempts }) => {
                job.transition(JobStatus::TimedOut);
                tracing::error!(job_id = %job_id, attempts, "job timed out");
                Err(Error::PollTimeout { attempts })
            }
            Err(PollStop::Cancelled { attempts }) => {
                tracing::info!(job_id = %job_id, attempts, "polling cancelled");
                Err(Error::Superseded)
            }
        }
    }

    async fn query(&self, url: &str, attempt: u32) -> Result<PollStep<StatusResponse>> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PollTransport {
                status: status_text(status),
                attempt,
            });
        }

        let text = response.text().await?;
        let body: StatusResponse = serde_json::from_str(&text)?;
        tracing::debug!(attempt, status = ?body.status, "status response");

        match body.state() {
            RemoteState::Completed => Ok(PollStep::Ready(body)),
            RemoteState::Failed => {
                let message = body.error_message().unwrap_or(GENERIC_FAILURE_MESSAGE);
                Err(Error::JobFailed(message.to_string()))
            }
            RemoteState::Running => Ok(PollStep::Pending),
        }
    }
}
