//! Job submission

use crate::client::{SubmitRequest, SubmitResponse, status_text};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{AssetReference, GenerationJob};
use std::sync::Arc;

/// Sends generation requests to the configured pipeline
#[derive(Clone)]
pub struct JobSubmitter {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl JobSubmitter {
    /// Create a submitter sharing the given client and configuration
    pub fn new(http: reqwest::Client, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// Submit a job for an uploaded asset
    ///
    /// Issues exactly one request. The returned job is always `Queued`, whatever
    /// status the service reports alongside the job id.
    ///
    /// # Errors
    ///
    /// - [`Error::Submission`] when the endpoint answers with a non-success status
    /// - [`Error::Network`] / [`Error::Serialization`] for transport and body failures
    pub async fn submit(&self, asset: &AssetReference) -> Result<GenerationJob> {
        let url = self.config.pipeline_url();
        let body = SubmitRequest::new(&self.config.job, asset);

        tracing::debug!(url = %url, asset = %asset, "submitting generation job");

        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "job submission rejected");
            return Err(Error::Submission {
                status: status_text(status),
            });
        }

        let text = response.text().await?;
        let parsed: SubmitResponse = serde_json::from_str(&text)?;

        tracing::info!(job_id = %parsed.job_id, "job submitted");
        Ok(GenerationJob::queued(parsed.job_id))
    }
}
