//! HTTP client and wire types for the remote generation service
//!
//! The service exposes two endpoints per pipeline:
//! - `POST {base}/{pipeline}` accepts a job and answers with its `jobId`
//! - `GET {base}/{pipeline}/{userId}/{jobId}/status` reports progress
//!
//! Both bodies are camelCase JSON.

use crate::config::{ApiConfig, Config, JobConfig};
use crate::error::{Error, Result};
use crate::types::{AssetReference, JobId};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// `Accept` header value sent with every request
pub const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

/// Build the shared HTTP client
///
/// No cookie store is configured, so media fetches go out without credentials.
pub(crate) fn build_http_client(api: &ApiConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

    reqwest::Client::builder()
        .timeout(api.request_timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to create HTTP client: {}", e),
            key: Some("api".to_string()),
        })
}

/// Human-readable status line, e.g. "500 Internal Server Error"
pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Body of a job submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Tool type
    pub tool_type: &'a str,
    /// Effect to apply
    pub effect_id: &'a str,
    /// Uploaded input asset
    pub image_url: &'a str,
    /// Fixed user identifier
    pub user_id: &'a str,
    /// Strip the service watermark
    pub remove_watermark: bool,
    /// Keep the output private
    pub is_private: bool,
}

impl<'a> SubmitRequest<'a> {
    /// Combine the fixed job parameters with an uploaded asset
    pub fn new(job: &'a JobConfig, asset: &'a AssetReference) -> Self {
        Self {
            model: &job.model,
            tool_type: &job.tool_type,
            effect_id: &job.effect_id,
            image_url: asset.as_str(),
            user_id: &job.user_id,
            remove_watermark: job.remove_watermark,
            is_private: job.is_private,
        }
    }
}

/// Body of a successful submission
///
/// Any status field the service includes is ignored; every new job starts
/// out queued.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Server-issued job identifier
    pub job_id: JobId,
}

/// Body of a status lookup
///
/// `status` and `error` are kept as raw JSON: a field of an unexpected type
/// must not turn a readable answer into a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    /// Raw status (`queued`, `processing`, `completed`, `failed`, `error`, ...)
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    /// Result payload, present once the job completed
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Failure detail supplied by the service
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// How the poller should treat a status response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// `completed`
    Completed,
    /// `failed` or `error`
    Failed,
    /// Anything else, including statuses the service may add later
    Running,
}

impl StatusResponse {
    /// The status when the service sent it as a string
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_ref().and_then(serde_json::Value::as_str)
    }

    /// Classify the raw status; non-string statuses count as running
    pub fn state(&self) -> RemoteState {
        match self.status_str() {
            Some("completed") => RemoteState::Completed,
            Some("failed" | "error") => RemoteState::Failed,
            _ => RemoteState::Running,
        }
    }

    /// The service's failure message, if it sent a non-empty string
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Status endpoint for a job
///
/// The job id is percent-encoded so an unusual id cannot escape its path segment.
pub fn status_url(config: &Config, job_id: &JobId) -> String {
    format!(
        "{}/{}/{}/status",
        config.pipeline_url(),
        urlencoding::encode(&config.job.user_id),
        urlencoding::encode(job_id.as_str())
    )
}
