//! Error types for effect-gen
//!
//! This module provides the error taxonomy for the generation lifecycle:
//! - Remote job errors (submission, status transport, server-reported failure, timeout)
//! - Result resolution errors (no usable media locator in a completed job)
//! - Export errors, which the download fallback chain recovers from internally
//! - Ambient errors (configuration, network, serialization, I/O)
//!
//! Every variant renders a message suitable for showing to the end user verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for effect-gen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for effect-gen
///
/// Lifecycle failures are never retried automatically: the caller surfaces the
/// message and lets the user trigger the operation again.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "poll.max_attempts")
        key: Option<String>,
    },

    /// The submission endpoint answered with a non-success status
    #[error("Failed to submit job: {status}")]
    Submission {
        /// HTTP status line returned by the endpoint (e.g., "500 Internal Server Error")
        status: String,
    },

    /// The status endpoint answered with a non-success status
    #[error("Failed to check status: {status}")]
    PollTransport {
        /// HTTP status line returned by the endpoint
        status: String,
        /// Zero-based attempt on which the transport failure occurred
        attempt: u32,
    },

    /// The remote service reported the job as failed
    #[error("{0}")]
    JobFailed(String),

    /// The poll budget was exhausted before the job reached a terminal state
    #[error("Job timed out after {attempts} polls")]
    PollTimeout {
        /// Number of status requests that were issued
        attempts: u32,
    },

    /// A completed job carried no recognizable media locator
    #[error("No image URL in response: {0}")]
    ResultResolution(String),

    /// The upload handshake failed
    #[error("Failed to upload file: {0}")]
    Upload(String),

    /// The selected file was rejected before upload
    #[error("{0}")]
    InvalidFile(String),

    /// Generation was requested before any asset was uploaded
    #[error("Please upload an image first.")]
    NoAsset,

    /// The run was invalidated by a session reset or a newer run
    #[error("generation run was superseded")]
    Superseded,

    /// Export strategy error
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by individual export strategies
///
/// The download fallback chain catches these and moves on to the next
/// strategy; they only surface as entries in a `DownloadOutcome`.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Fetching the media returned a non-success status
    #[error("fetch failed with status {status}")]
    FetchFailed {
        /// HTTP status line returned for the media URL
        status: String,
    },

    /// No rendered copy of the image is available to re-encode
    #[error("no rendered copy of {url} is available")]
    NoRenderedCopy {
        /// Media URL that was looked up
        url: String,
    },

    /// A rendered copy exists but has not finished loading
    #[error("rendered copy of {url} is not fully loaded")]
    NotLoaded {
        /// Media URL that was looked up
        url: String,
    },

    /// Encoding the rendered copy failed
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// The strategy does not apply to this media kind
    #[error("strategy does not apply to {kind} media")]
    Inapplicable {
        /// Media kind that was rejected
        kind: String,
    },

    /// A file with the chosen name already exists and collisions are skipped
    #[error("file already exists at {path}")]
    FileCollision {
        /// Path that already exists
        path: PathBuf,
    },

    /// The external opener could not be launched
    #[error("failed to open {url}: {reason}")]
    OpenFailed {
        /// Media URL that was to be opened
        url: String,
        /// Reason the launch failed
        reason: String,
    },
}

impl Error {
    /// Machine-readable error code
    ///
    /// Stable snake_case identifiers that embedders can match on instead of
    /// parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Submission { .. } => "submission_failed",
            Error::PollTransport { .. } => "poll_transport_failed",
            Error::JobFailed(_) => "job_failed",
            Error::PollTimeout { .. } => "poll_timeout",
            Error::ResultResolution(_) => "result_resolution_failed",
            Error::Upload(_) => "upload_failed",
            Error::InvalidFile(_) => "invalid_file",
            Error::NoAsset => "no_asset",
            Error::Superseded => "superseded",
            Error::Export(e) => match e {
                ExportError::FetchFailed { .. } => "fetch_failed",
                ExportError::NoRenderedCopy { .. } => "no_rendered_copy",
                ExportError::NotLoaded { .. } => "not_loaded",
                ExportError::Encode(_) => "encode_failed",
                ExportError::Inapplicable { .. } => "inapplicable",
                ExportError::FileCollision { .. } => "file_collision",
                ExportError::OpenFailed { .. } => "open_failed",
            },
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Whether this error should be reported to the presentation layer
    ///
    /// A superseded run belongs to state the user has already discarded.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Error::Superseded)
    }
}
