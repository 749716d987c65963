//! Core types and events for effect-gen

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Locator of a previously stored input or output asset
///
/// Produced by the upload collaborator and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetReference(String);

impl AssetReference {
    /// Wrap an asset URL
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The asset URL
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-issued identifier of a generation job
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Get the inner identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a generation job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the service, not yet picked up
    Queued,
    /// Being processed remotely
    Processing,
    /// Finished with a result payload
    Completed,
    /// Reported as failed by the service
    Failed,
    /// Poll budget exhausted before a terminal response
    TimedOut,
}

impl JobStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut
        )
    }
}

/// A remote generation job
///
/// Only the submitter creates jobs and only the poller moves their status, so
/// neither field is publicly writable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationJob {
    job_id: JobId,
    status: JobStatus,
}

impl GenerationJob {
    pub(crate) fn queued(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
        }
    }

    /// Identifier used for status lookups
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Last status observed for this job
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move to `next` unless the job is already terminal
    ///
    /// Returns whether the transition was applied.
    pub(crate) fn transition(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() {
            tracing::debug!(
                job_id = %self.job_id,
                current = ?self.status,
                rejected = ?next,
                "ignoring transition out of terminal state"
            );
            return false;
        }
        self.status = next;
        true
    }
}

/// Kind of generated media
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

fn video_suffix() -> &'static Regex {
    static VIDEO_SUFFIX: OnceLock<Regex> = OnceLock::new();
    VIDEO_SUFFIX.get_or_init(|| {
        // literal pattern, cannot fail to compile
        #[allow(clippy::expect_used)]
        let re = Regex::new(r"(?i)\.(mp4|webm)(\?.*)?$").expect("video suffix pattern");
        re
    })
}

impl MediaKind {
    /// Infer the kind from a URL's file extension
    ///
    /// `.mp4` and `.webm` (optionally followed by a query string) are video;
    /// everything else is treated as an image.
    pub fn from_url(url: &str) -> Self {
        if video_suffix().is_match(url) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Normalized pointer at the generated output
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaReference {
    /// Media URL
    pub url: String,
    /// Media kind, derived from the URL
    pub kind: MediaKind,
}

impl MediaReference {
    /// Build a reference, deriving the kind from the URL
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = MediaKind::from_url(&url);
        Self { url, kind }
    }

    /// Whether this reference points at a video
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Progress label shown by the presentation layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ProgressLabel {
    /// Ready for the user to trigger generation
    Idle,
    /// Asset upload in progress
    Uploading,
    /// Generation request being sent
    Submitting,
    /// Job accepted, first status request pending
    Queued,
    /// Job still running after `attempt` status requests (1-based)
    Processing {
        /// Number of non-terminal status responses seen so far
        attempt: u32,
    },
    /// Media resolved and handed to the presentation layer
    Complete,
    /// The last operation failed
    Error,
}

impl std::fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressLabel::Idle => f.write_str("GENERATE MUGSHOT"),
            ProgressLabel::Uploading => f.write_str("UPLOADING..."),
            ProgressLabel::Submitting => f.write_str("SUBMITTING..."),
            ProgressLabel::Queued => f.write_str("QUEUED..."),
            ProgressLabel::Processing { attempt } => write!(f, "PROCESSING... ({})", attempt),
            ProgressLabel::Complete => f.write_str("COMPLETE"),
            ProgressLabel::Error => f.write_str("ERROR"),
        }
    }
}

/// Successful result of an export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportResult {
    /// Bytes were written to local storage
    Saved {
        /// Final path of the written file
        path: PathBuf,
        /// Name of the strategy that produced the file
        strategy: String,
    },
    /// The media was handed to an external viewer for manual saving
    OpenedExternally {
        /// URL that was opened
        url: String,
    },
}

/// One strategy that failed (or did not apply) during an export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    /// Strategy name
    pub strategy: String,
    /// Why the strategy did not produce a file
    pub reason: String,
}

/// Terminal outcome of one run of the download fallback chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// What finally happened
    pub result: ExportResult,
    /// Strategies that failed before the final one, in attempt order
    pub failures: Vec<StrategyFailure>,
}

impl DownloadOutcome {
    /// Whether a file was written locally
    pub fn is_saved(&self) -> bool {
        matches!(self.result, ExportResult::Saved { .. })
    }
}

/// Event delivered to the presentation layer
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Progress label changed
    Status {
        /// New label
        label: ProgressLabel,
    },

    /// Busy indicator changed (controls are disabled while active)
    Busy {
        /// Whether an operation is in flight
        active: bool,
    },

    /// An asset was uploaded and is ready for generation
    Uploaded {
        /// Stored asset
        asset: AssetReference,
    },

    /// A generated media reference is ready to render
    MediaReady {
        /// Media to display
        media: MediaReference,
    },

    /// An operation failed; the message is meant for the user
    Error {
        /// User-facing message
        message: String,
    },

    /// Session state was cleared
    SessionReset,

    /// Export of a media reference started
    DownloadStarted {
        /// Media URL
        url: String,
    },

    /// Automatic saving failed; the user has to save the media manually
    ManualSaveRequired {
        /// Media URL opened for the user
        url: String,
        /// Instructions for the user
        message: String,
    },

    /// Export finished
    DownloadFinished {
        /// Terminal outcome of the fallback chain
        outcome: DownloadOutcome,
    },
}
