//! Configuration types for effect-gen

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote service endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the generation API (default: "https://api.chromastudio.ai")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL under which uploaded assets become publicly readable
    /// (default: "https://contents.maxstudio.ai")
    #[serde(default = "default_content_base_url")]
    pub content_base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            content_base_url: default_content_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Which remote pipeline processes the job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    /// Image effects pipeline (default)
    #[default]
    Image,
    /// Video effects pipeline
    Video,
}

impl Pipeline {
    /// Path segment of the pipeline's submission and status endpoints
    pub fn endpoint(&self) -> &'static str {
        match self {
            Pipeline::Image => "image-gen",
            Pipeline::Video => "video-gen",
        }
    }
}

/// Fixed job parameters sent with every submission
///
/// These are deployment constants, not caller-supplied values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Model identifier (default: "image-effects")
    #[serde(default = "default_model")]
    pub model: String,

    /// Tool type (default: "image-effects")
    #[serde(default = "default_model")]
    pub tool_type: String,

    /// Effect to apply (default: "mugshot")
    #[serde(default = "default_effect_id")]
    pub effect_id: String,

    /// Fixed user identifier used for submission and status lookups
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Ask the service to strip its watermark (default: true)
    #[serde(default = "default_true")]
    pub remove_watermark: bool,

    /// Keep the generated output private (default: true)
    #[serde(default = "default_true")]
    pub is_private: bool,

    /// Remote pipeline (default: image)
    #[serde(default)]
    pub pipeline: Pipeline,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            tool_type: default_model(),
            effect_id: default_effect_id(),
            user_id: default_user_id(),
            remove_watermark: true,
            is_private: true,
            pipeline: Pipeline::default(),
        }
    }
}

/// Bounded, fixed-interval poll policy
///
/// The budget is a product decision (60 polls, 2 seconds apart), not a derived
/// constant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of non-terminal status responses tolerated (default: 60)
    #[serde(default = "default_max_polls")]
    pub max_attempts: u32,

    /// Delay between consecutive status requests (default: 2000 ms)
    #[serde(default = "default_poll_interval", with = "duration_ms_serde")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_polls(),
            interval: default_poll_interval(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

/// Export (download) configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory exported media is written to (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Prefix of generated file names (default: "mugshot_")
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Length of the random identifier in generated file names (default: 8)
    #[serde(default = "default_filename_id_length")]
    pub filename_id_length: usize,

    /// File collision handling
    #[serde(default)]
    pub collision: FileCollisionAction,

    /// Explicit opener binary for the new-tab fallback (auto-detected if None)
    #[serde(default)]
    pub open_command: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            filename_prefix: default_filename_prefix(),
            filename_id_length: default_filename_id_length(),
            collision: FileCollisionAction::default(),
            open_command: None,
        }
    }
}

/// Upload validation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file in bytes (default: 10 MiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Length of the random identifier used as the stored file name (default: 21)
    #[serde(default = "default_file_id_length")]
    pub file_id_length: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            file_id_length: default_file_id_length(),
        }
    }
}

/// Main configuration for the lifecycle orchestrator
///
/// Every field has a default, so `Config::default()` targets the production
/// image-effects deployment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints and HTTP settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Fixed job parameters
    #[serde(default)]
    pub job: JobConfig,

    /// Poll policy
    #[serde(default)]
    pub poll: PollConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Upload settings
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Check the configuration for values that cannot work
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.content_base_url", &self.api.content_base_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("invalid URL '{}': {}", value, e),
                key: Some(key.to_string()),
            })?;
        }

        for (key, value) in [
            ("job.model", &self.job.model),
            ("job.tool_type", &self.job.tool_type),
            ("job.effect_id", &self.job.effect_id),
            ("job.user_id", &self.job.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{} must not be empty", key),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.poll.max_attempts == 0 {
            return Err(Error::Config {
                message: "poll budget must allow at least one status request".to_string(),
                key: Some("poll.max_attempts".to_string()),
            });
        }

        if self.export.filename_id_length == 0 {
            return Err(Error::Config {
                message: "file name identifier length must be positive".to_string(),
                key: Some("export.filename_id_length".to_string()),
            });
        }

        if self.upload.file_id_length == 0 {
            return Err(Error::Config {
                message: "upload identifier length must be positive".to_string(),
                key: Some("upload.file_id_length".to_string()),
            });
        }

        Ok(())
    }

    /// Endpoint of the configured pipeline, e.g. `https://api.chromastudio.ai/image-gen`
    pub fn pipeline_url(&self) -> String {
        format!(
            "{}/{}",
            self.api.base_url.trim_end_matches('/'),
            self.job.pipeline.endpoint()
        )
    }
}

fn default_base_url() -> String {
    "https://api.chromastudio.ai".to_string()
}

fn default_content_base_url() -> String {
    "https://contents.maxstudio.ai".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_model() -> String {
    "image-effects".to_string()
}

fn default_effect_id() -> String {
    "mugshot".to_string()
}

fn default_user_id() -> String {
    "DObRu1vyStbUynoQmTcHBlhs55z2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_polls() -> u32 {
    60
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(2000)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_filename_prefix() -> String {
    "mugshot_".to_string()
}

fn default_filename_id_length() -> usize {
    8
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_file_id_length() -> usize {
    21
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
