//! Direct fetch-and-save export

use super::traits::ExportSink;
use super::writer::write_export;
use crate::client::status_text;
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::types::{ExportResult, MediaReference};
use crate::utils::infer_extension;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Fetches the media and saves the bytes as they arrived
///
/// The file extension comes from the response's content type, falling back to
/// the URL. Works for both images and videos.
pub struct DirectSaveSink {
    http: reqwest::Client,
    config: ExportConfig,
}

impl DirectSaveSink {
    /// Create a sink writing into `config.download_dir`
    pub fn new(http: reqwest::Client, config: ExportConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ExportSink for DirectSaveSink {
    async fn export(&self, media: &MediaReference) -> crate::Result<ExportResult> {
        let response = self.http.get(&media.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::FetchFailed {
                status: status_text(status),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let extension = infer_extension(content_type.as_deref(), &media.url);

        tracing::debug!(
            url = %media.url,
            content_type = ?content_type,
            size = bytes.len(),
            extension,
            "fetched media"
        );

        let path = write_export(&self.config, extension, &bytes).await?;
        Ok(ExportResult::Saved {
            path,
            strategy: self.name().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "direct-save"
    }
}
