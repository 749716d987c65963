//! Asset upload via signed URLs
//!
//! Uploading is a two-step handshake: ask the API for a signed URL for a fresh
//! file name, then PUT the bytes there. The stored file becomes readable under
//! the content base URL.

use crate::client::status_text;
use crate::config::{ApiConfig, UploadConfig};
use crate::error::{Error, Result};
use crate::types::AssetReference;
use crate::utils::{file_extension_or_default, generate_id};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;

/// A file selected for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    /// Original file name, used for its extension
    pub name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Wrap in-memory file contents
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = content_type_for(path).to_string();
        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }

    /// Check the file before any network activity
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFile`] for non-image content and for files larger
    /// than `config.max_file_bytes`.
    pub fn validate(&self, config: &UploadConfig) -> Result<()> {
        if !self.content_type.starts_with("image/") {
            return Err(Error::InvalidFile(
                "Please upload a valid image file (JPEG, PNG).".to_string(),
            ));
        }
        if self.bytes.len() as u64 > config.max_file_bytes {
            return Err(Error::InvalidFile(format!(
                "File is too large. Max size is {}MB.",
                config.max_file_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match file_extension_or_default(path).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Stores input assets and returns a reference the generation service can read
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Upload a validated file
    async fn upload(&self, file: &LocalFile) -> Result<AssetReference>;
}

/// Uploads through the API's signed-URL handshake
pub struct SignedUrlUploader {
    http: reqwest::Client,
    api: ApiConfig,
    config: UploadConfig,
}

impl SignedUrlUploader {
    /// Create an uploader sharing the given HTTP client
    pub fn new(http: reqwest::Client, api: ApiConfig, config: UploadConfig) -> Self {
        Self { http, api, config }
    }

    async fn signed_url(&self, file_name: &str) -> Result<String> {
        let url = format!(
            "{}/get-emd-upload-url?fileName={}",
            self.api.base_url.trim_end_matches('/'),
            urlencoding::encode(file_name)
        );
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload(format!(
                "could not get upload URL: {}",
                status_text(status)
            )));
        }

        let signed = response.text().await?.trim().to_string();
        if signed.is_empty() {
            return Err(Error::Upload("empty upload URL".to_string()));
        }
        Ok(signed)
    }
}

#[async_trait]
impl AssetUploader for SignedUrlUploader {
    async fn upload(&self, file: &LocalFile) -> Result<AssetReference> {
        let extension = file_extension_or_default(Path::new(&file.name));
        let file_name = format!("{}.{}", generate_id(self.config.file_id_length), extension);

        let signed = self.signed_url(&file_name).await?;
        tracing::debug!(file_name = %file_name, size = file.bytes.len(), "uploading asset");

        let response = self
            .http
            .put(&signed)
            .header(CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload(status_text(status)));
        }

        let asset = AssetReference::new(format!(
            "{}/{}",
            self.api.content_base_url.trim_end_matches('/'),
            file_name
        ));
        tracing::info!(asset = %asset, "asset uploaded");
        Ok(asset)
    }
}
