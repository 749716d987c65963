//! Re-encode fallback for images that are already rendered
//!
//! When the media URL cannot be fetched again, the copy the presentation layer
//! already decoded can still be written out as PNG. The presentation layer
//! publishes decoded images through a [`RenderedImageSource`]; [`RenderCache`]
//! is the in-memory implementation.

use super::traits::ExportSink;
use super::writer::write_export;
use crate::config::ExportConfig;
use crate::error::{Error, ExportError};
use crate::types::{ExportResult, MediaReference};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State of a rendered copy
#[derive(Clone, Debug)]
pub enum RenderedImage {
    /// Rendering started but the image is not decoded yet
    Loading,
    /// Fully decoded image at its natural resolution
    Loaded(Arc<DynamicImage>),
}

/// Lookup of images the presentation layer has rendered
#[async_trait]
pub trait RenderedImageSource: Send + Sync {
    /// Rendered copy for `url`, if one exists
    async fn rendered(&self, url: &str) -> Option<RenderedImage>;
}

/// In-memory [`RenderedImageSource`] keyed by media URL
#[derive(Default)]
pub struct RenderCache {
    images: RwLock<HashMap<String, RenderedImage>>,
}

impl RenderCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `url` is being rendered
    pub async fn mark_loading(&self, url: impl Into<String>) {
        self.images
            .write()
            .await
            .insert(url.into(), RenderedImage::Loading);
    }

    /// Store a decoded image for `url`
    pub async fn insert(&self, url: impl Into<String>, image: DynamicImage) {
        self.images
            .write()
            .await
            .insert(url.into(), RenderedImage::Loaded(Arc::new(image)));
    }

    /// Decode `bytes` and store the result for `url`
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encode`] when the bytes are not a supported image.
    pub async fn insert_encoded(&self, url: impl Into<String>, bytes: Vec<u8>) -> crate::Result<()> {
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
            .map_err(ExportError::from)?;
        self.insert(url, decoded).await;
        Ok(())
    }

    /// Forget the rendered copy of `url`
    pub async fn remove(&self, url: &str) {
        self.images.write().await.remove(url);
    }

    /// Forget every rendered copy
    pub async fn clear(&self) {
        self.images.write().await.clear();
    }
}

#[async_trait]
impl RenderedImageSource for RenderCache {
    async fn rendered(&self, url: &str) -> Option<RenderedImage> {
        self.images.read().await.get(url).cloned()
    }
}

/// Writes the rendered copy of an image as PNG
///
/// Never applies to video.
pub struct ReencodeSink {
    source: Arc<dyn RenderedImageSource>,
    config: ExportConfig,
}

impl ReencodeSink {
    /// Create a sink reading rendered copies from `source`
    pub fn new(source: Arc<dyn RenderedImageSource>, config: ExportConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl ExportSink for ReencodeSink {
    async fn export(&self, media: &MediaReference) -> crate::Result<ExportResult> {
        if media.is_video() {
            return Err(ExportError::Inapplicable {
                kind: media.kind.to_string(),
            }
            .into());
        }

        let image = match self.source.rendered(&media.url).await {
            Some(RenderedImage::Loaded(image)) if image.width() > 0 && image.height() > 0 => image,
            Some(_) => {
                return Err(ExportError::NotLoaded {
                    url: media.url.clone(),
                }
                .into());
            }
            None => {
                return Err(ExportError::NoRenderedCopy {
                    url: media.url.clone(),
                }
                .into());
            }
        };

        let png = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        let path = write_export(&self.config, "png", &png).await?;
        Ok(ExportResult::Saved {
            path,
            strategy: self.name().to_string(),
        })
    }

    fn applies_to(&self, media: &MediaReference) -> bool {
        !media.is_video()
    }

    fn name(&self) -> &'static str {
        "reencode-save"
    }
}

fn encode_png(image: &DynamicImage) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(ExportError::from)?;
    Ok(buf)
}
