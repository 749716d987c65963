//! Terminal export fallback: hand the media to an external viewer

use super::traits::ExportSink;
use crate::error::ExportError;
use crate::types::{ExportResult, MediaReference};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

/// Message shown when the user has to save the media by hand
pub const MANUAL_SAVE_MESSAGE: &str =
    "Direct download failed. Opening in new tab - please right click and \"Save as...\"";

/// Something that can show a URL to the user
#[async_trait]
pub trait ReferenceOpener: Send + Sync {
    /// Open `url` for the user
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::OpenFailed`] when the viewer could not be launched.
    async fn open(&self, url: &str) -> crate::Result<()>;
}

/// Opens URLs with the platform's default handler
///
/// Uses `xdg-open` on Linux and BSD, `open` on macOS and
/// `rundll32 url.dll,FileProtocolHandler` on Windows. The URL is always passed
/// as a single argument and never goes through a shell. The binary is located
/// with `which` unless configured explicitly.
///
/// # Examples
///
/// ```no_run
/// use effect_gen::export::{ReferenceOpener, SystemOpener};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let opener = SystemOpener::from_path().expect("no opener in PATH");
/// opener.open("https://x/a.png").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SystemOpener {
    binary_path: PathBuf,
    leading_args: Vec<String>,
}

impl SystemOpener {
    /// Create an opener that runs `binary_path <url>`
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            leading_args: Vec::new(),
        }
    }

    /// Attempt to find the platform opener in PATH
    ///
    /// # Returns
    ///
    /// `Some(SystemOpener)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        Self::for_os(std::env::consts::OS, |name| which::which(name).ok())
    }

    fn for_os(os: &str, lookup: impl Fn(&str) -> Option<PathBuf>) -> Option<Self> {
        match os {
            // cmd.exe would re-parse `&`, `|` and `^` in query strings
            "windows" => lookup("rundll32").map(|binary_path| Self {
                binary_path,
                leading_args: vec!["url.dll,FileProtocolHandler".to_string()],
            }),
            "macos" => lookup("open").map(Self::new),
            _ => lookup("xdg-open").map(Self::new),
        }
    }

    fn args<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a str> {
        self.leading_args
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(url))
    }
}

#[async_trait]
impl ReferenceOpener for SystemOpener {
    async fn open(&self, url: &str) -> crate::Result<()> {
        // the viewer outlives this call; the child is not awaited
        Command::new(&self.binary_path)
            .args(self.args(url))
            .spawn()
            .map_err(|e| ExportError::OpenFailed {
                url: url.to_string(),
                reason: format!("failed to execute {}: {}", self.binary_path.display(), e),
            })?;
        Ok(())
    }
}

/// Opener used when no platform handler is available
///
/// Always fails, so the URL is only delivered through the manual-save event.
pub struct NoOpOpener;

#[async_trait]
impl ReferenceOpener for NoOpOpener {
    async fn open(&self, url: &str) -> crate::Result<()> {
        Err(ExportError::OpenFailed {
            url: url.to_string(),
            reason: "no URL opener available".to_string(),
        }
        .into())
    }
}

/// Opens the media for manual saving
///
/// This sink cannot fail: a launch failure is logged and the outcome is still
/// [`ExportResult::OpenedExternally`], since the user has already been told
/// where the media is.
pub struct OpenReferenceSink {
    opener: Arc<dyn ReferenceOpener>,
}

impl OpenReferenceSink {
    /// Create a sink delegating to `opener`
    pub fn new(opener: Arc<dyn ReferenceOpener>) -> Self {
        Self { opener }
    }

    /// Open the media, logging instead of failing
    pub async fn open_reference(&self, media: &MediaReference) -> ExportResult {
        if let Err(e) = self.opener.open(&media.url).await {
            tracing::warn!(url = %media.url, error = %e, "could not open media externally");
        }
        ExportResult::OpenedExternally {
            url: media.url.clone(),
        }
    }
}

#[async_trait]
impl ExportSink for OpenReferenceSink {
    async fn export(&self, media: &MediaReference) -> crate::Result<ExportResult> {
        Ok(self.open_reference(media).await)
    }

    fn name(&self) -> &'static str {
        "open-reference"
    }
}
