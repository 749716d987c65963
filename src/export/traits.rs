//! Traits for export strategies

use crate::types::{ExportResult, MediaReference};
use async_trait::async_trait;

/// One way of getting generated media onto the user's machine
///
/// Sinks are tried in order by the
/// [`DownloadFallbackChain`](super::DownloadFallbackChain). A sink only reports
/// success when it actually produced its result; any error is caught by the
/// chain, recorded, and the next sink is tried.
///
/// # Examples
///
/// ```no_run
/// use effect_gen::export::{DirectSaveSink, ExportSink};
/// use effect_gen::config::ExportConfig;
/// use effect_gen::types::MediaReference;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = DirectSaveSink::new(reqwest::Client::new(), ExportConfig::default());
/// let media = MediaReference::from_url("https://x/a.png");
/// if sink.applies_to(&media) {
///     let result = sink.export(&media).await?;
///     println!("{:?}", result);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Export the media
    ///
    /// # Errors
    ///
    /// Any error means this sink did not produce a result. Implementations must
    /// leave no partial output behind.
    async fn export(&self, media: &MediaReference) -> crate::Result<ExportResult>;

    /// Whether this sink can handle the given media at all
    ///
    /// Inapplicable sinks are skipped without being called.
    fn applies_to(&self, _media: &MediaReference) -> bool {
        true
    }

    /// Human-readable name for logging and outcome reports
    fn name(&self) -> &'static str;
}
