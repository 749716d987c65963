//! Exporting generated media to local storage
//!
//! Export is a chain of interchangeable sinks behind the [`ExportSink`] trait:
//!
//! - [`DirectSaveSink`]: fetch the media and save the bytes as received
//! - [`ReencodeSink`]: write an already rendered image as PNG (images only)
//! - [`OpenReferenceSink`]: hand the URL to an external viewer for manual saving
//!
//! [`DownloadFallbackChain`] tries them in that order and isolates failures
//! between them. The last sink cannot fail, so every download ends in a
//! [`DownloadOutcome`](crate::types::DownloadOutcome).
//!
//! ## Usage
//!
//! ```no_run
//! use effect_gen::config::ExportConfig;
//! use effect_gen::export::{DownloadFallbackChain, RenderCache, default_opener};
//! use effect_gen::types::MediaReference;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let chain = DownloadFallbackChain::standard(
//!         reqwest::Client::new(),
//!         &ExportConfig::default(),
//!         Arc::new(RenderCache::new()),
//!         default_opener(&ExportConfig::default()),
//!     );
//!
//!     let outcome = chain
//!         .download(&MediaReference::from_url("https://x/a.png"))
//!         .await;
//!     println!("{:?}", outcome.result);
//! }
//! ```

mod chain;
mod direct;
mod open;
mod reencode;
mod traits;
mod writer;

pub use chain::DownloadFallbackChain;
pub use direct::DirectSaveSink;
pub use open::{MANUAL_SAVE_MESSAGE, NoOpOpener, OpenReferenceSink, ReferenceOpener, SystemOpener};
pub use reencode::{ReencodeSink, RenderCache, RenderedImage, RenderedImageSource};
pub use traits::ExportSink;

use crate::config::ExportConfig;
use std::sync::Arc;

/// Pick the opener for the terminal fallback
///
/// Uses `config.open_command` when set, otherwise searches PATH for the
/// platform opener, and degrades to [`NoOpOpener`] when none is found.
pub fn default_opener(config: &ExportConfig) -> Arc<dyn ReferenceOpener> {
    if let Some(command) = &config.open_command {
        return Arc::new(SystemOpener::new(command.clone()));
    }
    match SystemOpener::from_path() {
        Some(opener) => Arc::new(opener),
        None => {
            tracing::debug!("no URL opener found in PATH, manual-save fallback will only notify");
            Arc::new(NoOpOpener)
        }
    }
}

impl DownloadFallbackChain {
    /// The default chain: direct save, then PNG re-encode, then open externally
    pub fn standard(
        http: reqwest::Client,
        config: &ExportConfig,
        rendered: Arc<dyn RenderedImageSource>,
        opener: Arc<dyn ReferenceOpener>,
    ) -> Self {
        DownloadFallbackChain::new(OpenReferenceSink::new(opener))
            .with_sink(Arc::new(DirectSaveSink::new(http, config.clone())))
            .with_sink(Arc::new(ReencodeSink::new(rendered, config.clone())))
    }
}
