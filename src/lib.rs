//! # effect-gen
//!
//! Async job lifecycle client for remote image-effect generation services.
//!
//! ## Design Philosophy
//!
//! effect-gen is designed to be:
//! - **Sensible defaults** - `Config::default()` targets the production deployment
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - The presentation layer subscribes to events
//! - **Failure-isolating** - Export falls back through strategies and always
//!   ends in an outcome the user can act on
//!
//! ## Lifecycle
//!
//! An uploaded asset is submitted as a job ([`submit`]), the job is polled on a
//! bounded fixed-interval schedule ([`poll`], [`retry`]) and the completed
//! payload is resolved into a [`MediaReference`] ([`resolve`]). Exporting the
//! media runs a chain of fallback sinks ([`export`]). The
//! [`LifecycleOrchestrator`] ties these together against a caller-owned
//! [`Session`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use effect_gen::{Config, LifecycleOrchestrator, LocalFile, Session};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = LifecycleOrchestrator::new(Config::default())?;
//!     let session = Session::new();
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let file = LocalFile::from_path(Path::new("face.jpg")).await?;
//!     orchestrator.upload(&session, file).await?;
//!
//!     let media = orchestrator.generate(&session).await?;
//!     let outcome = orchestrator.download(&media).await;
//!     println!("Export: {:?}", outcome.result);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client and wire types
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media export with fallback strategies
pub mod export;
/// End-to-end lifecycle orchestration
pub mod orchestrator;
/// Job status polling
pub mod poll;
/// Result payload resolution
pub mod resolve;
/// Bounded fixed-interval polling policy
pub mod retry;
/// Per-user session state
pub mod session;
/// Job submission
pub mod submit;
/// Core types and events
pub mod types;
/// Asset upload
pub mod upload;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ExportConfig, FileCollisionAction, Pipeline, PollConfig};
pub use error::{Error, ExportError, Result};
pub use export::{
    DirectSaveSink, DownloadFallbackChain, ExportSink, OpenReferenceSink, ReencodeSink,
    ReferenceOpener, RenderCache, RenderedImageSource, SystemOpener,
};
pub use orchestrator::LifecycleOrchestrator;
pub use poll::JobPoller;
pub use resolve::resolve;
pub use session::Session;
pub use submit::JobSubmitter;
pub use types::{
    AssetReference, DownloadOutcome, Event, ExportResult, GenerationJob, JobId, JobStatus,
    MediaKind, MediaReference, ProgressLabel, StrategyFailure,
};
pub use upload::{AssetUploader, LocalFile, SignedUrlUploader};
