//! End-to-end generation lifecycle
//!
//! [`LifecycleOrchestrator`] wires upload, submission, polling, resolution and
//! export together and reports every phase to the presentation layer as
//! [`Event`]s. It holds no per-user state; that lives in the [`Session`] passed
//! to each call.

use crate::client::build_http_client;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{DownloadFallbackChain, RenderCache, default_opener};
use crate::poll::JobPoller;
use crate::resolve::resolve;
use crate::session::{RunTicket, Session};
use crate::submit::JobSubmitter;
use crate::types::{AssetReference, DownloadOutcome, Event, MediaReference, ProgressLabel};
use crate::upload::{AssetUploader, LocalFile, SignedUrlUploader};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives uploads, generation runs and downloads for the presentation layer
///
/// # Examples
///
/// ```no_run
/// use effect_gen::{Config, LifecycleOrchestrator, LocalFile, Session};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = LifecycleOrchestrator::new(Config::default())?;
/// let session = Session::new();
///
/// let mut events = orchestrator.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("Event: {:?}", event);
///     }
/// });
///
/// let file = LocalFile::from_path(Path::new("face.jpg")).await?;
/// orchestrator.upload(&session, file).await?;
/// let media = orchestrator.generate(&session).await?;
/// let outcome = orchestrator.download(&media).await;
/// println!("{:?}", outcome.result);
/// # Ok(())
/// # }
/// ```
pub struct LifecycleOrchestrator {
    config: Arc<Config>,
    submitter: JobSubmitter,
    poller: JobPoller,
    uploader: Arc<dyn AssetUploader>,
    export_chain: Arc<DownloadFallbackChain>,
    render_cache: Arc<RenderCache>,
    event_tx: broadcast::Sender<Event>,
}

impl LifecycleOrchestrator {
    /// Create an orchestrator with the standard uploader and export chain
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configuration does not validate.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let http = build_http_client(&config.api)?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let render_cache = Arc::new(RenderCache::new());

        let export_chain = DownloadFallbackChain::standard(
            http.clone(),
            &config.export,
            render_cache.clone(),
            default_opener(&config.export),
        )
        .with_events(event_tx.clone());

        let uploader = SignedUrlUploader::new(
            http.clone(),
            config.api.clone(),
            config.upload.clone(),
        );

        Ok(Self {
            submitter: JobSubmitter::new(http.clone(), config.clone()),
            poller: JobPoller::new(http, config.clone()),
            uploader: Arc::new(uploader),
            export_chain: Arc::new(export_chain),
            render_cache,
            event_tx,
            config,
        })
    }

    /// Replace the asset uploader
    pub fn with_uploader(mut self, uploader: Arc<dyn AssetUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// Replace the export chain
    ///
    /// The chain publishes its download events on this orchestrator's channel.
    pub fn with_export_chain(mut self, chain: DownloadFallbackChain) -> Self {
        self.export_chain = Arc::new(chain.with_events(self.event_tx.clone()));
        self
    }

    /// Subscribe to presentation events
    ///
    /// Multiple subscribers are supported. A subscriber that falls more than
    /// the channel capacity behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cache the presentation layer fills with rendered images
    ///
    /// The re-encode export fallback reads from it.
    pub fn render_cache(&self) -> Arc<RenderCache> {
        self.render_cache.clone()
    }

    /// Validate and upload a file, making it the session's current asset
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFile`] before any network activity, or the uploader's
    /// error. Either way the message has already been reported as an event.
    pub async fn upload(&self, session: &Session, file: LocalFile) -> Result<AssetReference> {
        if let Err(e) = file.validate(&self.config.upload) {
            self.report_error(&e);
            return Err(e);
        }

        self.emit_event(Event::Busy { active: true });
        self.emit_status(ProgressLabel::Uploading);

        match self.uploader.upload(&file).await {
            Ok(asset) => {
                session.set_asset(asset.clone()).await;
                self.emit_event(Event::Uploaded {
                    asset: asset.clone(),
                });
                self.emit_status(ProgressLabel::Idle);
                self.emit_event(Event::Busy { active: false });
                Ok(asset)
            }
            Err(e) => {
                tracing::error!(file = %file.name, error = %e, "upload failed");
                self.emit_status(ProgressLabel::Error);
                self.report_error(&e);
                self.emit_event(Event::Busy { active: false });
                Err(e)
            }
        }
    }

    /// Run one generation for the session's current asset
    ///
    /// Submits a job, polls it to completion and resolves the media reference.
    /// Starting a run supersedes any earlier run of the same session. Failures
    /// are reported as events and leave the session's asset in place for a
    /// retry.
    ///
    /// # Errors
    ///
    /// - [`Error::NoAsset`] when nothing was uploaded; no request is made
    /// - [`Error::Submission`], [`Error::PollTransport`], [`Error::JobFailed`],
    ///   [`Error::PollTimeout`], [`Error::ResultResolution`] from the run itself
    /// - [`Error::Superseded`] when the session was reset or a newer run
    ///   started; this one is not reported to the presentation layer
    pub async fn generate(&self, session: &Session) -> Result<MediaReference> {
        let Some(asset) = session.current_asset().await else {
            let e = Error::NoAsset;
            self.report_error(&e);
            return Err(e);
        };

        let ticket = session.begin_run().await;
        tracing::info!(generation = ticket.generation(), asset = %asset, "generation started");

        self.emit_event(Event::Busy { active: true });
        self.emit_status(ProgressLabel::Submitting);

        let outcome = tokio::select! {
            biased;
            _ = ticket.cancel_token().cancelled() => Err(Error::Superseded),
            result = self.run(&asset, &ticket) => result,
        };

        let outcome = match outcome {
            Ok(media) => {
                if session.commit_media(&ticket, media.clone()).await {
                    Ok(media)
                } else {
                    Err(Error::Superseded)
                }
            }
            Err(e) => {
                session.end_run(&ticket).await;
                Err(e)
            }
        };

        match outcome {
            Ok(media) => {
                tracing::info!(url = %media.url, kind = %media.kind, "media ready");
                self.emit_event(Event::MediaReady {
                    media: media.clone(),
                });
                self.emit_status(ProgressLabel::Complete);
                self.emit_event(Event::Busy { active: false });
                Ok(media)
            }
            Err(e) if !e.is_user_visible() => {
                tracing::debug!(generation = ticket.generation(), "dropping superseded run");
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "generation failed");
                self.emit_status(ProgressLabel::Error);
                self.report_error(&e);
                self.emit_event(Event::Busy { active: false });
                Err(e)
            }
        }
    }

    async fn run(&self, asset: &AssetReference, ticket: &RunTicket) -> Result<MediaReference> {
        let mut job = self.submitter.submit(asset).await?;
        self.emit_status(ProgressLabel::Queued);

        let event_tx = self.event_tx.clone();
        let completed = self
            .poller
            .poll(&mut job, Some(ticket.cancel_token()), |attempt| {
                event_tx
                    .send(Event::Status {
                        label: ProgressLabel::Processing { attempt },
                    })
                    .ok();
            })
            .await?;

        resolve(completed.result.as_ref())
    }

    /// Export media through the fallback chain
    ///
    /// Always ends in an outcome; see [`DownloadFallbackChain`].
    pub async fn download(&self, media: &MediaReference) -> DownloadOutcome {
        self.export_chain.download(media).await
    }

    /// Clear the session and invalidate any run still in flight
    pub async fn reset(&self, session: &Session) {
        session.reset().await;
        self.render_cache.clear().await;
        self.emit_event(Event::SessionReset);
        self.emit_status(ProgressLabel::Idle);
        self.emit_event(Event::Busy { active: false });
    }

    fn emit_status(&self, label: ProgressLabel) {
        self.emit_event(Event::Status { label });
    }

    fn report_error(&self, error: &Error) {
        self.emit_event(Event::Error {
            message: error.to_string(),
        });
    }

    fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}
