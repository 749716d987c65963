//! Ordered export with failure isolation

use super::open::{MANUAL_SAVE_MESSAGE, OpenReferenceSink};
use super::traits::ExportSink;
use crate::types::{DownloadOutcome, Event, MediaReference, StrategyFailure};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Tries export sinks in order until one succeeds
///
/// Each sink runs in its own task, so neither an error nor a panic inside one
/// sink reaches the caller; it is recorded and the next sink is tried. When
/// every sink has failed or been skipped, the terminal [`OpenReferenceSink`]
/// runs exactly once. A download therefore always ends in a
/// [`DownloadOutcome`].
pub struct DownloadFallbackChain {
    sinks: Vec<Arc<dyn ExportSink>>,
    terminal: OpenReferenceSink,
    events: Option<broadcast::Sender<Event>>,
}

impl DownloadFallbackChain {
    /// Create a chain with only the terminal fallback
    pub fn new(terminal: OpenReferenceSink) -> Self {
        Self {
            sinks: Vec::new(),
            terminal,
            events: None,
        }
    }

    /// Append a sink, tried after the ones already added
    pub fn with_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Publish download events on `events`
    pub fn with_events(mut self, events: broadcast::Sender<Event>) -> Self {
        self.events = Some(events);
        self
    }

    /// Names of the sinks in attempt order, terminal fallback last
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.sinks
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.terminal.name()))
            .collect()
    }

    /// Export `media`, falling back through the chain
    pub async fn download(&self, media: &MediaReference) -> DownloadOutcome {
        self.emit(Event::DownloadStarted {
            url: media.url.clone(),
        });

        let mut failures = Vec::new();

        for sink in &self.sinks {
            let name = sink.name();

            if !sink.applies_to(media) {
                tracing::debug!(strategy = name, kind = %media.kind, "strategy skipped");
                failures.push(StrategyFailure {
                    strategy: name.to_string(),
                    reason: format!("not applicable to {} media", media.kind),
                });
                continue;
            }

            tracing::debug!(strategy = name, url = %media.url, "trying export strategy");

            let task_sink = Arc::clone(sink);
            let task_media = media.clone();
            let attempt =
                tokio::spawn(async move { task_sink.export(&task_media).await }).await;

            let reason = match attempt {
                Ok(Ok(result)) => {
                    tracing::info!(strategy = name, result = ?result, "media exported");
                    return self.finish(DownloadOutcome { result, failures });
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("strategy aborted: {}", e),
            };

            tracing::warn!(strategy = name, reason = %reason, "export strategy failed");
            failures.push(StrategyFailure {
                strategy: name.to_string(),
                reason,
            });
        }

        self.emit(Event::ManualSaveRequired {
            url: media.url.clone(),
            message: MANUAL_SAVE_MESSAGE.to_string(),
        });
        let result = self.terminal.open_reference(media).await;
        tracing::info!(url = %media.url, "media handed off for manual saving");

        self.finish(DownloadOutcome { result, failures })
    }

    fn finish(&self, outcome: DownloadOutcome) -> DownloadOutcome {
        self.emit(Event::DownloadFinished {
            outcome: outcome.clone(),
        });
        outcome
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            // send() returns Err if there are no receivers, which is fine - we just drop the event
            events.send(event).ok();
        }
    }
}
