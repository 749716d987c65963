//! Per-user session state
//!
//! A [`Session`] replaces ambient global state: it holds the current uploaded
//! asset, the last generated media and a generation counter. The caller owns it
//! and passes it to each orchestrator operation. Resetting is an explicit
//! operation that also invalidates any run still in flight.

use crate::types::{AssetReference, MediaReference};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct SessionState {
    asset: Option<AssetReference>,
    last_media: Option<MediaReference>,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

/// Handle to one user's session
///
/// Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

/// Ticket identifying one generation run
///
/// Obtained from [`Session::begin_run`]; results are only committed while the
/// ticket is still current.
#[derive(Clone, Debug)]
pub struct RunTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl RunTicket {
    /// Generation this run belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token cancelled when the run is superseded
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Asset the next generation will use
    pub async fn current_asset(&self) -> Option<AssetReference> {
        self.state.lock().await.asset.clone()
    }

    /// Store a freshly uploaded asset
    pub async fn set_asset(&self, asset: AssetReference) {
        self.state.lock().await.asset = Some(asset);
    }

    /// Most recent media produced in this session
    pub async fn last_media(&self) -> Option<MediaReference> {
        self.state.lock().await.last_media.clone()
    }

    /// Current generation counter
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Clear asset and media, and invalidate any in-flight run
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.asset = None;
        state.last_media = None;
        state.generation += 1;
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
        tracing::debug!(generation = state.generation, "session reset");
    }

    /// Start a new run, superseding the previous one
    pub(crate) async fn begin_run(&self) -> RunTicket {
        let mut state = self.state.lock().await;
        state.generation += 1;
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        state.in_flight = Some(cancel.clone());
        RunTicket {
            generation: state.generation,
            cancel,
        }
    }

    /// Whether `ticket` still belongs to the latest run
    pub async fn is_current(&self, ticket: &RunTicket) -> bool {
        self.state.lock().await.generation == ticket.generation
    }

    /// Record the run's media if the run is still current
    ///
    /// Returns `false` when the run was superseded; nothing is stored then.
    pub(crate) async fn commit_media(&self, ticket: &RunTicket, media: MediaReference) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            return false;
        }
        state.last_media = Some(media);
        state.in_flight = None;
        true
    }

    /// Drop the in-flight marker of a run that ended without media
    pub(crate) async fn end_run(&self, ticket: &RunTicket) {
        let mut state = self.state.lock().await;
        if state.generation == ticket.generation {
            state.in_flight = None;
        }
    }
}
