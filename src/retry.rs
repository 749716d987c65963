//! Bounded fixed-interval polling
//!
//! [`PollConfig`] is a plain policy value (attempt budget and interval).
//! [`poll_until`] drives an async status check through the policy's
//! [`schedule`](PollConfig::schedule): it stops on the
//! first ready value, propagates operation errors untouched, and gives up when
//! the attempt after the last budgeted one would be scheduled, so the request
//! count never exceeds the budget.
//!
//! # Example
//!
//! ```no_run
//! use effect_gen::config::PollConfig;
//! use effect_gen::retry::{PollStep, poll_until};
//!
//! # async fn example() {
//! let policy = PollConfig::default();
//! let result = poll_until(&policy, None, |attempt| println!("pending ({attempt})"), || async {
//!     Ok::<_, std::io::Error>(PollStep::Ready("done"))
//! })
//! .await;
//! # }
//! ```

use crate::config::PollConfig;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of a single poll operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Terminal value; polling stops
    Ready(T),
    /// Not finished yet; wait and ask again
    Pending,
}

/// Why [`poll_until`] stopped without a ready value
#[derive(Debug)]
pub enum PollStop<E> {
    /// The operation itself failed
    Failed(E),
    /// Every allowed attempt returned `Pending`
    Exhausted {
        /// Number of operations that were run
        attempts: u32,
    },
    /// The cancellation token fired while waiting
    Cancelled {
        /// Number of operations that were run before cancellation
        attempts: u32,
    },
}

impl PollConfig {
    /// Delays following each pending response
    ///
    /// Yields `max_attempts` copies of `interval`. The first request is sent
    /// immediately; the wait after the last pending response ends in a timeout
    /// instead of another request.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(move |_| self.interval)
    }

    /// Upper bound on time spent waiting before a timeout is declared
    ///
    /// Saturates at [`Duration::MAX`] for budgets that would overflow.
    pub fn total_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Run `operation` until it is ready, fails, or the policy's budget is spent
///
/// # Arguments
///
/// * `policy` - Attempt budget and fixed interval
/// * `cancel` - Optional token; cancellation is observed while waiting
/// * `on_pending` - Called with the 1-based attempt number after each pending response
/// * `operation` - Async closure performing one attempt
///
/// # Returns
///
/// The ready value, or a [`PollStop`] explaining why polling ended.
pub async fn poll_until<F, Fut, T, E, P>(
    policy: &PollConfig,
    cancel: Option<&CancellationToken>,
    mut on_pending: P,
    mut operation: F,
) -> Result<T, PollStop<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStep<T>, E>>,
    P: FnMut(u32),
{
    let mut attempts = 0;
    let mut delays = policy.schedule().peekable();

    loop {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(PollStop::Cancelled { attempts });
        }

        let step = operation().await.map_err(PollStop::Failed)?;
        attempts += 1;

        match step {
            PollStep::Ready(value) => {
                tracing::debug!(attempts, "poll reached a terminal response");
                return Ok(value);
            }
            PollStep::Pending => {
                on_pending(attempts);

                let Some(delay) = delays.next() else {
                    tracing::warn!(attempts, "poll budget is empty");
                    return Err(PollStop::Exhausted { attempts });
                };

                match cancel {
                    Some(token) => {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => {
                                return Err(PollStop::Cancelled { attempts });
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }

                // the budget is checked when the next attempt would be scheduled
                if delays.peek().is_none() {
                    tracing::warn!(
                        attempts,
                        max_attempts = policy.max_attempts,
                        "poll budget exhausted"
                    );
                    return Err(PollStop::Exhausted { attempts });
                }
            }
        }
    }
}
