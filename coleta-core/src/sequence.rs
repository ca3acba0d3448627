//! Ordering guards for overlapping asynchronous queries.
//!
//! Each outgoing query is tagged with a ticket from a [`QuerySequencer`].
//! A response is only applied while its ticket is still the latest one
//! issued, so a slow answer to an old keystroke can never overwrite the
//! suggestions for the current input.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Monotonically increasing query tag.
pub struct SearchTicket(u64);

#[derive(Debug, Default)]
/// Issues tickets and tells whether a ticket is still current.
pub struct QuerySequencer {
    latest: AtomicU64,
}

impl QuerySequencer {
    /// Create a sequencer with no tickets issued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, making every earlier ticket stale.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Make every outstanding ticket stale without issuing a new one.
    pub fn supersede(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `ticket` is the most recently issued one.
    #[must_use]
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Unwrap a response if it is still current, dropping it otherwise.
    pub fn accept<T>(&self, response: Sequenced<T>) -> Option<T> {
        if self.is_current(response.ticket) {
            Some(response.value)
        } else {
            debug!(ticket = response.ticket.0, "discarding stale response");
            None
        }
    }
}

#[derive(Debug)]
/// A value tagged with the ticket of the query that produced it.
pub struct Sequenced<T> {
    /// Ticket issued when the query was scheduled.
    pub ticket: SearchTicket,
    /// Query result.
    pub value: T,
}

/// Runs only the most recently scheduled job, after a quiet period.
///
/// Scheduling a job aborts the pending one and issues a fresh ticket, so only
/// the last keystroke within the delay reaches the provider.
pub struct Debouncer<T> {
    delay: Duration,
    sequencer: Arc<QuerySequencer>,
    sender: UnboundedSender<Sequenced<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer delivering results to `sender`.
    #[must_use]
    pub fn new(delay: Duration, sequencer: Arc<QuerySequencer>, sender: UnboundedSender<Sequenced<T>>) -> Self {
        Self {
            delay,
            sequencer,
            sender,
            pending: None,
        }
    }

    /// Sequencer shared with the receiving side.
    #[must_use]
    pub fn sequencer(&self) -> &Arc<QuerySequencer> {
        &self.sequencer
    }

    /// Replace any pending job with `job`, to run after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, job: F) -> SearchTicket
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.cancel();
        let ticket = self.sequencer.issue();
        let delay = self.delay;
        let sender = self.sender.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let value = job.await;
            if sender.send(Sequenced { ticket, value }).is_err() {
                debug!("debounced result dropped, receiver closed");
            }
        }));

        ticket
    }

    /// Abort the pending job, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
