//! AlertIterator - cancellable lazy sequence of alert records

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use alerttypes::{Alert, AlertError};

/// Slot a producer may fill if it terminates abnormally.
///
/// The in-memory provider's own producers never fail, but the iterator
/// contract carries the slot for producers that can.
pub type ErrorSlot = Arc<Mutex<Option<AlertError>>>;

/// A lazy sequence of alert records backed by a bounded channel.
///
/// The sequence ends when the producer closes the channel; it cannot be
/// restarted. Consumers call [`AlertIterator::close`] to signal loss of
/// interest, which stops the producer within one buffered-item latency.
pub struct AlertIterator {
    rx: mpsc::Receiver<Alert>,
    done: CancellationToken,
    err: ErrorSlot,
}

impl AlertIterator {
    /// Wrap a delivery channel and its cancellation handle
    pub fn new(rx: mpsc::Receiver<Alert>, done: CancellationToken) -> Self {
        Self::with_error(rx, done, ErrorSlot::default())
    }

    /// Wrap a channel whose producer reports failures through `err`
    pub fn with_error(rx: mpsc::Receiver<Alert>, done: CancellationToken, err: ErrorSlot) -> Self {
        Self { rx, done, err }
    }

    /// Next record, or `None` once the producer has shut down.
    ///
    /// Channel closure without an error value is the normal end of stream,
    /// not a failure.
    pub async fn next(&mut self) -> Option<Alert> {
        self.rx.recv().await
    }

    /// Next record if one is already buffered
    pub fn try_next(&mut self) -> Option<Alert> {
        self.rx.try_recv().ok()
    }

    /// Signal that the consumer is no longer interested.
    ///
    /// Safe to call any number of times, including after the sequence is
    /// exhausted.
    pub fn close(&self) {
        self.done.cancel();
    }

    /// Error from a producer that terminated abnormally, if any
    pub fn err(&self) -> Option<AlertError> {
        self.err.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Drop for AlertIterator {
    fn drop(&mut self) {
        // A dropped consumer is an implicit close; the producer must not
        // park forever on a channel nobody reads.
        self.done.cancel();
    }
}
