//! In-memory alert provider

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use alerttypes::{Alert, AlertError, Fingerprint, Marker};
use expirestore::Store;

use super::iterator::AlertIterator;
use super::registry::Registry;
use super::AlertProvider;

/// Default capacity of each subscriber's delivery channel.
///
/// This is the backpressure boundary: once a subscriber's channel is full,
/// writers block until it drains or the subscription is cancelled. Alerts
/// are never dropped.
pub const DEFAULT_CAPACITY: usize = 200;

/// Alert provider backed by an expiring in-memory store.
///
/// Owns the store for its own lifetime and maintains the registry of live
/// subscribers. All methods are safe to call concurrently.
pub struct MemAlerts {
    store: Store,
    listeners: Arc<Registry>,
    token: CancellationToken,
    closed: AtomicBool,
    capacity: usize,
}

impl MemAlerts {
    /// Create a provider bound to a parent cancellation scope.
    ///
    /// The store's GC sweep runs every `gc_interval` on a token derived from
    /// `parent`; whenever the sweep evicts a record, `marker` is notified
    /// with the record's fingerprint so dependent state can be cleared.
    pub fn new(
        parent: &CancellationToken,
        marker: Arc<dyn Marker>,
        gc_interval: Duration,
    ) -> Result<Self, AlertError> {
        Self::with_capacity(parent, marker, gc_interval, DEFAULT_CAPACITY)
    }

    /// Create a provider with a custom subscriber channel capacity
    pub fn with_capacity(
        parent: &CancellationToken,
        marker: Arc<dyn Marker>,
        gc_interval: Duration,
        capacity: usize,
    ) -> Result<Self, AlertError> {
        let token = parent.child_token();
        let store = Store::new(token.clone(), gc_interval);
        store.set_eviction_callback(move |alert| {
            marker.delete(alert.fingerprint());
        });

        info!(?gc_interval, capacity, "alert provider created");
        Ok(Self {
            store,
            listeners: Arc::new(Registry::new()),
            token,
            closed: AtomicBool::new(false),
            capacity,
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl AlertProvider for MemAlerts {
    /// Subscribe to the current alerts and all subsequent inserts.
    ///
    /// The returned iterator first yields a snapshot of the store taken at
    /// subscribe time, then stays open delivering every later [`put`]. Every
    /// record present at subscribe time and every record inserted afterwards
    /// is offered exactly once per insert; records for different
    /// fingerprints may arrive in any order.
    ///
    /// If a live insert for a fingerprint races the snapshot walk, the
    /// subscriber may momentarily see the stale snapshot value after the
    /// updated one. Serializing the two would require holding locks across
    /// the snapshot walk and stall writers, so the weaker guarantee stands.
    ///
    /// [`put`]: AlertProvider::put
    fn subscribe(&self) -> AlertIterator {
        let (tx, rx) = mpsc::channel(self.capacity);
        let done = self.token.child_token();
        let id = self.listeners.add(tx.clone(), done.clone());

        // Snapshot taken before this method returns, so "present at
        // subscribe time" has a definite meaning.
        let snapshot = self.store.list();
        let listeners = self.listeners.clone();
        let walk_done = done.clone();
        tokio::spawn(async move {
            for alert in snapshot {
                tokio::select! {
                    _ = walk_done.cancelled() => break,
                    res = tx.send(alert) => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
            }

            // Snapshot drained; live inserts now reach this channel through
            // the broadcast path in put. Park until cancelled.
            walk_done.cancelled().await;
            listeners.remove(id);
            debug!(id, "subscription ended");
            // tx drops here; the channel closes once any in-flight
            // broadcast clones drop as well.
        });

        AlertIterator::new(rx, done)
    }

    /// Snapshot-only iterator over the currently outstanding alerts.
    ///
    /// Never registered with the subscriber registry, so inserts after the
    /// call are not reflected. Cancellation is scoped to this iterator
    /// alone, independent of the provider's own lifetime.
    fn get_pending(&self) -> AlertIterator {
        let (tx, rx) = mpsc::channel(self.capacity);
        let done = CancellationToken::new();

        let snapshot = self.store.list();
        let walk_done = done.clone();
        tokio::spawn(async move {
            for alert in snapshot {
                tokio::select! {
                    _ = walk_done.cancelled() => break,
                    res = tx.send(alert) => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        AlertIterator::new(rx, done)
    }

    fn get(&self, fp: Fingerprint) -> Result<Alert, AlertError> {
        self.store.get(fp)
    }

    /// Insert the given alerts and broadcast each to every subscriber.
    ///
    /// Per record, in argument order: validate, merge with any stored record
    /// for the same fingerprint whose activity window overlaps, persist, and
    /// fan out. The recipient set is fixed when the call starts; a
    /// subscriber whose registration completes before that point receives
    /// the batch, one that joins later may not.
    ///
    /// A failure for one record never aborts the rest of the batch. Failures
    /// are logged and the first one is returned once the batch completes.
    async fn put(&self, alerts: Vec<Alert>) -> Result<(), AlertError> {
        let listeners = self.listeners.snapshot();
        let mut first_err: Option<AlertError> = None;

        for mut alert in alerts {
            if let Err(err) = alert.validate() {
                warn!(%err, "rejecting invalid alert");
                first_err.get_or_insert(err);
                continue;
            }

            let fp = alert.fingerprint();

            if let Ok(old) = self.store.get(fp) {
                // Merge if there is an overlap in activity range; otherwise
                // the new occurrence supersedes the stored one.
                if (alert.ends_at > old.starts_at && alert.ends_at < old.ends_at)
                    || (alert.starts_at > old.starts_at && alert.starts_at < old.ends_at)
                {
                    alert = old.merge(&alert);
                }
            }

            if let Err(err) = self.store.set(alert.clone()) {
                warn!(%fp, %err, "failed to persist alert");
                first_err.get_or_insert(err);
            }

            for listener in &listeners {
                tokio::select! {
                    _ = listener.done.cancelled() => {}
                    res = listener.tx.send(alert.clone()) => {
                        if res.is_err() {
                            // Subscriber tore down after the recipient
                            // snapshot was taken; nothing to deliver to.
                            debug!(%fp, "skipping departed subscriber");
                        }
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Cancel the provider's scope.
    ///
    /// Stops the store's GC sweep and terminates every outstanding
    /// subscription's producer, closing their channels. A second call is a
    /// no-op.
    fn close(&self) -> Result<(), AlertError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("closing alert provider");
            self.token.cancel();
        }
        Ok(())
    }
}
