//! Alert provider: canonical alert set plus live change distribution
//!
//! Consumers either take a one-shot snapshot ([`AlertProvider::get_pending`])
//! or a live subscription ([`AlertProvider::subscribe`]): a snapshot of the
//! store followed by a continuous stream of subsequent inserts, delivered on
//! the same channel.

mod iterator;
mod mem;
mod registry;

pub use iterator::AlertIterator;
pub use mem::MemAlerts;
pub use registry::{Listener, Registry};

use async_trait::async_trait;

use alerttypes::{Alert, AlertError, Fingerprint};

/// Access to a set of alerts. All methods are safe to call concurrently.
#[async_trait]
pub trait AlertProvider: Send + Sync {
    /// Iterator over the current alerts followed by a live stream of
    /// subsequent inserts
    fn subscribe(&self) -> AlertIterator;

    /// Iterator over the current alerts only; never sees later inserts
    fn get_pending(&self) -> AlertIterator;

    /// The alert stored under a fingerprint
    fn get(&self, fp: Fingerprint) -> Result<Alert, AlertError>;

    /// Insert the given alerts, merging overlapping occurrences of the same
    /// fingerprint, and broadcast each result to every subscriber
    async fn put(&self, alerts: Vec<Alert>) -> Result<(), AlertError>;

    /// Shut down: stop the store sweep and terminate all outstanding
    /// iterators. Safe to call more than once.
    fn close(&self) -> Result<(), AlertError>;
}
