//! Subscriber registry - id-keyed delivery channels behind one mutex

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use alerttypes::Alert;

/// A registered subscriber's delivery channel and cancellation handle
#[derive(Clone)]
pub struct Listener {
    pub tx: mpsc::Sender<Alert>,
    pub done: CancellationToken,
}

struct RegistryInner {
    next: u64,
    listeners: HashMap<u64, Listener>,
}

/// Registry of live subscribers.
///
/// All access goes through short critical sections on a single mutex; the
/// lock is never held while sending on a channel or walking the store.
/// Broadcast callers take a copy of the current listeners via
/// [`Registry::snapshot`] and deliver with the lock released.
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next: 0,
                listeners: HashMap::new(),
            }),
        }
    }

    /// Register a listener and return its id
    pub fn add(&self, tx: mpsc::Sender<Alert>, done: CancellationToken) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.next;
        inner.next += 1;
        inner.listeners.insert(id, Listener { tx, done });
        debug!(id, total = inner.listeners.len(), "listener registered");
        id
    }

    /// Remove a listener. Idempotent: removing an unknown id is a no-op.
    ///
    /// Only the subscriber's own teardown path calls this, so a finished
    /// subscriber can never race an external remover.
    pub fn remove(&self, id: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.listeners.remove(&id).is_some() {
            debug!(id, total = inner.listeners.len(), "listener removed");
        }
    }

    /// Copy of the current listeners, for delivery with the lock released
    pub fn snapshot(&self) -> Vec<Listener> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.listeners.values().cloned().collect()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
