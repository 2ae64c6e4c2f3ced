//! Expiring alert store
//!
//! Fingerprint-keyed map of alert records with a background garbage
//! collection sweep. Resolved records (activity window fully in the past)
//! are evicted on each sweep, and a caller-registered callback is invoked
//! once per evicted record so dependent state can be cleared.
//!
//! All methods are safe to call concurrently; the map lock is never held
//! while the eviction callback runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use alerttypes::{Alert, AlertError, Fingerprint};

type EvictionCallback = Box<dyn Fn(&Alert) + Send + Sync>;

struct Inner {
    alerts: Mutex<HashMap<Fingerprint, Alert>>,
    callback: Mutex<Option<EvictionCallback>>,
}

/// Handle to the store; cheap to clone, all clones share state
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Create a store and spawn its GC sweep.
    ///
    /// The sweep runs every `gc_interval` until `token` is cancelled.
    pub fn new(token: CancellationToken, gc_interval: Duration) -> Self {
        let store = Self {
            inner: Arc::new(Inner {
                alerts: Mutex::new(HashMap::new()),
                callback: Mutex::new(None),
            }),
        };

        let sweep = store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(gc_interval);
            info!(?gc_interval, "store GC sweep started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("store GC sweep stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = sweep.evict_resolved();
                        if evicted > 0 {
                            debug!(evicted, "evicted resolved alerts");
                        }
                    }
                }
            }
        });

        store
    }

    /// Register the eviction callback.
    ///
    /// Replaces any previously registered callback. The callback runs on the
    /// sweep task with the map lock released, so it may call back into other
    /// components without risking lock reentrancy.
    pub fn set_eviction_callback(&self, callback: impl Fn(&Alert) + Send + Sync + 'static) {
        let mut slot = self.inner.callback.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Box::new(callback));
    }

    /// Look up the alert stored under a fingerprint
    pub fn get(&self, fp: Fingerprint) -> Result<Alert, AlertError> {
        self.inner
            .alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&fp)
            .cloned()
            .ok_or(AlertError::NotFound(fp))
    }

    /// Insert or replace the alert stored under its fingerprint
    pub fn set(&self, alert: Alert) -> Result<(), AlertError> {
        let fp = alert.fingerprint();
        self.inner
            .alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(fp, alert);
        Ok(())
    }

    /// Snapshot of the current contents.
    ///
    /// Reflects the map at the moment of the call; inserts after the call
    /// returns are not included.
    pub fn list(&self) -> Vec<Alert> {
        self.inner
            .alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Number of stored alerts
    pub fn count(&self) -> usize {
        self.inner.alerts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Remove resolved records and fire the eviction callback for each.
    ///
    /// Eviction happens under the map lock; callbacks run after it is
    /// released.
    fn evict_resolved(&self) -> usize {
        let now = Utc::now();
        let evicted: Vec<Alert> = {
            let mut alerts = self.inner.alerts.lock().unwrap_or_else(|e| e.into_inner());
            let expired: Vec<Fingerprint> = alerts
                .iter()
                .filter(|(_, alert)| alert.resolved_at(now))
                .map(|(fp, _)| *fp)
                .collect();
            expired.iter().filter_map(|fp| alerts.remove(fp)).collect()
        };

        if !evicted.is_empty() {
            let slot = self.inner.callback.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(callback) = slot.as_ref() {
                for alert in &evicted {
                    callback(alert);
                }
            }
        }

        evicted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::mpsc;

    fn alert(name: &str, start_min: i64, end_min: i64) -> Alert {
        let t0 = Utc::now();
        let labels = [("alertname".to_string(), name.to_string())].into_iter().collect();
        Alert::new(
            labels,
            t0 + ChronoDuration::minutes(start_min),
            t0 + ChronoDuration::minutes(end_min),
        )
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let store = Store::new(CancellationToken::new(), Duration::from_secs(3600));
        let a = alert("x", 0, 10);
        let fp = a.fingerprint();

        store.set(a.clone()).unwrap();
        assert_eq!(store.get(fp).unwrap(), a);
    }

    #[tokio::test]
    async fn test_get_miss_is_not_found() {
        let store = Store::new(CancellationToken::new(), Duration::from_secs(3600));
        assert!(matches!(store.get(Fingerprint(1)), Err(AlertError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_snapshot() {
        let store = Store::new(CancellationToken::new(), Duration::from_secs(3600));
        store.set(alert("a", 0, 10)).unwrap();

        let snapshot = store.list();
        store.set(alert("b", 0, 10)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_sweep_evicts_resolved_and_fires_callback() {
        let store = Store::new(CancellationToken::new(), Duration::from_millis(20));
        let (tx, rx) = mpsc::channel();
        store.set_eviction_callback(move |a| {
            let _ = tx.send(a.fingerprint());
        });

        let resolved = alert("gone", -20, -10);
        let active = alert("here", -5, 60);
        let resolved_fp = resolved.fingerprint();
        store.set(resolved).unwrap();
        store.set(active.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(rx.try_recv().unwrap(), resolved_fp);
        assert!(matches!(store.get(resolved_fp), Err(AlertError::NotFound(_))));
        assert_eq!(store.get(active.fingerprint()).unwrap(), active);
    }

    #[tokio::test]
    async fn test_cancel_stops_sweep() {
        let token = CancellationToken::new();
        let store = Store::new(token.clone(), Duration::from_millis(20));
        let (tx, rx) = mpsc::channel();
        store.set_eviction_callback(move |a| {
            let _ = tx.send(a.fingerprint());
        });

        token.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        store.set(alert("gone", -20, -10)).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(store.count(), 1);
    }
}
