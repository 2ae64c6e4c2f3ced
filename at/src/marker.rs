//! Marker - per-fingerprint state cleared on eviction

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::alert::Fingerprint;

/// Tracks downstream state keyed by fingerprint (e.g. which silences
/// currently apply to an alert).
///
/// The store's eviction callback calls [`Marker::delete`] from the sweep
/// task, so implementations must be safe to call from any thread and must
/// not block for long.
pub trait Marker: Send + Sync {
    /// Record the silences applying to a fingerprint
    fn set_silenced(&self, fp: Fingerprint, silence_ids: Vec<Uuid>);

    /// Silences currently applying to a fingerprint (empty if none)
    fn silenced(&self, fp: Fingerprint) -> Vec<Uuid>;

    /// Drop all state for a fingerprint.
    ///
    /// Invoked once per evicted record; deleting an unknown fingerprint is
    /// a no-op.
    fn delete(&self, fp: Fingerprint);
}

/// In-memory marker backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemMarker {
    marks: Mutex<HashMap<Fingerprint, Vec<Uuid>>>,
}

impl MemMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fingerprints with recorded state
    pub fn len(&self) -> usize {
        self.marks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Marker for MemMarker {
    fn set_silenced(&self, fp: Fingerprint, silence_ids: Vec<Uuid>) {
        let mut marks = self.marks.lock().unwrap_or_else(|e| e.into_inner());
        if silence_ids.is_empty() {
            marks.remove(&fp);
        } else {
            marks.insert(fp, silence_ids);
        }
    }

    fn silenced(&self, fp: Fingerprint) -> Vec<Uuid> {
        self.marks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&fp)
            .cloned()
            .unwrap_or_default()
    }

    fn delete(&self, fp: Fingerprint) {
        self.marks.lock().unwrap_or_else(|e| e.into_inner()).remove(&fp);
    }
}
