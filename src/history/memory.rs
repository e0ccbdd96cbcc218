use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{Assignment, HistoryEntry, HistoryStore, InstanceKey};
use crate::fingerprint::assignment_fingerprint;
use crate::value::Value;
use crate::variable::VariableId;

/// In-process observation history (the default).
///
/// Keys map to independently locked buckets, so concurrent observations for
/// unrelated decision points proceed without contention while updates to the
/// same key serialize.
#[derive(Default)]
pub struct MemoryHistory {
    buckets: RwLock<HashMap<InstanceKey, Arc<Mutex<Bucket>>>>,
}

#[derive(Default)]
struct Bucket {
    entries: HashMap<u64, (Assignment, HistoryEntry)>,
    total: u64,
}

impl MemoryHistory {
    /// Creates a new, empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All instance keys with at least one observation, in no particular
    /// order.
    #[must_use]
    pub fn keys(&self) -> Vec<InstanceKey> {
        self.buckets.read().keys().copied().collect()
    }

    fn bucket(&self, key: InstanceKey) -> Option<Arc<Mutex<Bucket>>> {
        self.buckets.read().get(&key).cloned()
    }

    fn bucket_or_insert(&self, key: InstanceKey) -> Arc<Mutex<Bucket>> {
        if let Some(bucket) = self.bucket(key) {
            return bucket;
        }
        self.buckets.write().entry(key).or_default().clone()
    }
}

impl HistoryStore for MemoryHistory {
    fn record(&self, key: InstanceKey, assignment: &[(VariableId, Value)], cost: f64) {
        let bucket = self.bucket_or_insert(key);
        let mut bucket = bucket.lock();
        let fingerprint = assignment_fingerprint(assignment);
        let (_, entry) = bucket
            .entries
            .entry(fingerprint)
            .or_insert_with(|| (assignment.to_vec(), HistoryEntry::default()));
        entry.observe(cost);
        bucket.total += 1;
        trace_debug!(%key, cost, "recorded observation");
    }

    fn lookup(&self, key: InstanceKey) -> Option<Vec<(Assignment, HistoryEntry)>> {
        let bucket = self.bucket(key)?;
        let bucket = bucket.lock();
        Some(bucket.entries.values().cloned().collect())
    }

    fn total_observations(&self, key: InstanceKey) -> u64 {
        self.bucket(key).map_or(0, |bucket| bucket.lock().total)
    }
}
