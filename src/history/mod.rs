//! Per-instance observation history.
//!
//! The history store is the engine's only learned state: a map from
//! [`InstanceKey`] (the identity of a decision point) to the cost statistics
//! accumulated per candidate assignment. It lives for the whole process —
//! entries are never deleted — so repeated calls with the same problem shape
//! keep learning.
//!
//! The store is an explicit, injected collaborator with its own lifecycle,
//! never an implicit singleton: construct a fresh [`MemoryHistory`] per
//! [`Tuner`](crate::Tuner) (or per test) and drop it with the tuner.
//!
//! # Concurrency
//!
//! [`HistoryStore`] implementations must serialize read-modify-write updates
//! per key while allowing concurrent insertion of new keys. [`MemoryHistory`]
//! does this with an outer `RwLock` over the key map and one `Mutex` per key,
//! so observations for unrelated decision points never contend.
//!
//! # Failure model
//!
//! A `record` that cannot complete simply does not influence future
//! decisions; there is no partial-failure state to repair. Availability of
//! the caller's workload is favored over durability of learning.

mod memory;

pub use memory::MemoryHistory;

use crate::value::Value;
use crate::variable::VariableId;

/// Identity of a tuning decision point: derived from the context label, the
/// recorded input values, and the enclosing contexts' identities.
///
/// Two contexts with identical labels and input values share the same key —
/// and therefore the same learned statistics — even across unrelated call
/// sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceKey(pub(crate) u64);

impl core::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One concrete choice of values for a context's requested output variables,
/// in request order.
pub type Assignment = Vec<(VariableId, Value)>;

/// Accumulated statistics for one `(instance key, assignment)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    /// Number of recorded observations.
    pub count: u64,
    /// Running mean of observed execution costs, updated incrementally as
    /// `mean + (cost - mean) / (count + 1)`.
    pub mean: f64,
}

impl HistoryEntry {
    /// Folds one observed cost into the running mean.
    pub(crate) fn observe(&mut self, cost: f64) {
        #[allow(clippy::cast_precision_loss)]
        {
            self.mean += (cost - self.mean) / (self.count + 1) as f64;
        }
        self.count += 1;
    }
}

/// Storage for per-instance observations.
///
/// The trait requires `Send + Sync`: the store is shared across all caller
/// threads of a [`Tuner`](crate::Tuner).
pub trait HistoryStore: Send + Sync {
    /// Appends one observation for `(key, assignment)`, updating its count
    /// and running cost mean.
    fn record(&self, key: InstanceKey, assignment: &[(VariableId, Value)], cost: f64);

    /// Returns the accumulated entries for `key`, or `None` if the key has
    /// never been observed (cold start).
    fn lookup(&self, key: InstanceKey) -> Option<Vec<(Assignment, HistoryEntry)>>;

    /// Total observations recorded under `key`, across all assignments.
    /// Strategies use this to decide phase transitions; the context manager
    /// uses it to detect that a cached assignment has gone stale.
    fn total_observations(&self, key: InstanceKey) -> u64;
}
