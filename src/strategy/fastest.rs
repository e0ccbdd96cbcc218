//! Empirical fastest-of-N selection.
//!
//! The selector ranks the candidates of a single output variable purely by
//! measured cost. It cycles through the candidate list round-robin until
//! every candidate has `exploration_trials` observations, then settles on
//! the one with the lowest running cost mean, re-probing a non-selected
//! candidate every `reprobe_every`-th observation so a drifting cost
//! landscape can unseat an early winner.
//!
//! [`Tuner::fastest_of`](crate::Tuner::fastest_of) wires this strategy to an
//! implicitly declared variant-index variable; it works just as well on any
//! explicitly declared variable with a discrete candidate set.

use super::{SelectionRequest, Strategy};
use crate::value::Value;

/// Fastest-of-N candidate selector.
///
/// # Configuration
///
/// | Option | Default | Description |
/// |--------|---------|-------------|
/// | `exploration_trials` | 3 | Observations required per candidate before exploitation begins |
/// | `reprobe_every` | 20 | Re-probe a non-selected candidate every Nth observation; 0 disables |
pub struct FastestOf {
    exploration_trials: u64,
    reprobe_every: u64,
}

impl FastestOf {
    /// Creates a selector with the default exploration budget and re-probe
    /// cadence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exploration_trials: 3,
            reprobe_every: 20,
        }
    }

    /// Observations required per candidate before exploitation begins.
    #[must_use]
    pub fn exploration_trials(mut self, trials: u64) -> Self {
        self.exploration_trials = trials.max(1);
        self
    }

    /// Re-probe a non-selected candidate every `every`-th observation once
    /// exploration is complete. `0` disables re-probing (permanent lock-in
    /// once a winner is found).
    #[must_use]
    pub fn reprobe_every(mut self, every: u64) -> Self {
        self.reprobe_every = every;
        self
    }
}

impl Default for FastestOf {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for FastestOf {
    fn select(&self, request: &SelectionRequest<'_>) -> Vec<Value> {
        let [slot] = request.outputs else {
            // This selector ranks exactly one variable. Let the domain check
            // surface a multi-slot misuse instead of guessing.
            return request.defaults();
        };

        let candidates = slot.variable.domain().candidates();
        if candidates.is_empty() {
            // An open range narrower than its step discretizes to nothing.
            return request.defaults();
        }
        let id = slot.variable.id();

        // Per-candidate statistics. An assignment matches a candidate when
        // its value for the ranked variable equals that candidate.
        let mut counts = vec![0u64; candidates.len()];
        let mut means = vec![f64::INFINITY; candidates.len()];
        for (assignment, entry) in request.history {
            let Some((_, value)) = assignment.iter().find(|(vid, _)| *vid == id) else {
                continue;
            };
            if let Some(i) = candidates.iter().position(|c| c == value) {
                counts[i] += entry.count;
                means[i] = entry.mean;
            }
        }

        // Exploration: round-robin until every candidate has its quota.
        // Picking the least-observed under-quota candidate (lowest index on
        // ties) visits candidates in cyclic order as observations land.
        let under_quota = counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c < self.exploration_trials)
            .min_by_key(|&(i, &c)| (c, i));
        if let Some((i, _)) = under_quota {
            return vec![candidates[i]];
        }

        // Exploitation: lowest mean wins, ties broken by lowest index.
        let mut best = 0;
        for (i, &mean) in means.iter().enumerate() {
            if mean < means[best] {
                best = i;
            }
        }

        // Periodic re-probe of the least-observed non-winner, so drift in
        // the cost landscape is eventually noticed.
        if self.reprobe_every > 0 && request.total_observations % self.reprobe_every == 0 {
            let probe = counts
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != best)
                .min_by_key(|&(i, &c)| (c, i));
            if let Some((i, _)) = probe {
                trace_debug!(candidate = i, "re-probing non-selected candidate");
                return vec![candidates[i]];
            }
        }

        vec![candidates[best]]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::history::{Assignment, HistoryEntry, InstanceKey};
    use crate::strategy::OutputSlot;
    use crate::value::ValueKind;
    use crate::variable::{Category, Domain, Variable, VariableId};

    fn slot(n: i64) -> OutputSlot {
        OutputSlot {
            variable: Arc::new(Variable {
                id: VariableId(0),
                name: "variant".to_owned(),
                kind: ValueKind::Int64,
                category: Category::Categorical,
                domain: Domain::int_range(0, n - 1, 1),
            }),
            default: Value::Int(0),
        }
    }

    fn entry(variant: i64, count: u64, mean: f64) -> (Assignment, HistoryEntry) {
        (vec![(VariableId(0), Value::Int(variant))], HistoryEntry { count, mean })
    }

    fn select(strategy: &FastestOf, slots: &[OutputSlot], history: &[(Assignment, HistoryEntry)]) -> i64 {
        let total = history.iter().map(|(_, e)| e.count).sum();
        let request = SelectionRequest {
            key: InstanceKey(0),
            outputs: slots,
            history,
            total_observations: total,
        };
        strategy.select(&request)[0].as_int().unwrap()
    }

    #[test]
    fn exploration_cycles_round_robin() {
        let strategy = FastestOf::new().exploration_trials(2);
        let slots = [slot(3)];

        assert_eq!(select(&strategy, &slots, &[]), 0);
        assert_eq!(select(&strategy, &slots, &[entry(0, 1, 5.0)]), 1);
        assert_eq!(
            select(&strategy, &slots, &[entry(0, 1, 5.0), entry(1, 1, 5.0)]),
            2
        );
        // Second lap.
        assert_eq!(
            select(
                &strategy,
                &slots,
                &[entry(0, 1, 5.0), entry(1, 1, 5.0), entry(2, 1, 5.0)]
            ),
            0
        );
    }

    #[test]
    fn exploitation_picks_argmin() {
        let strategy = FastestOf::new().exploration_trials(1).reprobe_every(0);
        let slots = [slot(3)];
        let history = [entry(0, 3, 10.0), entry(1, 3, 5.0), entry(2, 3, 1.0)];
        assert_eq!(select(&strategy, &slots, &history), 2);
    }

    #[test]
    fn ties_break_to_lowest_index() {
        let strategy = FastestOf::new().exploration_trials(1).reprobe_every(0);
        let slots = [slot(3)];
        let history = [entry(0, 2, 4.0), entry(1, 2, 4.0), entry(2, 2, 9.0)];
        assert_eq!(select(&strategy, &slots, &history), 0);
    }

    #[test]
    fn reprobe_targets_least_observed_loser() {
        let strategy = FastestOf::new().exploration_trials(1).reprobe_every(10);
        let slots = [slot(3)];
        // Total is 20, divisible by the cadence, so this call re-probes.
        let history = [entry(0, 5, 4.0), entry(1, 14, 1.0), entry(2, 1, 9.0)];
        assert_eq!(select(&strategy, &slots, &history), 2);
    }

    #[test]
    fn reprobe_disabled_locks_in_winner() {
        let strategy = FastestOf::new().exploration_trials(1).reprobe_every(0);
        let slots = [slot(2)];
        let history = [entry(0, 10, 4.0), entry(1, 10, 1.0)];
        assert_eq!(select(&strategy, &slots, &history), 1);
    }
}
