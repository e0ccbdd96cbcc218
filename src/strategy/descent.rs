//! Generic discrete/continuous candidate chooser.
//!
//! [`CoordinateDescent`] is the default strategy for any context label
//! without an explicit registration. It tunes each requested variable along
//! its own axis: all probes and scans hold the other variables at the
//! caller-supplied defaults, so an M-variable problem costs the sum of its
//! per-axis candidate counts rather than their product. The price is that
//! only per-axis optima are found, never joint ones — a deliberate tradeoff
//! for decision points with several loosely coupled knobs (chunk size,
//! thread count, schedule kind).
//!
//! # Phases
//!
//! 1. **Cold start** — with no observations at all, the caller-supplied
//!    default is returned per variable, exactly.
//! 2. **Exploration** — each `(variable, candidate)` pair is probed until it
//!    has `exploration_trials` observations, least-observed pair first.
//! 3. **Descent** — per variable, the candidate with the lowest observed
//!    cost mean wins; variables whose candidates were never observed keep
//!    their default. Every `reprobe_every`-th observation, one randomly
//!    chosen pair is probed again to track drift.

use fastrand::Rng;

use super::{SelectionRequest, Strategy};
use crate::fingerprint::{finalize, mix};
use crate::history::Assignment;
use crate::value::Value;

/// Coordinate-wise hill descent over candidate domains.
///
/// # Configuration
///
/// | Option | Default | Description |
/// |--------|---------|-------------|
/// | `exploration_trials` | 3 | Observations required per `(variable, candidate)` pair |
/// | `reprobe_every` | 20 | Re-probe one random pair every Nth observation; 0 disables |
/// | `seed` | 42 | Base seed for the deterministic re-probe choice |
pub struct CoordinateDescent {
    exploration_trials: u64,
    reprobe_every: u64,
    seed: u64,
}

impl CoordinateDescent {
    /// Creates a chooser with the default exploration budget, re-probe
    /// cadence, and seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exploration_trials: 3,
            reprobe_every: 20,
            seed: 42,
        }
    }

    /// Observations required per `(variable, candidate)` pair before the
    /// descent phase begins.
    #[must_use]
    pub fn exploration_trials(mut self, trials: u64) -> Self {
        self.exploration_trials = trials.max(1);
        self
    }

    /// Re-probe one random `(variable, candidate)` pair every `every`-th
    /// observation. `0` disables re-probing.
    #[must_use]
    pub fn reprobe_every(mut self, every: u64) -> Self {
        self.reprobe_every = every;
        self
    }

    /// Base seed for the re-probe choice. The choice is a pure function of
    /// `(seed, observation count)`, keeping selection idempotent between
    /// observations.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for CoordinateDescent {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CoordinateDescent {
    fn select(&self, request: &SelectionRequest<'_>) -> Vec<Value> {
        let defaults = request.defaults();
        if request.outputs.is_empty() || request.history.is_empty() {
            return defaults;
        }

        let candidates: Vec<Vec<Value>> = request
            .outputs
            .iter()
            .map(|slot| slot.variable.domain().candidates())
            .collect();

        // An axis probe: the default assignment with one coordinate varied.
        let probe = |axis: usize, value: Value| -> Assignment {
            request
                .outputs
                .iter()
                .enumerate()
                .map(|(i, slot)| {
                    let v = if i == axis { value } else { defaults[i] };
                    (slot.variable.id(), v)
                })
                .collect()
        };

        // Exploration: fill every (axis, candidate) pair up to its quota,
        // least-observed pair first.
        let mut thinnest: Option<(u64, usize, Value)> = None;
        for (axis, axis_candidates) in candidates.iter().enumerate() {
            for &candidate in axis_candidates {
                let count = request
                    .entry_for(&probe(axis, candidate))
                    .map_or(0, |entry| entry.count);
                if count < self.exploration_trials
                    && thinnest.is_none_or(|(c, _, _)| count < c)
                {
                    thinnest = Some((count, axis, candidate));
                }
            }
        }
        if let Some((_, axis, candidate)) = thinnest {
            return assignment_values(&probe(axis, candidate));
        }

        // Drift re-probe: one random pair, derived deterministically from
        // the observation count so selection stays idempotent.
        if self.reprobe_every > 0 && request.total_observations % self.reprobe_every == 0 {
            let mut rng = Rng::with_seed(finalize(mix(self.seed, request.total_observations)));
            let axis = rng.usize(..candidates.len());
            if !candidates[axis].is_empty() {
                let candidate = candidates[axis][rng.usize(..candidates[axis].len())];
                trace_debug!(axis, "re-probing candidate pair");
                return assignment_values(&probe(axis, candidate));
            }
        }

        // Descent: per axis, the observed candidate with the lowest cost
        // mean; axes with no observed candidate keep their default.
        let mut chosen = defaults.clone();
        for (axis, axis_candidates) in candidates.iter().enumerate() {
            let mut best: Option<(f64, Value)> = None;
            for &candidate in axis_candidates {
                if let Some(entry) = request.entry_for(&probe(axis, candidate))
                    && entry.count > 0
                    && best.is_none_or(|(mean, _)| entry.mean < mean)
                {
                    best = Some((entry.mean, candidate));
                }
            }
            if let Some((_, value)) = best {
                chosen[axis] = value;
            }
        }
        chosen
    }
}

fn assignment_values(assignment: &[(crate::variable::VariableId, Value)]) -> Vec<Value> {
    assignment.iter().map(|(_, v)| *v).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::history::{HistoryEntry, InstanceKey};
    use crate::strategy::OutputSlot;
    use crate::value::ValueKind;
    use crate::variable::{Category, Domain, Variable, VariableId};

    fn int_slot(id: u64, values: &[i64], default: i64) -> OutputSlot {
        OutputSlot {
            variable: Arc::new(Variable {
                id: VariableId(id),
                name: format!("v{id}"),
                kind: ValueKind::Int64,
                category: Category::Ordinal,
                domain: Domain::set(values.iter().copied()),
            }),
            default: Value::Int(default),
        }
    }

    fn request<'a>(
        outputs: &'a [OutputSlot],
        history: &'a [(Assignment, HistoryEntry)],
    ) -> SelectionRequest<'a> {
        SelectionRequest {
            key: InstanceKey(0),
            outputs,
            history,
            total_observations: history.iter().map(|(_, e)| e.count).sum(),
        }
    }

    #[test]
    fn cold_start_returns_defaults_exactly() {
        let strategy = CoordinateDescent::new();
        let slots = [int_slot(0, &[1, 2, 4], 2), int_slot(1, &[8, 16], 16)];
        let values = strategy.select(&request(&slots, &[]));
        assert_eq!(values, vec![Value::Int(2), Value::Int(16)]);
    }

    #[test]
    fn exploration_probes_one_axis_at_a_time() {
        let strategy = CoordinateDescent::new().exploration_trials(1);
        let slots = [int_slot(0, &[1, 2], 1), int_slot(1, &[8, 16], 8)];
        let history = [(
            vec![(VariableId(0), Value::Int(1)), (VariableId(1), Value::Int(8))],
            HistoryEntry { count: 1, mean: 3.0 },
        )];
        let values = strategy.select(&request(&slots, &history));
        // One coordinate differs from the defaults, the other is held there.
        let off_default = [values[0] != Value::Int(1), values[1] != Value::Int(8)];
        assert_eq!(off_default.iter().filter(|&&d| d).count(), 1, "{values:?}");
    }

    #[test]
    fn descent_picks_per_axis_argmin() {
        let strategy = CoordinateDescent::new().exploration_trials(1).reprobe_every(0);
        let slots = [int_slot(0, &[1, 2], 1), int_slot(1, &[8, 16], 8)];
        let entry = |a: i64, b: i64, mean: f64| {
            (
                vec![(VariableId(0), Value::Int(a)), (VariableId(1), Value::Int(b))],
                HistoryEntry { count: 2, mean },
            )
        };
        // Axis 0 scanned at b=8 (the default); axis 1 scanned at a=1.
        let history = [
            entry(1, 8, 10.0),
            entry(2, 8, 4.0),
            entry(1, 16, 2.0),
        ];
        let values = strategy.select(&request(&slots, &history));
        assert_eq!(values, vec![Value::Int(2), Value::Int(16)]);
    }

    #[test]
    fn selection_is_pure_between_observations() {
        let strategy = CoordinateDescent::new();
        let slots = [int_slot(0, &[1, 2, 4], 1)];
        let history = [(
            vec![(VariableId(0), Value::Int(1))],
            HistoryEntry { count: 1, mean: 3.0 },
        )];
        let a = strategy.select(&request(&slots, &history));
        let b = strategy.select(&request(&slots, &history));
        assert_eq!(a, b);
    }
}
