//! Search strategies for choosing output values.
//!
//! A strategy turns the accumulated history of a decision point into a
//! concrete assignment: one [`Value`] per requested output variable. The
//! context manager selects the strategy by context label (with
//! [`CoordinateDescent`] as the generic default), hands it a
//! [`SelectionRequest`], and validates every returned value against its
//! variable's declared domain before the caller sees it.
//!
//! # Built-in strategies
//!
//! | Strategy | Algorithm | Best for |
//! |----------|-----------|----------|
//! | [`FastestOf`] | Empirical fastest-of-N over a candidate list | Picking one of N interchangeable variants |
//! | [`CoordinateDescent`] | Per-axis hill descent over candidate domains | Multi-variable tuning (tile sizes, thread counts) |
//!
//! # Implementing a custom strategy
//!
//! Implement the [`Strategy`] trait with its single method and register the
//! strategy for a label via
//! [`Tuner::set_strategy`](crate::Tuner::set_strategy); the context manager
//! needs no modification.
//!
//! ```
//! use autotuner::strategy::{SelectionRequest, Strategy};
//! use autotuner::Value;
//!
//! /// A strategy that always returns the caller-supplied defaults.
//! struct Defaults;
//!
//! impl Strategy for Defaults {
//!     fn select(&self, request: &SelectionRequest<'_>) -> Vec<Value> {
//!         request.outputs.iter().map(|slot| slot.default).collect()
//!     }
//! }
//! ```
//!
//! The arguments in a [`SelectionRequest`]:
//!
//! - **`outputs`** — the requested variables (with their declared domains)
//!   and the caller-supplied default per variable. Return one value per
//!   slot, in order; each must satisfy the slot's domain.
//! - **`history`** — every assignment observed so far for this decision
//!   point, with its count and running cost mean. Empty on cold start.
//! - **`total_observations`** — total observation count for the decision
//!   point. Useful for phase transitions and re-probe cadence.
//!
//! # Statelessness
//!
//! `select` must be a pure function of its request: the context manager
//! relies on this for its idempotence guarantee (two consecutive requests
//! with no intervening observation return the same assignment). Strategies
//! that need randomness derive it deterministically from the request, the
//! way [`CoordinateDescent`] seeds its re-probe jitter from the observation
//! count.

mod descent;
mod fastest;

pub use descent::CoordinateDescent;
pub use fastest::FastestOf;

use std::sync::Arc;

use crate::history::{Assignment, HistoryEntry, InstanceKey};
use crate::value::Value;
use crate::variable::Variable;

/// One requested output variable together with the caller-supplied default
/// returned on cold start.
#[derive(Clone)]
pub struct OutputSlot {
    /// The declared variable (name, kind, category, domain).
    pub variable: Arc<Variable>,
    /// The value to fall back to while the decision point has no usable
    /// history. Must lie inside the variable's domain.
    pub default: Value,
}

/// Everything a strategy may consult when producing an assignment.
pub struct SelectionRequest<'a> {
    /// Identity of the decision point being tuned.
    pub key: InstanceKey,
    /// The requested output variables, in request order.
    pub outputs: &'a [OutputSlot],
    /// Observed assignments with their accumulated statistics. Empty on
    /// cold start.
    pub history: &'a [(Assignment, HistoryEntry)],
    /// Total observations recorded for `key`, across all assignments.
    pub total_observations: u64,
}

impl SelectionRequest<'_> {
    /// The caller-supplied defaults, in slot order.
    #[must_use]
    pub fn defaults(&self) -> Vec<Value> {
        self.outputs.iter().map(|slot| slot.default).collect()
    }

    /// The accumulated entry, if any, for an exact assignment.
    #[must_use]
    pub fn entry_for(&self, assignment: &[(crate::variable::VariableId, Value)]) -> Option<&HistoryEntry> {
        self.history
            .iter()
            .find(|(a, _)| a == assignment)
            .map(|(_, entry)| entry)
    }
}

/// Trait for pluggable search strategies.
///
/// Requires `Send + Sync`: a [`Tuner`](crate::Tuner) shares its strategies
/// across caller threads behind `Arc<dyn Strategy>`.
pub trait Strategy: Send + Sync {
    /// Produces one value per requested output slot, in order.
    ///
    /// Every returned value must satisfy its slot's declared domain; the
    /// context manager fails the request with
    /// [`OutOfDomain`](crate::Error::OutOfDomain) otherwise.
    fn select(&self, request: &SelectionRequest<'_>) -> Vec<Value>;
}
