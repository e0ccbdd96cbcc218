//! Per-thread context stacks.
//!
//! A context is one scoped tuning decision point. Contexts nest lexically —
//! a tile-size decision inside a backend decision — so each calling thread
//! owns a stack of open contexts mirroring that nesting, and only the
//! root-to-current path is ever materialized. A context begun on one thread
//! cannot be observed or closed from another.
//!
//! The stack discipline is structural: `end_context` must name the current
//! top, and abandoning an open context leaks its stack entry. That is a
//! programming error in the caller, not a runtime condition the engine
//! recovers from.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::fingerprint::{finalize, hash_str, mix};
use crate::history::{Assignment, InstanceKey};
use crate::strategy::OutputSlot;
use crate::value::Value;
use crate::variable::VariableId;

/// Identifier for an open tuning context.
///
/// Ids are process-unique and never reused; a closed id stays invalid
/// forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u64);

impl core::fmt::Display for ContextId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// One open context on a thread's stack.
pub(crate) struct ActiveContext {
    pub(crate) id: ContextId,
    pub(crate) label: String,
    pub(crate) inputs: Vec<(VariableId, Value)>,
    /// Requested output slots; non-empty once outputs were requested, which
    /// also freezes the inputs.
    pub(crate) outputs: Vec<OutputSlot>,
    /// Identity, computed at the first output request.
    pub(crate) key: Option<InstanceKey>,
    /// The assignment in force, cached for idempotence.
    pub(crate) assignment: Option<Assignment>,
    /// Observation total for `key` at the time `assignment` was computed.
    pub(crate) assignment_seen: u64,
    /// Cost staged by a measurement or an explicit report; committed to the
    /// history store when the context closes.
    pub(crate) pending_cost: Option<f64>,
}

/// The per-thread stacks of open contexts.
///
/// The outer map is keyed by thread id and only touched to fetch (or lazily
/// create) a thread's stack handle; all per-context work happens under the
/// stack's own lock, which only its owning thread ever takes.
pub(crate) struct ContextStacks {
    stacks: Mutex<HashMap<ThreadId, Arc<Mutex<Vec<ActiveContext>>>>>,
    next_id: AtomicU64,
}

impl ContextStacks {
    pub(crate) fn new() -> Self {
        Self {
            stacks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn fresh_id(&self) -> ContextId {
        ContextId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// The calling thread's stack, created on first use. The handle for a
    /// thread persists for the tuner's lifetime even when its stack is
    /// empty.
    pub(crate) fn current(&self) -> Arc<Mutex<Vec<ActiveContext>>> {
        let thread = std::thread::current().id();
        let mut stacks = self.stacks.lock();
        Arc::clone(stacks.entry(thread).or_default())
    }
}

/// Computes the identity of the context at `index` on its thread's stack:
/// the labels and sorted input values of the context and every ancestor,
/// plus the ancestors' assignments in force. Folding in ancestor
/// assignments keeps, say, a tile-size decision reached under variant A
/// separate from the same decision reached under variant B; the context's
/// own outputs are never part of its key.
pub(crate) fn instance_key(stack: &[ActiveContext], index: usize) -> InstanceKey {
    let mut h: u64 = 0;
    for (depth, context) in stack[..=index].iter().enumerate() {
        h = mix(h, hash_str(&context.label));

        let mut inputs = context.inputs.clone();
        inputs.sort_by_key(|(id, _)| *id);
        for (id, value) in &inputs {
            h = mix(mix(h, id.0), value.to_key_bits());
        }

        if depth < index
            && let Some(assignment) = &context.assignment
        {
            for (id, value) in assignment {
                h = mix(mix(h, id.0), value.to_key_bits());
            }
        }
    }
    InstanceKey(finalize(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(label: &str, inputs: Vec<(VariableId, Value)>) -> ActiveContext {
        ActiveContext {
            id: ContextId(0),
            label: label.to_owned(),
            inputs,
            outputs: Vec::new(),
            key: None,
            assignment: None,
            assignment_seen: 0,
            pending_cost: None,
        }
    }

    #[test]
    fn same_label_and_inputs_share_a_key() {
        let a = [context("gemm", vec![(VariableId(0), Value::Int(64))])];
        let b = [context("gemm", vec![(VariableId(0), Value::Int(64))])];
        assert_eq!(instance_key(&a, 0), instance_key(&b, 0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = [context(
            "gemm",
            vec![(VariableId(0), Value::Int(64)), (VariableId(1), Value::Int(32))],
        )];
        let b = [context(
            "gemm",
            vec![(VariableId(1), Value::Int(32)), (VariableId(0), Value::Int(64))],
        )];
        assert_eq!(instance_key(&a, 0), instance_key(&b, 0));
    }

    #[test]
    fn label_and_inputs_both_distinguish() {
        let base = [context("gemm", vec![(VariableId(0), Value::Int(64))])];
        let other_label = [context("gemv", vec![(VariableId(0), Value::Int(64))])];
        let other_input = [context("gemm", vec![(VariableId(0), Value::Int(128))])];
        assert_ne!(instance_key(&base, 0), instance_key(&other_label, 0));
        assert_ne!(instance_key(&base, 0), instance_key(&other_input, 0));
    }

    #[test]
    fn parent_assignment_distinguishes_nested_keys() {
        let mut parent = context("backend", Vec::new());
        parent.assignment = Some(vec![(VariableId(0), Value::Int(0))]);
        let stack_a = [parent, context("tile", Vec::new())];

        let mut parent = context("backend", Vec::new());
        parent.assignment = Some(vec![(VariableId(0), Value::Int(1))]);
        let stack_b = [parent, context("tile", Vec::new())];

        assert_ne!(instance_key(&stack_a, 1), instance_key(&stack_b, 1));
        // The parents themselves still share a key: own outputs are not
        // part of a context's identity.
        assert_eq!(instance_key(&stack_a, 0), instance_key(&stack_b, 0));
    }
}
