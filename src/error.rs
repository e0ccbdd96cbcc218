//! Error types for the autotuner crate.
//!
//! All fallible operations in the crate return [`Result<T>`], which is an
//! alias for `core::result::Result<T, Error>`. The [`Error`] enum covers
//! domain validation at declaration time, context lifecycle violations, and
//! strategy contract violations.
//!
//! None of these errors are retried internally. Every variant signals an
//! integration defect in the calling code (or, for
//! [`OutOfDomain`](Error::OutOfDomain), in a strategy implementation), and
//! callers are expected to abort or fall back to a hard-coded configuration
//! rather than proceed with an unverified tuning decision.

use crate::context::ContextId;
use crate::value::{Value, ValueKind};
use crate::variable::VariableId;

/// Errors returned by tuner operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A [`Domain::Set`](crate::variable::Domain::Set) was declared with no
    /// candidate values.
    #[error("candidate set cannot be empty")]
    EmptyCandidates,

    /// The lower bound of a [`Domain::Range`](crate::variable::Domain::Range)
    /// is not strictly below the upper bound.
    #[error("invalid bounds: lower ({lower}) must be less than upper ({upper})")]
    InvalidBounds {
        /// The lower bound value.
        lower: f64,
        /// The upper bound value.
        upper: f64,
    },

    /// The step size of a range domain is not positive and finite.
    #[error("invalid step: step must be positive and finite")]
    InvalidStep,

    /// A candidate value (or a range domain) does not match the declared
    /// value kind of its variable.
    #[error("candidate kind mismatch: variable declared as {expected}, candidate is {got}")]
    CandidateKindMismatch {
        /// The kind the variable was declared with.
        expected: ValueKind,
        /// The kind actually found in the domain.
        got: ValueKind,
    },

    /// A [`VariableId`] was used that was never returned by
    /// [`Tuner::declare_variable`](crate::Tuner::declare_variable).
    #[error("unknown variable: {id}")]
    UnknownVariable {
        /// The unregistered id.
        id: VariableId,
    },

    /// A caller-supplied value (input value or request default) does not
    /// match the variable's declared kind.
    #[error("type mismatch for variable {variable}: expected {expected}, got {got}")]
    TypeMismatch {
        /// The variable whose declared kind was violated.
        variable: VariableId,
        /// The declared kind.
        expected: ValueKind,
        /// The kind of the supplied value.
        got: ValueKind,
    },

    /// [`Tuner::end_context`](crate::Tuner::end_context) was called on a
    /// context that is not the top of the calling thread's stack. The stack
    /// is left unmodified.
    #[error("context mismatch: tried to close {got}, current top is {expected:?}")]
    ContextMismatch {
        /// The current stack top, or `None` if the stack is empty (the
        /// context was already closed or belongs to another thread).
        expected: Option<ContextId>,
        /// The context the caller tried to close.
        got: ContextId,
    },

    /// A context id was used that is not open on the calling thread. Either
    /// it was already closed, or it was begun by a different thread.
    #[error("context {id} is not open on this thread")]
    UnknownContext {
        /// The unrecognized context id.
        id: ContextId,
    },

    /// [`Tuner::set_input_values`](crate::Tuner::set_input_values) was called
    /// after output values were already requested for the context. Inputs
    /// take part in the context's identity and must be complete before the
    /// first request.
    #[error("inputs for context {context} were set after outputs were requested")]
    InputsAfterRequest {
        /// The offending context.
        context: ContextId,
    },

    /// A search strategy produced a value outside the declared candidate
    /// domain of the requested variable. This indicates a bug in the strategy
    /// implementation (or a request default lying outside the domain), not a
    /// recoverable runtime condition.
    #[error("value {value} for variable {variable} is outside its declared domain")]
    OutOfDomain {
        /// The variable whose domain was violated.
        variable: VariableId,
        /// The offending value.
        value: Value,
    },

    /// An internal invariant was violated. This indicates a bug in the
    /// library rather than a user error.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// A convenience alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;
