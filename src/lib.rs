#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Runtime adaptive variant selection and parameter tuning for numerically
//! heavy, repeatedly invoked kernels. Callers register tunable decision
//! points — which algorithm variant to run, what tile size to use, how many
//! workers to spawn — and the engine chooses values for them, learning from
//! repeated measured executions so that decisions converge toward low-cost
//! configurations over the life of the process.
//!
//! # Getting Started
//!
//! Race three interchangeable implementations and let the engine converge
//! on the cheapest:
//!
//! ```
//! use autotuner::Tuner;
//!
//! let tuner = Tuner::new();
//!
//! let mut serial = || { /* run the serial kernel */ };
//! let mut chunked = || { /* run the chunked kernel */ };
//! let mut strided = || { /* run the strided kernel */ };
//!
//! for _ in 0..20 {
//!     let ran = tuner
//!         .fastest_of("heat-transfer", &mut [&mut serial, &mut chunked, &mut strided])
//!         .unwrap();
//!     assert!(ran < 3);
//! }
//! ```
//!
//! For multi-variable decision points, declare the variables and drive the
//! context lifecycle yourself — see [`Tuner`] for the full sequence.
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Tuner`] | Facade: declare variables, open/close contexts, request values, report costs. |
//! | [`Domain`] | Candidate domain of a tunable variable — a discrete set or a stepped continuous range. |
//! | [`ContextId`] | A scoped tuning decision point, possibly nested inside another. |
//! | [`Strategy`](strategy::Strategy) | Policy turning accumulated history into a concrete assignment. |
//! | [`HistoryStore`](history::HistoryStore) | Injected per-instance observation statistics, alive for the process. |
//! | [`Measurement`] | RAII wall-clock guard that stages a cost observation on drop. |
//!
//! # Built-in strategies
//!
//! | Strategy | Algorithm | Selected |
//! |----------|-----------|----------|
//! | [`FastestOf`](strategy::FastestOf) | Empirical fastest-of-N with round-robin exploration and drift re-probing | Per label, by [`Tuner::fastest_of`] |
//! | [`CoordinateDescent`](strategy::CoordinateDescent) | Per-axis hill descent over candidate domains | Default for unregistered labels |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on the public data-model types | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key engine points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod context;
mod error;
mod fingerprint;
pub mod history;
mod registry;
pub mod strategy;
mod tuner;
mod value;
mod variable;

pub use context::ContextId;
pub use error::{Error, Result};
pub use history::{Assignment, HistoryEntry, HistoryStore, InstanceKey, MemoryHistory};
pub use strategy::{CoordinateDescent, FastestOf, Strategy};
pub use tuner::{Measurement, OutputRequest, Tuner, TunerBuilder};
pub use value::{Value, ValueKind};
pub use variable::{Category, Domain, Variable, VariableId};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use autotuner::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::ContextId;
    pub use crate::error::{Error, Result};
    pub use crate::history::{HistoryStore, MemoryHistory};
    pub use crate::strategy::{CoordinateDescent, FastestOf, Strategy};
    pub use crate::tuner::{OutputRequest, Tuner, TunerBuilder};
    pub use crate::value::{Value, ValueKind};
    pub use crate::variable::{Category, Domain, VariableId};
}
