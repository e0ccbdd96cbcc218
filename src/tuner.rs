//! The tuning engine facade.
//!
//! A [`Tuner`] owns the variable registry, the per-thread context stacks,
//! the label-to-strategy table, and a handle to the injected
//! [`HistoryStore`]. It is a passive library: callers invoke it
//! synchronously around their own (possibly parallel) workloads, and no
//! operation waits on the workload being timed.
//!
//! The typical call sequence per iteration of a kernel:
//!
//! 1. [`begin_context`](Tuner::begin_context) — open the decision point.
//! 2. [`set_input_values`](Tuner::set_input_values) — optionally attach
//!    problem-shape features that refine the decision point's identity.
//! 3. [`request_output_values`](Tuner::request_output_values) — obtain the
//!    assignment to run with.
//! 4. Run the workload under [`measure`](Tuner::measure) (or time it
//!    externally and call [`report_cost`](Tuner::report_cost)).
//! 5. [`end_context`](Tuner::end_context) — close the decision point,
//!    committing the staged observation.
//!
//! [`fastest_of`](Tuner::fastest_of) packages that whole sequence for the
//! common pick-the-fastest-variant case.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::context::{ActiveContext, ContextId, ContextStacks, instance_key};
use crate::error::{Error, Result};
use crate::history::{HistoryStore, MemoryHistory};
use crate::registry::Registry;
use crate::strategy::{CoordinateDescent, FastestOf, OutputSlot, SelectionRequest, Strategy};
use crate::value::{Value, ValueKind};
use crate::variable::{Category, Domain, VariableId};

/// One requested output variable paired with the default value returned
/// while the decision point has no usable history. The default must lie
/// inside the variable's declared domain.
#[derive(Clone, Copy, Debug)]
pub struct OutputRequest {
    /// The variable to obtain a value for.
    pub variable: VariableId,
    /// The cold-start fallback value.
    pub default: Value,
}

impl OutputRequest {
    /// Pairs a variable with its cold-start default.
    #[must_use]
    pub fn new(variable: VariableId, default: impl Into<Value>) -> Self {
        Self {
            variable,
            default: default.into(),
        }
    }
}

/// The adaptive variant-selection and parameter-tuning engine.
///
/// Learned state lives for the life of the `Tuner`; drop it and the
/// statistics go with it. There is no cross-process persistence.
///
/// # Examples
///
/// ```
/// use autotuner::{Category, Domain, OutputRequest, Tuner, Value, ValueKind};
///
/// let tuner = Tuner::new();
/// let tile = tuner
///     .declare_variable("tile", ValueKind::Int64, Category::Ordinal, Domain::factors_of(64))
///     .unwrap();
///
/// let ctx = tuner.begin_context("mm2d");
/// let values = tuner
///     .request_output_values(ctx, &[OutputRequest::new(tile, 8i64)])
///     .unwrap();
/// assert_eq!(values[0], Value::Int(8)); // cold start returns the default
///
/// {
///     let _timer = tuner.measure(ctx);
///     // run the kernel with the chosen tile size
/// }
/// tuner.end_context(ctx).unwrap();
/// ```
pub struct Tuner {
    registry: Registry,
    history: Arc<dyn HistoryStore>,
    strategies: RwLock<HashMap<String, Arc<dyn Strategy>>>,
    fallback: Arc<dyn Strategy>,
    contexts: ContextStacks,
    exploration_trials: u64,
    reprobe_every: u64,
    variant_variables: Mutex<HashMap<(String, usize), VariableId>>,
}

impl Tuner {
    /// Creates a tuner with default configuration and a fresh in-memory
    /// history.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for configuring exploration budget, re-probe
    /// cadence, seed, history store, and per-label strategies.
    #[must_use]
    pub fn builder() -> TunerBuilder {
        TunerBuilder::new()
    }

    /// Declares a tunable variable.
    ///
    /// Declarations are permanent; there is no retraction. Declaring the
    /// same `(name, domain)` pair twice yields independent ids, so callers
    /// that want one shared statistic cache the id themselves.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyCandidates`], [`Error::InvalidBounds`],
    /// [`Error::InvalidStep`], or [`Error::CandidateKindMismatch`] when the
    /// domain is malformed for the declared kind.
    pub fn declare_variable(
        &self,
        name: &str,
        kind: ValueKind,
        category: Category,
        domain: Domain,
    ) -> Result<VariableId> {
        self.registry.declare(name, kind, category, domain)
    }

    /// Registers `strategy` for every context with the given label,
    /// replacing any previous registration. Labels without a registration
    /// use the built-in [`CoordinateDescent`].
    pub fn set_strategy(&self, label: &str, strategy: impl Strategy + 'static) {
        self.strategies
            .write()
            .insert(label.to_owned(), Arc::new(strategy));
    }

    /// Opens a tuning context on the calling thread's stack. The parent is
    /// the context currently on top, if any.
    #[must_use = "the id is required to close the context"]
    pub fn begin_context(&self, label: &str) -> ContextId {
        let id = self.contexts.fresh_id();
        let stack = self.contexts.current();
        stack.lock().push(ActiveContext {
            id,
            label: label.to_owned(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            key: None,
            assignment: None,
            assignment_seen: 0,
            pending_cost: None,
        });
        trace_debug!(label, %id, "opened context");
        id
    }

    /// Attaches declared input variable values to an open context. Inputs
    /// refine the context's identity — the same label with different input
    /// values learns separately — and must be complete before the first
    /// output request.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownVariable`] for an undeclared id,
    /// [`Error::TypeMismatch`] for a value of the wrong kind,
    /// [`Error::UnknownContext`] when `ctx` is not open on this thread, and
    /// [`Error::InputsAfterRequest`] when outputs were already requested.
    pub fn set_input_values(&self, ctx: ContextId, values: &[(VariableId, Value)]) -> Result<()> {
        for (id, value) in values {
            let variable = self.registry.get(*id)?;
            if value.kind() != variable.kind() {
                return Err(Error::TypeMismatch {
                    variable: *id,
                    expected: variable.kind(),
                    got: value.kind(),
                });
            }
        }

        let stack = self.contexts.current();
        let mut stack = stack.lock();
        let context = stack
            .iter_mut()
            .find(|c| c.id == ctx)
            .ok_or(Error::UnknownContext { id: ctx })?;
        if !context.outputs.is_empty() {
            return Err(Error::InputsAfterRequest { context: ctx });
        }
        context.inputs.extend_from_slice(values);
        Ok(())
    }

    /// Obtains one value per requested variable for an open context,
    /// consulting the history store and the label's strategy.
    ///
    /// The defaults supplied with the requests are returned verbatim while
    /// the decision point is cold, so they must lie inside their variables'
    /// domains. Within one context the call is idempotent: it returns the
    /// cached assignment until new observations are recorded for the
    /// decision point.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownVariable`] or [`Error::TypeMismatch`] for
    /// malformed requests, [`Error::UnknownContext`] when `ctx` is not open
    /// on this thread, and [`Error::OutOfDomain`] when the strategy (or a
    /// caller default) produces a value outside a declared domain — the
    /// latter is a strategy bug, not a recoverable condition.
    pub fn request_output_values(
        &self,
        ctx: ContextId,
        requests: &[OutputRequest],
    ) -> Result<Vec<Value>> {
        let mut slots = Vec::with_capacity(requests.len());
        for request in requests {
            let variable = self.registry.get(request.variable)?;
            if request.default.kind() != variable.kind() {
                return Err(Error::TypeMismatch {
                    variable: request.variable,
                    expected: variable.kind(),
                    got: request.default.kind(),
                });
            }
            slots.push(OutputSlot {
                variable,
                default: request.default,
            });
        }

        let stack = self.contexts.current();
        let mut stack = stack.lock();
        let index = stack
            .iter()
            .position(|c| c.id == ctx)
            .ok_or(Error::UnknownContext { id: ctx })?;

        let key = match stack[index].key {
            Some(key) => key,
            None => instance_key(&stack, index),
        };
        let total = self.history.total_observations(key);

        // Idempotence: reuse the cached assignment until new observations
        // land for this decision point (or the requested variables change).
        if let Some(assignment) = &stack[index].assignment
            && stack[index].assignment_seen == total
            && assignment.len() == slots.len()
            && assignment
                .iter()
                .zip(&slots)
                .all(|((id, _), slot)| *id == slot.variable.id())
        {
            return Ok(assignment.iter().map(|(_, v)| *v).collect());
        }

        let strategy = self
            .strategies
            .read()
            .get(&stack[index].label)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback));

        let entries = self.history.lookup(key).unwrap_or_default();
        let values = strategy.select(&SelectionRequest {
            key,
            outputs: &slots,
            history: &entries,
            total_observations: total,
        });

        if values.len() != slots.len() {
            return Err(Error::Internal("strategy returned wrong number of values"));
        }
        for (slot, value) in slots.iter().zip(&values) {
            if !slot.variable.domain().contains(value) {
                return Err(Error::OutOfDomain {
                    variable: slot.variable.id(),
                    value: *value,
                });
            }
        }

        let context = &mut stack[index];
        context.key = Some(key);
        context.assignment = Some(
            slots
                .iter()
                .zip(&values)
                .map(|(slot, value)| (slot.variable.id(), *value))
                .collect(),
        );
        context.assignment_seen = total;
        context.outputs = slots;
        trace_debug!(label = context.label.as_str(), %key, "assignment in force");
        Ok(values)
    }

    /// Stages an externally measured cost for an open context, replacing any
    /// previously staged value. Negative (and NaN) costs are clamped to zero
    /// rather than surfaced. The staged cost is committed when the context
    /// closes.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownContext`] when `ctx` is not open on this
    /// thread.
    pub fn report_cost(&self, ctx: ContextId, cost: f64) -> Result<()> {
        let stack = self.contexts.current();
        let mut stack = stack.lock();
        let context = stack
            .iter_mut()
            .find(|c| c.id == ctx)
            .ok_or(Error::UnknownContext { id: ctx })?;
        context.pending_cost = Some(cost.max(0.0));
        Ok(())
    }

    /// Starts a scoped wall-clock measurement for `ctx`. When the returned
    /// guard drops — on normal exit or early return — the elapsed time in
    /// seconds is staged as the context's pending cost observation.
    #[must_use]
    pub fn measure(&self, ctx: ContextId) -> Measurement<'_> {
        Measurement {
            tuner: self,
            ctx,
            start: Instant::now(),
        }
    }

    /// Closes the top context on the calling thread's stack.
    ///
    /// If a cost was staged during the context's lifetime and an assignment
    /// is in force, the observation is committed to the history store under
    /// the context's instance key. A context closed without a staged cost
    /// contributes nothing to learning — distinct from a zero-cost
    /// observation.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ContextMismatch`] when `ctx` is not the current
    /// stack top; the stack is left unmodified.
    pub fn end_context(&self, ctx: ContextId) -> Result<()> {
        let stack = self.contexts.current();
        let mut stack = stack.lock();
        let top = stack.last().map(|c| c.id);
        if top != Some(ctx) {
            return Err(Error::ContextMismatch {
                expected: top,
                got: ctx,
            });
        }
        let context = stack.pop().ok_or(Error::Internal("checked top just vanished"))?;
        if let (Some(cost), Some(key), Some(assignment)) =
            (context.pending_cost, context.key, &context.assignment)
        {
            self.history.record(key, assignment, cost);
            trace_info!(%key, cost, "committed observation");
        }
        trace_debug!(%ctx, "closed context");
        Ok(())
    }

    /// Runs the empirically fastest of N interchangeable variants.
    ///
    /// Composes the whole per-iteration sequence: a context labelled
    /// `label`, an implicitly declared variant-index variable over
    /// `0..variants.len()`, a [`FastestOf`] strategy registration for the
    /// label, a scoped measurement around the chosen callable, and the
    /// closing commit. Returns the index that was run.
    ///
    /// Call it once per iteration of a repeatedly invoked workload; the
    /// selection converges on the cheapest variant as observations
    /// accumulate.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyCandidates`] when `variants` is empty, and
    /// propagates any context or strategy failure.
    pub fn fastest_of(&self, label: &str, variants: &mut [&mut dyn FnMut()]) -> Result<usize> {
        let n = variants.len();
        if n == 0 {
            return Err(Error::EmptyCandidates);
        }
        let variable = self.variant_variable(label, n)?;
        {
            let mut strategies = self.strategies.write();
            strategies.entry(label.to_owned()).or_insert_with(|| {
                Arc::new(
                    FastestOf::new()
                        .exploration_trials(self.exploration_trials)
                        .reprobe_every(self.reprobe_every),
                )
            });
        }

        let ctx = self.begin_context(label);
        let outcome = self.run_variant(ctx, variable, variants);
        let ended = self.end_context(ctx);
        let index = outcome?;
        ended?;
        Ok(index)
    }

    fn run_variant(
        &self,
        ctx: ContextId,
        variable: VariableId,
        variants: &mut [&mut dyn FnMut()],
    ) -> Result<usize> {
        let values = self.request_output_values(ctx, &[OutputRequest::new(variable, 0i64)])?;
        let index = values[0]
            .as_int()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < variants.len())
            .ok_or(Error::Internal("variant index outside candidate list"))?;
        let _timer = self.measure(ctx);
        (variants[index])();
        Ok(index)
    }

    /// The cached variant-index variable for `(label, n)`, declared on first
    /// use. A label re-used with a different variant count gets a fresh
    /// variable — and a cold history.
    fn variant_variable(&self, label: &str, n: usize) -> Result<VariableId> {
        let mut cache = self.variant_variables.lock();
        if let Some(&id) = cache.get(&(label.to_owned(), n)) {
            return Ok(id);
        }
        #[allow(clippy::cast_possible_wrap)]
        let domain = Domain::int_range(0, n as i64 - 1, 1);
        let id = self
            .registry
            .declare(label, ValueKind::Int64, Category::Categorical, domain)?;
        cache.insert((label.to_owned(), n), id);
        Ok(id)
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped wall-clock measurement.
///
/// Created by [`Tuner::measure`]; on drop, the elapsed time since creation
/// (monotonic clock, nanosecond resolution, in seconds) is staged as the
/// context's pending cost. Dropping the guard after its context was already
/// closed is a silent no-op.
#[must_use = "the measurement is staged when the guard drops"]
pub struct Measurement<'a> {
    tuner: &'a Tuner,
    ctx: ContextId,
    start: Instant,
}

impl Drop for Measurement<'_> {
    fn drop(&mut self) {
        // The monotonic clock cannot run backwards; `elapsed` already
        // saturates at zero, matching the clamp on reported costs.
        let elapsed = self.start.elapsed().as_secs_f64();
        let _ = self.tuner.report_cost(self.ctx, elapsed);
    }
}

/// Builder for a configured [`Tuner`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use autotuner::{HistoryStore, MemoryHistory, Tuner};
///
/// let history: Arc<dyn HistoryStore> = Arc::new(MemoryHistory::new());
/// let tuner = Tuner::builder()
///     .exploration_trials(5)
///     .reprobe_every(50)
///     .seed(7)
///     .history(Arc::clone(&history))
///     .build();
/// # let _ = tuner;
/// ```
pub struct TunerBuilder {
    exploration_trials: u64,
    reprobe_every: u64,
    seed: u64,
    history: Option<Arc<dyn HistoryStore>>,
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl TunerBuilder {
    /// Creates a builder with the default configuration: 3 exploration
    /// trials, re-probe every 20th observation, seed 42, fresh in-memory
    /// history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exploration_trials: 3,
            reprobe_every: 20,
            seed: 42,
            history: None,
            strategies: HashMap::new(),
        }
    }

    /// Observations required per candidate before built-in strategies leave
    /// their exploration phase.
    #[must_use]
    pub fn exploration_trials(mut self, trials: u64) -> Self {
        self.exploration_trials = trials.max(1);
        self
    }

    /// Built-in strategies re-probe a non-selected candidate every
    /// `every`-th observation; `0` disables re-probing.
    #[must_use]
    pub fn reprobe_every(mut self, every: u64) -> Self {
        self.reprobe_every = every;
        self
    }

    /// Base seed for deterministic re-probe choices.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Injects the history store. Tests inject a store they keep a handle
    /// to; the default is a fresh [`MemoryHistory`] per tuner.
    #[must_use]
    pub fn history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Pre-registers a strategy for a context label.
    #[must_use]
    pub fn strategy(mut self, label: &str, strategy: impl Strategy + 'static) -> Self {
        self.strategies.insert(label.to_owned(), Arc::new(strategy));
        self
    }

    /// Builds the tuner.
    #[must_use]
    pub fn build(self) -> Tuner {
        let fallback = Arc::new(
            CoordinateDescent::new()
                .exploration_trials(self.exploration_trials)
                .reprobe_every(self.reprobe_every)
                .seed(self.seed),
        );
        Tuner {
            registry: Registry::new(),
            history: self
                .history
                .unwrap_or_else(|| Arc::new(MemoryHistory::new())),
            strategies: RwLock::new(self.strategies),
            fallback,
            contexts: ContextStacks::new(),
            exploration_trials: self.exploration_trials,
            reprobe_every: self.reprobe_every,
            variant_variables: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for TunerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
