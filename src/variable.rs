//! Tunable variable declarations and candidate domains.
//!
//! A [`Variable`] describes one tunable quantity: its name, its value kind,
//! its statistical [`Category`], and the [`Domain`] of legal values. Variables
//! are declared once through
//! [`Tuner::declare_variable`](crate::Tuner::declare_variable) and are
//! immutable for the life of the process.
//!
//! # Domains
//!
//! | Domain | Shape | Typical use |
//! |--------|-------|-------------|
//! | [`Domain::Set`] | explicit candidate list | tile sizes, variant indices, thread counts |
//! | [`Domain::Range`] | continuous `[lower, upper]` with a scan `step` | damping factors, eigenvalue ratios |
//!
//! Integer-valued searches always use `Domain::Set`; the
//! [`Domain::int_range`] and [`Domain::factors_of`] helpers materialize the
//! common candidate lists. `Domain::Range` is reserved for `float64`
//! variables and is discretized by `step` when a strategy scans it.

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// Identifier assigned to a declared variable.
///
/// Ids are assigned sequentially by the registry and are never reused.
/// Declaring the same `(name, domain)` pair twice yields two independent ids;
/// callers that want a single shared statistic cache the id themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableId(pub(crate) u64);

impl core::fmt::Display for VariableId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "var#{}", self.0)
    }
}

/// The statistical category of a variable, describing how its values relate
/// to each other.
///
/// The category does not change how values are stored; it tells strategies
/// whether neighboring candidates are meaningful (ordinal, interval) or not
/// (categorical).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Unordered alternatives, e.g. which algorithm variant to run.
    Categorical,
    /// Ordered discrete values, e.g. a tile size from a candidate list.
    Ordinal,
    /// Values from a continuous interval, e.g. a damping factor.
    Interval,
}

/// The candidate domain of a tunable variable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Domain {
    /// An explicit, non-empty set of candidate values. Unordered for
    /// [`Category::Categorical`] variables, ordered for
    /// [`Category::Ordinal`].
    Set(Vec<Value>),
    /// A continuous range of `float64` values. Strategies discretize the
    /// range by `step` when scanning it; returned values always lie on that
    /// grid, but any value inside the bounds satisfies the domain.
    Range {
        /// Lower bound.
        lower: f64,
        /// Upper bound. Must be strictly greater than `lower`.
        upper: f64,
        /// Scan step. Must be positive and finite.
        step: f64,
        /// Whether the lower bound itself is excluded.
        lower_open: bool,
        /// Whether the upper bound itself is excluded.
        upper_open: bool,
    },
}

impl Domain {
    /// Builds a candidate set from anything that converts into [`Value`]s.
    ///
    /// # Examples
    ///
    /// ```
    /// use autotuner::Domain;
    ///
    /// let tile_sizes = Domain::set([2i64, 4, 8]);
    /// ```
    #[must_use = "building a domain has no side effects"]
    pub fn set<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Set(values.into_iter().map(Into::into).collect())
    }

    /// Builds a closed continuous range `[lower, upper]` scanned by `step`.
    #[must_use]
    pub fn range(lower: f64, upper: f64, step: f64) -> Self {
        Self::Range {
            lower,
            upper,
            step,
            lower_open: false,
            upper_open: false,
        }
    }

    /// Builds a continuous range with explicit bound openness.
    #[must_use]
    pub fn range_open(lower: f64, upper: f64, step: f64, lower_open: bool, upper_open: bool) -> Self {
        Self::Range {
            lower,
            upper,
            step,
            lower_open,
            upper_open,
        }
    }

    /// Builds the candidate set `{lower, lower + step, ...} ∩ [lower, upper]`
    /// of integers. This is how integer-valued search spaces are declared;
    /// there is no integer range domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use autotuner::Domain;
    ///
    /// assert_eq!(
    ///     Domain::int_range(1, 6, 2),
    ///     Domain::set([1i64, 3, 5]),
    /// );
    /// ```
    #[must_use]
    pub fn int_range(lower: i64, upper: i64, step: i64) -> Self {
        let mut values = Vec::new();
        if step > 0 {
            let mut v = lower;
            while v <= upper {
                values.push(Value::Int(v));
                let Some(next) = v.checked_add(step) else {
                    break;
                };
                v = next;
            }
        }
        Self::Set(values)
    }

    /// Builds the candidate set of proper factors of `n` (excluding `n`
    /// itself), the usual candidate list for a tile-size search over an
    /// extent of `n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use autotuner::Domain;
    ///
    /// assert_eq!(
    ///     Domain::factors_of(12),
    ///     Domain::set([1i64, 2, 3, 4, 6]),
    /// );
    /// ```
    #[must_use]
    pub fn factors_of(n: i64) -> Self {
        let values = (1..n)
            .filter(|i| n % i == 0)
            .map(Value::Int)
            .collect();
        Self::Set(values)
    }

    /// Validates the domain against the declared value kind.
    ///
    /// A set must be non-empty and homogeneous in `kind`; a range must have
    /// `lower < upper`, a positive finite step, and a `float64` kind.
    pub(crate) fn validate(&self, kind: ValueKind) -> Result<()> {
        match self {
            Self::Set(values) => {
                if values.is_empty() {
                    return Err(Error::EmptyCandidates);
                }
                for v in values {
                    if v.kind() != kind {
                        return Err(Error::CandidateKindMismatch {
                            expected: kind,
                            got: v.kind(),
                        });
                    }
                }
                Ok(())
            }
            Self::Range {
                lower, upper, step, ..
            } => {
                if kind != ValueKind::Float64 {
                    return Err(Error::CandidateKindMismatch {
                        expected: kind,
                        got: ValueKind::Float64,
                    });
                }
                if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                    return Err(Error::InvalidBounds {
                        lower: *lower,
                        upper: *upper,
                    });
                }
                if !step.is_finite() || *step <= 0.0 {
                    return Err(Error::InvalidStep);
                }
                Ok(())
            }
        }
    }

    /// Returns whether `value` satisfies this domain.
    ///
    /// Set membership is exact; range membership respects bound openness and
    /// accepts any value inside the bounds, not only grid points.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Self::Set(values) => values.contains(value),
            Self::Range {
                lower,
                upper,
                lower_open,
                upper_open,
                ..
            } => {
                let Some(v) = value.as_float() else {
                    return false;
                };
                let above = if *lower_open { v > *lower } else { v >= *lower };
                let below = if *upper_open { v < *upper } else { v <= *upper };
                above && below
            }
        }
    }

    /// The list of candidates a strategy scans: the set members themselves,
    /// or the range discretized by `step` (open bounds excluded).
    #[must_use]
    pub fn candidates(&self) -> Vec<Value> {
        match self {
            Self::Set(values) => values.clone(),
            Self::Range {
                lower,
                upper,
                step,
                lower_open,
                upper_open,
            } => {
                let mut values = Vec::new();
                let mut i: u64 = u64::from(*lower_open);
                loop {
                    #[allow(clippy::cast_precision_loss)]
                    let v = lower + i as f64 * step;
                    if v > *upper || (*upper_open && v >= *upper) {
                        break;
                    }
                    values.push(Value::Float(v));
                    i += 1;
                }
                values
            }
        }
    }
}

/// A declared tunable variable. Immutable once declared; owned by the
/// registry and handed to strategies behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Variable {
    pub(crate) id: VariableId,
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) category: Category,
    pub(crate) domain: Domain,
}

impl Variable {
    /// The id assigned at declaration.
    #[must_use]
    pub fn id(&self) -> VariableId {
        self.id
    }

    /// The name supplied at declaration. Names are labels for humans; they
    /// are not unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared value kind.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The declared statistical category.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// The declared candidate domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }
}
