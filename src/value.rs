//! Tagged value storage.
//!
//! [`Value`] is the type-erased representation of a tunable quantity. Every
//! value that crosses the engine boundary — candidate domain members, input
//! features, request defaults, and the assignments a strategy returns — is a
//! `Value` paired with the [`VariableId`](crate::variable::VariableId) whose
//! declared [`ValueKind`] it must match. The pairing is checked at
//! declaration time and again whenever a value is returned to the caller.

/// The declared kind of a tunable variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// 64-bit signed integer values.
    Int64,
    /// 64-bit floating point values.
    Float64,
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Int64 => write!(f, "int64"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

/// A type-erased tunable value.
///
/// # Display
///
/// `Value` implements [`Display`](core::fmt::Display): both variants print
/// their numeric value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating point value.
    Float(f64),
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int64,
            Self::Float(_) => ValueKind::Float64,
        }
    }

    /// Returns the integer payload, or `None` for a float value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) => None,
        }
    }

    /// Returns the float payload, or `None` for an integer value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(_) => None,
        }
    }

    /// Stable 64-bit encoding of the payload, used when hashing values into
    /// instance and assignment keys. Uses `f64::to_bits` for floats so that
    /// distinct bit patterns produce distinct keys.
    #[must_use]
    pub(crate) fn to_key_bits(self) -> u64 {
        match self {
            #[allow(clippy::cast_sign_loss)]
            Self::Int(v) => v as u64,
            Self::Float(v) => v.to_bits(),
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
