//! The variable registry.
//!
//! Declarations are append-only and serialized by a write lock scoped to the
//! insert; there is no deletion operation. Lookups clone an `Arc` out of the
//! table, so strategies can hold variable definitions without keeping the
//! registry locked.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::value::ValueKind;
use crate::variable::{Category, Domain, Variable, VariableId};

pub(crate) struct Registry {
    variables: RwLock<Vec<Arc<Variable>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            variables: RwLock::new(Vec::new()),
        }
    }

    /// Validates the domain against `kind` and appends the declaration.
    ///
    /// Declaring the same `(name, domain)` pair twice yields independent ids.
    pub(crate) fn declare(
        &self,
        name: &str,
        kind: ValueKind,
        category: Category,
        domain: Domain,
    ) -> Result<VariableId> {
        domain.validate(kind)?;
        let mut variables = self.variables.write();
        let id = VariableId(variables.len() as u64);
        variables.push(Arc::new(Variable {
            id,
            name: name.to_owned(),
            kind,
            category,
            domain,
        }));
        trace_debug!(name, %id, "declared variable");
        Ok(id)
    }

    pub(crate) fn get(&self, id: VariableId) -> Result<Arc<Variable>> {
        let index = usize::try_from(id.0).map_err(|_| Error::UnknownVariable { id })?;
        self.variables
            .read()
            .get(index)
            .cloned()
            .ok_or(Error::UnknownVariable { id })
    }
}
