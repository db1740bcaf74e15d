use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::error::ComposeError;
use crate::procedure::{Procedure, ProcedureType};

/// The procedures of one category within one router, keyed by name.
pub struct ProcedureRecord<Ctx> {
    kind: ProcedureType,
    procedures: HashMap<String, Procedure<Ctx>, ahash::RandomState>,
}

impl<Ctx> ProcedureRecord<Ctx> {
    pub fn new(kind: ProcedureType) -> Self {
        Self {
            kind,
            procedures: HashMap::default(),
        }
    }

    pub fn kind(&self) -> ProcedureType {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Procedure<Ctx>> {
        self.procedures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Procedure<Ctx>)> {
        self.procedures.iter().map(|(name, proc)| (name.as_str(), proc))
    }

    /// Procedure names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.procedures.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Insert a procedure, refusing to replace an existing name.
    pub(crate) fn try_insert(
        &mut self,
        name: impl Into<String>,
        procedure: Procedure<Ctx>,
    ) -> Result<(), ComposeError> {
        use std::collections::hash_map::Entry;

        match self.procedures.entry(name.into()) {
            Entry::Occupied(slot) => {
                warn!(kind = %self.kind, name = %slot.key(), "Duplicate procedure name");
                Err(ComposeError::DuplicateProcedureName {
                    kind: self.kind,
                    name: slot.key().clone(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(procedure);
                Ok(())
            }
        }
    }
}

impl<Ctx> Clone for ProcedureRecord<Ctx> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            procedures: self.procedures.clone(),
        }
    }
}

impl<Ctx> fmt::Debug for ProcedureRecord<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRecord")
            .field("category", &self.kind.category())
            .field("names", &self.names())
            .finish()
    }
}

/// Merge procedure records of one category into a single record.
///
/// This is a strict disjoint union: a name present in more than one input
/// fails with [`ComposeError::DuplicateProcedureName`] instead of letting a
/// later record override an earlier one. On success the result does not
/// depend on input order.
pub fn merge_without_overrides<'a, Ctx: 'a>(
    kind: ProcedureType,
    records: impl IntoIterator<Item = &'a ProcedureRecord<Ctx>>,
) -> Result<ProcedureRecord<Ctx>, ComposeError> {
    let mut merged = ProcedureRecord::new(kind);
    for record in records {
        debug_assert_eq!(record.kind(), kind, "merging records of different kinds");
        for (name, procedure) in record.iter() {
            merged.try_insert(name, procedure.clone())?;
        }
    }
    Ok(merged)
}
