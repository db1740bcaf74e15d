use std::fmt;

use crate::procedure::ProcedureType;
use crate::router::RouterParts;

/// A reflection of a router's shape for tooling: the procedure names in each
/// category and whether its settings were overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterSchema {
    pub queries: Vec<String>,
    pub mutations: Vec<String>,
    pub subscriptions: Vec<String>,
    pub custom_error_formatter: bool,
    pub custom_transformer: bool,
}

impl RouterSchema {
    pub(crate) fn from_parts<Ctx>(parts: &RouterParts<Ctx>) -> Self {
        Self {
            queries: parts.queries.names(),
            mutations: parts.mutations.names(),
            subscriptions: parts.subscriptions.names(),
            custom_error_formatter: !parts.error_formatter.is_default(),
            custom_transformer: !parts.transformer.is_default(),
        }
    }

    pub fn names(&self, kind: ProcedureType) -> &[String] {
        match kind {
            ProcedureType::Query => &self.queries,
            ProcedureType::Mutation => &self.mutations,
            ProcedureType::Subscription => &self.subscriptions,
        }
    }

    /// Total number of procedures.
    pub fn len(&self) -> usize {
        self.queries.len() + self.mutations.len() + self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for RouterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in ProcedureType::ALL {
            for name in self.names(kind) {
                writeln!(f, "{kind:<12} {name}")?;
            }
        }
        let setting = |custom: bool| if custom { "custom" } else { "default" };
        writeln!(f, "error formatter: {}", setting(self.custom_error_formatter))?;
        write!(f, "transformer: {}", setting(self.custom_transformer))
    }
}
