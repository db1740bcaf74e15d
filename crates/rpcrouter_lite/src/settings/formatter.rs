use std::collections::BTreeMap;
use tonic::Code;

use crate::error::ProcedureError;
use crate::procedure::ProcedureType;

/// The error payload sent back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorShape {
    pub code: Code,
    pub message: String,
    pub path: Option<String>,
    pub data: BTreeMap<String, String>,
}

impl ErrorShape {
    /// Build the default shape for a failed call.
    pub fn from_error(error: &ProcedureError, path: &str) -> Self {
        let (code, message) = match error {
            ProcedureError::NotFound { .. } => (Code::NotFound, error.to_string()),
            ProcedureError::KindMismatch { .. } => (Code::Unimplemented, error.to_string()),
            ProcedureError::Decode(_) | ProcedureError::Transform(_) => {
                (Code::InvalidArgument, error.to_string())
            }
            ProcedureError::Encode(_) => (Code::Internal, error.to_string()),
            ProcedureError::Resolver(status) => (status.code(), status.message().to_string()),
        };

        Self {
            code,
            message,
            path: Some(path.to_string()),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Everything an error formatter gets to look at.
#[derive(Debug)]
pub struct FormatterInput<'a> {
    pub error: &'a ProcedureError,
    pub kind: ProcedureType,
    pub path: &'a str,
    /// The default shape, which a formatter may extend or replace.
    pub shape: ErrorShape,
}

/// Shapes errors before they are returned to callers.
pub trait ErrorFormatter: Send + Sync {
    fn format(&self, input: FormatterInput<'_>) -> ErrorShape;
}

impl<F> ErrorFormatter for F
where
    F: Fn(FormatterInput<'_>) -> ErrorShape + Send + Sync,
{
    fn format(&self, input: FormatterInput<'_>) -> ErrorShape {
        self(input)
    }
}

/// Returns the default shape unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorFormatter;

impl ErrorFormatter for DefaultErrorFormatter {
    fn format(&self, input: FormatterInput<'_>) -> ErrorShape {
        input.shape
    }
}
