use thiserror::Error;

use crate::procedure::ProcedureType;
use crate::settings::SettingKind;
use crate::settings::formatter::ErrorShape;

/// Errors that can occur while defining or composing routers.
///
/// Both variants are build-time failures: a router that fails to compose is
/// never partially returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ComposeError {
    /// Two routers declare the same procedure name within one category.
    #[error("duplicate {kind} procedure '{name}'")]
    DuplicateProcedureName { kind: ProcedureType, name: String },

    /// Two routers declare different non-default values for one setting.
    #[error("you seem to have several {setting}s")]
    ConflictingConfiguration { setting: SettingKind },
}

/// Errors raised by a data transformer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformError(String);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur while invoking a single procedure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcedureError {
    /// No procedure with this name in the requested category.
    #[error("no {kind} procedure registered for '{path}'")]
    NotFound { kind: ProcedureType, path: String },

    /// The procedure exists but was invoked through the wrong call style.
    #[error("procedure is a {found}, cannot be called as a {expected}")]
    KindMismatch {
        expected: ProcedureType,
        found: ProcedureType,
    },

    /// Failed to decode the protobuf input.
    #[error("protobuf decode error")]
    Decode(#[from] prost::DecodeError),

    /// Failed to encode the protobuf output.
    #[error("protobuf encode error")]
    Encode(#[from] prost::EncodeError),

    /// The data transformer rejected a payload.
    #[error("data transformer error: {0}")]
    Transform(#[from] TransformError),

    /// The resolver returned an error status.
    #[error("resolver error: {}", .0.message())]
    Resolver(#[from] tonic::Status),
}

/// A procedure call failed; `shape` is the payload produced by the router's
/// effective error formatter.
#[derive(Debug, Error)]
#[error("{kind} '{path}' failed: {message}", message = .shape.message)]
pub struct CallError {
    pub kind: ProcedureType,
    pub path: String,
    pub shape: ErrorShape,
    #[source]
    pub source: ProcedureError,
}
