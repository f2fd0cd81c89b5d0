use thiserror::Error;

use crate::veriloga::ValueKind;

/// Construction-time failure raised by the builders.
///
/// Every variant is reported synchronously at the call that caused it. Once a
/// [`crate::Module`] method has failed, the module is poisoned and refuses to
/// emit (see [`BuildError::Poisoned`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Type mismatch in `{context}`: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Invalid identifier `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Unknown {kind} `{value}` (expected one of: {allowed})")]
    InvalidEnum {
        kind: &'static str,
        value: String,
        allowed: String,
    },

    #[error("{what} out of range: {detail}")]
    OutOfRange { what: &'static str, detail: String },

    #[error("Structural violation in {context}: {detail}")]
    StructuralViolation {
        context: &'static str,
        detail: String,
    },

    #[error("Missing parameter for `{constructor}`: {detail}")]
    MissingParameter {
        constructor: &'static str,
        detail: String,
    },

    #[error("Module `{module}` cannot be emitted after a construction error: {cause}")]
    Poisoned {
        module: String,
        cause: Box<BuildError>,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    pub(crate) fn structural(context: &'static str, detail: impl Into<String>) -> Self {
        BuildError::StructuralViolation {
            context,
            detail: detail.into(),
        }
    }

    pub(crate) fn out_of_range(what: &'static str, detail: impl Into<String>) -> Self {
        BuildError::OutOfRange {
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn mismatch(context: impl Into<String>, expected: ValueKind, found: ValueKind) -> Self {
        BuildError::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }
}
