//! Primitive type errors

use crate::EdmPrimitiveTypeKind;
use thiserror::Error;

/// Errors raised by primitive literal conversion
///
/// `Content` means the text or value is not acceptable for the kind (bad
/// syntax, out of range, facet violation). `TypeMismatch` means the caller
/// asked for, or supplied, a representation the kind does not support at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveTypeError {
    #[error("The literal '{literal}' has illegal content for {kind}: {reason}")]
    Content {
        kind: EdmPrimitiveTypeKind,
        literal: String,
        reason: String,
    },

    #[error("{kind} values cannot be represented as {representation}")]
    TypeMismatch {
        kind: EdmPrimitiveTypeKind,
        representation: String,
    },

    #[error("Invalid qualified name '{0}'")]
    InvalidQualifiedName(String),
}

impl PrimitiveTypeError {
    pub fn content(
        kind: EdmPrimitiveTypeKind,
        literal: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Content {
            kind,
            literal: literal.into(),
            reason: reason.into(),
        }
    }

    pub fn mismatch(kind: EdmPrimitiveTypeKind, representation: impl Into<String>) -> Self {
        Self::TypeMismatch {
            kind,
            representation: representation.into(),
        }
    }

    pub fn is_content_error(&self) -> bool {
        matches!(self, Self::Content { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
