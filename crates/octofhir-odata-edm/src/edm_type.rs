//! The tagged union over every EDM type

use crate::{EdmEnumType, EdmStructuredType, StructuredKind};
use octofhir_odata_diagnostics::{ODATA0308, ODataError, Result};
use octofhir_odata_model::CsdlTypeDefinition;
use octofhir_odata_types::{EdmPrimitiveTypeKind, Facets, FullQualifiedName};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmTypeKind {
    Primitive,
    Enum,
    Complex,
    Entity,
    Definition,
}

/// Resolved type of a property, parameter, return value or expression
///
/// Equality is identity for model types: two `EdmType`s are equal when they
/// refer to the same cached element.
#[derive(Debug, Clone)]
pub enum EdmType {
    Primitive(EdmPrimitiveTypeKind),
    Enum(Arc<EdmEnumType>),
    Complex(Arc<EdmStructuredType>),
    Entity(Arc<EdmStructuredType>),
    Definition(Arc<EdmTypeDefinition>),
}

impl EdmType {
    pub fn kind(&self) -> EdmTypeKind {
        match self {
            Self::Primitive(_) => EdmTypeKind::Primitive,
            Self::Enum(_) => EdmTypeKind::Enum,
            Self::Complex(_) => EdmTypeKind::Complex,
            Self::Entity(_) => EdmTypeKind::Entity,
            Self::Definition(_) => EdmTypeKind::Definition,
        }
    }

    pub fn full_qualified_name(&self) -> FullQualifiedName {
        match self {
            Self::Primitive(kind) => kind.full_qualified_name(),
            Self::Enum(e) => e.name().clone(),
            Self::Complex(t) | Self::Entity(t) => t.name().clone(),
            Self::Definition(d) => d.name().clone(),
        }
    }

    /// Primitive kind, looking through type definitions
    pub fn primitive_kind(&self) -> Option<EdmPrimitiveTypeKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            Self::Definition(d) => Some(d.underlying_type()),
            _ => None,
        }
    }

    /// Wrap a structured type into the matching variant
    pub fn structured(ty: Arc<EdmStructuredType>) -> Self {
        match ty.kind() {
            StructuredKind::Entity => Self::Entity(ty),
            StructuredKind::Complex => Self::Complex(ty),
        }
    }

    pub fn as_structured(&self) -> Option<&Arc<EdmStructuredType>> {
        match self {
            Self::Complex(t) | Self::Entity(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Arc<EdmStructuredType>> {
        match self {
            Self::Entity(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&Arc<EdmStructuredType>> {
        match self {
            Self::Complex(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EdmEnumType>> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Complex(_) | Self::Entity(_))
    }
}

impl PartialEq for EdmType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            (Self::Complex(a), Self::Complex(b)) | (Self::Entity(a), Self::Entity(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Self::Definition(a), Self::Definition(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_qualified_name())
    }
}

/// Named alias of a primitive type with its own facets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmTypeDefinition {
    name: FullQualifiedName,
    underlying_type: EdmPrimitiveTypeKind,
    facets: Facets,
}

impl EdmTypeDefinition {
    pub(crate) fn new(name: FullQualifiedName, record: CsdlTypeDefinition) -> Result<Self> {
        let underlying_type = EdmPrimitiveTypeKind::kind_of(&record.underlying_type).ok_or_else(|| {
            ODataError::model(
                ODATA0308,
                format!(
                    "Underlying type '{}' of type definition '{name}' is not a primitive type",
                    record.underlying_type
                ),
                name.to_string(),
            )
        })?;
        Ok(Self {
            name,
            underlying_type,
            facets: record.facets,
        })
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn underlying_type(&self) -> EdmPrimitiveTypeKind {
        self.underlying_type
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }
}
