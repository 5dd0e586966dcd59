//! Resolved resource path segments

use crate::Expression;
use octofhir_odata_edm::{
    EdmBindingTarget, EdmNavigationProperty, EdmOperation, EdmOperationImport, EdmProperty,
    EdmStructuredType, EdmType,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Discriminant of [`UriResourceKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    EntitySet,
    Singleton,
    NavigationProperty,
    KeyPredicate,
    TypeCast,
    PrimitiveProperty,
    ComplexProperty,
    BoundAction,
    BoundFunction,
    ActionImport,
    FunctionImport,
    Count,
    Ref,
    Value,
    LambdaVariable,
    LambdaAll,
    LambdaAny,
    It,
    Root,
}

/// One segment of a resource path or member expression
///
/// `type_` and `is_collection` describe what the segment yields after any
/// key predicate and type filter attached to it have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct UriResource {
    pub kind: UriResourceKind,
    pub type_: Option<EdmType>,
    pub is_collection: bool,
    /// Key predicate written directly after the segment
    pub keys: SmallVec<[KeyPredicate; 2]>,
    /// Type cast folded into the segment (`ESBase/ns.ETDerived`)
    pub type_filter: Option<Arc<EdmStructuredType>>,
}

impl UriResource {
    pub fn new(kind: UriResourceKind, type_: Option<EdmType>, is_collection: bool) -> Self {
        Self {
            kind,
            type_,
            is_collection,
            keys: SmallVec::new(),
            type_filter: None,
        }
    }

    pub fn segment_kind(&self) -> SegmentKind {
        self.kind.segment_kind()
    }

    /// The structured type the segment yields, honouring its type filter
    pub fn structured_type(&self) -> Option<&Arc<EdmStructuredType>> {
        self.type_filter
            .as_ref()
            .or_else(|| self.type_.as_ref().and_then(EdmType::as_structured))
    }

    /// Key value by predicate name
    pub fn key(&self, name: &str) -> Option<&KeyPredicate> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Name as written in the URI
    pub fn segment_name(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UriResourceKind {
    EntitySet(Arc<EdmBindingTarget>),
    Singleton(Arc<EdmBindingTarget>),
    NavigationProperty(Arc<EdmNavigationProperty>),
    /// Key predicate that could not be attached to the segment it follows,
    /// as in `ESBase/ns.ETDerived(1)`
    KeyPredicate,
    /// Leading type cast of a member expression (`ns.ETDerived/Prop`)
    TypeCast(Arc<EdmStructuredType>),
    PrimitiveProperty(Arc<EdmProperty>),
    ComplexProperty(Arc<EdmProperty>),
    BoundAction(Arc<EdmOperation>),
    BoundFunction {
        function: Arc<EdmOperation>,
        parameters: Vec<FunctionParameter>,
    },
    ActionImport {
        import: Arc<EdmOperationImport>,
        action: Arc<EdmOperation>,
    },
    FunctionImport {
        import: Arc<EdmOperationImport>,
        function: Arc<EdmOperation>,
        parameters: Vec<FunctionParameter>,
    },
    Count,
    Ref,
    Value,
    LambdaVariable(String),
    LambdaAny(Lambda),
    LambdaAll(Lambda),
    It,
    Root,
}

impl UriResourceKind {
    pub fn segment_kind(&self) -> SegmentKind {
        match self {
            Self::EntitySet(_) => SegmentKind::EntitySet,
            Self::Singleton(_) => SegmentKind::Singleton,
            Self::NavigationProperty(_) => SegmentKind::NavigationProperty,
            Self::KeyPredicate => SegmentKind::KeyPredicate,
            Self::TypeCast(_) => SegmentKind::TypeCast,
            Self::PrimitiveProperty(_) => SegmentKind::PrimitiveProperty,
            Self::ComplexProperty(_) => SegmentKind::ComplexProperty,
            Self::BoundAction(_) => SegmentKind::BoundAction,
            Self::BoundFunction { .. } => SegmentKind::BoundFunction,
            Self::ActionImport { .. } => SegmentKind::ActionImport,
            Self::FunctionImport { .. } => SegmentKind::FunctionImport,
            Self::Count => SegmentKind::Count,
            Self::Ref => SegmentKind::Ref,
            Self::Value => SegmentKind::Value,
            Self::LambdaVariable(_) => SegmentKind::LambdaVariable,
            Self::LambdaAny(_) => SegmentKind::LambdaAny,
            Self::LambdaAll(_) => SegmentKind::LambdaAll,
            Self::It => SegmentKind::It,
            Self::Root => SegmentKind::Root,
        }
    }
}

impl fmt::Display for UriResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntitySet(target) | Self::Singleton(target) => f.write_str(target.name()),
            Self::NavigationProperty(nav) => f.write_str(nav.name()),
            Self::KeyPredicate => f.write_str("()"),
            Self::TypeCast(ty) => write!(f, "{}", ty.name()),
            Self::PrimitiveProperty(p) | Self::ComplexProperty(p) => f.write_str(p.name()),
            Self::BoundAction(op) | Self::BoundFunction { function: op, .. } => {
                write!(f, "{}", op.name())
            }
            Self::ActionImport { import, .. } | Self::FunctionImport { import, .. } => {
                f.write_str(import.name())
            }
            Self::Count => f.write_str("$count"),
            Self::Ref => f.write_str("$ref"),
            Self::Value => f.write_str("$value"),
            Self::LambdaVariable(name) => f.write_str(name),
            Self::LambdaAny(_) => f.write_str("any"),
            Self::LambdaAll(_) => f.write_str("all"),
            Self::It => f.write_str("$it"),
            Self::Root => f.write_str("$root"),
        }
    }
}

/// A `Name=value` pair of a key predicate
///
/// `text` is the literal exactly as written (`'2'` for a string key).
/// `referenced_property` is set when the value was filled in from a
/// referential constraint instead of being written in the URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPredicate {
    pub name: String,
    pub text: String,
    pub alias: Option<String>,
    pub referenced_property: Option<String>,
}

impl KeyPredicate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            alias: None,
            referenced_property: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_referenced_property(mut self, property: impl Into<String>) -> Self {
        self.referenced_property = Some(property.into());
        self
    }
}

/// Argument of a function call segment
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: String,
    /// Raw value as written, empty for alias references
    pub text: String,
    /// `@alias` referenced instead of an inline value
    pub alias: Option<String>,
    /// Resolved value when it is a literal or expression
    pub expression: Option<Expression>,
}

/// Body of an `any`/`all` segment
///
/// `any()` without arguments has no variable and no predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub variable: Option<String>,
    pub predicate: Option<Box<Expression>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_odata_types::EdmPrimitiveTypeKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_count_segment() {
        let count = UriResource::new(
            UriResourceKind::Count,
            Some(EdmType::Primitive(EdmPrimitiveTypeKind::Int64)),
            false,
        );
        assert_eq!(count.segment_kind(), SegmentKind::Count);
        assert_eq!(count.segment_name(), "$count");
        assert!(count.structured_type().is_none());
    }

    #[test]
    fn test_key_lookup() {
        let mut segment = UriResource::new(UriResourceKind::KeyPredicate, None, false);
        segment.keys.push(KeyPredicate::new("PropertyInt16", "1"));
        segment
            .keys
            .push(KeyPredicate::new("PropertyString", "'2'").with_alias("Key"));
        assert_eq!(segment.key("PropertyString").map(|k| k.text.as_str()), Some("'2'"));
        assert!(segment.key("Missing").is_none());
    }
}
