//! The resolved request: kind, resource path, query options and aliases

use crate::{Expression, QueryOptions, UriResource};
use indexmap::IndexMap;
use octofhir_odata_edm::{EdmStructuredType, EdmType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UriInfoKind {
    /// Empty path, the service document
    Service,
    Metadata,
    Batch,
    All,
    CrossJoin,
    /// `$entity?$id=...`
    Entity,
    Resource,
}

/// Value bound to an `@alias` query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct AliasValue {
    pub text: String,
    /// Resolved value when the alias was used in an expression
    pub expression: Option<Expression>,
}

/// Everything known about a parsed request URI
#[derive(Debug, Clone, PartialEq)]
pub struct UriInfo {
    pub kind: UriInfoKind,
    pub resource_path: Vec<UriResource>,
    /// Entity set names of a `$crossjoin`, in request order
    pub entity_set_names: Vec<String>,
    /// Cast of `$entity/ns.Type`
    pub entity_type_cast: Option<Arc<EdmStructuredType>>,
    pub query: QueryOptions,
    pub aliases: IndexMap<String, AliasValue>,
}

impl UriInfo {
    pub fn new(kind: UriInfoKind) -> Self {
        Self {
            kind,
            resource_path: Vec::new(),
            entity_set_names: Vec::new(),
            entity_type_cast: None,
            query: QueryOptions::default(),
            aliases: IndexMap::new(),
        }
    }

    pub fn last_segment(&self) -> Option<&UriResource> {
        self.resource_path.last()
    }

    /// Type of the addressed resource
    pub fn result_type(&self) -> Option<&EdmType> {
        self.last_segment().and_then(|s| s.type_.as_ref())
    }

    pub fn is_collection(&self) -> bool {
        self.last_segment().is_some_and(|s| s.is_collection)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasValue> {
        self.aliases.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_document() {
        let info = UriInfo::new(UriInfoKind::Service);
        assert!(info.resource_path.is_empty());
        assert!(info.result_type().is_none());
        assert!(!info.is_collection());
    }
}
