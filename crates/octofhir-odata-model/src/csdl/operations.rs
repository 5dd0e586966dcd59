//! Action and function records

use super::default_true;
use octofhir_odata_types::{Facets, FullQualifiedName};
use serde::{Deserialize, Serialize};

/// Action overload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlAction {
    pub name: String,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub entity_set_path: Option<String>,
    /// For bound actions the first parameter is the binding parameter
    #[serde(default)]
    pub parameters: Vec<CsdlParameter>,
    #[serde(default)]
    pub return_type: Option<CsdlReturnType>,
}

impl CsdlAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bound: false,
            entity_set_path: None,
            parameters: Vec::new(),
            return_type: None,
        }
    }

    pub fn with_bound(mut self, is_bound: bool) -> Self {
        self.is_bound = is_bound;
        self
    }

    pub fn with_entity_set_path(mut self, path: impl Into<String>) -> Self {
        self.entity_set_path = Some(path.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<CsdlParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return_type(mut self, return_type: CsdlReturnType) -> Self {
        self.return_type = Some(return_type);
        self
    }
}

/// Function overload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlFunction {
    pub name: String,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub is_composable: bool,
    #[serde(default)]
    pub entity_set_path: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CsdlParameter>,
    pub return_type: CsdlReturnType,
}

impl CsdlFunction {
    pub fn new(name: impl Into<String>, return_type: CsdlReturnType) -> Self {
        Self {
            name: name.into(),
            is_bound: false,
            is_composable: false,
            entity_set_path: None,
            parameters: Vec::new(),
            return_type,
        }
    }

    pub fn with_bound(mut self, is_bound: bool) -> Self {
        self.is_bound = is_bound;
        self
    }

    pub fn with_composable(mut self, is_composable: bool) -> Self {
        self.is_composable = is_composable;
        self
    }

    pub fn with_entity_set_path(mut self, path: impl Into<String>) -> Self {
        self.entity_set_path = Some(path.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<CsdlParameter>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Operation parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(flatten)]
    pub facets: Facets,
}

impl CsdlParameter {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            collection: false,
            nullable: true,
            facets: Facets::default(),
        }
    }

    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }
}

/// Operation return type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlReturnType {
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(flatten)]
    pub facets: Facets,
}

impl CsdlReturnType {
    pub fn new(type_name: FullQualifiedName) -> Self {
        Self {
            type_name,
            collection: false,
            nullable: true,
            facets: Facets::default(),
        }
    }

    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}
