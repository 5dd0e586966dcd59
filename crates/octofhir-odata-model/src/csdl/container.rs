//! Entity container records

use super::default_true;
use octofhir_odata_types::FullQualifiedName;
use serde::{Deserialize, Serialize};

/// Entity container with its entity sets, singletons and operation imports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEntityContainer {
    pub name: String,
    #[serde(default)]
    pub extends: Option<FullQualifiedName>,
    #[serde(default)]
    pub entity_sets: Vec<CsdlEntitySet>,
    #[serde(default)]
    pub singletons: Vec<CsdlSingleton>,
    #[serde(default)]
    pub action_imports: Vec<CsdlActionImport>,
    #[serde(default)]
    pub function_imports: Vec<CsdlFunctionImport>,
}

impl CsdlEntityContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            entity_sets: Vec::new(),
            singletons: Vec::new(),
            action_imports: Vec::new(),
            function_imports: Vec::new(),
        }
    }

    pub fn with_extends(mut self, extends: FullQualifiedName) -> Self {
        self.extends = Some(extends);
        self
    }

    pub fn with_entity_sets(mut self, entity_sets: Vec<CsdlEntitySet>) -> Self {
        self.entity_sets = entity_sets;
        self
    }

    pub fn with_singletons(mut self, singletons: Vec<CsdlSingleton>) -> Self {
        self.singletons = singletons;
        self
    }

    pub fn with_action_imports(mut self, imports: Vec<CsdlActionImport>) -> Self {
        self.action_imports = imports;
        self
    }

    pub fn with_function_imports(mut self, imports: Vec<CsdlFunctionImport>) -> Self {
        self.function_imports = imports;
        self
    }

    pub fn entity_set(&self, name: &str) -> Option<&CsdlEntitySet> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    pub fn singleton(&self, name: &str) -> Option<&CsdlSingleton> {
        self.singletons.iter().find(|s| s.name == name)
    }

    pub fn action_import(&self, name: &str) -> Option<&CsdlActionImport> {
        self.action_imports.iter().find(|i| i.name == name)
    }

    pub fn function_import(&self, name: &str) -> Option<&CsdlFunctionImport> {
        self.function_imports.iter().find(|i| i.name == name)
    }
}

/// Name and inheritance of an entity container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEntityContainerInfo {
    pub container_name: FullQualifiedName,
    #[serde(default)]
    pub extends: Option<FullQualifiedName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEntitySet {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default = "default_true")]
    pub include_in_service_document: bool,
    #[serde(default)]
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
}

impl CsdlEntitySet {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            include_in_service_document: true,
            navigation_property_bindings: Vec::new(),
        }
    }

    pub fn with_include_in_service_document(mut self, include: bool) -> Self {
        self.include_in_service_document = include;
        self
    }

    pub fn with_navigation_property_bindings(mut self, bindings: Vec<CsdlNavigationPropertyBinding>) -> Self {
        self.navigation_property_bindings = bindings;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlSingleton {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
}

impl CsdlSingleton {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            navigation_property_bindings: Vec::new(),
        }
    }

    pub fn with_navigation_property_bindings(mut self, bindings: Vec<CsdlNavigationPropertyBinding>) -> Self {
        self.navigation_property_bindings = bindings;
        self
    }
}

/// Binds a navigation path of a binding target to another target
///
/// `target` is either a simple name in the same container or
/// `Namespace.Container/Name` for a target in another container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlNavigationPropertyBinding {
    pub path: String,
    pub target: String,
}

impl CsdlNavigationPropertyBinding {
    pub fn new(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlActionImport {
    pub name: String,
    pub action: FullQualifiedName,
    #[serde(default)]
    pub entity_set: Option<String>,
}

impl CsdlActionImport {
    pub fn new(name: impl Into<String>, action: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            action,
            entity_set: None,
        }
    }

    pub fn with_entity_set(mut self, entity_set: impl Into<String>) -> Self {
        self.entity_set = Some(entity_set.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlFunctionImport {
    pub name: String,
    pub function: FullQualifiedName,
    #[serde(default)]
    pub entity_set: Option<String>,
    #[serde(default)]
    pub include_in_service_document: bool,
}

impl CsdlFunctionImport {
    pub fn new(name: impl Into<String>, function: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            function,
            entity_set: None,
            include_in_service_document: false,
        }
    }

    pub fn with_entity_set(mut self, entity_set: impl Into<String>) -> Self {
        self.entity_set = Some(entity_set.into());
        self
    }

    pub fn with_include_in_service_document(mut self, include: bool) -> Self {
        self.include_in_service_document = include;
        self
    }
}
