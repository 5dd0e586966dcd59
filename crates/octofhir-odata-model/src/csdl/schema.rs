//! Schema, alias, term and annotation records

use super::{
    CsdlAction, CsdlComplexType, CsdlEntityContainer, CsdlEntityType, CsdlEnumType, CsdlFunction,
    CsdlTypeDefinition, default_true,
};
use octofhir_odata_types::{Facets, FullQualifiedName};
use serde::{Deserialize, Serialize};

/// One namespace worth of metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlSchema {
    pub namespace: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<CsdlEntityType>,
    #[serde(default)]
    pub complex_types: Vec<CsdlComplexType>,
    #[serde(default)]
    pub enum_types: Vec<CsdlEnumType>,
    #[serde(default)]
    pub type_definitions: Vec<CsdlTypeDefinition>,
    #[serde(default)]
    pub actions: Vec<CsdlAction>,
    #[serde(default)]
    pub functions: Vec<CsdlFunction>,
    #[serde(default)]
    pub terms: Vec<CsdlTerm>,
    #[serde(default)]
    pub entity_container: Option<CsdlEntityContainer>,
    #[serde(default)]
    pub annotation_groups: Vec<CsdlAnnotations>,
}

impl CsdlSchema {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            alias: None,
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            enum_types: Vec::new(),
            type_definitions: Vec::new(),
            actions: Vec::new(),
            functions: Vec::new(),
            terms: Vec::new(),
            entity_container: None,
            annotation_groups: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_entity_types(mut self, types: Vec<CsdlEntityType>) -> Self {
        self.entity_types = types;
        self
    }

    pub fn with_complex_types(mut self, types: Vec<CsdlComplexType>) -> Self {
        self.complex_types = types;
        self
    }

    pub fn with_enum_types(mut self, types: Vec<CsdlEnumType>) -> Self {
        self.enum_types = types;
        self
    }

    pub fn with_type_definitions(mut self, definitions: Vec<CsdlTypeDefinition>) -> Self {
        self.type_definitions = definitions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<CsdlAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_functions(mut self, functions: Vec<CsdlFunction>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_terms(mut self, terms: Vec<CsdlTerm>) -> Self {
        self.terms = terms;
        self
    }

    pub fn with_entity_container(mut self, container: CsdlEntityContainer) -> Self {
        self.entity_container = Some(container);
        self
    }

    pub fn with_annotation_groups(mut self, groups: Vec<CsdlAnnotations>) -> Self {
        self.annotation_groups = groups;
        self
    }

    /// Qualified name of this schema's container, if it declares one
    pub fn container_name(&self) -> Option<FullQualifiedName> {
        self.entity_container
            .as_ref()
            .map(|c| FullQualifiedName::new(self.namespace.clone(), c.name.clone()))
    }
}

/// Alias declared for a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlAliasInfo {
    pub alias: String,
    pub namespace: String,
}

impl CsdlAliasInfo {
    pub fn new(alias: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            namespace: namespace.into(),
        }
    }
}

/// Vocabulary term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlTerm {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub base_term: Option<FullQualifiedName>,
    #[serde(default)]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(flatten)]
    pub facets: Facets,
}

impl CsdlTerm {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            collection: false,
            nullable: true,
            base_term: None,
            applies_to: Vec::new(),
            default_value: None,
            facets: Facets::default(),
        }
    }

    pub fn with_applies_to(mut self, applies_to: Vec<String>) -> Self {
        self.applies_to = applies_to;
        self
    }

    pub fn with_base_term(mut self, base_term: FullQualifiedName) -> Self {
        self.base_term = Some(base_term);
        self
    }
}

/// Annotations applied to one target path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlAnnotations {
    pub target: String,
    #[serde(default)]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub annotations: Vec<CsdlAnnotation>,
}

impl CsdlAnnotations {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            qualifier: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<CsdlAnnotation>) -> Self {
        self.annotations = annotations;
        self
    }
}

/// Single term application; the value is kept as provider JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlAnnotation {
    pub term: FullQualifiedName,
    #[serde(default)]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl CsdlAnnotation {
    pub fn new(term: FullQualifiedName) -> Self {
        Self {
            term,
            qualifier: None,
            value: None,
        }
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }
}
