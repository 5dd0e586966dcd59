//! Schemas, vocabulary terms and annotation groups

use crate::edm::EdmInner;
use crate::property::resolve_referenced;
use crate::{Edm, EdmEntityContainer, EdmEnumType, EdmOperation, EdmStructuredType, EdmType, EdmTypeDefinition};
use octofhir_odata_diagnostics::Result;
use octofhir_odata_model::{CsdlAnnotations, CsdlTerm};
use octofhir_odata_types::{Facets, FullQualifiedName};
use std::sync::{Arc, Weak};

/// One namespace worth of resolved elements
#[derive(Debug)]
pub struct EdmSchema {
    namespace: String,
    alias: Option<String>,
    pub(crate) entity_types: Vec<Arc<EdmStructuredType>>,
    pub(crate) complex_types: Vec<Arc<EdmStructuredType>>,
    pub(crate) enum_types: Vec<Arc<EdmEnumType>>,
    pub(crate) type_definitions: Vec<Arc<EdmTypeDefinition>>,
    pub(crate) actions: Vec<Arc<EdmOperation>>,
    pub(crate) functions: Vec<Arc<EdmOperation>>,
    pub(crate) terms: Vec<Arc<EdmTerm>>,
    pub(crate) entity_container: Option<Arc<EdmEntityContainer>>,
    pub(crate) annotation_groups: Vec<Arc<EdmAnnotations>>,
}

impl EdmSchema {
    pub(crate) fn empty(namespace: String, alias: Option<String>) -> Self {
        Self {
            namespace,
            alias,
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

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn entity_types(&self) -> &[Arc<EdmStructuredType>] {
        &self.entity_types
    }

    pub fn complex_types(&self) -> &[Arc<EdmStructuredType>] {
        &self.complex_types
    }

    pub fn enum_types(&self) -> &[Arc<EdmEnumType>] {
        &self.enum_types
    }

    pub fn type_definitions(&self) -> &[Arc<EdmTypeDefinition>] {
        &self.type_definitions
    }

    pub fn actions(&self) -> &[Arc<EdmOperation>] {
        &self.actions
    }

    pub fn functions(&self) -> &[Arc<EdmOperation>] {
        &self.functions
    }

    pub fn terms(&self) -> &[Arc<EdmTerm>] {
        &self.terms
    }

    pub fn entity_container(&self) -> Option<&Arc<EdmEntityContainer>> {
        self.entity_container.as_ref()
    }

    pub fn annotation_groups(&self) -> &[Arc<EdmAnnotations>] {
        &self.annotation_groups
    }
}

#[derive(Debug)]
pub struct EdmTerm {
    edm: Weak<EdmInner>,
    name: FullQualifiedName,
    type_name: FullQualifiedName,
    collection: bool,
    nullable: bool,
    base_term_name: Option<FullQualifiedName>,
    applies_to: Vec<String>,
    default_value: Option<String>,
    facets: Facets,
}

impl EdmTerm {
    pub(crate) fn new(edm: &Edm, name: FullQualifiedName, record: CsdlTerm) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            name,
            type_name: edm.resolve_alias(&record.type_name)?,
            collection: record.collection,
            nullable: record.nullable,
            base_term_name: record.base_term.map(|b| edm.resolve_alias(&b)).transpose()?,
            applies_to: record.applies_to,
            default_value: record.default_value,
            facets: record.facets,
        })
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn type_name(&self) -> &FullQualifiedName {
        &self.type_name
    }

    pub fn type_(&self) -> Result<EdmType> {
        resolve_referenced(&self.edm, &self.type_name, self.name.name())
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn base_term(&self) -> Result<Option<Arc<Self>>> {
        match &self.base_term_name {
            Some(base) => Edm::upgrade(&self.edm)?.term(base),
            None => Ok(None),
        }
    }

    pub fn applies_to(&self) -> &[String] {
        &self.applies_to
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }
}

/// Term applications attached to one target path
#[derive(Debug)]
pub struct EdmAnnotations {
    target: String,
    qualifier: Option<String>,
    annotations: Vec<EdmAnnotation>,
}

impl EdmAnnotations {
    pub(crate) fn new(edm: &Edm, record: CsdlAnnotations) -> Result<Self> {
        let annotations = record
            .annotations
            .into_iter()
            .map(|a| {
                Ok(EdmAnnotation {
                    edm: edm.downgrade(),
                    term_name: edm.resolve_alias(&a.term)?,
                    qualifier: a.qualifier,
                    value: a.value,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            target: record.target,
            qualifier: record.qualifier,
            annotations,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn annotations(&self) -> &[EdmAnnotation] {
        &self.annotations
    }

    pub fn annotation(&self, term: &FullQualifiedName) -> Option<&EdmAnnotation> {
        self.annotations.iter().find(|a| &a.term_name == term)
    }
}

#[derive(Debug)]
pub struct EdmAnnotation {
    edm: Weak<EdmInner>,
    term_name: FullQualifiedName,
    qualifier: Option<String>,
    value: Option<serde_json::Value>,
}

impl EdmAnnotation {
    pub fn term_name(&self) -> &FullQualifiedName {
        &self.term_name
    }

    pub fn term(&self) -> Result<Option<Arc<EdmTerm>>> {
        Edm::upgrade(&self.edm)?.term(&self.term_name)
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }
}
