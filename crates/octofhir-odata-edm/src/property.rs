//! Structural and navigation properties, key references

use crate::edm::EdmInner;
use crate::{Edm, EdmStructuredType, EdmType};
use octofhir_odata_diagnostics::{ODATA0308, ODataError, Result};
use octofhir_odata_model::{CsdlMapping, CsdlNavigationProperty, CsdlProperty};
use octofhir_odata_types::{Facets, FullQualifiedName};
use std::sync::{Arc, Weak};

fn type_not_found(type_name: &FullQualifiedName, owner: &str) -> ODataError {
    ODataError::model(
        ODATA0308,
        format!("Type '{type_name}' referenced by '{owner}' not found"),
        type_name.to_string(),
    )
}

/// Resolve a referenced type name, failing when the model does not know it
pub(crate) fn resolve_referenced(
    edm: &Weak<EdmInner>,
    type_name: &FullQualifiedName,
    owner: &str,
) -> Result<EdmType> {
    Edm::upgrade(edm)?
        .resolve_type(type_name)?
        .ok_or_else(|| type_not_found(type_name, owner))
}

/// Structural property
///
/// The property type is looked up through the model on each call rather than
/// stored, so mutually referencing types never form reference cycles.
#[derive(Debug)]
pub struct EdmProperty {
    edm: Weak<EdmInner>,
    name: String,
    type_name: FullQualifiedName,
    collection: bool,
    nullable: bool,
    facets: Facets,
    default_value: Option<String>,
    mime_type: Option<String>,
    mapping: Option<CsdlMapping>,
}

impl EdmProperty {
    pub(crate) fn new(edm: &Edm, record: CsdlProperty) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            type_name: edm.resolve_alias(&record.type_name)?,
            name: record.name,
            collection: record.collection,
            nullable: record.nullable,
            facets: record.facets,
            default_value: record.default_value,
            mime_type: record.mime_type,
            mapping: record.mapping,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &FullQualifiedName {
        &self.type_name
    }

    pub fn type_(&self) -> Result<EdmType> {
        resolve_referenced(&self.edm, &self.type_name, &self.name)
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn mapping(&self) -> Option<&CsdlMapping> {
        self.mapping.as_ref()
    }
}

/// `(dependent property, principal property)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmReferentialConstraint {
    pub property: String,
    pub referenced_property: String,
}

#[derive(Debug)]
pub struct EdmNavigationProperty {
    edm: Weak<EdmInner>,
    name: String,
    type_name: FullQualifiedName,
    collection: bool,
    nullable: bool,
    partner_name: Option<String>,
    contains_target: bool,
    referential_constraints: Vec<EdmReferentialConstraint>,
}

impl EdmNavigationProperty {
    pub(crate) fn new(edm: &Edm, record: CsdlNavigationProperty) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            type_name: edm.resolve_alias(&record.type_name)?,
            name: record.name,
            collection: record.collection,
            nullable: record.nullable,
            partner_name: record.partner,
            contains_target: record.contains_target,
            referential_constraints: record
                .referential_constraints
                .into_iter()
                .map(|c| EdmReferentialConstraint {
                    property: c.property,
                    referenced_property: c.referenced_property,
                })
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &FullQualifiedName {
        &self.type_name
    }

    pub fn target_type(&self) -> Result<Arc<EdmStructuredType>> {
        Edm::upgrade(&self.edm)?
            .entity_type(&self.type_name)?
            .ok_or_else(|| type_not_found(&self.type_name, &self.name))
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn contains_target(&self) -> bool {
        self.contains_target
    }

    pub fn partner_name(&self) -> Option<&str> {
        self.partner_name.as_deref()
    }

    /// The navigation property on the target type pointing back here
    pub fn partner(&self) -> Result<Option<Arc<Self>>> {
        let Some(partner) = &self.partner_name else {
            return Ok(None);
        };
        self.target_type()?.navigation_property(partner)
    }

    pub fn referential_constraints(&self) -> &[EdmReferentialConstraint] {
        &self.referential_constraints
    }

    /// Dependent property constrained to the principal `referenced`
    pub fn referencing_property_name(&self, referenced: &str) -> Option<&str> {
        self.referential_constraints
            .iter()
            .find(|c| c.referenced_property == referenced)
            .map(|c| c.property.as_str())
    }

    /// Principal property the dependent `property` refers to
    pub fn referenced_property_name(&self, property: &str) -> Option<&str> {
        self.referential_constraints
            .iter()
            .find(|c| c.property == property)
            .map(|c| c.referenced_property.as_str())
    }
}

/// One key entry, resolved to its terminal property
#[derive(Debug)]
pub struct EdmKeyPropertyRef {
    path: String,
    alias: Option<String>,
    property: Arc<EdmProperty>,
}

impl EdmKeyPropertyRef {
    pub(crate) fn new(path: String, alias: Option<String>, property: Arc<EdmProperty>) -> Self {
        Self { path, alias, property }
    }

    /// `/`-separated path from the entity type to the key property
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name used in key predicates
    pub fn name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.property.name(),
        }
    }

    pub fn property(&self) -> &Arc<EdmProperty> {
        &self.property
    }
}
