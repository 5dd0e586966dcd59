//! Entity and complex types

use crate::edm::EdmInner;
use crate::{Edm, EdmKeyPropertyRef, EdmNavigationProperty, EdmProperty};
use indexmap::IndexMap;
use octofhir_odata_diagnostics::{
    ODATA0300, ODATA0301, ODATA0302, ODATA0303, ODATA0304, ODATA0305, ODATA0401, ODataError,
    Result,
};
use octofhir_odata_model::{CsdlComplexType, CsdlEntityType, CsdlNavigationProperty, CsdlProperty, CsdlPropertyRef};
use octofhir_odata_types::FullQualifiedName;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuredKind {
    Entity,
    Complex,
}

type PropertyMap = IndexMap<String, Arc<EdmProperty>>;
type NavigationMap = IndexMap<String, Arc<EdmNavigationProperty>>;

/// Entity or complex type with single inheritance
///
/// Own members are resolved at construction. The base type, merged member
/// maps and the key are computed on first access and kept on the instance.
pub struct EdmStructuredType {
    edm: Weak<EdmInner>,
    name: FullQualifiedName,
    kind: StructuredKind,
    base_type_name: Option<FullQualifiedName>,
    is_abstract: bool,
    is_open: bool,
    has_stream: bool,
    own_properties: PropertyMap,
    own_navigation: NavigationMap,
    declared_key: Vec<CsdlPropertyRef>,
    base: OnceCell<Option<Arc<Self>>>,
    properties: OnceCell<PropertyMap>,
    navigation: OnceCell<NavigationMap>,
    key: OnceCell<Vec<Arc<EdmKeyPropertyRef>>>,
}

impl EdmStructuredType {
    pub(crate) fn from_entity(edm: &Edm, name: FullQualifiedName, record: CsdlEntityType) -> Result<Self> {
        let mut ty = Self::build(
            edm,
            name,
            StructuredKind::Entity,
            record.base_type,
            record.properties,
            record.navigation_properties,
        )?;
        ty.is_abstract = record.is_abstract;
        ty.is_open = record.open_type;
        ty.has_stream = record.has_stream;
        ty.declared_key = record.key;
        Ok(ty)
    }

    pub(crate) fn from_complex(edm: &Edm, name: FullQualifiedName, record: CsdlComplexType) -> Result<Self> {
        let mut ty = Self::build(
            edm,
            name,
            StructuredKind::Complex,
            record.base_type,
            record.properties,
            record.navigation_properties,
        )?;
        ty.is_abstract = record.is_abstract;
        ty.is_open = record.open_type;
        Ok(ty)
    }

    fn build(
        edm: &Edm,
        name: FullQualifiedName,
        kind: StructuredKind,
        base_type: Option<FullQualifiedName>,
        properties: Vec<CsdlProperty>,
        navigation: Vec<CsdlNavigationProperty>,
    ) -> Result<Self> {
        let base_type_name = base_type.map(|b| edm.resolve_alias(&b)).transpose()?;
        let own_properties = properties
            .into_iter()
            .map(|p| Ok((p.name.clone(), Arc::new(EdmProperty::new(edm, p)?))))
            .collect::<Result<PropertyMap>>()?;
        let own_navigation = navigation
            .into_iter()
            .map(|n| Ok((n.name.clone(), Arc::new(EdmNavigationProperty::new(edm, n)?))))
            .collect::<Result<NavigationMap>>()?;
        Ok(Self {
            edm: edm.downgrade(),
            name,
            kind,
            base_type_name,
            is_abstract: false,
            is_open: false,
            has_stream: false,
            own_properties,
            own_navigation,
            declared_key: Vec::new(),
            base: OnceCell::new(),
            properties: OnceCell::new(),
            navigation: OnceCell::new(),
            key: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn kind(&self) -> StructuredKind {
        self.kind
    }

    pub fn is_entity(&self) -> bool {
        self.kind == StructuredKind::Entity
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Media entity; only entity types carry a stream
    pub fn has_stream(&self) -> Result<bool> {
        if self.has_stream {
            return Ok(true);
        }
        match self.base_type()? {
            Some(base) => base.has_stream(),
            None => Ok(false),
        }
    }

    pub fn base_type_name(&self) -> Option<&FullQualifiedName> {
        self.base_type_name.as_ref()
    }

    pub fn base_type(&self) -> Result<Option<Arc<Self>>> {
        self.base
            .get_or_try_init(|| {
                let Some(base_name) = &self.base_type_name else {
                    return Ok(None);
                };
                let edm = Edm::upgrade(&self.edm)?;
                self.check_base_chain(&edm)?;
                self.lookup(&edm, base_name)?.map(Some).ok_or_else(|| {
                    ODataError::model(
                        ODATA0301,
                        format!("Base type '{base_name}' of '{}' not found", self.name),
                        self.name.to_string(),
                    )
                })
            })
            .cloned()
    }

    fn lookup(&self, edm: &Edm, name: &FullQualifiedName) -> Result<Option<Arc<Self>>> {
        match self.kind {
            StructuredKind::Entity => edm.entity_type(name),
            StructuredKind::Complex => edm.complex_type(name),
        }
    }

    /// Walk base names only; never touches another type's `base` cell
    fn check_base_chain(&self, edm: &Edm) -> Result<()> {
        let mut visited = HashSet::from([self.name.clone()]);
        let mut next = self.base_type_name.clone();
        while let Some(name) = next {
            if !visited.insert(name.clone()) {
                return Err(ODataError::model(
                    ODATA0300,
                    format!("Base type cycle detected at '{name}' while resolving '{}'", self.name),
                    self.name.to_string(),
                ));
            }
            next = self
                .lookup(edm, &name)?
                .and_then(|ty| ty.base_type_name.clone());
        }
        Ok(())
    }

    /// Properties merged over the base chain, base members first
    pub fn properties(&self) -> Result<&IndexMap<String, Arc<EdmProperty>>> {
        self.properties.get_or_try_init(|| {
            let mut merged = match self.base_type()? {
                Some(base) => base.properties()?.clone(),
                None => IndexMap::new(),
            };
            for (name, property) in &self.own_properties {
                merged.insert(name.clone(), Arc::clone(property));
            }
            Ok(merged)
        })
    }

    pub fn navigation_properties(&self) -> Result<&IndexMap<String, Arc<EdmNavigationProperty>>> {
        self.navigation.get_or_try_init(|| {
            let mut merged = match self.base_type()? {
                Some(base) => base.navigation_properties()?.clone(),
                None => IndexMap::new(),
            };
            for (name, navigation) in &self.own_navigation {
                merged.insert(name.clone(), Arc::clone(navigation));
            }
            Ok(merged)
        })
    }

    pub fn property(&self, name: &str) -> Result<Option<Arc<EdmProperty>>> {
        if let Some(own) = self.own_properties.get(name) {
            return Ok(Some(Arc::clone(own)));
        }
        Ok(self.properties()?.get(name).cloned())
    }

    pub fn navigation_property(&self, name: &str) -> Result<Option<Arc<EdmNavigationProperty>>> {
        if let Some(own) = self.own_navigation.get(name) {
            return Ok(Some(Arc::clone(own)));
        }
        Ok(self.navigation_properties()?.get(name).cloned())
    }

    pub fn property_names(&self) -> Result<Vec<String>> {
        Ok(self.properties()?.keys().cloned().collect())
    }

    pub fn navigation_property_names(&self) -> Result<Vec<String>> {
        Ok(self.navigation_properties()?.keys().cloned().collect())
    }

    /// True when `other` is this type or one of its bases
    pub fn compatible_to(&self, other: Option<&Self>) -> Result<bool> {
        let other = other.ok_or_else(|| {
            ODataError::system(ODATA0401, "compatible_to requires a target type")
        })?;
        if self.same_as(other) {
            return Ok(true);
        }
        let mut next = self.base_type()?;
        while let Some(ty) = next {
            if ty.same_as(other) {
                return Ok(true);
            }
            next = ty.base_type()?;
        }
        Ok(false)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }

    /// Declared or inherited key, resolved through complex properties
    pub fn key_property_refs(&self) -> Result<&[Arc<EdmKeyPropertyRef>]> {
        let key = self.key.get_or_try_init(|| {
            if self.kind == StructuredKind::Complex {
                return Ok(Vec::new());
            }
            if !self.declared_key.is_empty() {
                return self
                    .declared_key
                    .iter()
                    .map(|r| self.resolve_key_ref(r).map(Arc::new))
                    .collect();
            }
            if let Some(base) = self.base_type()? {
                let inherited = base.key_property_refs()?;
                if !inherited.is_empty() {
                    return Ok(inherited.to_vec());
                }
            }
            if self.is_abstract {
                return Ok(Vec::new());
            }
            Err(ODataError::model(
                ODATA0305,
                format!("Entity type '{}' neither declares nor inherits a key", self.name),
                self.name.to_string(),
            ))
        })?;
        Ok(key)
    }

    fn resolve_key_ref(&self, key_ref: &CsdlPropertyRef) -> Result<EdmKeyPropertyRef> {
        let segments: Vec<&str> = key_ref.name.split('/').collect();
        match (&key_ref.alias, segments.len()) {
            (Some(alias), 1) => {
                return Err(ODataError::model(
                    ODATA0302,
                    format!("Key alias '{alias}' requires a property path in '{}'", self.name),
                    self.name.to_string(),
                ));
            }
            (None, n) if n > 1 => {
                return Err(ODataError::model(
                    ODATA0303,
                    format!("Key path '{}' requires an alias in '{}'", key_ref.name, self.name),
                    self.name.to_string(),
                ));
            }
            _ => {}
        }

        let missing = |segment: &str| {
            ODataError::model(
                ODATA0304,
                format!(
                    "Key property '{segment}' of path '{}' not found in '{}'",
                    key_ref.name, self.name
                ),
                self.name.to_string(),
            )
        };

        let (last, complex_path) = segments.split_last().ok_or_else(|| missing(""))?;
        let mut holder: Option<Arc<Self>> = None;
        for segment in complex_path {
            let property = match &holder {
                Some(ty) => ty.property(segment)?,
                None => self.property(segment)?,
            }
            .ok_or_else(|| missing(segment))?;
            let complex = property.type_()?.as_complex().cloned();
            holder = Some(complex.ok_or_else(|| missing(segment))?);
        }
        let property = match &holder {
            Some(ty) => ty.property(last)?,
            None => self.property(last)?,
        }
        .ok_or_else(|| missing(last))?;

        Ok(EdmKeyPropertyRef::new(key_ref.name.clone(), key_ref.alias.clone(), property))
    }

    /// Externally visible key names: the alias if declared, else the property name
    pub fn key_predicate_names(&self) -> Result<Vec<String>> {
        Ok(self
            .key_property_refs()?
            .iter()
            .map(|r| r.name().to_string())
            .collect())
    }

    pub fn key_property_ref(&self, predicate_name: &str) -> Result<Option<Arc<EdmKeyPropertyRef>>> {
        Ok(self
            .key_property_refs()?
            .iter()
            .find(|r| r.name() == predicate_name)
            .cloned())
    }
}

impl fmt::Debug for EdmStructuredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdmStructuredType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base_type", &self.base_type_name)
            .finish_non_exhaustive()
    }
}
