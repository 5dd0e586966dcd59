//! Entity containers, binding targets and operation imports

use crate::edm::{Cache, EdmInner, cached, insert_or_get};
use crate::{Edm, EdmOperation, EdmStructuredType, OperationKind};
use octofhir_odata_diagnostics::{ODATA0308, ODATA0309, ODataError, Result};
use octofhir_odata_model::{
    CsdlActionImport, CsdlEntityContainer, CsdlEntitySet, CsdlFunctionImport,
    CsdlNavigationPropertyBinding, CsdlSingleton,
};
use octofhir_odata_types::FullQualifiedName;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct Listing {
    entity_sets: Vec<String>,
    singletons: Vec<String>,
    action_imports: Vec<String>,
    function_imports: Vec<String>,
}

impl Listing {
    fn of(record: &CsdlEntityContainer) -> Self {
        Self {
            entity_sets: record.entity_sets.iter().map(|s| s.name.clone()).collect(),
            singletons: record.singletons.iter().map(|s| s.name.clone()).collect(),
            action_imports: record.action_imports.iter().map(|i| i.name.clone()).collect(),
            function_imports: record.function_imports.iter().map(|i| i.name.clone()).collect(),
        }
    }
}

/// Entity container; members are fetched from the provider one name at a time
pub struct EdmEntityContainer {
    edm: Weak<EdmInner>,
    name: FullQualifiedName,
    parent_name: Option<FullQualifiedName>,
    entity_sets: Cache<String, EdmBindingTarget>,
    singletons: Cache<String, EdmBindingTarget>,
    action_imports: Cache<String, EdmOperationImport>,
    function_imports: Cache<String, EdmOperationImport>,
    listing: OnceCell<Listing>,
}

impl EdmEntityContainer {
    pub(crate) fn new(edm: &Edm, name: FullQualifiedName, parent_name: Option<FullQualifiedName>) -> Self {
        Self {
            edm: edm.downgrade(),
            name,
            parent_name,
            entity_sets: RwLock::default(),
            singletons: RwLock::default(),
            action_imports: RwLock::default(),
            function_imports: RwLock::default(),
            listing: OnceCell::new(),
        }
    }

    /// Cache every member of a full container record
    pub(crate) fn absorb(&self, edm: &Edm, record: CsdlEntityContainer) -> Result<()> {
        let _ = self.listing.set(Listing::of(&record));
        for set in record.entity_sets {
            let name = set.name.clone();
            insert_or_get(&self.entity_sets, &name, EdmBindingTarget::entity_set(edm, &self.name, set)?);
        }
        for singleton in record.singletons {
            let name = singleton.name.clone();
            insert_or_get(
                &self.singletons,
                &name,
                EdmBindingTarget::singleton(edm, &self.name, singleton)?,
            );
        }
        for import in record.action_imports {
            let name = import.name.clone();
            insert_or_get(
                &self.action_imports,
                &name,
                EdmOperationImport::action(edm, &self.name, import)?,
            );
        }
        for import in record.function_imports {
            let name = import.name.clone();
            insert_or_get(
                &self.function_imports,
                &name,
                EdmOperationImport::function(edm, &self.name, import)?,
            );
        }
        Ok(())
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn parent_name(&self) -> Option<&FullQualifiedName> {
        self.parent_name.as_ref()
    }

    fn parent(&self, edm: &Edm) -> Result<Option<Arc<Self>>> {
        match &self.parent_name {
            Some(parent) => edm.entity_container(Some(parent)),
            None => Ok(None),
        }
    }

    pub fn entity_set(&self, name: &str) -> Result<Option<Arc<EdmBindingTarget>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let key = name.to_string();
        let own = cached(&self.entity_sets, &key, || {
            let record = edm.fetch("entity set", &key, |p| p.entity_set(&self.name, name))?;
            record
                .map(|r| EdmBindingTarget::entity_set(&edm, &self.name, r))
                .transpose()
        })?;
        match own {
            Some(found) => Ok(Some(found)),
            None => match self.parent(&edm)? {
                Some(parent) => parent.entity_set(name),
                None => Ok(None),
            },
        }
    }

    pub fn singleton(&self, name: &str) -> Result<Option<Arc<EdmBindingTarget>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let key = name.to_string();
        let own = cached(&self.singletons, &key, || {
            let record = edm.fetch("singleton", &key, |p| p.singleton(&self.name, name))?;
            record
                .map(|r| EdmBindingTarget::singleton(&edm, &self.name, r))
                .transpose()
        })?;
        match own {
            Some(found) => Ok(Some(found)),
            None => match self.parent(&edm)? {
                Some(parent) => parent.singleton(name),
                None => Ok(None),
            },
        }
    }

    pub fn action_import(&self, name: &str) -> Result<Option<Arc<EdmOperationImport>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let key = name.to_string();
        let own = cached(&self.action_imports, &key, || {
            let record = edm.fetch("action import", &key, |p| p.action_import(&self.name, name))?;
            record
                .map(|r| EdmOperationImport::action(&edm, &self.name, r))
                .transpose()
        })?;
        match own {
            Some(found) => Ok(Some(found)),
            None => match self.parent(&edm)? {
                Some(parent) => parent.action_import(name),
                None => Ok(None),
            },
        }
    }

    pub fn function_import(&self, name: &str) -> Result<Option<Arc<EdmOperationImport>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let key = name.to_string();
        let own = cached(&self.function_imports, &key, || {
            let record = edm.fetch("function import", &key, |p| p.function_import(&self.name, name))?;
            record
                .map(|r| EdmOperationImport::function(&edm, &self.name, r))
                .transpose()
        })?;
        match own {
            Some(found) => Ok(Some(found)),
            None => match self.parent(&edm)? {
                Some(parent) => parent.function_import(name),
                None => Ok(None),
            },
        }
    }

    fn listing(&self, edm: &Edm) -> Result<&Listing> {
        if let Some(listing) = self.listing.get() {
            return Ok(listing);
        }
        edm.schemas()?;
        self.listing.get_or_try_init(|| {
            let record = edm.fetch("entity container", &self.name, |p| p.entity_container())?;
            Ok(record
                .filter(|r| r.name == self.name.name())
                .map(|r| Listing::of(&r))
                .unwrap_or_default())
        })
    }

    /// Every entity set declared in this container, in declaration order
    pub fn entity_sets(&self) -> Result<Vec<Arc<EdmBindingTarget>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let mut sets = Vec::new();
        for name in &self.listing(&edm)?.entity_sets {
            sets.extend(self.entity_set(name)?);
        }
        Ok(sets)
    }

    pub fn singletons(&self) -> Result<Vec<Arc<EdmBindingTarget>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let mut singletons = Vec::new();
        for name in &self.listing(&edm)?.singletons {
            singletons.extend(self.singleton(name)?);
        }
        Ok(singletons)
    }

    pub fn action_imports(&self) -> Result<Vec<Arc<EdmOperationImport>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let mut imports = Vec::new();
        for name in &self.listing(&edm)?.action_imports {
            imports.extend(self.action_import(name)?);
        }
        Ok(imports)
    }

    pub fn function_imports(&self) -> Result<Vec<Arc<EdmOperationImport>>> {
        let edm = Edm::upgrade(&self.edm)?;
        let mut imports = Vec::new();
        for name in &self.listing(&edm)?.function_imports {
            imports.extend(self.function_import(name)?);
        }
        Ok(imports)
    }
}

impl fmt::Debug for EdmEntityContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdmEntityContainer")
            .field("name", &self.name)
            .field("parent", &self.parent_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingTargetKind {
    EntitySet,
    Singleton,
}

/// Entity set or singleton
pub struct EdmBindingTarget {
    edm: Weak<EdmInner>,
    container_name: FullQualifiedName,
    name: String,
    kind: BindingTargetKind,
    type_name: FullQualifiedName,
    include_in_service_document: bool,
    bindings: Vec<CsdlNavigationPropertyBinding>,
    resolved_bindings: RwLock<HashMap<String, Weak<EdmBindingTarget>>>,
}

impl EdmBindingTarget {
    fn entity_set(edm: &Edm, container: &FullQualifiedName, record: CsdlEntitySet) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            container_name: container.clone(),
            name: record.name,
            kind: BindingTargetKind::EntitySet,
            type_name: edm.resolve_alias(&record.type_name)?,
            include_in_service_document: record.include_in_service_document,
            bindings: record.navigation_property_bindings,
            resolved_bindings: RwLock::default(),
        })
    }

    fn singleton(edm: &Edm, container: &FullQualifiedName, record: CsdlSingleton) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            container_name: container.clone(),
            name: record.name,
            kind: BindingTargetKind::Singleton,
            type_name: edm.resolve_alias(&record.type_name)?,
            include_in_service_document: true,
            bindings: record.navigation_property_bindings,
            resolved_bindings: RwLock::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BindingTargetKind {
        self.kind
    }

    pub fn is_entity_set(&self) -> bool {
        self.kind == BindingTargetKind::EntitySet
    }

    pub fn container_name(&self) -> &FullQualifiedName {
        &self.container_name
    }

    pub fn type_name(&self) -> &FullQualifiedName {
        &self.type_name
    }

    pub fn include_in_service_document(&self) -> bool {
        self.include_in_service_document
    }

    pub fn navigation_property_bindings(&self) -> &[CsdlNavigationPropertyBinding] {
        &self.bindings
    }

    pub fn entity_type(&self) -> Result<Arc<EdmStructuredType>> {
        Edm::upgrade(&self.edm)?.entity_type(&self.type_name)?.ok_or_else(|| {
            ODataError::model(
                ODATA0308,
                format!("Entity type '{}' of '{}' not found", self.type_name, self.name),
                self.type_name.to_string(),
            )
        })
    }

    pub fn container(&self) -> Result<Arc<EdmEntityContainer>> {
        Edm::upgrade(&self.edm)?
            .entity_container(Some(&self.container_name))?
            .ok_or_else(|| {
                ODataError::model(
                    ODATA0308,
                    format!("Container '{}' of '{}' not found", self.container_name, self.name),
                    self.container_name.to_string(),
                )
            })
    }

    /// Target bound to the navigation path, in this or another container
    pub fn related_binding_target(&self, path: &str) -> Result<Option<Arc<Self>>> {
        if let Some(hit) = self.resolved_bindings.read().get(path).and_then(Weak::upgrade) {
            return Ok(Some(hit));
        }
        let Some(binding) = self.bindings.iter().find(|b| b.path == path) else {
            return Ok(None);
        };

        let invalid = || {
            ODataError::model(
                ODATA0309,
                format!(
                    "Navigation binding '{path}' of '{}' targets unknown '{}'",
                    self.name, binding.target
                ),
                self.name.clone(),
            )
        };
        let edm = Edm::upgrade(&self.edm)?;
        let (container, local) = match binding.target.split_once('/') {
            Some((container, local)) => {
                let container = FullQualifiedName::parse(container).ok_or_else(invalid)?;
                (edm.entity_container(Some(&container))?, local)
            }
            None => (Some(self.container()?), binding.target.as_str()),
        };
        let container = container.ok_or_else(invalid)?;
        let target = match container.entity_set(local)? {
            Some(set) => set,
            None => container.singleton(local)?.ok_or_else(invalid)?,
        };

        self.resolved_bindings
            .write()
            .insert(path.to_string(), Arc::downgrade(&target));
        Ok(Some(target))
    }
}

impl fmt::Debug for EdmBindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdmBindingTarget")
            .field("container", &self.container_name)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Action or function import exposing an unbound operation at the service root
#[derive(Debug)]
pub struct EdmOperationImport {
    edm: Weak<EdmInner>,
    kind: OperationKind,
    container_name: FullQualifiedName,
    name: String,
    operation_name: FullQualifiedName,
    entity_set: Option<String>,
    include_in_service_document: bool,
}

impl EdmOperationImport {
    fn action(edm: &Edm, container: &FullQualifiedName, record: CsdlActionImport) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            kind: OperationKind::Action,
            container_name: container.clone(),
            name: record.name,
            operation_name: edm.resolve_alias(&record.action)?,
            entity_set: record.entity_set,
            include_in_service_document: false,
        })
    }

    fn function(edm: &Edm, container: &FullQualifiedName, record: CsdlFunctionImport) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            kind: OperationKind::Function,
            container_name: container.clone(),
            name: record.name,
            operation_name: edm.resolve_alias(&record.function)?,
            entity_set: record.entity_set,
            include_in_service_document: record.include_in_service_document,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn container_name(&self) -> &FullQualifiedName {
        &self.container_name
    }

    pub fn operation_name(&self) -> &FullQualifiedName {
        &self.operation_name
    }

    pub fn entity_set_name(&self) -> Option<&str> {
        self.entity_set.as_deref()
    }

    pub fn include_in_service_document(&self) -> bool {
        self.include_in_service_document
    }

    pub fn unbound_action(&self) -> Result<Option<Arc<EdmOperation>>> {
        if self.kind != OperationKind::Action {
            return Ok(None);
        }
        Edm::upgrade(&self.edm)?.unbound_action(&self.operation_name)
    }

    pub fn unbound_functions(&self) -> Result<Vec<Arc<EdmOperation>>> {
        if self.kind != OperationKind::Function {
            return Ok(Vec::new());
        }
        Edm::upgrade(&self.edm)?.unbound_functions(&self.operation_name)
    }

    pub fn unbound_function(&self, parameter_names: Option<&[&str]>) -> Result<Option<Arc<EdmOperation>>> {
        if self.kind != OperationKind::Function {
            return Ok(None);
        }
        Edm::upgrade(&self.edm)?.unbound_function(&self.operation_name, parameter_names)
    }

    /// Entity set the import's results belong to
    ///
    /// Accepts a simple name in the own container or `ns.Container/Name`.
    pub fn returned_entity_set(&self) -> Result<Option<Arc<EdmBindingTarget>>> {
        let Some(target) = &self.entity_set else {
            return Ok(None);
        };
        let edm = Edm::upgrade(&self.edm)?;
        let (container_name, local) = match target.split_once('/') {
            Some((container, local)) => match FullQualifiedName::parse(container) {
                Some(name) => (name, local),
                None => return Ok(None),
            },
            None => (self.container_name.clone(), target.as_str()),
        };
        match edm.entity_container(Some(&container_name))? {
            Some(container) => container.entity_set(local),
            None => Ok(None),
        }
    }
}
