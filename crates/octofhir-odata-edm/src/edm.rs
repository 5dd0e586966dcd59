//! The `Edm` handle and its provider-backed caches

use crate::{
    EdmAnnotations, EdmEntityContainer, EdmEnumType, EdmOperation, EdmSchema, EdmStructuredType,
    EdmTerm, EdmType, EdmTypeDefinition, check_overloads,
};
use log::{debug, trace, warn};
use octofhir_odata_diagnostics::{ODATA0402, ODataError, Result};
use octofhir_odata_model::{CsdlAliasInfo, CsdlSchema, MetadataProvider, ProviderResult};
use octofhir_odata_types::{EDM_NAMESPACE, EdmPrimitiveTypeKind, FullQualifiedName};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// Per-name cache slot map
pub(crate) type Cache<K, V> = RwLock<HashMap<K, Arc<V>>>;

type OverloadSet = Vec<Arc<EdmOperation>>;

/// Return the cached value for `key`, or run `load` and cache what it yields.
///
/// Absent results are not cached. When two threads load the same key the
/// first insert wins and both callers get that instance.
pub(crate) fn cached<K, V>(
    cache: &Cache<K, V>,
    key: &K,
    load: impl FnOnce() -> Result<Option<V>>,
) -> Result<Option<Arc<V>>>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    if let Some(hit) = cache.read().get(key) {
        trace!("Cache hit for {key:?}");
        return Ok(Some(Arc::clone(hit)));
    }
    let Some(value) = load()? else {
        return Ok(None);
    };
    Ok(Some(insert_or_get(cache, key, value)))
}

/// Insert `value` unless another instance is already cached under `key`
pub(crate) fn insert_or_get<K, V>(cache: &Cache<K, V>, key: &K, value: V) -> Arc<V>
where
    K: Eq + Hash + Clone,
{
    let mut slots = cache.write();
    Arc::clone(slots.entry(key.clone()).or_insert_with(|| Arc::new(value)))
}

/// Cached instance for `key`, building it only when absent
pub(crate) fn insert_or_build<K, V>(
    cache: &Cache<K, V>,
    key: &K,
    build: impl FnOnce() -> Result<V>,
) -> Result<Arc<V>>
where
    K: Eq + Hash + Clone,
{
    if let Some(hit) = cache.read().get(key) {
        return Ok(Arc::clone(hit));
    }
    Ok(insert_or_get(cache, key, build()?))
}

fn peek<K, V>(cache: &Cache<K, V>, key: &K) -> Option<Arc<V>>
where
    K: Eq + Hash,
{
    cache.read().get(key).cloned()
}

struct AliasTable {
    infos: Vec<CsdlAliasInfo>,
    by_alias: HashMap<String, String>,
}

pub(crate) struct EdmInner {
    provider: Arc<dyn MetadataProvider>,
    aliases: OnceCell<AliasTable>,
    entity_types: Cache<FullQualifiedName, EdmStructuredType>,
    complex_types: Cache<FullQualifiedName, EdmStructuredType>,
    enum_types: Cache<FullQualifiedName, EdmEnumType>,
    type_definitions: Cache<FullQualifiedName, EdmTypeDefinition>,
    terms: Cache<FullQualifiedName, EdmTerm>,
    actions: Cache<FullQualifiedName, OverloadSet>,
    functions: Cache<FullQualifiedName, OverloadSet>,
    containers: Cache<FullQualifiedName, EdmEntityContainer>,
    default_container: RwLock<Option<Arc<EdmEntityContainer>>>,
    annotation_groups: Cache<(String, Option<String>), EdmAnnotations>,
    schemas: OnceCell<Vec<Arc<EdmSchema>>>,
}

/// Entity Data Model backed by a metadata provider
///
/// Cheap to clone; clones share the same caches. Every lookup first expands
/// a namespace alias, then consults the cache, then the provider. Provider
/// failures surface as resolution errors naming the element being resolved.
#[derive(Clone)]
pub struct Edm {
    inner: Arc<EdmInner>,
}

impl Edm {
    pub fn new(provider: impl MetadataProvider + 'static) -> Self {
        Self::with_provider(Arc::new(provider))
    }

    pub fn with_provider(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            inner: Arc::new(EdmInner {
                provider,
                aliases: OnceCell::new(),
                entity_types: RwLock::default(),
                complex_types: RwLock::default(),
                enum_types: RwLock::default(),
                type_definitions: RwLock::default(),
                terms: RwLock::default(),
                actions: RwLock::default(),
                functions: RwLock::default(),
                containers: RwLock::default(),
                default_container: RwLock::new(None),
                annotation_groups: RwLock::default(),
                schemas: OnceCell::new(),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<EdmInner> {
        Arc::downgrade(&self.inner)
    }

    /// Recover the model from an element's back reference
    pub(crate) fn upgrade(edm: &Weak<EdmInner>) -> Result<Self> {
        edm.upgrade().map(|inner| Self { inner }).ok_or_else(|| {
            ODataError::system(ODATA0402, "The EDM owning this element has been dropped")
        })
    }

    /// Call the provider, wrapping any failure into a resolution error
    pub(crate) fn fetch<T>(
        &self,
        what: &str,
        name: &dyn fmt::Display,
        call: impl FnOnce(&dyn MetadataProvider) -> ProviderResult<T>,
    ) -> Result<T> {
        debug!("Fetching {what} '{name}' from metadata provider");
        call(self.inner.provider.as_ref()).map_err(|cause| {
            warn!("Metadata provider failed on {what} '{name}': {cause}");
            ODataError::resolution(name.to_string(), cause)
        })
    }

    fn alias_table(&self) -> Result<&AliasTable> {
        self.inner.aliases.get_or_try_init(|| {
            let infos = self.fetch("alias infos", &"*", |p| p.alias_infos())?;
            let by_alias = infos
                .iter()
                .map(|info| (info.alias.clone(), info.namespace.clone()))
                .collect();
            Ok(AliasTable { infos, by_alias })
        })
    }

    pub fn alias_infos(&self) -> Result<&[CsdlAliasInfo]> {
        Ok(&self.alias_table()?.infos)
    }

    /// Replace a leading namespace alias with its namespace
    pub fn resolve_alias(&self, name: &FullQualifiedName) -> Result<FullQualifiedName> {
        if name.namespace() == EDM_NAMESPACE {
            return Ok(name.clone());
        }
        Ok(match self.alias_table()?.by_alias.get(name.namespace()) {
            Some(namespace) => name.with_namespace(namespace.clone()),
            None => name.clone(),
        })
    }

    pub fn entity_type(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmStructuredType>>> {
        let name = self.resolve_alias(name)?;
        cached(&self.inner.entity_types, &name, || {
            let record = self.fetch("entity type", &name, |p| p.entity_type(&name))?;
            record
                .map(|record| EdmStructuredType::from_entity(self, name.clone(), record))
                .transpose()
        })
    }

    pub fn complex_type(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmStructuredType>>> {
        let name = self.resolve_alias(name)?;
        cached(&self.inner.complex_types, &name, || {
            let record = self.fetch("complex type", &name, |p| p.complex_type(&name))?;
            record
                .map(|record| EdmStructuredType::from_complex(self, name.clone(), record))
                .transpose()
        })
    }

    pub fn enum_type(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmEnumType>>> {
        let name = self.resolve_alias(name)?;
        cached(&self.inner.enum_types, &name, || {
            let record = self.fetch("enum type", &name, |p| p.enum_type(&name))?;
            record
                .map(|record| EdmEnumType::new(name.clone(), record))
                .transpose()
        })
    }

    pub fn type_definition(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmTypeDefinition>>> {
        let name = self.resolve_alias(name)?;
        cached(&self.inner.type_definitions, &name, || {
            let record = self.fetch("type definition", &name, |p| p.type_definition(&name))?;
            record
                .map(|record| EdmTypeDefinition::new(name.clone(), record))
                .transpose()
        })
    }

    /// Resolve any type name: primitive, type definition, enum, complex or entity
    pub fn resolve_type(&self, name: &FullQualifiedName) -> Result<Option<EdmType>> {
        if name.namespace() == EDM_NAMESPACE {
            return Ok(EdmPrimitiveTypeKind::kind_of(name).map(EdmType::Primitive));
        }
        let name = self.resolve_alias(name)?;
        let inner = &self.inner;
        if let Some(found) = peek(&inner.type_definitions, &name) {
            return Ok(Some(EdmType::Definition(found)));
        }
        if let Some(found) = peek(&inner.enum_types, &name) {
            return Ok(Some(EdmType::Enum(found)));
        }
        if let Some(found) = peek(&inner.complex_types, &name) {
            return Ok(Some(EdmType::Complex(found)));
        }
        if let Some(found) = peek(&inner.entity_types, &name) {
            return Ok(Some(EdmType::Entity(found)));
        }

        if let Some(found) = self.type_definition(&name)? {
            return Ok(Some(EdmType::Definition(found)));
        }
        if let Some(found) = self.enum_type(&name)? {
            return Ok(Some(EdmType::Enum(found)));
        }
        if let Some(found) = self.complex_type(&name)? {
            return Ok(Some(EdmType::Complex(found)));
        }
        Ok(self.entity_type(&name)?.map(EdmType::Entity))
    }

    /// Every overload of the action `name`
    pub fn actions(&self, name: &FullQualifiedName) -> Result<Arc<Vec<Arc<EdmOperation>>>> {
        let name = self.resolve_alias(name)?;
        let set = cached(&self.inner.actions, &name, || {
            let records = self.fetch("actions", &name, |p| p.actions(&name))?;
            if records.is_empty() {
                return Ok(None);
            }
            let set = records
                .into_iter()
                .map(|record| EdmOperation::action(self, name.clone(), record).map(Arc::new))
                .collect::<Result<Vec<_>>>()?;
            check_overloads(&name, &set)?;
            Ok(Some(set))
        })?;
        Ok(set.unwrap_or_default())
    }

    /// Every overload of the function `name`
    pub fn functions(&self, name: &FullQualifiedName) -> Result<Arc<Vec<Arc<EdmOperation>>>> {
        let name = self.resolve_alias(name)?;
        let set = cached(&self.inner.functions, &name, || {
            let records = self.fetch("functions", &name, |p| p.functions(&name))?;
            if records.is_empty() {
                return Ok(None);
            }
            let set = records
                .into_iter()
                .map(|record| EdmOperation::function(self, name.clone(), record).map(Arc::new))
                .collect::<Result<Vec<_>>>()?;
            check_overloads(&name, &set)?;
            Ok(Some(set))
        })?;
        Ok(set.unwrap_or_default())
    }

    pub fn unbound_action(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmOperation>>> {
        Ok(self.actions(name)?.iter().find(|a| !a.is_bound()).cloned())
    }

    /// Unbound function overload whose parameter names equal `parameter_names`
    /// as a set. `None` picks the first declared unbound overload.
    pub fn unbound_function(
        &self,
        name: &FullQualifiedName,
        parameter_names: Option<&[&str]>,
    ) -> Result<Option<Arc<EdmOperation>>> {
        Ok(self
            .functions(name)?
            .iter()
            .filter(|f| !f.is_bound())
            .find(|f| parameter_names.is_none_or(|names| f.matches_parameter_names(names)))
            .cloned())
    }

    pub fn unbound_functions(&self, name: &FullQualifiedName) -> Result<Vec<Arc<EdmOperation>>> {
        Ok(self
            .functions(name)?
            .iter()
            .filter(|f| !f.is_bound())
            .cloned()
            .collect())
    }

    /// Bound action whose binding parameter has exactly this type and collection flag
    pub fn bound_action(
        &self,
        name: &FullQualifiedName,
        binding_type: &FullQualifiedName,
        is_binding_collection: bool,
    ) -> Result<Option<Arc<EdmOperation>>> {
        let binding_type = self.resolve_alias(binding_type)?;
        Ok(self
            .actions(name)?
            .iter()
            .find(|a| a.is_bound_to(&binding_type, is_binding_collection))
            .cloned())
    }

    /// Bound function overload; binding type must match exactly, no base type covariance
    pub fn bound_function(
        &self,
        name: &FullQualifiedName,
        binding_type: &FullQualifiedName,
        is_binding_collection: bool,
        parameter_names: Option<&[&str]>,
    ) -> Result<Option<Arc<EdmOperation>>> {
        let binding_type = self.resolve_alias(binding_type)?;
        Ok(self
            .functions(name)?
            .iter()
            .filter(|f| f.is_bound_to(&binding_type, is_binding_collection))
            .find(|f| parameter_names.is_none_or(|names| f.matches_parameter_names(names)))
            .cloned())
    }

    /// Every bound function named `name` accepting this binding type
    pub fn bound_functions(
        &self,
        name: &FullQualifiedName,
        binding_type: &FullQualifiedName,
        is_binding_collection: bool,
    ) -> Result<Vec<Arc<EdmOperation>>> {
        let binding_type = self.resolve_alias(binding_type)?;
        Ok(self
            .functions(name)?
            .iter()
            .filter(|f| f.is_bound_to(&binding_type, is_binding_collection))
            .cloned()
            .collect())
    }

    /// Container by name, or the single default container for `None`
    pub fn entity_container(
        &self,
        name: Option<&FullQualifiedName>,
    ) -> Result<Option<Arc<EdmEntityContainer>>> {
        let Some(name) = name else {
            return self.default_container();
        };
        let name = self.resolve_alias(name)?;
        cached(&self.inner.containers, &name, || {
            let info = self.fetch("entity container", &name, |p| p.entity_container_info(Some(&name)))?;
            Ok(info.map(|info| EdmEntityContainer::new(self, info.container_name, info.extends)))
        })
    }

    fn default_container(&self) -> Result<Option<Arc<EdmEntityContainer>>> {
        if let Some(container) = self.inner.default_container.read().as_ref() {
            return Ok(Some(Arc::clone(container)));
        }
        let Some(info) =
            self.fetch("entity container", &"<default>", |p| p.entity_container_info(None))?
        else {
            return Ok(None);
        };
        let name = info.container_name.clone();
        let container = insert_or_get(
            &self.inner.containers,
            &name,
            EdmEntityContainer::new(self, info.container_name, info.extends),
        );
        let mut slot = self.inner.default_container.write();
        Ok(Some(Arc::clone(slot.get_or_insert(container))))
    }

    pub fn term(&self, name: &FullQualifiedName) -> Result<Option<Arc<EdmTerm>>> {
        let name = self.resolve_alias(name)?;
        cached(&self.inner.terms, &name, || {
            let record = self.fetch("term", &name, |p| p.term(&name))?;
            record
                .map(|record| EdmTerm::new(self, name.clone(), record))
                .transpose()
        })
    }

    /// Annotations applied to `target`, optionally restricted to one qualifier
    pub fn annotation_group(
        &self,
        target: &str,
        qualifier: Option<&str>,
    ) -> Result<Option<Arc<EdmAnnotations>>> {
        let key = (target.to_string(), qualifier.map(str::to_string));
        cached(&self.inner.annotation_groups, &key, || {
            let record = self.fetch("annotations", &target, |p| p.annotations_group(target, qualifier))?;
            record.map(|record| EdmAnnotations::new(self, record)).transpose()
        })
    }

    /// Materialise every provider schema once.
    ///
    /// Elements already cached are reused, and elements first built here are
    /// cached, so later named lookups return the very same instances.
    pub fn schemas(&self) -> Result<&[Arc<EdmSchema>]> {
        let schemas = self.inner.schemas.get_or_try_init(|| {
            let records = self.fetch("schemas", &"*", |p| p.schemas())?;
            debug!("Materialising {} schemas", records.len());
            records
                .into_iter()
                .map(|record| self.materialise(record).map(Arc::new))
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(schemas)
    }

    fn materialise(&self, record: CsdlSchema) -> Result<EdmSchema> {
        let inner = &self.inner;
        let namespace = record.namespace.clone();
        let qualify = |name: &str| FullQualifiedName::new(namespace.clone(), name);
        let mut schema = EdmSchema::empty(namespace.clone(), record.alias.clone());

        for entity in record.entity_types {
            let name = qualify(&entity.name);
            schema.entity_types.push(insert_or_build(&inner.entity_types, &name, || {
                EdmStructuredType::from_entity(self, name.clone(), entity)
            })?);
        }
        for complex in record.complex_types {
            let name = qualify(&complex.name);
            schema.complex_types.push(insert_or_build(&inner.complex_types, &name, || {
                EdmStructuredType::from_complex(self, name.clone(), complex)
            })?);
        }
        for enumeration in record.enum_types {
            let name = qualify(&enumeration.name);
            schema.enum_types.push(insert_or_build(&inner.enum_types, &name, || {
                EdmEnumType::new(name.clone(), enumeration)
            })?);
        }
        for definition in record.type_definitions {
            let name = qualify(&definition.name);
            schema.type_definitions.push(insert_or_build(&inner.type_definitions, &name, || {
                EdmTypeDefinition::new(name.clone(), definition)
            })?);
        }

        let mut actions: HashMap<FullQualifiedName, Vec<_>> = HashMap::new();
        let mut action_order = Vec::new();
        for action in record.actions {
            let name = qualify(&action.name);
            if !actions.contains_key(&name) {
                action_order.push(name.clone());
            }
            actions.entry(name).or_default().push(action);
        }
        for name in action_order {
            let records = actions.remove(&name).unwrap_or_default();
            let set = insert_or_build(&inner.actions, &name, || {
                let set = records
                    .into_iter()
                    .map(|r| EdmOperation::action(self, name.clone(), r).map(Arc::new))
                    .collect::<Result<Vec<_>>>()?;
                check_overloads(&name, &set)?;
                Ok(set)
            })?;
            schema.actions.extend(set.iter().cloned());
        }

        let mut functions: HashMap<FullQualifiedName, Vec<_>> = HashMap::new();
        let mut function_order = Vec::new();
        for function in record.functions {
            let name = qualify(&function.name);
            if !functions.contains_key(&name) {
                function_order.push(name.clone());
            }
            functions.entry(name).or_default().push(function);
        }
        for name in function_order {
            let records = functions.remove(&name).unwrap_or_default();
            let set = insert_or_build(&inner.functions, &name, || {
                let set = records
                    .into_iter()
                    .map(|r| EdmOperation::function(self, name.clone(), r).map(Arc::new))
                    .collect::<Result<Vec<_>>>()?;
                check_overloads(&name, &set)?;
                Ok(set)
            })?;
            schema.functions.extend(set.iter().cloned());
        }

        for term in record.terms {
            let name = qualify(&term.name);
            schema.terms.push(insert_or_build(&inner.terms, &name, || {
                EdmTerm::new(self, name.clone(), term)
            })?);
        }

        if let Some(container) = record.entity_container {
            let name = qualify(&container.name);
            let edm_container = insert_or_get(
                &inner.containers,
                &name,
                EdmEntityContainer::new(self, name.clone(), container.extends.clone()),
            );
            edm_container.absorb(self, container)?;
            schema.entity_container = Some(edm_container);
        }

        for group in record.annotation_groups {
            let key = (group.target.clone(), group.qualifier.clone());
            schema.annotation_groups.push(insert_or_build(&inner.annotation_groups, &key, || {
                EdmAnnotations::new(self, group)
            })?);
        }

        Ok(schema)
    }
}

impl fmt::Debug for Edm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("Edm")
            .field("entity_types", &inner.entity_types.read().len())
            .field("complex_types", &inner.complex_types.read().len())
            .field("enum_types", &inner.enum_types.read().len())
            .field("type_definitions", &inner.type_definitions.read().len())
            .field("actions", &inner.actions.read().len())
            .field("functions", &inner.functions.read().len())
            .field("containers", &inner.containers.read().len())
            .finish_non_exhaustive()
    }
}
