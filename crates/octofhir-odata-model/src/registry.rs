//! In-memory metadata provider
//!
//! Serves a list of `CsdlSchema` records. Schemas can be registered after
//! construction; lookups always see the current list.

use crate::csdl::{
    CsdlAction, CsdlActionImport, CsdlAliasInfo, CsdlAnnotations, CsdlComplexType,
    CsdlEntityContainer, CsdlEntityContainerInfo, CsdlEntitySet, CsdlEntityType, CsdlEnumType,
    CsdlFunction, CsdlFunctionImport, CsdlSchema, CsdlSingleton, CsdlTerm, CsdlTypeDefinition,
};
use crate::provider::{MetadataProvider, MetadataProviderError, ProviderResult};
use log::debug;
use octofhir_odata_types::FullQualifiedName;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

/// Provider backed by schema records held in memory
#[derive(Clone, Default)]
pub struct InMemoryProvider {
    schemas: Arc<RwLock<Vec<CsdlSchema>>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Many(Vec<CsdlSchema>),
    One(Box<CsdlSchema>),
}

impl InMemoryProvider {
    pub fn new(schemas: Vec<CsdlSchema>) -> Self {
        Self {
            schemas: Arc::new(RwLock::new(schemas)),
        }
    }

    /// Load a schema or a list of schemas from a JSON string
    pub fn from_json(json: &str) -> Result<Self, MetadataProviderError> {
        let document: SchemaDocument =
            serde_json::from_str(json).map_err(|e| MetadataProviderError::ParseError(e.to_string()))?;
        let schemas = match document {
            SchemaDocument::Many(schemas) => schemas,
            SchemaDocument::One(schema) => vec![*schema],
        };
        debug!("Loaded {} schema(s) from JSON", schemas.len());
        Ok(Self::new(schemas))
    }

    /// Load schemas from a JSON file at runtime
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, MetadataProviderError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| MetadataProviderError::IoError(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Load schemas from a file, choosing the format by extension
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, MetadataProviderError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some(ext) => Err(MetadataProviderError::ParseError(format!(
                "Unsupported file extension: .{ext}. Expected .json"
            ))),
            None => Err(MetadataProviderError::ParseError(
                "No file extension found. Expected .json".to_string(),
            )),
        }
    }

    /// Add a schema, replacing any schema with the same namespace
    pub fn register_schema(&self, schema: CsdlSchema) {
        let mut schemas = self.schemas.write();
        match schemas.iter_mut().find(|s| s.namespace == schema.namespace) {
            Some(existing) => *existing = schema,
            None => schemas.push(schema),
        }
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.schemas.read().iter().map(|s| s.namespace.clone()).collect()
    }

    fn find_in_namespace<T>(
        &self,
        namespace: &str,
        find: impl FnOnce(&CsdlSchema) -> Option<T>,
    ) -> Option<T> {
        let schemas = self.schemas.read();
        schemas.iter().find(|s| s.namespace == namespace).and_then(find)
    }

    fn find_in_container<T>(
        &self,
        container: &FullQualifiedName,
        find: impl FnOnce(&CsdlEntityContainer) -> Option<T>,
    ) -> Option<T> {
        self.find_in_namespace(container.namespace(), |schema| {
            schema
                .entity_container
                .as_ref()
                .filter(|c| c.name == container.name())
                .and_then(find)
        })
    }

    /// The only container across all schemas
    fn default_container(&self) -> ProviderResult<Option<(FullQualifiedName, CsdlEntityContainer)>> {
        let schemas = self.schemas.read();
        let mut containers = schemas.iter().filter_map(|s| {
            let container = s.entity_container.as_ref()?;
            Some((s.container_name()?, container))
        });
        let Some((name, container)) = containers.next() else {
            return Ok(None);
        };
        if let Some((other, _)) = containers.next() {
            return Err(MetadataProviderError::AmbiguousContainer(format!(
                "{name} and {other} are both declared; name the container explicitly"
            )));
        }
        Ok(Some((name, container.clone())))
    }
}

impl MetadataProvider for InMemoryProvider {
    fn entity_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlEntityType>> {
        Ok(self.find_in_namespace(name.namespace(), |s| {
            s.entity_types.iter().find(|t| t.name == name.name()).cloned()
        }))
    }

    fn complex_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlComplexType>> {
        Ok(self.find_in_namespace(name.namespace(), |s| {
            s.complex_types.iter().find(|t| t.name == name.name()).cloned()
        }))
    }

    fn enum_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlEnumType>> {
        Ok(self.find_in_namespace(name.namespace(), |s| {
            s.enum_types.iter().find(|t| t.name == name.name()).cloned()
        }))
    }

    fn type_definition(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlTypeDefinition>> {
        Ok(self.find_in_namespace(name.namespace(), |s| {
            s.type_definitions.iter().find(|t| t.name == name.name()).cloned()
        }))
    }

    fn actions(&self, name: &FullQualifiedName) -> ProviderResult<Vec<CsdlAction>> {
        Ok(self
            .find_in_namespace(name.namespace(), |s| {
                Some(s.actions.iter().filter(|a| a.name == name.name()).cloned().collect())
            })
            .unwrap_or_default())
    }

    fn functions(&self, name: &FullQualifiedName) -> ProviderResult<Vec<CsdlFunction>> {
        Ok(self
            .find_in_namespace(name.namespace(), |s| {
                Some(s.functions.iter().filter(|f| f.name == name.name()).cloned().collect())
            })
            .unwrap_or_default())
    }

    fn term(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlTerm>> {
        Ok(self.find_in_namespace(name.namespace(), |s| {
            s.terms.iter().find(|t| t.name == name.name()).cloned()
        }))
    }

    fn entity_container(&self) -> ProviderResult<Option<CsdlEntityContainer>> {
        Ok(self.default_container()?.map(|(_, container)| container))
    }

    fn entity_container_info(
        &self,
        name: Option<&FullQualifiedName>,
    ) -> ProviderResult<Option<CsdlEntityContainerInfo>> {
        let found = match name {
            Some(name) => self
                .find_in_container(name, |c| Some(c.clone()))
                .map(|c| (name.clone(), c)),
            None => self.default_container()?,
        };
        Ok(found.map(|(container_name, container)| CsdlEntityContainerInfo {
            container_name,
            extends: container.extends,
        }))
    }

    fn entity_set(&self, container: &FullQualifiedName, name: &str) -> ProviderResult<Option<CsdlEntitySet>> {
        Ok(self.find_in_container(container, |c| c.entity_set(name).cloned()))
    }

    fn singleton(&self, container: &FullQualifiedName, name: &str) -> ProviderResult<Option<CsdlSingleton>> {
        Ok(self.find_in_container(container, |c| c.singleton(name).cloned()))
    }

    fn action_import(
        &self,
        container: &FullQualifiedName,
        name: &str,
    ) -> ProviderResult<Option<CsdlActionImport>> {
        Ok(self.find_in_container(container, |c| c.action_import(name).cloned()))
    }

    fn function_import(
        &self,
        container: &FullQualifiedName,
        name: &str,
    ) -> ProviderResult<Option<CsdlFunctionImport>> {
        Ok(self.find_in_container(container, |c| c.function_import(name).cloned()))
    }

    fn alias_infos(&self) -> ProviderResult<Vec<CsdlAliasInfo>> {
        Ok(self
            .schemas
            .read()
            .iter()
            .filter_map(|s| {
                s.alias
                    .as_ref()
                    .map(|alias| CsdlAliasInfo::new(alias.clone(), s.namespace.clone()))
            })
            .collect())
    }

    fn schemas(&self) -> ProviderResult<Vec<CsdlSchema>> {
        Ok(self.schemas.read().clone())
    }

    fn annotations_group(
        &self,
        target: &str,
        qualifier: Option<&str>,
    ) -> ProviderResult<Option<CsdlAnnotations>> {
        let schemas = self.schemas.read();
        Ok(schemas
            .iter()
            .flat_map(|s| s.annotation_groups.iter())
            .find(|g| g.target == target && g.qualifier.as_deref() == qualifier)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEMO: &str = r#"{
        "namespace": "demo.ns",
        "alias": "Demo",
        "entityTypes": [{
            "name": "ETPerson",
            "key": [{"name": "Id"}],
            "properties": [
                {"name": "Id", "type": "Edm.Int32", "nullable": false},
                {"name": "Name", "type": "Edm.String", "maxLength": 40}
            ]
        }],
        "entityContainer": {
            "name": "Container",
            "entitySets": [{"name": "People", "type": "demo.ns.ETPerson"}]
        }
    }"#;

    fn fqn(text: &str) -> FullQualifiedName {
        FullQualifiedName::parse(text).unwrap()
    }

    #[test]
    fn test_from_json_single_schema() {
        let provider = InMemoryProvider::from_json(DEMO).unwrap();
        let person = provider.entity_type(&fqn("demo.ns.ETPerson")).unwrap().unwrap();
        assert_eq!(person.key[0].name, "Id");
        assert!(!person.properties[0].nullable);
        assert_eq!(person.properties[1].facets.max_length, Some(40));
        assert!(provider.entity_type(&fqn("demo.ns.Missing")).unwrap().is_none());
    }

    #[test]
    fn test_container_lookups() {
        let provider = InMemoryProvider::from_json(DEMO).unwrap();
        let info = provider.entity_container_info(None).unwrap().unwrap();
        assert_eq!(info.container_name, fqn("demo.ns.Container"));

        let set = provider
            .entity_set(&info.container_name, "People")
            .unwrap()
            .unwrap();
        assert_eq!(set.type_name, fqn("demo.ns.ETPerson"));
        assert!(set.include_in_service_document);
    }

    #[test]
    fn test_ambiguous_default_container() {
        let provider = InMemoryProvider::new(vec![
            CsdlSchema::new("a").with_entity_container(CsdlEntityContainer::new("C1")),
            CsdlSchema::new("b").with_entity_container(CsdlEntityContainer::new("C2")),
        ]);
        assert!(matches!(
            provider.entity_container_info(None),
            Err(MetadataProviderError::AmbiguousContainer(_))
        ));
        assert!(provider.entity_container_info(Some(&fqn("b.C2"))).unwrap().is_some());
    }

    #[test]
    fn test_register_schema_after_probe() {
        let provider = InMemoryProvider::default();
        assert!(provider.entity_type(&fqn("late.ET")).unwrap().is_none());

        provider.register_schema(
            CsdlSchema::new("late").with_entity_types(vec![CsdlEntityType::new("ET")]),
        );
        assert!(provider.entity_type(&fqn("late.ET")).unwrap().is_some());
    }

    #[test]
    fn test_alias_infos() {
        let provider = InMemoryProvider::from_json(DEMO).unwrap();
        assert_eq!(
            provider.alias_infos().unwrap(),
            vec![CsdlAliasInfo::new("Demo", "demo.ns")]
        );
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[{DEMO}]").unwrap();
        file.flush().unwrap();

        let provider = InMemoryProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.namespaces(), vec!["demo.ns".to_string()]);
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        assert!(matches!(
            InMemoryProvider::from_file(file.path()),
            Err(MetadataProviderError::ParseError(_))
        ));
    }
}
