//! Metadata provider SPI consumed by the EDM

use crate::csdl::{
    CsdlAction, CsdlActionImport, CsdlAliasInfo, CsdlAnnotations, CsdlComplexType,
    CsdlEntityContainer, CsdlEntityContainerInfo, CsdlEntitySet, CsdlEntityType, CsdlEnumType,
    CsdlFunction, CsdlFunctionImport, CsdlSchema, CsdlSingleton, CsdlTerm, CsdlTypeDefinition,
};
use octofhir_odata_types::FullQualifiedName;

/// Result type of provider calls
pub type ProviderResult<T> = Result<T, MetadataProviderError>;

/// Source of raw schema metadata
///
/// The EDM is the only caller. Every lookup is by qualified name; aliases are
/// expanded before the provider sees a name. Providers may be slow (disk or
/// network backed); the EDM calls each method at most once per name and
/// caches what comes back.
///
/// All methods default to "nothing declared" so a provider only implements
/// what it serves.
pub trait MetadataProvider: Send + Sync {
    fn entity_type(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlEntityType>> {
        Ok(None)
    }

    fn complex_type(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlComplexType>> {
        Ok(None)
    }

    fn enum_type(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlEnumType>> {
        Ok(None)
    }

    fn type_definition(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlTypeDefinition>> {
        Ok(None)
    }

    /// Every action overload sharing `name`
    fn actions(&self, _name: &FullQualifiedName) -> ProviderResult<Vec<CsdlAction>> {
        Ok(Vec::new())
    }

    /// Every function overload sharing `name`
    fn functions(&self, _name: &FullQualifiedName) -> ProviderResult<Vec<CsdlFunction>> {
        Ok(Vec::new())
    }

    fn term(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlTerm>> {
        Ok(None)
    }

    /// The service's default entity container
    fn entity_container(&self) -> ProviderResult<Option<CsdlEntityContainer>> {
        Ok(None)
    }

    /// Container info by name; `None` asks for the default container
    fn entity_container_info(
        &self,
        _name: Option<&FullQualifiedName>,
    ) -> ProviderResult<Option<CsdlEntityContainerInfo>> {
        Ok(None)
    }

    fn entity_set(&self, _container: &FullQualifiedName, _name: &str) -> ProviderResult<Option<CsdlEntitySet>> {
        Ok(None)
    }

    fn singleton(&self, _container: &FullQualifiedName, _name: &str) -> ProviderResult<Option<CsdlSingleton>> {
        Ok(None)
    }

    fn action_import(
        &self,
        _container: &FullQualifiedName,
        _name: &str,
    ) -> ProviderResult<Option<CsdlActionImport>> {
        Ok(None)
    }

    fn function_import(
        &self,
        _container: &FullQualifiedName,
        _name: &str,
    ) -> ProviderResult<Option<CsdlFunctionImport>> {
        Ok(None)
    }

    fn alias_infos(&self) -> ProviderResult<Vec<CsdlAliasInfo>> {
        Ok(Vec::new())
    }

    fn schemas(&self) -> ProviderResult<Vec<CsdlSchema>> {
        Ok(Vec::new())
    }

    fn annotations_group(
        &self,
        _target: &str,
        _qualifier: Option<&str>,
    ) -> ProviderResult<Option<CsdlAnnotations>> {
        Ok(None)
    }
}

/// Metadata provider error
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataProviderError {
    #[error("Ambiguous entity container: {0}")]
    AmbiguousContainer(String),

    #[error("Schema not available: {0}")]
    Unavailable(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
