//! Actions, functions and their overload sets

use crate::edm::EdmInner;
use crate::property::resolve_referenced;
use crate::{Edm, EdmBindingTarget, EdmType};
use octofhir_odata_diagnostics::{ODATA0307, ODATA0310, ODataError, Result};
use octofhir_odata_model::{CsdlAction, CsdlFunction, CsdlParameter, CsdlReturnType};
use octofhir_odata_types::{Facets, FullQualifiedName};
use std::collections::HashSet;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Action,
    Function,
}

#[derive(Debug)]
pub struct EdmParameter {
    edm: Weak<EdmInner>,
    name: String,
    type_name: FullQualifiedName,
    collection: bool,
    nullable: bool,
    facets: Facets,
}

impl EdmParameter {
    fn new(edm: &Edm, record: CsdlParameter) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            type_name: edm.resolve_alias(&record.type_name)?,
            name: record.name,
            collection: record.collection,
            nullable: record.nullable,
            facets: record.facets,
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
}

#[derive(Debug)]
pub struct EdmReturnType {
    edm: Weak<EdmInner>,
    type_name: FullQualifiedName,
    collection: bool,
    nullable: bool,
    facets: Facets,
}

impl EdmReturnType {
    fn new(edm: &Edm, record: CsdlReturnType) -> Result<Self> {
        Ok(Self {
            edm: edm.downgrade(),
            type_name: edm.resolve_alias(&record.type_name)?,
            collection: record.collection,
            nullable: record.nullable,
            facets: record.facets,
        })
    }

    pub fn type_name(&self) -> &FullQualifiedName {
        &self.type_name
    }

    pub fn type_(&self) -> Result<EdmType> {
        resolve_referenced(&self.edm, &self.type_name, "return type")
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
}

/// One overload of an action or function
#[derive(Debug)]
pub struct EdmOperation {
    name: FullQualifiedName,
    kind: OperationKind,
    is_bound: bool,
    is_composable: bool,
    entity_set_path: Option<String>,
    parameters: Vec<Arc<EdmParameter>>,
    return_type: Option<EdmReturnType>,
}

impl EdmOperation {
    pub(crate) fn action(edm: &Edm, name: FullQualifiedName, record: CsdlAction) -> Result<Self> {
        let return_type = record
            .return_type
            .map(|r| EdmReturnType::new(edm, r))
            .transpose()?;
        Self::build(
            edm,
            name,
            OperationKind::Action,
            record.is_bound,
            false,
            record.entity_set_path,
            record.parameters,
            return_type,
        )
    }

    pub(crate) fn function(edm: &Edm, name: FullQualifiedName, record: CsdlFunction) -> Result<Self> {
        let return_type = Some(EdmReturnType::new(edm, record.return_type)?);
        Self::build(
            edm,
            name,
            OperationKind::Function,
            record.is_bound,
            record.is_composable,
            record.entity_set_path,
            record.parameters,
            return_type,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        edm: &Edm,
        name: FullQualifiedName,
        kind: OperationKind,
        is_bound: bool,
        is_composable: bool,
        entity_set_path: Option<String>,
        parameters: Vec<CsdlParameter>,
        return_type: Option<EdmReturnType>,
    ) -> Result<Self> {
        if is_bound && parameters.is_empty() {
            return Err(ODataError::model(
                ODATA0310,
                format!("Bound operation '{name}' declares no binding parameter"),
                name.to_string(),
            ));
        }
        let parameters = parameters
            .into_iter()
            .map(|p| EdmParameter::new(edm, p).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name,
            kind,
            is_bound,
            is_composable,
            entity_set_path,
            parameters,
            return_type,
        })
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_action(&self) -> bool {
        self.kind == OperationKind::Action
    }

    pub fn is_function(&self) -> bool {
        self.kind == OperationKind::Function
    }

    pub fn is_bound(&self) -> bool {
        self.is_bound
    }

    pub fn is_composable(&self) -> bool {
        self.is_composable
    }

    pub fn entity_set_path(&self) -> Option<&str> {
        self.entity_set_path.as_deref()
    }

    pub fn parameters(&self) -> &[Arc<EdmParameter>] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Arc<EdmParameter>> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn return_type(&self) -> Option<&EdmReturnType> {
        self.return_type.as_ref()
    }

    /// First parameter of a bound operation
    pub fn binding_parameter(&self) -> Option<&Arc<EdmParameter>> {
        if self.is_bound {
            self.parameters.first()
        } else {
            None
        }
    }

    pub fn binding_type_name(&self) -> Option<&FullQualifiedName> {
        self.binding_parameter().map(|p| p.type_name())
    }

    pub fn is_binding_collection(&self) -> bool {
        self.binding_parameter().is_some_and(|p| p.is_collection())
    }

    /// Exact binding match: same type name and collection flag
    pub fn is_bound_to(&self, binding_type: &FullQualifiedName, is_collection: bool) -> bool {
        self.binding_parameter()
            .is_some_and(|p| &p.type_name == binding_type && p.collection == is_collection)
    }

    /// Parameters a caller supplies explicitly
    pub fn non_binding_parameters(&self) -> &[Arc<EdmParameter>] {
        if self.is_bound {
            &self.parameters[1..]
        } else {
            &self.parameters
        }
    }

    fn non_binding_name_set(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.non_binding_parameters().iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Set equality between `names` and the non-binding parameter names
    pub fn matches_parameter_names(&self, names: &[&str]) -> bool {
        let supplied: HashSet<&str> = names.iter().copied().collect();
        let declared: HashSet<&str> = self
            .non_binding_parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        supplied == declared
    }

    /// Entity set returned when invoked on `binding_target`, following
    /// the entity set path through navigation property bindings
    pub fn returned_entity_set(
        &self,
        binding_target: Option<&Arc<EdmBindingTarget>>,
    ) -> Result<Option<Arc<EdmBindingTarget>>> {
        let (Some(path), Some(start)) = (&self.entity_set_path, binding_target) else {
            return Ok(None);
        };
        let mut current = Arc::clone(start);
        for segment in path.split('/').skip(1) {
            match current.related_binding_target(segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Reject overload sets that cannot be told apart
pub(crate) fn check_overloads(name: &FullQualifiedName, overloads: &[Arc<EdmOperation>]) -> Result<()> {
    let mut unbound = HashSet::new();
    let mut bound = HashSet::new();
    for op in overloads {
        let duplicate = match op.binding_parameter() {
            None => !unbound.insert(op.non_binding_name_set()),
            Some(binding) => {
                let names = if op.is_function() { op.non_binding_name_set() } else { Vec::new() };
                !bound.insert((binding.type_name.clone(), binding.collection, names))
            }
        };
        if duplicate {
            return Err(ODataError::model(
                ODATA0307,
                format!("Overloads of '{name}' cannot be distinguished"),
                name.to_string(),
            ));
        }
    }
    Ok(())
}
