use octofhir_odata_diagnostics::{
    ODATA0300, ODATA0302, ODATA0303, ODATA0304, ODATA0305, ODATA0307, ODATA0401, ODATA0402,
};
use octofhir_odata_edm::{Edm, EdmType, StructuredKind};
use octofhir_odata_model::{
    CsdlAction, CsdlActionImport, CsdlAliasInfo, CsdlAnnotation, CsdlAnnotations, CsdlComplexType,
    CsdlEntityContainer, CsdlEntityContainerInfo, CsdlEntitySet, CsdlEntityType, CsdlEnumMember,
    CsdlEnumType, CsdlFunction, CsdlFunctionImport, CsdlNavigationProperty,
    CsdlNavigationPropertyBinding, CsdlParameter, CsdlProperty, CsdlPropertyRef, CsdlReturnType,
    CsdlSchema, CsdlSingleton, CsdlTerm, InMemoryProvider, MetadataProvider,
    MetadataProviderError, ProviderResult,
};
use octofhir_odata_types::{EdmPrimitiveTypeKind, FullQualifiedName};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn fqn(name: &str) -> FullQualifiedName {
    FullQualifiedName::parse(name).unwrap()
}

fn prop(name: &str, ty: &str) -> CsdlProperty {
    CsdlProperty::new(name, fqn(ty))
}

fn schema() -> CsdlSchema {
    CsdlSchema::new("ns")
        .with_alias("Alias")
        .with_entity_types(vec![
            CsdlEntityType::new("ETBase")
                .with_key(vec![CsdlPropertyRef::new("PropertyInt16")])
                .with_properties(vec![
                    prop("PropertyInt16", "Edm.Int16").with_nullable(false),
                    prop("PropertyString", "Edm.String"),
                ])
                .with_navigation_properties(vec![
                    CsdlNavigationProperty::new("NavDerived", fqn("ns.ETDerived"))
                        .with_collection(true)
                        .with_partner("NavBase"),
                ]),
            CsdlEntityType::new("ETDerived")
                .with_base_type(fqn("Alias.ETBase"))
                .with_properties(vec![prop("AdditionalProperty", "Edm.String")])
                .with_navigation_properties(vec![CsdlNavigationProperty::new("NavBase", fqn("ns.ETBase"))]),
            CsdlEntityType::new("ETCycleA").with_base_type(fqn("ns.ETCycleB")),
            CsdlEntityType::new("ETCycleB").with_base_type(fqn("ns.ETCycleA")),
            CsdlEntityType::new("ETAbstract").with_abstract(true),
            CsdlEntityType::new("ETNoKey").with_base_type(fqn("ns.ETAbstract")),
            CsdlEntityType::new("ETCompKey")
                .with_key(vec![
                    CsdlPropertyRef::new("PropertyInt16"),
                    CsdlPropertyRef::new("PropertyComp/PropertyInt32").with_alias("KeyAlias"),
                ])
                .with_properties(vec![
                    prop("PropertyInt16", "Edm.Int16"),
                    prop("PropertyComp", "ns.CTPrim"),
                ]),
            CsdlEntityType::new("ETAliasWithoutPath")
                .with_key(vec![CsdlPropertyRef::new("PropertyInt16").with_alias("A")])
                .with_properties(vec![prop("PropertyInt16", "Edm.Int16")]),
            CsdlEntityType::new("ETPathWithoutAlias")
                .with_key(vec![CsdlPropertyRef::new("PropertyComp/PropertyInt32")])
                .with_properties(vec![prop("PropertyComp", "ns.CTPrim")]),
            CsdlEntityType::new("ETMissingKey").with_key(vec![CsdlPropertyRef::new("Nope")]),
        ])
        .with_complex_types(vec![
            CsdlComplexType::new("CTPrim").with_properties(vec![prop("PropertyInt32", "Edm.Int32")]),
        ])
        .with_enum_types(vec![
            CsdlEnumType::new("ENFlags").with_flags(true).with_members(vec![
                CsdlEnumMember::new("A", 2),
                CsdlEnumMember::new("B", 4),
                CsdlEnumMember::new("C", 8),
            ]),
        ])
        .with_actions(vec![
            CsdlAction::new("o1"),
            CsdlAction::new("o1")
                .with_bound(true)
                .with_parameters(vec![CsdlParameter::new("Binding", fqn("ns.ETBase"))]),
            CsdlAction::new("o1")
                .with_bound(true)
                .with_parameters(vec![CsdlParameter::new("Binding", fqn("ns.ETDerived"))]),
        ])
        .with_functions(vec![
            CsdlFunction::new("f1", CsdlReturnType::new(fqn("Edm.String"))),
            CsdlFunction::new("f1", CsdlReturnType::new(fqn("Edm.String")))
                .with_parameters(vec![CsdlParameter::new("P1", fqn("Edm.Int16"))]),
            CsdlFunction::new("f1", CsdlReturnType::new(fqn("ns.ETDerived")).with_collection(true))
                .with_bound(true)
                .with_entity_set_path("Binding/NavDerived")
                .with_parameters(vec![CsdlParameter::new("Binding", fqn("ns.ETBase")).with_collection(true)]),
        ])
        .with_terms(vec![
            CsdlTerm::new("Description", fqn("Edm.String")),
            CsdlTerm::new("LongDescription", fqn("Edm.String")).with_base_term(fqn("Alias.Description")),
        ])
        .with_entity_container(
            CsdlEntityContainer::new("Container")
                .with_entity_sets(vec![
                    CsdlEntitySet::new("ESBase", fqn("ns.ETBase")).with_navigation_property_bindings(vec![
                        CsdlNavigationPropertyBinding::new("NavDerived", "ESDerived"),
                    ]),
                    CsdlEntitySet::new("ESDerived", fqn("ns.ETDerived")).with_navigation_property_bindings(
                        vec![CsdlNavigationPropertyBinding::new("NavBase", "ns.Container/ESBase")],
                    ),
                    CsdlEntitySet::new("ESBroken", fqn("ns.ETBase")).with_navigation_property_bindings(vec![
                        CsdlNavigationPropertyBinding::new("NavDerived", "ESNowhere"),
                    ]),
                ])
                .with_singletons(vec![CsdlSingleton::new("SIBase", fqn("ns.ETBase"))])
                .with_action_imports(vec![CsdlActionImport::new("AIo1", fqn("ns.o1"))])
                .with_function_imports(vec![
                    CsdlFunctionImport::new("FIf1", fqn("ns.f1")).with_entity_set("ESDerived"),
                ]),
        )
        .with_annotation_groups(vec![
            CsdlAnnotations::new("ns.ETBase").with_annotations(vec![
                CsdlAnnotation::new(fqn("Alias.Description")).with_value(serde_json::json!("Base")),
            ]),
        ])
}

/// Wraps a provider and counts calls per method and name
struct CountingProvider {
    inner: InMemoryProvider,
    calls: Mutex<HashMap<String, usize>>,
    schema_calls: AtomicUsize,
}

impl CountingProvider {
    fn new(inner: InMemoryProvider) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            schema_calls: AtomicUsize::new(0),
        }
    }

    fn record(&self, method: &str, name: &dyn std::fmt::Display) {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(format!("{method}:{name}"))
            .or_default() += 1;
    }

    fn count(&self, method: &str, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&format!("{method}:{name}"))
            .copied()
            .unwrap_or(0)
    }
}

impl MetadataProvider for CountingProvider {
    fn entity_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlEntityType>> {
        self.record("entity_type", name);
        self.inner.entity_type(name)
    }

    fn complex_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlComplexType>> {
        self.record("complex_type", name);
        self.inner.complex_type(name)
    }

    fn enum_type(&self, name: &FullQualifiedName) -> ProviderResult<Option<CsdlEnumType>> {
        self.record("enum_type", name);
        self.inner.enum_type(name)
    }

    fn actions(&self, name: &FullQualifiedName) -> ProviderResult<Vec<CsdlAction>> {
        self.record("actions", name);
        self.inner.actions(name)
    }

    fn functions(&self, name: &FullQualifiedName) -> ProviderResult<Vec<CsdlFunction>> {
        self.record("functions", name);
        self.inner.functions(name)
    }

    fn entity_container_info(
        &self,
        name: Option<&FullQualifiedName>,
    ) -> ProviderResult<Option<CsdlEntityContainerInfo>> {
        self.inner.entity_container_info(name)
    }

    fn entity_set(&self, container: &FullQualifiedName, name: &str) -> ProviderResult<Option<CsdlEntitySet>> {
        self.record("entity_set", &name);
        self.inner.entity_set(container, name)
    }

    fn alias_infos(&self) -> ProviderResult<Vec<CsdlAliasInfo>> {
        self.inner.alias_infos()
    }

    fn schemas(&self) -> ProviderResult<Vec<CsdlSchema>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.schemas()
    }
}

/// Fails every lookup
struct BrokenProvider;

impl MetadataProvider for BrokenProvider {
    fn entity_type(&self, _name: &FullQualifiedName) -> ProviderResult<Option<CsdlEntityType>> {
        Err(MetadataProviderError::Unavailable("disk on fire".to_string()))
    }
}

fn edm() -> Edm {
    Edm::new(InMemoryProvider::new(vec![schema()]))
}

#[test]
fn test_inherited_properties_come_first() {
    let edm = edm();
    let derived = edm.entity_type(&fqn("ns.ETDerived")).unwrap().unwrap();
    assert_eq!(
        derived.property_names().unwrap(),
        vec!["PropertyInt16", "PropertyString", "AdditionalProperty"]
    );
    assert_eq!(derived.navigation_property_names().unwrap(), vec!["NavDerived", "NavBase"]);

    let first = derived.property("PropertyInt16").unwrap().unwrap();
    let second = derived.property("PropertyInt16").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let base = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
    let from_base = base.property("PropertyInt16").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &from_base));
}

#[test]
fn test_provider_called_once_per_name() {
    let provider = Arc::new(CountingProvider::new(InMemoryProvider::new(vec![schema()])));
    let edm = Edm::with_provider(provider.clone());

    let a = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
    let b = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
    let c = edm.entity_type(&fqn("Alias.ETBase")).unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(provider.count("entity_type", "ns.ETBase"), 1);

    edm.actions(&fqn("ns.o1")).unwrap();
    edm.bound_action(&fqn("ns.o1"), &fqn("ns.ETBase"), false).unwrap();
    edm.unbound_action(&fqn("ns.o1")).unwrap();
    assert_eq!(provider.count("actions", "ns.o1"), 1);

    let container = edm.entity_container(None).unwrap().unwrap();
    container.entity_set("ESBase").unwrap().unwrap();
    container.entity_set("ESBase").unwrap().unwrap();
    assert_eq!(provider.count("entity_set", "ESBase"), 1);
}

#[test]
fn test_absent_names_are_not_cached() {
    let provider = InMemoryProvider::default();
    let edm = Edm::new(provider.clone());
    assert!(edm.entity_type(&fqn("ns.ETBase")).unwrap().is_none());

    provider.register_schema(schema());
    assert!(edm.entity_type(&fqn("ns.ETBase")).unwrap().is_some());
}

#[test]
fn test_provider_failure_becomes_resolution_error() {
    let edm = Edm::new(BrokenProvider);
    let err = edm.entity_type(&fqn("ns.ETBase")).unwrap_err();
    assert!(err.is_resolution());
    assert!(err.message().contains("ns.ETBase"));
    assert!(err.message().contains("disk on fire"));
}

#[test]
fn test_compatible_to() {
    let edm = edm();
    let base = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
    let derived = edm.entity_type(&fqn("ns.ETDerived")).unwrap().unwrap();

    assert!(base.compatible_to(Some(&base)).unwrap());
    assert!(derived.compatible_to(Some(&base)).unwrap());
    assert!(!base.compatible_to(Some(&derived)).unwrap());
    assert_eq!(base.compatible_to(None).unwrap_err().code(), ODATA0401);
}

#[test]
fn test_base_type_cycle() {
    let edm = edm();
    let ty = edm.entity_type(&fqn("ns.ETCycleA")).unwrap().unwrap();
    assert_eq!(ty.base_type().unwrap_err().code(), ODATA0300);
    assert_eq!(ty.properties().unwrap_err().code(), ODATA0300);
}

#[test]
fn test_keys() {
    let edm = edm();
    let derived = edm.entity_type(&fqn("ns.ETDerived")).unwrap().unwrap();
    assert_eq!(derived.key_predicate_names().unwrap(), vec!["PropertyInt16"]);

    let comp = edm.entity_type(&fqn("ns.ETCompKey")).unwrap().unwrap();
    assert_eq!(comp.key_predicate_names().unwrap(), vec!["PropertyInt16", "KeyAlias"]);
    let aliased = comp.key_property_ref("KeyAlias").unwrap().unwrap();
    assert_eq!(aliased.path(), "PropertyComp/PropertyInt32");
    assert_eq!(aliased.property().name(), "PropertyInt32");
    assert_eq!(
        aliased.property().type_().unwrap(),
        EdmType::Primitive(EdmPrimitiveTypeKind::Int32)
    );

    let abstract_type = edm.entity_type(&fqn("ns.ETAbstract")).unwrap().unwrap();
    assert!(abstract_type.key_property_refs().unwrap().is_empty());
}

#[rstest]
#[case("ns.ETAliasWithoutPath", ODATA0302)]
#[case("ns.ETPathWithoutAlias", ODATA0303)]
#[case("ns.ETMissingKey", ODATA0304)]
#[case("ns.ETNoKey", ODATA0305)]
fn test_key_errors(#[case] name: &str, #[case] code: octofhir_odata_diagnostics::ErrorCode) {
    let ty = edm().entity_type(&fqn(name)).unwrap().unwrap();
    assert_eq!(ty.key_property_refs().unwrap_err().code(), code);
}

#[test]
fn test_resolve_type_kinds() {
    let edm = edm();
    assert_eq!(
        edm.resolve_type(&fqn("Edm.Guid")).unwrap(),
        Some(EdmType::Primitive(EdmPrimitiveTypeKind::Guid))
    );
    let comp = edm.resolve_type(&fqn("Alias.CTPrim")).unwrap().unwrap();
    assert_eq!(comp.as_complex().unwrap().kind(), StructuredKind::Complex);
    let flags = edm.resolve_type(&fqn("ns.ENFlags")).unwrap().unwrap();
    assert_eq!(flags.as_enum().unwrap().value_to_string(6).unwrap(), "A,B");
    assert!(edm.resolve_type(&fqn("ns.Unknown")).unwrap().is_none());
}

#[test]
fn test_bound_action_overloads_are_distinct_and_stable() {
    let edm = edm();
    let on_base = edm.bound_action(&fqn("ns.o1"), &fqn("ns.ETBase"), false).unwrap().unwrap();
    let on_derived = edm
        .bound_action(&fqn("ns.o1"), &fqn("ns.ETDerived"), false)
        .unwrap()
        .unwrap();
    assert!(!Arc::ptr_eq(&on_base, &on_derived));

    let again = edm.bound_action(&fqn("Alias.o1"), &fqn("Alias.ETBase"), false).unwrap().unwrap();
    assert!(Arc::ptr_eq(&on_base, &again));

    assert!(edm.bound_action(&fqn("ns.o1"), &fqn("ns.ETBase"), true).unwrap().is_none());
    assert!(!edm.unbound_action(&fqn("ns.o1")).unwrap().unwrap().is_bound());
}

#[test]
fn test_unbound_function_by_parameter_names() {
    let edm = edm();
    let first = edm.unbound_function(&fqn("ns.f1"), None).unwrap().unwrap();
    assert!(first.parameters().is_empty());

    let empty = edm.unbound_function(&fqn("ns.f1"), Some(&[])).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &empty));

    let with_p1 = edm.unbound_function(&fqn("ns.f1"), Some(&["P1"])).unwrap().unwrap();
    assert_eq!(with_p1.parameter_names(), vec!["P1"]);
    assert!(edm.unbound_function(&fqn("ns.f1"), Some(&["P2"])).unwrap().is_none());
    assert_eq!(edm.unbound_functions(&fqn("ns.f1")).unwrap().len(), 2);

    let bound = edm
        .bound_function(&fqn("ns.f1"), &fqn("ns.ETBase"), true, None)
        .unwrap()
        .unwrap();
    assert!(bound.is_binding_collection());
    assert!(bound.non_binding_parameters().is_empty());
}

#[test]
fn test_indistinguishable_overloads() {
    let duplicate = CsdlSchema::new("dup").with_actions(vec![
        CsdlAction::new("a")
            .with_bound(true)
            .with_parameters(vec![CsdlParameter::new("X", fqn("Edm.Int16"))]),
        CsdlAction::new("a")
            .with_bound(true)
            .with_parameters(vec![CsdlParameter::new("Y", fqn("Edm.Int16"))]),
    ]);
    let edm = Edm::new(InMemoryProvider::new(vec![duplicate]));
    assert_eq!(edm.actions(&fqn("dup.a")).unwrap_err().code(), ODATA0307);
}

#[test]
fn test_binding_targets() {
    let edm = edm();
    let container = edm.entity_container(None).unwrap().unwrap();
    assert_eq!(container.name(), &fqn("ns.Container"));

    let base = container.entity_set("ESBase").unwrap().unwrap();
    let derived = base.related_binding_target("NavDerived").unwrap().unwrap();
    assert_eq!(derived.name(), "ESDerived");
    let back = derived.related_binding_target("NavBase").unwrap().unwrap();
    assert!(Arc::ptr_eq(&base, &back));

    let broken = container.entity_set("ESBroken").unwrap().unwrap();
    assert!(broken.related_binding_target("NavDerived").is_err());

    let singleton = container.singleton("SIBase").unwrap().unwrap();
    assert!(!singleton.is_entity_set());
    assert_eq!(singleton.entity_type().unwrap().name(), &fqn("ns.ETBase"));
}

#[test]
fn test_returned_entity_sets() {
    let edm = edm();
    let container = edm.entity_container(None).unwrap().unwrap();
    let base = container.entity_set("ESBase").unwrap().unwrap();

    let bound = edm
        .bound_function(&fqn("ns.f1"), &fqn("ns.ETBase"), true, None)
        .unwrap()
        .unwrap();
    let returned = bound.returned_entity_set(Some(&base)).unwrap().unwrap();
    assert_eq!(returned.name(), "ESDerived");

    let import = container.function_import("FIf1").unwrap().unwrap();
    assert_eq!(import.unbound_functions().unwrap().len(), 2);
    assert_eq!(import.returned_entity_set().unwrap().unwrap().name(), "ESDerived");

    let action_import = container.action_import("AIo1").unwrap().unwrap();
    assert!(action_import.unbound_action().unwrap().is_some());
}

#[test]
fn test_container_listing() {
    let edm = edm();
    let container = edm.entity_container(None).unwrap().unwrap();
    let names: Vec<String> = container
        .entity_sets()
        .unwrap()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["ESBase", "ESDerived", "ESBroken"]);
    assert_eq!(container.singletons().unwrap().len(), 1);
}

#[test]
fn test_ambiguous_default_container() {
    let other = CsdlSchema::new("other").with_entity_container(CsdlEntityContainer::new("Second"));
    let edm = Edm::new(InMemoryProvider::new(vec![schema(), other]));
    assert!(edm.entity_container(None).unwrap_err().is_resolution());
    assert!(edm.entity_container(Some(&fqn("other.Second"))).unwrap().is_some());
}

#[test]
fn test_schemas_share_cached_instances() {
    let provider = Arc::new(CountingProvider::new(InMemoryProvider::new(vec![schema()])));
    let edm = Edm::with_provider(provider.clone());
    let before = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();

    let schemas = edm.schemas().unwrap();
    assert_eq!(schemas.len(), 1);
    let schema = &schemas[0];
    assert_eq!(schema.alias(), Some("Alias"));
    assert!(schema.entity_types().iter().any(|t| Arc::ptr_eq(t, &before)));

    let complex = schema
        .complex_types()
        .iter()
        .find(|t| t.name() == &fqn("ns.CTPrim"))
        .unwrap();
    let after = edm.complex_type(&fqn("ns.CTPrim")).unwrap().unwrap();
    assert!(Arc::ptr_eq(complex, &after));
    assert_eq!(provider.count("complex_type", "ns.CTPrim"), 0);

    let action = edm.bound_action(&fqn("ns.o1"), &fqn("ns.ETDerived"), false).unwrap().unwrap();
    assert!(schema.actions().iter().any(|a| Arc::ptr_eq(a, &action)));

    edm.schemas().unwrap();
    assert_eq!(provider.schema_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_terms_and_annotations() {
    let edm = edm();
    let long = edm.term(&fqn("ns.LongDescription")).unwrap().unwrap();
    let base = long.base_term().unwrap().unwrap();
    assert_eq!(base.name(), &fqn("ns.Description"));

    let group = edm.annotation_group("ns.ETBase", None).unwrap().unwrap();
    let annotation = group.annotation(&fqn("ns.Description")).unwrap();
    assert_eq!(annotation.value(), Some(&serde_json::json!("Base")));
    assert!(Arc::ptr_eq(&annotation.term().unwrap().unwrap(), &base));
}

#[test]
fn test_navigation_partner() {
    let edm = edm();
    let base = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
    let nav = base.navigation_property("NavDerived").unwrap().unwrap();
    assert!(nav.is_collection());
    assert_eq!(nav.target_type().unwrap().name(), &fqn("ns.ETDerived"));
    assert_eq!(nav.partner().unwrap().unwrap().name(), "NavBase");
}

#[test]
fn test_elements_outliving_the_model() {
    let property = {
        let edm = edm();
        let ty = edm.entity_type(&fqn("ns.ETBase")).unwrap().unwrap();
        ty.property("PropertyString").unwrap().unwrap()
    };
    assert_eq!(property.type_().unwrap_err().code(), ODATA0402);
}
