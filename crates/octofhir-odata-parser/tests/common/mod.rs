//! Service model shared by the parser integration tests

#![allow(dead_code)]

use octofhir_odata_ast::{SegmentKind, UriInfo, UriResource};
use octofhir_odata_diagnostics::{ErrorCode, ODataError};
use octofhir_odata_edm::Edm;
use octofhir_odata_model::{
    CsdlAction, CsdlActionImport, CsdlComplexType, CsdlEntityContainer, CsdlEntitySet,
    CsdlEntityType, CsdlEnumMember, CsdlEnumType, CsdlFunction, CsdlFunctionImport,
    CsdlNavigationProperty, CsdlNavigationPropertyBinding, CsdlParameter, CsdlProperty,
    CsdlPropertyRef, CsdlReferentialConstraint, CsdlReturnType, CsdlSchema, CsdlSingleton,
    InMemoryProvider,
};
use octofhir_odata_parser::{ParserOptions, UriParser};
use octofhir_odata_types::{Facets, FullQualifiedName};

pub fn fqn(name: &str) -> FullQualifiedName {
    FullQualifiedName::parse(name).unwrap()
}

fn prop(name: &str, ty: &str) -> CsdlProperty {
    CsdlProperty::new(name, fqn(ty))
}

fn key_prop(name: &str, ty: &str) -> CsdlProperty {
    prop(name, ty).with_nullable(false)
}

fn returns(ty: &str) -> CsdlReturnType {
    CsdlReturnType::new(fqn(ty))
}

fn param(name: &str, ty: &str) -> CsdlParameter {
    CsdlParameter::new(name, fqn(ty))
}

fn entity_types() -> Vec<CsdlEntityType> {
    vec![
        CsdlEntityType::new("ETAllPrim")
            .with_key(vec![CsdlPropertyRef::new("PropertyInt16")])
            .with_properties(vec![
                key_prop("PropertyInt16", "Edm.Int16"),
                prop("PropertyString", "Edm.String").with_facets(Facets::new().with_max_length(10)),
                prop("PropertyBoolean", "Edm.Boolean"),
                prop("PropertyByte", "Edm.Byte"),
                prop("PropertyInt32", "Edm.Int32"),
                prop("PropertyInt64", "Edm.Int64"),
                prop("PropertySingle", "Edm.Single"),
                prop("PropertyDouble", "Edm.Double"),
                prop("PropertyDecimal", "Edm.Decimal"),
                prop("PropertyDate", "Edm.Date"),
                prop("PropertyDateTimeOffset", "Edm.DateTimeOffset"),
                prop("PropertyDuration", "Edm.Duration"),
                prop("PropertyGuid", "Edm.Guid"),
                prop("PropertyTimeOfDay", "Edm.TimeOfDay"),
                prop("PropertyBinary", "Edm.Binary"),
                prop("PropertyGeography", "Edm.GeographyPoint"),
                prop("CollPropertyString", "Edm.String").with_collection(true),
                prop("CollPropertyInt16", "Edm.Int16").with_collection(true),
            ]),
        CsdlEntityType::new("ETTwoKeyNav")
            .with_key(vec![
                CsdlPropertyRef::new("PropertyInt16"),
                CsdlPropertyRef::new("PropertyString"),
            ])
            .with_properties(vec![
                key_prop("PropertyInt16", "Edm.Int16"),
                key_prop("PropertyString", "Edm.String"),
                prop("PropertyComp", "ns.CTPrimComp"),
                prop("CollPropertyComp", "ns.CTPrimComp").with_collection(true),
            ])
            .with_navigation_properties(vec![
                CsdlNavigationProperty::new("NavPropertyETKeyNavOne", fqn("ns.ETKeyNav"))
                    .with_partner("NavPropertyETTwoKeyNavMany")
                    .with_referential_constraints(vec![CsdlReferentialConstraint::new(
                        "PropertyInt16",
                        "PropertyInt16",
                    )]),
                CsdlNavigationProperty::new("NavPropertyETTwoKeyNavMany", fqn("ns.ETTwoKeyNav"))
                    .with_collection(true),
            ]),
        CsdlEntityType::new("ETBaseTwoKeyNav")
            .with_base_type(fqn("ns.ETTwoKeyNav"))
            .with_properties(vec![prop("PropertyDate", "Edm.Date")]),
        CsdlEntityType::new("ETTwoBaseTwoKeyNav")
            .with_base_type(fqn("ns.ETBaseTwoKeyNav"))
            .with_properties(vec![prop("PropertyGuid", "Edm.Guid")]),
        CsdlEntityType::new("ETKeyNav")
            .with_key(vec![CsdlPropertyRef::new("PropertyInt16")])
            .with_properties(vec![
                key_prop("PropertyInt16", "Edm.Int16"),
                prop("PropertyString", "Edm.String"),
                prop("PropertyCompNav", "ns.CTNavFiveProp"),
            ])
            .with_navigation_properties(vec![
                CsdlNavigationProperty::new("NavPropertyETTwoKeyNavMany", fqn("ns.ETTwoKeyNav"))
                    .with_collection(true)
                    .with_partner("NavPropertyETKeyNavOne"),
                CsdlNavigationProperty::new("NavPropertyETKeyNavOne", fqn("ns.ETKeyNav")),
                CsdlNavigationProperty::new("NavPropertyETKeyNavMany", fqn("ns.ETKeyNav"))
                    .with_collection(true),
            ]),
        CsdlEntityType::new("ETMedia")
            .with_has_stream(true)
            .with_key(vec![CsdlPropertyRef::new("PropertyInt16")])
            .with_properties(vec![key_prop("PropertyInt16", "Edm.Int16")]),
        CsdlEntityType::new("ETMixEnum")
            .with_key(vec![CsdlPropertyRef::new("PropertyEnumString")])
            .with_properties(vec![
                key_prop("PropertyEnumString", "ns.ENString"),
                prop("PropertyInt16", "Edm.Int16"),
                prop("CollPropertyEnumString", "ns.ENString").with_collection(true),
            ]),
    ]
}

fn complex_types() -> Vec<CsdlComplexType> {
    vec![
        CsdlComplexType::new("CTPrim").with_properties(vec![
            prop("PropertyInt16", "Edm.Int16"),
            prop("PropertyString", "Edm.String"),
        ]),
        CsdlComplexType::new("CTBase")
            .with_base_type(fqn("ns.CTPrim"))
            .with_properties(vec![prop("AdditionalPropString", "Edm.String")]),
        CsdlComplexType::new("CTPrimComp").with_properties(vec![
            prop("PropertyInt16", "Edm.Int16"),
            prop("PropertyComp", "ns.CTPrim"),
        ]),
        CsdlComplexType::new("CTNavFiveProp")
            .with_properties(vec![prop("PropertyInt16", "Edm.Int16")])
            .with_navigation_properties(vec![
                CsdlNavigationProperty::new("NavPropertyETTwoKeyNavMany", fqn("ns.ETTwoKeyNav"))
                    .with_collection(true),
            ]),
    ]
}

fn functions() -> Vec<CsdlFunction> {
    vec![
        CsdlFunction::new("UFNRTInt16", returns("Edm.Int16")),
        CsdlFunction::new("UFCRTETTwoKeyNavParam", returns("ns.ETTwoKeyNav"))
            .with_composable(true)
            .with_parameters(vec![param("ParameterInt16", "Edm.Int16")]),
        CsdlFunction::new("UFCRTETTwoKeyNavParam", returns("ns.ETTwoKeyNav"))
            .with_composable(true)
            .with_parameters(vec![
                param("ParameterInt16", "Edm.Int16"),
                param("ParameterString", "Edm.String"),
            ]),
        CsdlFunction::new(
            "UFCRTCollETTwoKeyNavParam",
            returns("ns.ETTwoKeyNav").with_collection(true),
        )
        .with_composable(true)
        .with_parameters(vec![param("ParameterInt16", "Edm.Int16")]),
        CsdlFunction::new("BFCESTwoKeyNavRTString", returns("Edm.String"))
            .with_bound(true)
            .with_composable(true)
            .with_parameters(vec![param("BindingParam", "ns.ETTwoKeyNav").with_collection(true)]),
        CsdlFunction::new("BFCETTwoKeyNavRTETTwoKeyNav", returns("ns.ETTwoKeyNav"))
            .with_bound(true)
            .with_composable(true)
            .with_parameters(vec![param("BindingParam", "ns.ETTwoKeyNav")]),
        CsdlFunction::new(
            "BFCESTwoKeyNavRTCollCTPrimComp",
            returns("ns.CTPrimComp").with_collection(true),
        )
        .with_bound(true)
        .with_composable(true)
        .with_parameters(vec![
            param("BindingParam", "ns.ETTwoKeyNav").with_collection(true),
            param("ParameterString", "Edm.String"),
        ]),
        CsdlFunction::new("BFNETAllPrimRTInt16", returns("Edm.Int16"))
            .with_bound(true)
            .with_parameters(vec![param("BindingParam", "ns.ETAllPrim")]),
        CsdlFunction::new("BFCETAllPrimRTBoolean", returns("Edm.Boolean"))
            .with_bound(true)
            .with_composable(true)
            .with_parameters(vec![
                param("BindingParam", "ns.ETAllPrim"),
                param("ParameterInt32", "Edm.Int32"),
            ]),
    ]
}

fn actions() -> Vec<CsdlAction> {
    vec![
        CsdlAction::new("UARTString").with_return_type(returns("Edm.String")),
        CsdlAction::new("BAESAllPrimRTETAllPrim")
            .with_bound(true)
            .with_parameters(vec![param("BindingParam", "ns.ETAllPrim").with_collection(true)])
            .with_return_type(returns("ns.ETAllPrim")),
        CsdlAction::new("BAETTwoKeyNavRTETTwoKeyNav")
            .with_bound(true)
            .with_parameters(vec![param("BindingParam", "ns.ETTwoKeyNav")])
            .with_return_type(returns("ns.ETTwoKeyNav")),
    ]
}

fn container() -> CsdlEntityContainer {
    CsdlEntityContainer::new("Container")
        .with_entity_sets(vec![
            CsdlEntitySet::new("ESAllPrim", fqn("ns.ETAllPrim")),
            CsdlEntitySet::new("ESTwoKeyNav", fqn("ns.ETTwoKeyNav")).with_navigation_property_bindings(
                vec![
                    CsdlNavigationPropertyBinding::new("NavPropertyETKeyNavOne", "ESKeyNav"),
                    CsdlNavigationPropertyBinding::new("NavPropertyETTwoKeyNavMany", "ESTwoKeyNav"),
                ],
            ),
            CsdlEntitySet::new("ESBaseTwoKeyNav", fqn("ns.ETBaseTwoKeyNav")),
            CsdlEntitySet::new("ESKeyNav", fqn("ns.ETKeyNav")).with_navigation_property_bindings(vec![
                CsdlNavigationPropertyBinding::new("NavPropertyETTwoKeyNavMany", "ESTwoKeyNav"),
                CsdlNavigationPropertyBinding::new("NavPropertyETKeyNavOne", "ESKeyNav"),
            ]),
            CsdlEntitySet::new("ESMedia", fqn("ns.ETMedia")),
            CsdlEntitySet::new("ESMixEnum", fqn("ns.ETMixEnum")),
        ])
        .with_singletons(vec![CsdlSingleton::new("SINav", fqn("ns.ETTwoKeyNav"))])
        .with_action_imports(vec![CsdlActionImport::new("AIRTString", fqn("ns.UARTString"))])
        .with_function_imports(vec![
            CsdlFunctionImport::new("FINRTInt16", fqn("ns.UFNRTInt16")),
            CsdlFunctionImport::new("FICRTETTwoKeyNavParam", fqn("ns.UFCRTETTwoKeyNavParam")),
            CsdlFunctionImport::new("FICRTCollETTwoKeyNavParam", fqn("ns.UFCRTCollETTwoKeyNavParam"))
                .with_entity_set("ESTwoKeyNav"),
        ])
}

pub fn schema() -> CsdlSchema {
    CsdlSchema::new("ns")
        .with_alias("Alias")
        .with_entity_types(entity_types())
        .with_complex_types(complex_types())
        .with_enum_types(vec![
            CsdlEnumType::new("ENString").with_flags(true).with_members(vec![
                CsdlEnumMember::new("String1", 1),
                CsdlEnumMember::new("String2", 2),
                CsdlEnumMember::new("String3", 4),
            ]),
        ])
        .with_functions(functions())
        .with_actions(actions())
        .with_entity_container(container())
}

pub fn edm() -> Edm {
    Edm::new(InMemoryProvider::new(vec![schema()]))
}

pub fn parser() -> UriParser {
    UriParser::new(edm())
}

pub fn strict_parser() -> UriParser {
    UriParser::with_options(
        edm(),
        ParserOptions::default()
            .with_allow_undefined_aliases(false)
            .with_max_expand_levels(2),
    )
}

pub fn parse(uri: &str) -> UriInfo {
    parser()
        .parse_uri(uri)
        .unwrap_or_else(|e| panic!("'{uri}' should parse: {e}"))
}

pub fn parse_err(uri: &str) -> ODataError {
    match parser().parse_uri(uri) {
        Ok(info) => panic!("'{uri}' should fail, got {:?}", info.kind),
        Err(e) => e,
    }
}

pub fn error_code(uri: &str) -> ErrorCode {
    parse_err(uri).code()
}

pub fn segment_kinds(path: &[UriResource]) -> Vec<SegmentKind> {
    path.iter().map(UriResource::segment_kind).collect()
}
