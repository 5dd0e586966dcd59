//! Tests for $filter and standalone expression parsing
//!
//! Covers:
//! - Operator precedence and result typing
//! - Canonical functions, cast and isof
//! - Lambda operators, $it and $root
//! - Enum literals with `has` and `in` lists
//! - Parameter aliases
//! - Syntax and typing errors

mod common;

use common::{edm, error_code, fqn, parse, parser, strict_parser};
use octofhir_odata_ast::{
    BinaryOperator, Expression, ExpressionKind, MethodKind, SegmentKind, UnaryOperator,
    UriResourceKind,
};
use octofhir_odata_diagnostics::{
    ErrorCode, ODATA0005, ODATA0006, ODATA0007, ODATA0016, ODATA0019, ODATA0101, ODATA0102,
    ODATA0109, ODATA0112, ODATA0113, ODATA0114, ODATA0115, ODATA0116, ODATA0117, ODATA0118,
    ODATA0119, ODATA0120, ODATA0126, ODATA0127,
};
use octofhir_odata_edm::EdmType;
use octofhir_odata_parser::{ParserOptions, UriParser};
use octofhir_odata_types::EdmPrimitiveTypeKind;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn filter(uri: &str) -> Expression {
    parse(uri).query.filter.expect("uri has a $filter")
}

fn binary(expression: &Expression) -> (BinaryOperator, &Expression, &Expression) {
    match &expression.kind {
        ExpressionKind::Binary {
            operator,
            left,
            right,
        } => (*operator, left, right),
        other => panic!("expected a binary expression, found {other:?}"),
    }
}

fn kind_of(expression: &Expression) -> Option<EdmPrimitiveTypeKind> {
    expression.type_.as_ref().and_then(EdmType::primitive_kind)
}

fn member_kinds(expression: &Expression) -> Vec<SegmentKind> {
    let path = expression.as_member().expect("member expression");
    common::segment_kinds(path)
}

fn all_prim() -> EdmType {
    let entity = edm()
        .entity_type(&fqn("ns.ETAllPrim"))
        .unwrap()
        .expect("ETAllPrim exists");
    EdmType::Entity(entity)
}

// === Comparison and logic ===

#[test]
fn test_simple_comparison() {
    let expression = filter("ESAllPrim?$filter=PropertyInt16 eq 1");
    let (operator, left, right) = binary(&expression);
    assert_eq!(operator, BinaryOperator::Eq);
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
    assert_eq!(member_kinds(left), vec![SegmentKind::PrimitiveProperty]);
    assert_eq!(right.as_literal().map(|l| l.text.as_str()), Some("1"));
}

#[test]
fn test_integer_literal_takes_property_kind() {
    let expression = filter("ESAllPrim?$filter=PropertyInt64 eq 1");
    let (_, left, right) = binary(&expression);
    assert_eq!(kind_of(left), Some(EdmPrimitiveTypeKind::Int64));
    assert_eq!(kind_of(right), Some(EdmPrimitiveTypeKind::Int64));
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expression =
        filter("ESAllPrim?$filter=PropertyInt16 eq 1 or PropertyInt16 eq 2 and PropertyBoolean");
    let (operator, left, right) = binary(&expression);
    assert_eq!(operator, BinaryOperator::Or);
    assert_eq!(binary(left).0, BinaryOperator::Eq);
    assert_eq!(binary(right).0, BinaryOperator::And);
}

#[test]
fn test_arithmetic_binds_tighter_than_comparison() {
    let expression = filter("ESAllPrim?$filter=PropertyInt16 add 1 mul 2 gt 5");
    let (operator, left, _) = binary(&expression);
    assert_eq!(operator, BinaryOperator::Gt);
    let (add, _, product) = binary(left);
    assert_eq!(add, BinaryOperator::Add);
    assert_eq!(binary(product).0, BinaryOperator::Mul);
}

#[test]
fn test_parentheses_override_precedence() {
    let expression =
        filter("ESAllPrim?$filter=(PropertyInt16 eq 1 or PropertyInt16 eq 2) and PropertyBoolean");
    let (operator, left, _) = binary(&expression);
    assert_eq!(operator, BinaryOperator::And);
    assert_eq!(binary(left).0, BinaryOperator::Or);
}

#[test]
fn test_not() {
    let expression = filter("ESAllPrim?$filter=not PropertyBoolean");
    let ExpressionKind::Unary { operator, operand } = &expression.kind else {
        panic!("expected a unary expression");
    };
    assert_eq!(*operator, UnaryOperator::Not);
    assert_eq!(kind_of(operand), Some(EdmPrimitiveTypeKind::Boolean));
}

#[rstest]
#[case("ESAllPrim?$filter=not PropertyInt16 in (1,2)", BinaryOperator::In)]
#[case("ESAllPrim?$filter=not PropertyString in CollPropertyString", BinaryOperator::In)]
#[case("ESMixEnum?$filter=not PropertyEnumString has ns.ENString'String1'", BinaryOperator::Has)]
fn test_has_and_in_bind_tighter_than_not(#[case] uri: &str, #[case] expected: BinaryOperator) {
    let expression = filter(uri);
    let ExpressionKind::Unary { operator, operand } = &expression.kind else {
        panic!("expected a unary expression");
    };
    assert_eq!(*operator, UnaryOperator::Not);
    assert_eq!(binary(operand).0, expected);
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
}

#[test]
fn test_in_binds_tighter_than_and() {
    let expression = filter("ESAllPrim?$filter=PropertyInt16 in (1,2) and PropertyBoolean");
    let (operator, left, _) = binary(&expression);
    assert_eq!(operator, BinaryOperator::And);
    assert_eq!(binary(left).0, BinaryOperator::In);
}

#[rstest]
#[case("ESAllPrim?$filter=PropertyString eq null")]
#[case("ESAllPrim?$filter=null ne PropertyDate")]
#[case("ESAllPrim?$filter=PropertyDecimal eq 99999999999999999999")]
#[case("ESAllPrim?$filter=PropertyDouble gt 1.5e3")]
#[case("ESAllPrim?$filter=PropertyGuid eq 01234567-89ab-cdef-0123-456789abcdef")]
#[case("ESAllPrim?$filter=PropertyDate le 2020-01-01")]
#[case("ESAllPrim?$filter=PropertyDateTimeOffset sub duration'P1D' lt now()")]
#[case("ESAllPrim?$filter=-PropertyInt16 lt 0")]
#[case("ESAllPrim?$filter=PropertyBoolean eq true")]
#[case("ESAllPrim?$filter=PropertyInt16 in (1,2,3)")]
#[case("ESAllPrim?$filter=PropertyString in CollPropertyString")]
#[case("ESAllPrim?$filter=CollPropertyString/$count gt 1")]
fn test_valid_filters(#[case] uri: &str) {
    let expression = filter(uri);
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
}

#[test]
fn test_in_list() {
    let expression = filter("ESAllPrim?$filter=PropertyInt16 in (1,2,3)");
    let (operator, _, right) = binary(&expression);
    assert_eq!(operator, BinaryOperator::In);
    let ExpressionKind::List(items) = &right.kind else {
        panic!("expected a list");
    };
    assert_eq!(items.len(), 3);
    assert!(right.is_collection);
}

// === Canonical functions ===

#[test]
fn test_method_call() {
    let expression = filter("ESAllPrim?$filter=contains(PropertyString,'a')");
    let ExpressionKind::MethodCall { method, arguments } = &expression.kind else {
        panic!("expected a method call");
    };
    assert_eq!(*method, MethodKind::Contains);
    assert_eq!(arguments.len(), 2);
}

#[rstest]
#[case("ESAllPrim?$filter=length(PropertyString) eq 3")]
#[case("ESAllPrim?$filter=year(PropertyDate) eq 2020")]
#[case("ESAllPrim?$filter=startswith(tolower(PropertyString),'a')")]
#[case("ESAllPrim?$filter=round(PropertyDouble) gt 1.5e0")]
#[case("ESAllPrim?$filter=substring(PropertyString,1) eq 'b'")]
#[case("ESAllPrim?$filter=cast(PropertyInt16,Edm.String) eq '1'")]
#[case("ESAllPrim?$filter=isof(ns.ETAllPrim)")]
#[case("ESAllPrim?$filter=isof(PropertyInt16,Edm.Int32)")]
#[case("ESTwoKeyNav?$filter=isof(ns.ETBaseTwoKeyNav)")]
fn test_valid_method_calls(#[case] uri: &str) {
    let expression = filter(uri);
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
}

#[test]
fn test_cast_result_type() {
    let expression = parser()
        .parse_expression(Some(all_prim()), "cast(PropertyInt16,Edm.String)")
        .unwrap();
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::String));
}

// === Members, $it and $root ===

#[test]
fn test_it_path() {
    let expression = filter("ESAllPrim?$filter=$it/PropertyInt16 eq 1");
    let (_, left, _) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![SegmentKind::It, SegmentKind::PrimitiveProperty]
    );
}

#[test]
fn test_it_on_primitive_collection() {
    let expression = filter("ESAllPrim(1)/CollPropertyString?$filter=$it eq 'a'");
    let (_, left, _) = binary(&expression);
    assert_eq!(member_kinds(left), vec![SegmentKind::It]);
    assert_eq!(kind_of(left), Some(EdmPrimitiveTypeKind::String));
}

#[test]
fn test_root_path() {
    let expression = filter("ESAllPrim?$filter=$root/ESAllPrim(1)/PropertyInt16 eq PropertyInt16");
    let (_, left, _) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![
            SegmentKind::Root,
            SegmentKind::EntitySet,
            SegmentKind::PrimitiveProperty
        ]
    );
    let path = left.as_member().unwrap();
    assert!(!path[1].is_collection);
    assert_eq!(path[1].keys[0].text, "1");
}

#[test]
fn test_complex_member_path() {
    let expression = filter("ESTwoKeyNav?$filter=PropertyComp/PropertyComp/PropertyString eq 'x'");
    let (_, left, _) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![
            SegmentKind::ComplexProperty,
            SegmentKind::ComplexProperty,
            SegmentKind::PrimitiveProperty
        ]
    );
}

#[test]
fn test_navigation_member_path() {
    let expression = filter("ESTwoKeyNav?$filter=NavPropertyETKeyNavOne/PropertyString eq 'x'");
    let (_, left, _) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![SegmentKind::NavigationProperty, SegmentKind::PrimitiveProperty]
    );
}

#[test]
fn test_leading_type_cast() {
    let expression = filter("ESTwoKeyNav?$filter=ns.ETBaseTwoKeyNav/PropertyDate eq 2020-01-01");
    let (_, left, _) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![SegmentKind::TypeCast, SegmentKind::PrimitiveProperty]
    );
}

#[test]
fn test_bound_function_in_filter() {
    let expression = filter("ESAllPrim?$filter=ns.BFCETAllPrimRTBoolean(ParameterInt32=1)");
    assert_eq!(
        member_kinds(&expression),
        vec![SegmentKind::It, SegmentKind::BoundFunction]
    );
    let path = expression.as_member().unwrap();
    let UriResourceKind::BoundFunction { parameters, .. } = &path[1].kind else {
        panic!("expected a bound function");
    };
    assert_eq!(parameters[0].name, "ParameterInt32");
    assert_eq!(parameters[0].text, "1");
}

#[test]
fn test_crossjoin_member() {
    let info = parse(
        "$crossjoin(ESAllPrim,ESTwoKeyNav)?$filter=ESAllPrim/PropertyInt16 eq ESTwoKeyNav/PropertyInt16",
    );
    let expression = info.query.filter.unwrap();
    let (_, left, right) = binary(&expression);
    assert_eq!(
        member_kinds(left),
        vec![SegmentKind::EntitySet, SegmentKind::PrimitiveProperty]
    );
    assert_eq!(
        member_kinds(right),
        vec![SegmentKind::EntitySet, SegmentKind::PrimitiveProperty]
    );
}

// === Lambdas ===

#[test]
fn test_any_with_predicate() {
    let expression = filter("ESAllPrim?$filter=CollPropertyString/any(s:contains(s,'a'))");
    assert_eq!(
        member_kinds(&expression),
        vec![SegmentKind::PrimitiveProperty, SegmentKind::LambdaAny]
    );
    let path = expression.as_member().unwrap();
    let UriResourceKind::LambdaAny(lambda) = &path[1].kind else {
        panic!("expected any");
    };
    assert_eq!(lambda.variable.as_deref(), Some("s"));
    let ExpressionKind::MethodCall { arguments, .. } = &lambda.predicate.as_ref().unwrap().kind else {
        panic!("expected a method call predicate");
    };
    assert_eq!(member_kinds(&arguments[0]), vec![SegmentKind::LambdaVariable]);
}

#[test]
fn test_all_over_navigation() {
    let expression =
        filter("ESKeyNav?$filter=NavPropertyETTwoKeyNavMany/all(d:d/PropertyInt16 gt 0)");
    assert_eq!(
        member_kinds(&expression),
        vec![SegmentKind::NavigationProperty, SegmentKind::LambdaAll]
    );
}

#[test]
fn test_any_without_predicate() {
    let expression = filter("ESAllPrim?$filter=CollPropertyString/any()");
    let path = expression.as_member().unwrap();
    let UriResourceKind::LambdaAny(lambda) = &path[1].kind else {
        panic!("expected any");
    };
    assert_eq!(lambda.variable, None);
    assert!(lambda.predicate.is_none());
}

#[test]
fn test_nested_lambdas_see_outer_variable() {
    let expression = filter(
        "ESKeyNav?$filter=NavPropertyETTwoKeyNavMany/any(d:d/CollPropertyComp/any(c:c/PropertyInt16 eq d/PropertyInt16))",
    );
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
}

// === Enums ===

#[rstest]
#[case("ESMixEnum?$filter=PropertyEnumString has ns.ENString'String1'")]
#[case("ESMixEnum?$filter=PropertyEnumString has Alias.ENString'String1,String3'")]
#[case("ESMixEnum?$filter=PropertyEnumString eq ns.ENString'String2'")]
#[case("ESMixEnum?$filter=CollPropertyEnumString/any(e:e has ns.ENString'String3')")]
fn test_enum_filters(#[case] uri: &str) {
    let expression = filter(uri);
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
}

#[test]
fn test_enum_literal_members() {
    let expression = filter("ESMixEnum?$filter=PropertyEnumString has ns.ENString'String1,String3'");
    let (_, _, right) = binary(&expression);
    let ExpressionKind::Enum { enum_type, values } = &right.kind else {
        panic!("expected an enum literal");
    };
    assert_eq!(enum_type.name().to_string(), "ns.ENString");
    assert_eq!(values, &vec!["String1".to_string(), "String3".to_string()]);
}

// === Aliases ===

#[test]
fn test_alias_in_filter() {
    let info = parse("ESAllPrim?$filter=PropertyInt16 eq @p&@p=1");
    let expression = info.query.filter.as_ref().unwrap();
    let (_, _, right) = binary(expression);
    assert_eq!(right.kind, ExpressionKind::Alias("p".to_string()));
    let alias = info.alias("p").unwrap();
    assert_eq!(alias.text, "1");
    assert!(alias.expression.is_some());
}

#[test]
fn test_alias_referring_to_alias() {
    let info = parse("ESAllPrim?$filter=PropertyString eq @a&@a=@b&@b='x'");
    assert!(info.alias("a").unwrap().expression.is_some());
    assert!(info.alias("b").unwrap().expression.is_some());
}

#[test]
fn test_undefined_alias_is_untyped() {
    let expression = filter("ESAllPrim?$filter=PropertyInt16 eq @missing");
    let (_, _, right) = binary(&expression);
    assert_eq!(right.type_, None);
}

#[test]
fn test_undefined_alias_strict() {
    let err = strict_parser()
        .parse_uri("ESAllPrim?$filter=PropertyInt16 eq @missing")
        .unwrap_err();
    assert_eq!(err.code(), ODATA0120);
}

#[test]
fn test_cyclic_alias() {
    assert_eq!(error_code("ESAllPrim?$filter=@a&@a=@b&@b=@a"), ODATA0120);
}

// === Errors ===

#[rstest]
#[case("ESAllPrim?$filter=PropertyString eq 1", ODATA0112)]
#[case("ESAllPrim?$filter=-PropertyString eq 'a'", ODATA0112)]
#[case("ESMixEnum?$filter=PropertyEnumString has 'String1'", ODATA0112)]
#[case("ESAllPrim?$filter=PropertyInt16", ODATA0118)]
#[case("ESAllPrim?$filter=PropertyInt16 eq 1 and 2", ODATA0118)]
#[case("ESAllPrim?$filter=CollPropertyString eq 'a'", ODATA0126)]
#[case("ESAllPrim?$filter=Nope eq 1", ODATA0101)]
#[case("ESAllPrim?$filter=PropertyString/Nope eq 1", ODATA0101)]
#[case("ESKeyNav?$filter=NavPropertyETTwoKeyNavMany/PropertyInt16 eq 1", ODATA0127)]
#[case("ESAllPrim?$filter=ns.Nope eq 1", ODATA0102)]
#[case("ESAllPrim?$filter=PropertyInt16/$count eq 1", ODATA0109)]
#[case("ESAllPrim?$filter=PropertyInt16 eq )", ODATA0007)]
#[case("ESAllPrim?$filter=PropertyInt16 eq", ODATA0019)]
#[case("ESAllPrim?$filter=PropertyInt16 eq 1)", ODATA0019)]
#[case("ESAllPrim?$filter=(PropertyInt16 eq 1", ODATA0006)]
#[case("ESAllPrim?$filter=PropertyString eq 'abc", ODATA0005)]
#[case("ESAllPrim?$filter=contains(PropertyString)", ODATA0114)]
#[case("ESAllPrim?$filter=length(PropertyInt16) eq 1", ODATA0115)]
#[case("ESAllPrim?$filter=cast(PropertyString,ns.ETAllPrim) eq null", ODATA0113)]
#[case("ESAllPrim?$filter=PropertyString/any(s:true)", ODATA0116)]
#[case("ESAllPrim?$filter=CollPropertyString/any(s:CollPropertyString/any(s:true))", ODATA0117)]
#[case("ESAllPrim?$filter=CollPropertyString/any(s:s)", ODATA0118)]
#[case("ESAllPrim?$filter=CollPropertyString/all()", ODATA0007)]
#[case("ESAllPrim?$filter=ns.BFCETAllPrimRTBoolean(ParameterInt32='a')", ODATA0119)]
fn test_filter_errors(#[case] uri: &str, #[case] expected: ErrorCode) {
    assert_eq!(error_code(uri), expected);
}

#[test]
fn test_error_points_into_the_option_value() {
    let err = parser()
        .parse_uri("ESAllPrim?$filter=PropertyString eq 1")
        .unwrap_err();
    assert_eq!(err.code(), ODATA0112);
    let location = err.location().expect("error carries a location");
    assert_eq!(location.offset, 15);
    assert_eq!(location.snippet, "eq");
}

#[test]
fn test_expression_depth_limit() {
    let options = ParserOptions::default().with_max_expression_depth(3);
    let parser = UriParser::with_options(edm(), options);
    let err = parser
        .parse_uri("ESAllPrim?$filter=not not not not PropertyBoolean")
        .unwrap_err();
    assert_eq!(err.code(), ODATA0016);
    assert!(parser.parse_uri("ESAllPrim?$filter=not not PropertyBoolean").is_ok());
}

// === Standalone entry points ===

#[test]
fn test_parse_filter_entry_point() {
    let expression = parser()
        .parse_filter(Some(all_prim()), "PropertyInt16 gt 2 and PropertyBoolean")
        .unwrap();
    assert_eq!(binary(&expression).0, BinaryOperator::And);

    let err = parser()
        .parse_filter(Some(all_prim()), "PropertyInt16 add 1")
        .unwrap_err();
    assert_eq!(err.code(), ODATA0118);
}

#[test]
fn test_parse_expression_entry_point() {
    let expression = parser()
        .parse_expression(Some(all_prim()), "PropertyInt16 add 1")
        .unwrap();
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Int16));

    let err = parser().parse_expression(None, "1 add )").unwrap_err();
    assert_eq!(err.code(), ODATA0007);
}

#[test]
fn test_parse_without_it_type() {
    let expression = parser().parse_filter(None, "true").unwrap();
    assert_eq!(kind_of(&expression), Some(EdmPrimitiveTypeKind::Boolean));
    let err = parser().parse_filter(None, "Anything eq 1").unwrap_err();
    assert_eq!(err.code(), ODATA0101);
}
