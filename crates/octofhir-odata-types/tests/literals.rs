//! Literal parse/format tests for every primitive kind

use chrono::{NaiveDate, TimeZone, Utc};
use octofhir_odata_types::{
    EdmPrimitiveTypeKind as K, Facets, GeoDimension, GeoShape, PrimitiveValue,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;
use std::str::FromStr;

#[rstest]
#[case(K::Boolean, "true")]
#[case(K::Byte, "255")]
#[case(K::SByte, "-128")]
#[case(K::Int16, "-32768")]
#[case(K::Int32, "2147483647")]
#[case(K::Int64, "-9223372036854775808")]
#[case(K::Decimal, "-123.45")]
#[case(K::Single, "1.5")]
#[case(K::Double, "-0.25")]
#[case(K::Double, "NaN")]
#[case(K::Double, "-INF")]
#[case(K::Double, "1.7976931348623157E308")]
#[case(K::Double, "1E-7")]
#[case(K::Double, "-1.2345678E7")]
#[case(K::Double, "9999999.5")]
#[case(K::Single, "1E10")]
#[case(K::Date, "2012-12-03")]
#[case(K::Date, "-0001-01-01")]
#[case(K::Date, "10000-01-01")]
#[case(K::DateTimeOffset, "2012-12-03T07:16:23Z")]
#[case(K::DateTimeOffset, "10000-01-01T00:00:00Z")]
#[case(K::DateTimeOffset, "-0001-01-01T00:00:00-05:00")]
#[case(K::DateTimeOffset, "2012-12-03T07:16:23.5+01:00")]
#[case(K::TimeOfDay, "23:59:59.123")]
#[case(K::Duration, "P1DT2H3M4.5S")]
#[case(K::Duration, "-PT30M")]
#[case(K::Duration, "PT0S")]
#[case(K::Guid, "01234567-89ab-cdef-0123-456789abcdef")]
#[case(K::Binary, "AQID")]
#[case(K::String, "it's")]
#[case(K::Geography, "SRID=4326;Point(142.1 64.1)")]
#[case(K::Geometry, "SRID=0;Polygon((0 0,4 0,4 4,0 0))")]
fn test_raw_text_round_trips(#[case] kind: K, #[case] text: &str) {
    let facets = Facets::default();
    let value = kind.value_of_string(text, &facets).unwrap();
    assert_eq!(kind.value_to_string(&value, &facets).unwrap(), text);
}

#[test]
fn test_format_then_parse_yields_the_same_value() {
    let facets = Facets::default();
    let values = [
        (K::Int16, PrimitiveValue::Int16(-7)),
        (K::Decimal, PrimitiveValue::Decimal(Decimal::new(31415, 4))),
        (K::Double, PrimitiveValue::Double(1.0e-7)),
        (K::Single, PrimitiveValue::Single(3.25)),
        (
            K::Date,
            PrimitiveValue::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
        ),
        (
            K::DateTimeOffset,
            PrimitiveValue::DateTimeOffset(
                Utc.with_ymd_and_hms(2020, 2, 29, 12, 0, 1).unwrap().fixed_offset(),
            ),
        ),
        (K::Duration, PrimitiveValue::Duration(Decimal::new(90061, 0))),
        (K::Binary, PrimitiveValue::Binary(vec![0xFB, 0xFF, 0x00])),
        (K::String, PrimitiveValue::String("ünïcode".to_string())),
    ];
    for (kind, value) in values {
        let literal = kind.format_literal(&value, &facets).unwrap();
        assert_eq!(kind.parse_literal(&literal, &facets).unwrap(), value, "{literal}");
    }
}

#[rstest]
#[case(K::String, "'O''Neil'", "O'Neil")]
#[case(K::Duration, "duration'P1D'", "P1D")]
#[case(K::Binary, "binary'AQID'", "AQID")]
#[case(K::Geography, "geography'SRID=4326;Point(1 2)'", "SRID=4326;Point(1 2)")]
#[case(K::Int32, "42", "42")]
fn test_uri_literal_decoration(#[case] kind: K, #[case] literal: &str, #[case] raw: &str) {
    assert_eq!(kind.from_uri_literal(literal).unwrap(), raw);
    assert_eq!(kind.to_uri_literal(raw), literal);
}

#[test]
fn test_uri_literal_prefix_is_case_insensitive() {
    assert_eq!(K::Duration.from_uri_literal("DURATION'PT1S'").unwrap(), "PT1S");
}

#[rstest]
#[case(K::String, "'unterminated")]
#[case(K::String, "'a'b'")]
#[case(K::Duration, "P1D")]
fn test_malformed_uri_literal(#[case] kind: K, #[case] literal: &str) {
    assert!(kind.from_uri_literal(literal).unwrap_err().is_content_error());
}

#[rstest]
#[case(K::Byte, "256")]
#[case(K::Byte, "-1")]
#[case(K::SByte, "128")]
#[case(K::Int16, "32768")]
#[case(K::Int32, "1.5")]
#[case(K::Int64, "99999999999999999999")]
#[case(K::Boolean, "yes")]
#[case(K::Decimal, "1.")]
#[case(K::Date, "2012-13-01")]
#[case(K::Date, "212-01-01")]
#[case(K::Date, "02012-01-01")]
#[case(K::DateTimeOffset, "02012-01-01T00:00:00Z")]
#[case(K::DateTimeOffset, "2012-12-03T07:16:23+24:00")]
#[case(K::DateTimeOffset, "2012-12-03T07:16:23")]
#[case(K::TimeOfDay, "25:00")]
#[case(K::Duration, "P")]
#[case(K::Duration, "PT")]
#[case(K::Duration, "PT1M2H")]
#[case(K::Duration, "P1.5D")]
#[case(K::Guid, "0123456789abcdef0123456789abcdef")]
#[case(K::Geography, "SRID=4326;Triangle(1 2)")]
#[case(K::Geometry, "Point(1 2")]
fn test_illegal_content(#[case] kind: K, #[case] text: &str) {
    let err = kind.value_of_string(text, &Facets::default()).unwrap_err();
    assert!(err.is_content_error(), "{text}: {err}");
}

#[test]
fn test_time_and_date_time_without_seconds() {
    let facets = Facets::default();
    assert_eq!(
        K::TimeOfDay
            .value_to_string(&K::TimeOfDay.value_of_string("08:09", &facets).unwrap(), &facets)
            .unwrap(),
        "08:09:00"
    );
    assert_eq!(
        K::DateTimeOffset
            .value_to_string(
                &K::DateTimeOffset.value_of_string("2012-09-03T08:09Z", &facets).unwrap(),
                &facets
            )
            .unwrap(),
        "2012-09-03T08:09:00Z"
    );
}

#[test]
fn test_binary_accepts_standard_alphabet_and_padding() {
    let facets = Facets::default();
    let url_safe = K::Binary.value_of_string("-_8=", &facets).unwrap();
    let standard = K::Binary.value_of_string("+/8", &facets).unwrap();
    assert_eq!(url_safe, standard);
}

#[test]
fn test_max_length_violation_on_format() {
    let facets = Facets::new().with_max_length(5);
    let value = PrimitiveValue::String("abcdef".to_string());
    let err = K::String.value_to_string(&value, &facets).unwrap_err();
    assert!(err.is_content_error());
    assert!(K::String.value_to_string(&PrimitiveValue::String("abcde".into()), &facets).is_ok());
}

#[test]
fn test_max_length_counts_characters() {
    let facets = Facets::new().with_max_length(3);
    assert!(K::String.value_of_string("äöü", &facets).is_ok());
}

#[test]
fn test_non_unicode_string_rejects_non_ascii() {
    let facets = Facets::new().with_unicode(false);
    assert!(K::String.value_of_string("abc", &facets).is_ok());
    assert!(K::String.value_of_string("äbc", &facets).unwrap_err().is_content_error());
}

#[rstest]
#[case("123.45", true)]
#[case("-999.99", true)]
#[case("123.456", false)]
#[case("1234.5", false)]
fn test_decimal_precision_and_scale(#[case] text: &str, #[case] ok: bool) {
    let facets = Facets::new().with_precision(5).with_scale(2);
    assert_eq!(K::Decimal.value_of_string(text, &facets).is_ok(), ok);
}

#[test]
fn test_fractional_second_precision() {
    let facets = Facets::new().with_precision(3);
    assert!(K::DateTimeOffset.value_of_string("2012-12-03T07:16:23.123Z", &facets).is_ok());
    assert!(
        K::DateTimeOffset
            .value_of_string("2012-12-03T07:16:23.1234Z", &facets)
            .unwrap_err()
            .is_content_error()
    );
    assert!(K::Duration.value_of_string("PT1.1234S", &facets).is_err());
}

#[test]
fn test_srid_facet() {
    let facets = Facets::new().with_srid(4326);
    assert!(K::Geography.value_of_string("Point(1 2)", &facets).is_ok());
    assert!(K::Geography.value_of_string("SRID=0;Point(1 2)", &facets).is_err());
}

#[test]
fn test_geo_literal_structure() {
    let value = K::Geometry
        .value_of_string("Collection(Point(1 2),LineString(0 0,1 1))", &Facets::default())
        .unwrap();
    let PrimitiveValue::Geo(geo) = value else {
        panic!("expected a geo value");
    };
    assert_eq!(geo.dimension, GeoDimension::Geometry);
    assert_eq!(geo.shape, GeoShape::Collection);
    assert_eq!(geo.srid, 0);
}

#[test]
fn test_wrong_representation_is_a_type_mismatch() {
    let facets = Facets::default();

    let err = K::Int16
        .value_to_string(&PrimitiveValue::String("1".into()), &facets)
        .unwrap_err();
    assert!(err.is_type_mismatch());

    let err = K::Int16.value_of_string_as::<bool>("1", &facets).unwrap_err();
    assert!(err.is_type_mismatch());

    let err = K::Date
        .value_to_string(&PrimitiveValue::Boolean(true), &facets)
        .unwrap_err();
    assert!(err.is_type_mismatch());

    let err = K::Stream.value_of_string("abc", &facets).unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn test_out_of_range_value_is_a_content_error() {
    let facets = Facets::default();
    let err = K::Int16
        .value_to_string(&PrimitiveValue::Int32(100_000), &facets)
        .unwrap_err();
    assert!(err.is_content_error());

    let err = K::Byte.value_of_string_as::<i8>("200", &facets).unwrap_err();
    assert!(err.is_content_error());
}

#[test]
fn test_narrower_representations_are_widened() {
    let facets = Facets::default();
    assert_eq!(
        K::Int64.value_to_string(&PrimitiveValue::Byte(7), &facets).unwrap(),
        "7"
    );
    assert_eq!(
        K::Decimal.value_to_string(&PrimitiveValue::Int32(10), &facets).unwrap(),
        "10"
    );
    assert_eq!(
        K::Int32.value_of_string_as::<i64>("-12", &facets).unwrap(),
        -12
    );
    assert_eq!(
        K::Decimal.value_of_string_as::<Decimal>("1e3", &facets).unwrap(),
        Decimal::from_str("1000").unwrap()
    );
}
