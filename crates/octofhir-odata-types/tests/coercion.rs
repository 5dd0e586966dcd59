//! Compatibility and promotion tests for primitive kinds
//!
//! Covers:
//! - The numeric promotion order
//! - Common kinds of mixed operands
//! - Arithmetic result kinds including date/time arithmetic

use octofhir_odata_types::{ArithmeticOperator, EdmPrimitiveTypeKind as K};
use rstest::rstest;

#[rstest]
#[case(K::SByte, K::Int16, true)]
#[case(K::Byte, K::Int16, true)]
#[case(K::Int16, K::Int32, true)]
#[case(K::Int32, K::Int64, true)]
#[case(K::Int64, K::Decimal, true)]
#[case(K::Single, K::Double, true)]
#[case(K::Double, K::Decimal, true)]
#[case(K::Int32, K::Int16, false)]
#[case(K::Double, K::Single, false)]
#[case(K::String, K::Int32, false)]
#[case(K::Date, K::DateTimeOffset, false)]
#[case(K::Guid, K::Guid, true)]
fn test_is_compatible_with(#[case] from: K, #[case] to: K, #[case] expected: bool) {
    assert_eq!(from.is_compatible_with(to), expected);
}

#[rstest]
#[case(K::Int16, K::Int32, Some(K::Int32))]
#[case(K::Int64, K::Single, Some(K::Single))]
#[case(K::Double, K::Decimal, Some(K::Decimal))]
#[case(K::Byte, K::SByte, Some(K::Int16))]
#[case(K::String, K::Int32, None)]
fn test_common_kind(#[case] left: K, #[case] right: K, #[case] expected: Option<K>) {
    assert_eq!(left.common_kind(right), expected);
    assert_eq!(right.common_kind(left), expected);
}

#[rstest]
#[case(ArithmeticOperator::Add, K::Int16, K::Int32, Some(K::Int32))]
#[case(ArithmeticOperator::Mul, K::Decimal, K::Int64, Some(K::Decimal))]
#[case(ArithmeticOperator::Div, K::Int32, K::Int32, Some(K::Int32))]
#[case(ArithmeticOperator::DivBy, K::Int32, K::Int32, Some(K::Decimal))]
#[case(ArithmeticOperator::DivBy, K::Int32, K::Double, Some(K::Double))]
#[case(ArithmeticOperator::Add, K::DateTimeOffset, K::Duration, Some(K::DateTimeOffset))]
#[case(ArithmeticOperator::Sub, K::Date, K::Duration, Some(K::Date))]
#[case(ArithmeticOperator::Sub, K::DateTimeOffset, K::DateTimeOffset, Some(K::Duration))]
#[case(ArithmeticOperator::Sub, K::Date, K::Date, Some(K::Duration))]
#[case(ArithmeticOperator::Add, K::Duration, K::Duration, Some(K::Duration))]
#[case(ArithmeticOperator::Add, K::Date, K::Date, None)]
#[case(ArithmeticOperator::Mul, K::Duration, K::Duration, None)]
#[case(ArithmeticOperator::Add, K::String, K::String, None)]
fn test_arithmetic_result(
    #[case] op: ArithmeticOperator,
    #[case] left: K,
    #[case] right: K,
    #[case] expected: Option<K>,
) {
    assert_eq!(K::arithmetic_result(op, left, right), expected);
}

#[test]
fn test_can_hold_respects_ranges() {
    assert!(K::Int16.can_hold(-32768));
    assert!(!K::Int16.can_hold(32768));
    assert!(!K::Byte.can_hold(-1));
    assert!(K::SByte.can_hold(-128));
    assert!(!K::String.can_hold(0));
}
