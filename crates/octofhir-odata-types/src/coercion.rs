//! Compatibility and numeric promotion between primitive kinds

use crate::EdmPrimitiveTypeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric promotion order, narrowest first
const PROMOTION_ORDER: [EdmPrimitiveTypeKind; 8] = [
    EdmPrimitiveTypeKind::SByte,
    EdmPrimitiveTypeKind::Byte,
    EdmPrimitiveTypeKind::Int16,
    EdmPrimitiveTypeKind::Int32,
    EdmPrimitiveTypeKind::Int64,
    EdmPrimitiveTypeKind::Single,
    EdmPrimitiveTypeKind::Double,
    EdmPrimitiveTypeKind::Decimal,
];

/// Arithmetic operators of the expression grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
    DivBy,
    Mod,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::DivBy => "divby",
            Self::Mod => "mod",
        })
    }
}

impl EdmPrimitiveTypeKind {
    /// Position in the numeric promotion order
    pub fn promotion_rank(&self) -> Option<usize> {
        PROMOTION_ORDER.iter().position(|k| k == self)
    }

    /// Whether every value of `self` can be represented by `target`
    ///
    /// Byte and SByte are not compatible with each other: each holds values
    /// the other cannot.
    pub fn is_compatible_with(&self, target: EdmPrimitiveTypeKind) -> bool {
        if *self == target {
            return true;
        }
        match (self.promotion_rank(), target.promotion_rank()) {
            (Some(from), Some(to)) => {
                from < to && !matches!((self, target), (Self::SByte, Self::Byte))
            }
            _ => false,
        }
    }

    /// Narrowest kind both operands widen to
    pub fn common_kind(&self, other: EdmPrimitiveTypeKind) -> Option<EdmPrimitiveTypeKind> {
        if *self == other {
            return Some(other);
        }
        PROMOTION_ORDER
            .into_iter()
            .find(|k| self.is_compatible_with(*k) && other.is_compatible_with(*k))
    }

    /// Whether an integer value fits into this kind
    pub fn can_hold(&self, value: i64) -> bool {
        match self {
            Self::SByte => i8::try_from(value).is_ok(),
            Self::Byte => u8::try_from(value).is_ok(),
            Self::Int16 => i16::try_from(value).is_ok(),
            Self::Int32 => i32::try_from(value).is_ok(),
            Self::Int64 | Self::Decimal | Self::Single | Self::Double => true,
            _ => false,
        }
    }

    /// The narrowest integral kind holding `value`
    pub fn narrowest_integral(value: i64) -> EdmPrimitiveTypeKind {
        PROMOTION_ORDER[..5]
            .iter()
            .copied()
            .find(|k| k.can_hold(value))
            .unwrap_or(Self::Int64)
    }

    /// Result kind of `left op right`, or `None` when the pair is not allowed
    pub fn arithmetic_result(
        op: ArithmeticOperator,
        left: EdmPrimitiveTypeKind,
        right: EdmPrimitiveTypeKind,
    ) -> Option<EdmPrimitiveTypeKind> {
        use EdmPrimitiveTypeKind as K;

        if left.is_numeric() && right.is_numeric() {
            let common = left.common_kind(right)?;
            return Some(match op {
                ArithmeticOperator::DivBy if !common.is_floating() => K::Decimal,
                _ => common,
            });
        }

        match (op, left, right) {
            (ArithmeticOperator::Add | ArithmeticOperator::Sub, K::DateTimeOffset, K::Duration) => {
                Some(K::DateTimeOffset)
            }
            (ArithmeticOperator::Add | ArithmeticOperator::Sub, K::Date, K::Duration) => Some(K::Date),
            (ArithmeticOperator::Add | ArithmeticOperator::Sub, K::Duration, K::Duration) => {
                Some(K::Duration)
            }
            (ArithmeticOperator::Sub, K::DateTimeOffset, K::DateTimeOffset) => Some(K::Duration),
            (ArithmeticOperator::Sub, K::Date, K::Date) => Some(K::Duration),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_and_sbyte_meet_at_int16() {
        use EdmPrimitiveTypeKind as K;
        assert!(!K::Byte.is_compatible_with(K::SByte));
        assert!(!K::SByte.is_compatible_with(K::Byte));
        assert_eq!(K::Byte.common_kind(K::SByte), Some(K::Int16));
    }

    #[test]
    fn test_narrowest_integral() {
        use EdmPrimitiveTypeKind as K;
        assert_eq!(K::narrowest_integral(1), K::SByte);
        assert_eq!(K::narrowest_integral(200), K::Byte);
        assert_eq!(K::narrowest_integral(-32768), K::Int16);
        assert_eq!(K::narrowest_integral(70_000), K::Int32);
        assert_eq!(K::narrowest_integral(i64::MAX), K::Int64);
    }
}
