//! Native representations of primitive values

use crate::{EdmPrimitiveTypeKind, PrimitiveResult, PrimitiveTypeError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default native value of a primitive kind
///
/// Durations are held as a signed number of seconds so that fractional
/// seconds survive a round trip without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Decimal(Decimal),
    Single(f32),
    Double(f64),
    Date(NaiveDate),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
    Duration(Decimal),
    Guid(Uuid),
    String(String),
    Geo(GeoValue),
}

impl PrimitiveValue {
    /// The kind this representation belongs to natively
    pub fn kind(&self) -> EdmPrimitiveTypeKind {
        match self {
            Self::Binary(_) => EdmPrimitiveTypeKind::Binary,
            Self::Boolean(_) => EdmPrimitiveTypeKind::Boolean,
            Self::Byte(_) => EdmPrimitiveTypeKind::Byte,
            Self::SByte(_) => EdmPrimitiveTypeKind::SByte,
            Self::Int16(_) => EdmPrimitiveTypeKind::Int16,
            Self::Int32(_) => EdmPrimitiveTypeKind::Int32,
            Self::Int64(_) => EdmPrimitiveTypeKind::Int64,
            Self::Decimal(_) => EdmPrimitiveTypeKind::Decimal,
            Self::Single(_) => EdmPrimitiveTypeKind::Single,
            Self::Double(_) => EdmPrimitiveTypeKind::Double,
            Self::Date(_) => EdmPrimitiveTypeKind::Date,
            Self::DateTimeOffset(_) => EdmPrimitiveTypeKind::DateTimeOffset,
            Self::TimeOfDay(_) => EdmPrimitiveTypeKind::TimeOfDay,
            Self::Duration(_) => EdmPrimitiveTypeKind::Duration,
            Self::Guid(_) => EdmPrimitiveTypeKind::Guid,
            Self::String(_) => EdmPrimitiveTypeKind::String,
            Self::Geo(geo) => geo.dimension.kind(),
        }
    }

    /// Integral content of any integer representation
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::SByte(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind().value_to_string(self, &crate::Facets::default()) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// Spatial family of a geo value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoDimension {
    Geography,
    Geometry,
}

impl GeoDimension {
    pub const fn kind(&self) -> EdmPrimitiveTypeKind {
        match self {
            Self::Geography => EdmPrimitiveTypeKind::Geography,
            Self::Geometry => EdmPrimitiveTypeKind::Geometry,
        }
    }

    /// SRID assumed when a literal omits one
    pub const fn default_srid(&self) -> u32 {
        match self {
            Self::Geography => 4326,
            Self::Geometry => 0,
        }
    }
}

/// Shape named by a WKT literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoShape {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Collection,
}

impl GeoShape {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::Collection => "Collection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Point,
            Self::LineString,
            Self::Polygon,
            Self::MultiPoint,
            Self::MultiLineString,
            Self::MultiPolygon,
            Self::Collection,
        ]
        .into_iter()
        .find(|shape| shape.name().eq_ignore_ascii_case(name))
    }
}

/// A validated spatial literal, kept as WKT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoValue {
    pub dimension: GeoDimension,
    pub srid: u32,
    pub shape: GeoShape,
    /// Parenthesised body, e.g. `(142.1 64.1)`
    pub coordinates: String,
}

impl fmt::Display for GeoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SRID={};{}{}", self.srid, self.shape.name(), self.coordinates)
    }
}

/// Conversion from a parsed primitive value into a caller-chosen native type
///
/// A representation the kind can never produce is a type mismatch; a value
/// the target cannot hold (e.g. 300 into `i8`) is a content error.
pub trait FromPrimitive: Sized {
    fn from_primitive(value: PrimitiveValue, kind: EdmPrimitiveTypeKind) -> PrimitiveResult<Self>;
}

impl FromPrimitive for PrimitiveValue {
    fn from_primitive(value: PrimitiveValue, _kind: EdmPrimitiveTypeKind) -> PrimitiveResult<Self> {
        Ok(value)
    }
}

macro_rules! integral_from_primitive {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl FromPrimitive for $ty {
                fn from_primitive(
                    value: PrimitiveValue,
                    kind: EdmPrimitiveTypeKind,
                ) -> PrimitiveResult<Self> {
                    let Some(number) = value.as_i64() else {
                        return Err(PrimitiveTypeError::mismatch(kind, $label));
                    };
                    <$ty>::try_from(number).map_err(|_| {
                        PrimitiveTypeError::content(
                            kind,
                            number.to_string(),
                            concat!("value does not fit into ", $label),
                        )
                    })
                }
            }
        )*
    };
}

integral_from_primitive!(
    i8 => "i8",
    u8 => "u8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
);

impl FromPrimitive for Decimal {
    fn from_primitive(value: PrimitiveValue, kind: EdmPrimitiveTypeKind) -> PrimitiveResult<Self> {
        match value {
            PrimitiveValue::Decimal(d) | PrimitiveValue::Duration(d) => Ok(d),
            other => match other.as_i64() {
                Some(n) => Ok(Decimal::from(n)),
                None => Err(PrimitiveTypeError::mismatch(kind, "Decimal")),
            },
        }
    }
}

impl FromPrimitive for f64 {
    fn from_primitive(value: PrimitiveValue, kind: EdmPrimitiveTypeKind) -> PrimitiveResult<Self> {
        match value {
            PrimitiveValue::Double(d) => Ok(d),
            PrimitiveValue::Single(s) => Ok(f64::from(s)),
            PrimitiveValue::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| PrimitiveTypeError::content(kind, d.to_string(), "not representable as f64")),
            other => match other.as_i64() {
                Some(n) => Ok(n as f64),
                None => Err(PrimitiveTypeError::mismatch(kind, "f64")),
            },
        }
    }
}

impl FromPrimitive for f32 {
    fn from_primitive(value: PrimitiveValue, kind: EdmPrimitiveTypeKind) -> PrimitiveResult<Self> {
        match value {
            PrimitiveValue::Single(s) => Ok(s),
            PrimitiveValue::Byte(b) => Ok(f32::from(b)),
            PrimitiveValue::SByte(b) => Ok(f32::from(b)),
            PrimitiveValue::Int16(i) => Ok(f32::from(i)),
            _ => Err(PrimitiveTypeError::mismatch(kind, "f32")),
        }
    }
}

macro_rules! exact_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromPrimitive for $ty {
                fn from_primitive(
                    value: PrimitiveValue,
                    kind: EdmPrimitiveTypeKind,
                ) -> PrimitiveResult<Self> {
                    match value {
                        PrimitiveValue::$variant(v) => Ok(v),
                        _ => Err(PrimitiveTypeError::mismatch(kind, stringify!($ty))),
                    }
                }
            }
        )*
    };
}

exact_from_primitive!(
    bool => Boolean,
    String => String,
    Vec<u8> => Binary,
    Uuid => Guid,
    NaiveDate => Date,
    NaiveTime => TimeOfDay,
    DateTime<FixedOffset> => DateTimeOffset,
    GeoValue => Geo,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_narrowing_is_a_content_error() {
        let err = i8::from_primitive(PrimitiveValue::Int16(300), EdmPrimitiveTypeKind::Int16)
            .unwrap_err();
        assert!(err.is_content_error());
        assert_eq!(
            i8::from_primitive(PrimitiveValue::Int16(-7), EdmPrimitiveTypeKind::Int16).unwrap(),
            -7
        );
    }

    #[test]
    fn test_wrong_representation_is_a_type_mismatch() {
        let err = bool::from_primitive(PrimitiveValue::Int32(1), EdmPrimitiveTypeKind::Int32)
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_geo_display() {
        let geo = GeoValue {
            dimension: GeoDimension::Geography,
            srid: 4326,
            shape: GeoShape::Point,
            coordinates: "(142.1 64.1)".to_string(),
        };
        assert_eq!(geo.to_string(), "SRID=4326;Point(142.1 64.1)");
    }
}
