//! The built-in `Edm.*` primitive kinds

use crate::FullQualifiedName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of every built-in primitive type
pub const EDM_NAMESPACE: &str = "Edm";

/// Built-in primitive type kinds
///
/// The concrete spatial types (`Edm.GeographyPoint`, `Edm.GeometryPolygon`, ...)
/// collapse into the two families `Geography` and `Geometry`; the shape is
/// carried by the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdmPrimitiveTypeKind {
    Binary,
    Boolean,
    Byte,
    SByte,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Duration,
    Decimal,
    Single,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    String,
    Stream,
    Geography,
    Geometry,
}

impl EdmPrimitiveTypeKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 19] = [
        Self::Binary,
        Self::Boolean,
        Self::Byte,
        Self::SByte,
        Self::Date,
        Self::DateTimeOffset,
        Self::TimeOfDay,
        Self::Duration,
        Self::Decimal,
        Self::Single,
        Self::Double,
        Self::Guid,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::String,
        Self::Stream,
        Self::Geography,
        Self::Geometry,
    ];

    /// Simple name without the `Edm` namespace
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::SByte => "SByte",
            Self::Date => "Date",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::TimeOfDay => "TimeOfDay",
            Self::Duration => "Duration",
            Self::Decimal => "Decimal",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::String => "String",
            Self::Stream => "Stream",
            Self::Geography => "Geography",
            Self::Geometry => "Geometry",
        }
    }

    pub fn full_qualified_name(&self) -> FullQualifiedName {
        FullQualifiedName::new(EDM_NAMESPACE, self.name())
    }

    /// Look a kind up by its simple name (`Int16`, `GeographyPoint`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(kind) = Self::ALL.iter().find(|k| k.name() == name) {
            return Some(*kind);
        }
        if let Some(shape) = name.strip_prefix("Geography") {
            return is_spatial_suffix(shape).then_some(Self::Geography);
        }
        if let Some(shape) = name.strip_prefix("Geometry") {
            return is_spatial_suffix(shape).then_some(Self::Geometry);
        }
        None
    }

    /// Resolve a qualified name to a primitive kind, if it names one
    pub fn kind_of(name: &FullQualifiedName) -> Option<Self> {
        if name.namespace() != EDM_NAMESPACE {
            return None;
        }
        Self::from_name(name.name())
    }

    /// Resolve a dotted name such as `Edm.Int32`
    pub fn from_qualified_str(name: &str) -> Option<Self> {
        FullQualifiedName::parse(name).and_then(|fqn| Self::kind_of(&fqn))
    }

    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::SByte | Self::Byte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    pub const fn is_floating(&self) -> bool {
        matches!(self, Self::Single | Self::Double)
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating() || matches!(self, Self::Decimal)
    }

    /// Kinds that take part in date/time arithmetic
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::DateTimeOffset | Self::Duration | Self::TimeOfDay
        )
    }

    pub const fn is_spatial(&self) -> bool {
        matches!(self, Self::Geography | Self::Geometry)
    }

    /// Values of this kind may be ordered with `lt`/`gt` and `$orderby`
    pub const fn is_orderable(&self) -> bool {
        !matches!(self, Self::Stream | Self::Geography | Self::Geometry)
    }
}

fn is_spatial_suffix(shape: &str) -> bool {
    matches!(
        shape,
        "Point"
            | "LineString"
            | "Polygon"
            | "MultiPoint"
            | "MultiLineString"
            | "MultiPolygon"
            | "Collection"
    )
}

impl fmt::Display for EdmPrimitiveTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", EDM_NAMESPACE, self.name())
    }
}
