//! OData EDM primitive type registry
//!
//! This crate defines the built-in primitive kinds of the Entity Data Model:
//! - `EdmPrimitiveTypeKind`, the singleton table of `Edm.*` primitive types
//! - `PrimitiveValue`, the default native representation of each kind
//! - Facet validation (maxLength, precision, scale, SRID, unicode)
//! - Literal parsing and formatting in raw and URI literal form
//! - Compatibility and numeric promotion rules
//! - `FullQualifiedName`, the namespace-qualified name of schema elements

mod coercion;
mod error;
mod facets;
mod kind;
mod literal;
mod qualified_name;
mod value;

pub use coercion::*;
pub use error::*;
pub use facets::*;
pub use kind::*;
pub use qualified_name::*;
pub use value::*;

/// Result type for primitive conversions
pub type PrimitiveResult<T> = std::result::Result<T, PrimitiveTypeError>;
