//! OData metadata provider SPI
//!
//! This crate provides:
//! - Raw, unresolved CSDL records (`CsdlEntityType`, `CsdlAction`, ...)
//! - The `MetadataProvider` trait the EDM pulls those records from
//! - `InMemoryProvider`, a schema list loadable from JSON

pub mod csdl;
pub mod provider;
pub mod registry;

pub use csdl::*;
pub use provider::*;
pub use registry::*;
