//! OData URI resolution for Rust
//!
//! This crate ties together:
//! - The primitive type registry and literal formats
//! - A metadata provider SPI with an in-memory implementation
//! - A lazily resolved entity data model
//! - Resource path and query option parsing with type checking
//!
//! # Example
//!
//! ```ignore
//! use octofhir_odata::{Edm, InMemoryProvider, parse_uri};
//!
//! let provider = InMemoryProvider::from_file("service.json")?;
//! let edm = Edm::new(provider);
//!
//! let info = parse_uri(&edm, "People(1)/Name?$format=json")?;
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_odata_ast as ast;
pub use octofhir_odata_diagnostics as diagnostics;
pub use octofhir_odata_edm as edm;
pub use octofhir_odata_model as model;
pub use octofhir_odata_parser as parser;
pub use octofhir_odata_types as types;

// Convenience re-exports
pub use octofhir_odata_ast::{Expression, UriInfo, UriInfoKind, UriResource};
pub use octofhir_odata_diagnostics::{ODataError, Result};
pub use octofhir_odata_edm::Edm;
pub use octofhir_odata_model::{InMemoryProvider, MetadataProvider};
pub use octofhir_odata_parser::{ParserOptions, UriParser, parse_uri};
