//! OData diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the EDM
//! model and the URI parser: error codes with stable message keys, source
//! spans into the request text, and the `ODataError` taxonomy.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for OData operations
pub type Result<T> = std::result::Result<T, ODataError>;
