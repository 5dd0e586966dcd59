//! OData URI parser
//!
//! Resolves a request URI against an [`Edm`](octofhir_odata_edm::Edm):
//! the resource path becomes a chain of typed
//! [`UriResource`](octofhir_odata_ast::UriResource) segments and each
//! system query option is lexed, parsed and type-checked.
//!
//! ```ignore
//! use octofhir_odata_parser::UriParser;
//!
//! let parser = UriParser::new(edm);
//! let info = parser.parse_uri("ESAllPrim?$filter=PropertyInt16 gt 5&$top=10")?;
//! assert_eq!(info.query.top, Some(10));
//! ```

mod context;
mod expression;
mod lexer;
mod member;
mod methods;
mod options;
mod path;
mod query;
mod typing;
mod uri;

pub use lexer::{LexMode, TokenKind, Tokenizer};
pub use options::ParserOptions;
pub use uri::UriParser;

use octofhir_odata_ast::UriInfo;
use octofhir_odata_diagnostics::Result;
use octofhir_odata_edm::Edm;

/// Parse `uri` against `edm` with default options
pub fn parse_uri(edm: &Edm, uri: &str) -> Result<UriInfo> {
    UriParser::new(edm.clone()).parse_uri(uri)
}
