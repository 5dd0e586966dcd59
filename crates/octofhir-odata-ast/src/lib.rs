//! Resolved OData request model
//!
//! What the parser hands to its consumers: the kind of request, the typed
//! resource path, one typed expression tree per expression-valued query
//! option, and the remaining query options. Every node that refers to the
//! service model holds a shared handle into the [`Edm`](octofhir_odata_edm::Edm)
//! caches, so `==` on those nodes compares identity.

mod expression;
mod operator;
mod query;
mod resource;
mod uri_info;

pub use expression::*;
pub use operator::*;
pub use query::*;
pub use resource::*;
pub use uri_info::*;

pub use octofhir_odata_diagnostics::Span;
