//! Raw CSDL records as handed out by a metadata provider
//!
//! Records are plain data: names are unresolved, base types and property
//! types are qualified names, and nothing is validated. The EDM resolves and
//! checks them on first use.

mod container;
mod operations;
mod schema;
mod types;

pub use container::*;
pub use operations::*;
pub use schema::*;
pub use types::*;

fn default_true() -> bool {
    true
}
