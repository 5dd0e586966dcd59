//! OData Entity Data Model
//!
//! An `Edm` is a lazily populated view over a `MetadataProvider`. Every
//! schema element is fetched from the provider on first reference, resolved,
//! and cached for the lifetime of the model. Repeated lookups of the same
//! name return the same `Arc`, so callers may compare elements with
//! `Arc::ptr_eq`.
//!
//! Elements refer back to their model weakly. Holding an element after the
//! `Edm` has been dropped is allowed; resolving through it then fails with a
//! system error.

pub mod container;
pub mod edm;
pub mod edm_type;
pub mod enum_type;
pub mod operation;
pub mod property;
pub mod schema;
pub mod structured;

pub use container::*;
pub use edm::*;
pub use edm_type::*;
pub use enum_type::*;
pub use operation::*;
pub use property::*;
pub use schema::*;
pub use structured::*;

/// Elements are compared by identity; the caches hand out one instance per name.
macro_rules! identity_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    std::ptr::eq(self, other)
                }
            }

            impl Eq for $ty {}
        )*
    };
}

identity_eq!(
    EdmStructuredType,
    EdmProperty,
    EdmNavigationProperty,
    EdmOperation,
    EdmBindingTarget,
    EdmOperationImport,
    EdmEntityContainer,
);
