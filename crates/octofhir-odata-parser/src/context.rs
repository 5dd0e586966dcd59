//! State shared by every resolver taking part in one parse call

use crate::ParserOptions;
use indexmap::IndexMap;
use octofhir_odata_ast::AliasValue;
use octofhir_odata_diagnostics::{ODATA0100, ODataError, Result};
use octofhir_odata_edm::{Edm, EdmEntityContainer};
use std::cell::RefCell;
use std::sync::Arc;

pub(crate) struct ParseContext<'e> {
    pub(crate) edm: &'e Edm,
    pub(crate) options: &'e ParserOptions,
    /// `@name` values of the request, keyed without the `@`
    pub(crate) aliases: RefCell<IndexMap<String, AliasValue>>,
    /// Aliases whose value is being resolved right now
    pub(crate) resolving: RefCell<Vec<String>>,
    /// Entity sets of a `$crossjoin`, addressable by name in expressions
    pub(crate) crossjoin: Vec<String>,
}

impl<'e> ParseContext<'e> {
    pub(crate) fn new(edm: &'e Edm, options: &'e ParserOptions) -> Self {
        Self {
            edm,
            options,
            aliases: RefCell::new(IndexMap::new()),
            resolving: RefCell::new(Vec::new()),
            crossjoin: Vec::new(),
        }
    }

    pub(crate) fn container(&self) -> Result<Arc<EdmEntityContainer>> {
        self.edm
            .entity_container(None)?
            .ok_or_else(|| ODataError::semantic(ODATA0100, "The service has no entity container"))
    }

    pub(crate) fn has_alias(&self, name: &str) -> bool {
        self.aliases.borrow().contains_key(name)
    }

    pub(crate) fn into_aliases(self) -> IndexMap<String, AliasValue> {
        self.aliases.into_inner()
    }
}
