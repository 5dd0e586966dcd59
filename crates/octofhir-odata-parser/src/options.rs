//! Parser configuration

use serde::{Deserialize, Serialize};

/// Limits and leniency switches applied while parsing a URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    /// Upper bound for a numeric `$levels`; `None` leaves it unbounded
    pub max_expand_levels: Option<u32>,
    /// Resolve an `@alias` without a value to a typeless null instead of failing
    pub allow_undefined_aliases: bool,
    /// Nesting bound for expressions
    pub max_expression_depth: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_expand_levels: None,
            allow_undefined_aliases: true,
            max_expression_depth: 100,
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_expand_levels(mut self, levels: u32) -> Self {
        self.max_expand_levels = Some(levels);
        self
    }

    pub fn with_allow_undefined_aliases(mut self, allow: bool) -> Self {
        self.allow_undefined_aliases = allow;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: u32) -> Self {
        self.max_expression_depth = depth;
        self
    }
}
