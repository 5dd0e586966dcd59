//! System query options and their resolved values

use crate::{Expression, UriResource};
use indexmap::IndexMap;
use octofhir_odata_edm::EdmStructuredType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Names of the system query options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemQueryOptionKind {
    Filter,
    OrderBy,
    Expand,
    Select,
    Top,
    Skip,
    Count,
    Format,
    SkipToken,
    DeltaToken,
    Search,
    Id,
    Levels,
}

impl SystemQueryOptionKind {
    pub const ALL: [Self; 13] = [
        Self::Filter,
        Self::OrderBy,
        Self::Expand,
        Self::Select,
        Self::Top,
        Self::Skip,
        Self::Count,
        Self::Format,
        Self::SkipToken,
        Self::DeltaToken,
        Self::Search,
        Self::Id,
        Self::Levels,
    ];

    /// Name including the leading `$`
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Filter => "$filter",
            Self::OrderBy => "$orderby",
            Self::Expand => "$expand",
            Self::Select => "$select",
            Self::Top => "$top",
            Self::Skip => "$skip",
            Self::Count => "$count",
            Self::Format => "$format",
            Self::SkipToken => "$skiptoken",
            Self::DeltaToken => "$deltatoken",
            Self::Search => "$search",
            Self::Id => "$id",
            Self::Levels => "$levels",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.name() == name)
    }

    /// Options accepted inside the parentheses of an `$expand` item
    pub const fn allowed_in_expand(&self) -> bool {
        matches!(
            self,
            Self::Filter
                | Self::OrderBy
                | Self::Expand
                | Self::Select
                | Self::Top
                | Self::Skip
                | Self::Count
                | Self::Search
                | Self::Levels
        )
    }
}

impl fmt::Display for SystemQueryOptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved query options of a request or of one `$expand` item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub expand: Vec<ExpandItem>,
    pub select: Vec<SelectItem>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub count: Option<bool>,
    pub format: Option<String>,
    pub skip_token: Option<String>,
    pub delta_token: Option<String>,
    /// `$search` is passed through as written
    pub search: Option<String>,
    pub id: Option<String>,
    pub levels: Option<Levels>,
    /// Options without a `$` or `@` prefix, in request order
    pub custom: IndexMap<String, String>,
}

impl QueryOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub descending: bool,
}

/// `$levels` value of an expand item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Levels {
    Max,
    Value(u32),
}

/// One comma-separated entry of `$expand`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandItem {
    /// Navigation path, possibly through complex properties
    pub path: Vec<UriResource>,
    /// `*` or `*/$ref`
    pub star: bool,
    /// Trailing `/$ref`
    pub is_ref: bool,
    /// Trailing `/$count`
    pub is_count: bool,
    /// Cast after the navigation property (`Nav/ns.ETDerived`)
    pub type_filter: Option<Arc<EdmStructuredType>>,
    pub options: QueryOptions,
}

impl ExpandItem {
    pub fn levels(&self) -> Option<Levels> {
        self.options.levels
    }
}

/// One comma-separated entry of `$select`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectItem {
    pub path: Vec<UriResource>,
    /// `*`
    pub star: bool,
    /// Namespace of a `ns.*` item selecting every operation in that schema
    pub all_operations_in_schema: Option<String>,
    /// Leading type cast (`ns.ETDerived/Prop`)
    pub starting_type: Option<Arc<EdmStructuredType>>,
}
