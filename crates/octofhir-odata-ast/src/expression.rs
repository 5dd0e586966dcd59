//! Typed expression tree produced for `$filter`, `$orderby` and lambda predicates

use crate::{BinaryOperator, UnaryOperator, UriResource};
use octofhir_odata_diagnostics::Span;
use octofhir_odata_edm::{EdmEnumType, EdmType};
use octofhir_odata_types::PrimitiveValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A resolved expression node
///
/// `type_` is `None` only for `null` literals and undefined aliases; every
/// other node carries the EDM type it evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub type_: Option<EdmType>,
    pub is_collection: bool,
    /// Position in the query option value the node was parsed from
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, type_: Option<EdmType>, is_collection: bool, span: Span) -> Self {
        Self {
            kind,
            type_,
            is_collection,
            span,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(&self.kind, ExpressionKind::Literal(l) if l.value.is_none())
    }

    pub fn as_member(&self) -> Option<&[UriResource]> {
        match &self.kind {
            ExpressionKind::Member(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExpressionKind::Literal(l) => Some(l),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    /// Enum member literal, `ns.Color'Red,Blue'`
    Enum {
        enum_type: Arc<EdmEnumType>,
        values: Vec<String>,
    },
    /// Property path, lambda or bound function chain starting at `$it`,
    /// `$root`, a lambda variable or a leading type cast
    Member(Vec<UriResource>),
    MethodCall {
        method: MethodKind,
        arguments: Vec<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `@name` parameter alias; its value lives in the URI's alias table
    Alias(String),
    /// Type name argument of `cast` and `isof`
    TypeLiteral(EdmType),
    /// Parenthesised list on the right of `in`
    List(Vec<Expression>),
}

/// Primitive literal with its original URI text
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub text: String,
    /// `None` for `null`
    pub value: Option<PrimitiveValue>,
}

impl Literal {
    pub fn new(text: impl Into<String>, value: Option<PrimitiveValue>) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }

    pub fn null() -> Self {
        Self::new("null", None)
    }
}

/// Built-in canonical functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Contains,
    StartsWith,
    EndsWith,
    Length,
    IndexOf,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Concat,
    MatchesPattern,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    FractionalSeconds,
    TotalSeconds,
    Date,
    Time,
    TotalOffsetMinutes,
    MinDateTime,
    MaxDateTime,
    Now,
    Round,
    Floor,
    Ceiling,
    GeoDistance,
    GeoLength,
    GeoIntersects,
    HasSubset,
    HasSubsequence,
    Cast,
    IsOf,
}

impl MethodKind {
    pub const ALL: [Self; 35] = [
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Length,
        Self::IndexOf,
        Self::Substring,
        Self::ToLower,
        Self::ToUpper,
        Self::Trim,
        Self::Concat,
        Self::MatchesPattern,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
        Self::FractionalSeconds,
        Self::TotalSeconds,
        Self::Date,
        Self::Time,
        Self::TotalOffsetMinutes,
        Self::MinDateTime,
        Self::MaxDateTime,
        Self::Now,
        Self::Round,
        Self::Floor,
        Self::Ceiling,
        Self::GeoDistance,
        Self::GeoLength,
        Self::GeoIntersects,
        Self::HasSubset,
        Self::HasSubsequence,
        Self::Cast,
        Self::IsOf,
    ];

    /// Name as written in a URI
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Length => "length",
            Self::IndexOf => "indexof",
            Self::Substring => "substring",
            Self::ToLower => "tolower",
            Self::ToUpper => "toupper",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::MatchesPattern => "matchesPattern",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::FractionalSeconds => "fractionalseconds",
            Self::TotalSeconds => "totalseconds",
            Self::Date => "date",
            Self::Time => "time",
            Self::TotalOffsetMinutes => "totaloffsetminutes",
            Self::MinDateTime => "mindatetime",
            Self::MaxDateTime => "maxdatetime",
            Self::Now => "now",
            Self::Round => "round",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::GeoDistance => "geo.distance",
            Self::GeoLength => "geo.length",
            Self::GeoIntersects => "geo.intersects",
            Self::HasSubset => "hassubset",
            Self::HasSubsequence => "hassubsequence",
            Self::Cast => "cast",
            Self::IsOf => "isof",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
