//! OData expression operators with precedence information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators of the common expression grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    // Precedence 1 (lowest)
    Or,

    // Precedence 2
    And,

    // Precedence 3
    Eq,
    Ne,

    // Precedence 4
    Gt,
    Ge,
    Lt,
    Le,

    // Precedence 5
    Add,
    Sub,

    // Precedence 6
    Mul,
    Div,
    /// Division yielding a fractional result even for integers
    DivBy,
    Mod,

    // Precedence 7, postfix on a primary operand, tighter than unary `-` and `not`
    /// Flags enum test (`Color has ns.Color'Red'`)
    Has,
    /// Membership in a parenthesised list or collection
    In,
}

impl BinaryOperator {
    /// Precedence level (1-7, higher binds tighter)
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne => 3,
            Self::Gt | Self::Ge | Self::Lt | Self::Le => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::DivBy | Self::Mod => 6,
            Self::Has | Self::In => 7,
        }
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub const fn is_equality(&self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }

    pub const fn is_relational(&self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }

    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::DivBy | Self::Mod
        )
    }

    /// Keyword as written in a URI
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Has => "has",
            Self::In => "in",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::DivBy => "divby",
            Self::Mod => "mod",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "or" => Self::Or,
            "and" => Self::And,
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "has" => Self::Has,
            "in" => Self::In,
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "divby" => Self::DivBy,
            "mod" => Self::Mod,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`)
    Minus,
    /// Logical negation (`not x`)
    Not,
}

impl UnaryOperator {
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Minus => "-",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
