//! Namespace-qualified names of schema elements

use crate::PrimitiveTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `namespace.Name` (or `alias.Name`) identifier of a schema element
///
/// Equality is textual. Alias expansion happens in the EDM before names are
/// compared, so two names only compare equal once both carry the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullQualifiedName {
    namespace: String,
    name: String,
}

impl FullQualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Split `text` at its last dot; both halves must be non-empty
    pub fn parse(text: &str) -> Option<Self> {
        let (namespace, name) = text.rsplit_once('.')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same simple name under another namespace
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(namespace, self.name.clone())
    }

    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FullQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for FullQualifiedName {
    type Err = PrimitiveTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PrimitiveTypeError::InvalidQualifiedName(s.to_string()))
    }
}

impl TryFrom<String> for FullQualifiedName {
    type Error = PrimitiveTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FullQualifiedName> for String {
    fn from(value: FullQualifiedName) -> Self {
        value.to_string()
    }
}
