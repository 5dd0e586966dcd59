//! Enumeration types and flags round-tripping

use octofhir_odata_diagnostics::{ODATA0306, ODataError, Result};
use octofhir_odata_model::CsdlEnumType;
use octofhir_odata_types::{EdmPrimitiveTypeKind, FullQualifiedName, PrimitiveResult, PrimitiveTypeError};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmEnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmEnumType {
    name: FullQualifiedName,
    underlying_type: EdmPrimitiveTypeKind,
    is_flags: bool,
    members: Vec<EdmEnumMember>,
}

impl EdmEnumType {
    pub(crate) fn new(name: FullQualifiedName, record: CsdlEnumType) -> Result<Self> {
        let invalid = |reason: String| ODataError::model(ODATA0306, reason, name.to_string());

        let underlying_type = match &record.underlying_type {
            None => EdmPrimitiveTypeKind::Int32,
            Some(fqn) => EdmPrimitiveTypeKind::kind_of(fqn)
                .filter(EdmPrimitiveTypeKind::is_integral)
                .ok_or_else(|| {
                    invalid(format!("Enum '{name}' has non-integral underlying type '{fqn}'"))
                })?,
        };

        let mut seen = HashSet::new();
        let mut next = 0i64;
        let mut members = Vec::with_capacity(record.members.len());
        for member in record.members {
            let value = member.value.unwrap_or(next);
            if !underlying_type.can_hold(value) {
                return Err(invalid(format!(
                    "Value {value} of member '{}' does not fit {underlying_type}",
                    member.name
                )));
            }
            if !seen.insert(member.name.clone()) {
                return Err(invalid(format!(
                    "Enum '{name}' declares member '{}' twice",
                    member.name
                )));
            }
            next = value.saturating_add(1);
            members.push(EdmEnumMember {
                name: member.name,
                value,
            });
        }

        Ok(Self {
            name,
            underlying_type,
            is_flags: record.is_flags,
            members,
        })
    }

    pub fn name(&self) -> &FullQualifiedName {
        &self.name
    }

    pub fn underlying_type(&self) -> EdmPrimitiveTypeKind {
        self.underlying_type
    }

    pub fn is_flags(&self) -> bool {
        self.is_flags
    }

    pub fn members(&self) -> &[EdmEnumMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&EdmEnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    fn content_error(&self, literal: &str, reason: impl Into<String>) -> PrimitiveTypeError {
        PrimitiveTypeError::content(self.underlying_type, literal, reason)
    }

    fn part_value(&self, part: &str, literal: &str) -> PrimitiveResult<i64> {
        if let Some(member) = self.member(part) {
            return Ok(member.value);
        }
        let number: i64 = part
            .parse()
            .map_err(|_| self.content_error(literal, format!("'{part}' is not a member of {}", self.name)))?;
        if !self.underlying_type.can_hold(number) {
            return Err(self.content_error(literal, "value out of range"));
        }
        Ok(number)
    }

    /// Parse a member name, a number, or for flags enums a `,`-separated
    /// combination of both
    pub fn value_of_string(&self, text: &str) -> PrimitiveResult<i64> {
        if text.is_empty() {
            return Err(self.content_error(text, "empty enum value"));
        }
        if !self.is_flags {
            return self.part_value(text, text);
        }
        text.split(',')
            .map(str::trim)
            .try_fold(0i64, |acc, part| Ok(acc | self.part_value(part, text)?))
    }

    /// Member name for `value`; flags enums decompose into declared members
    ///
    /// A flags value of 0 with no zero member formats as the empty string.
    pub fn value_to_string(&self, value: i64) -> PrimitiveResult<String> {
        if let Some(member) = self.members.iter().find(|m| m.value == value) {
            return Ok(member.name.clone());
        }
        let unrepresentable = || self.content_error(&value.to_string(), format!("no member of {} matches", self.name));
        if !self.is_flags {
            return Err(unrepresentable());
        }

        let mut remaining = value;
        let mut names = Vec::new();
        for member in &self.members {
            if member.value != 0 && member.value & remaining == member.value {
                names.push(member.name.as_str());
                remaining &= !member.value;
            }
        }
        if remaining != 0 {
            return Err(unrepresentable());
        }
        Ok(names.join(","))
    }

    /// Parse `Namespace.Enum'Member'`
    pub fn from_uri_literal(&self, literal: &str) -> PrimitiveResult<i64> {
        let prefix = format!("{}'", self.name);
        let inner = literal
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix('\''))
            .ok_or_else(|| self.content_error(literal, format!("expected {}'...'", self.name)))?;
        self.value_of_string(inner)
    }

    pub fn to_uri_literal(&self, value: i64) -> PrimitiveResult<String> {
        Ok(format!("{}'{}'", self.name, self.value_to_string(value)?))
    }
}
