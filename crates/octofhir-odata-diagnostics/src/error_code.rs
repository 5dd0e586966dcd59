//! OData error codes following a structured numbering system
//!
//! Error code ranges:
//! - ODATA0001-ODATA0099: Syntax errors (lexing, grammar)
//! - ODATA0100-ODATA0199: Semantic errors (resolution against the EDM)
//! - ODATA0200-ODATA0299: Resolution errors (metadata provider failures)
//! - ODATA0300-ODATA0399: Model errors (inconsistent metadata)
//! - ODATA0400-ODATA0499: System errors (usage, configuration)
//!
//! Every code carries a stable message key (`TYPE_FILTER_NOT_CHAINABLE`)
//! that callers can match on without parsing the message text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Stable message key for this code
    pub fn key(&self) -> &'static str {
        self.info().key
    }

    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_semantic_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_resolution_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_model_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ODATA{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Stable message key
    pub key: &'static str,
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(key: &'static str, description: &'static str) -> Self {
        Self {
            key,
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("UNKNOWN", "Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Syntax errors (0001-0099)
    map.insert(1, ErrorInfo::new("UNEXPECTED_TOKEN", "Unexpected token"));
    map.insert(3, ErrorInfo::new("INVALID_IDENTIFIER", "Invalid identifier"));
    map.insert(5, ErrorInfo::new("UNTERMINATED_STRING", "Unterminated string literal"));
    map.insert(6, ErrorInfo::new("MISSING_CLOSING_PARENTHESIS", "Missing closing parenthesis"));
    map.insert(7, ErrorInfo::new("EXPECTED_EXPRESSION", "Expected expression"));
    map.insert(8, ErrorInfo::new("UNKNOWN_SYSTEM_QUERY_OPTION", "Unknown system query option")
        .with_help("System query option names are case-sensitive and start with '$'"));
    map.insert(9, ErrorInfo::new("DOUBLE_SYSTEM_QUERY_OPTION", "System query option specified more than once"));
    map.insert(10, ErrorInfo::new("SYNTAX_IN_KEY_VALUE", "Syntax error in key-value list"));
    map.insert(11, ErrorInfo::new("EMPTY_SEGMENT", "Empty path segment"));
    map.insert(12, ErrorInfo::new("CROSSJOIN_REQUIRES_ENTITY_SETS", "Crossjoin requires at least one entity set"));
    map.insert(13, ErrorInfo::new("WRONG_VALUE_FOR_SYSTEM_QUERY_OPTION", "Wrong value for system query option"));
    map.insert(14, ErrorInfo::new("MALFORMED_PERCENT_ENCODING", "Invalid percent-encoding"));
    map.insert(15, ErrorInfo::new("DUPLICATE_ALIAS", "Alias defined more than once"));
    map.insert(16, ErrorInfo::new("EXPRESSION_TOO_DEEP", "Expression nesting too deep"));
    map.insert(17, ErrorInfo::new("MUST_BE_LAST_SEGMENT", "Segment must be the last path segment"));
    map.insert(18, ErrorInfo::new("UNKNOWN_SYSTEM_RESOURCE", "Unknown system resource segment"));
    map.insert(19, ErrorInfo::new("TRAILING_INPUT", "Unexpected input after expression"));

    // Semantic errors (0100-0199)
    map.insert(100, ErrorInfo::new("RESOURCE_NOT_FOUND", "Resource not found")
        .with_help("The first path segment must name an entity set, singleton, or operation import"));
    map.insert(101, ErrorInfo::new("PROPERTY_NOT_IN_TYPE", "Property not found in type"));
    map.insert(102, ErrorInfo::new("TYPE_NOT_FOUND", "Type not found"));
    map.insert(103, ErrorInfo::new("OPERATION_NOT_FOUND", "Function or action not found"));
    map.insert(104, ErrorInfo::new("WRONG_NUMBER_OF_KEY_PROPERTIES", "Wrong number of key properties"));
    map.insert(105, ErrorInfo::new("KEY_NOT_ALLOWED", "Key predicate not allowed"));
    map.insert(106, ErrorInfo::new("INCOMPATIBLE_TYPE_FILTER", "Incompatible type filter"));
    map.insert(107, ErrorInfo::new("TYPE_FILTER_NOT_CHAINABLE", "Type filter not chainable"));
    map.insert(108, ErrorInfo::new("PREVIOUS_PART_NOT_TYPED", "Previous segment is not typed"));
    map.insert(109, ErrorInfo::new("ONLY_FOR_COLLECTIONS", "Only allowed on collections"));
    map.insert(110, ErrorInfo::new("ONLY_FOR_ENTITY_TYPES", "Only allowed on entity types"));
    map.insert(111, ErrorInfo::new("ONLY_FOR_PRIMITIVE_OR_STREAM", "Only allowed on primitive values or media entities"));
    map.insert(112, ErrorInfo::new("TYPE_MISMATCH", "Type mismatch"));
    map.insert(113, ErrorInfo::new("INCOMPATIBLE_CAST", "Incompatible cast target"));
    map.insert(114, ErrorInfo::new("WRONG_ARGUMENT_COUNT", "Wrong number of method arguments"));
    map.insert(115, ErrorInfo::new("WRONG_ARGUMENT_TYPE", "Wrong method argument type"));
    map.insert(116, ErrorInfo::new("LAMBDA_OUTSIDE_COLLECTION", "Lambda or member used outside a collection context"));
    map.insert(117, ErrorInfo::new("LAMBDA_VARIABLE_REDEFINED", "Lambda variable already defined"));
    map.insert(118, ErrorInfo::new("EXPRESSION_NOT_BOOLEAN", "Expression must be of type Edm.Boolean"));
    map.insert(119, ErrorInfo::new("LITERAL_INVALID", "Invalid literal value"));
    map.insert(120, ErrorInfo::new("UNKNOWN_ALIAS", "Alias not defined"));
    map.insert(121, ErrorInfo::new("QUERY_OPTION_NOT_ALLOWED", "System query option not allowed here"));
    map.insert(122, ErrorInfo::new("EXPAND_LEVELS_EXCEEDED", "Expand levels exceed the configured maximum"));
    map.insert(123, ErrorInfo::new("FUNCTION_NOT_COMPOSABLE", "Function is not composable"));
    map.insert(124, ErrorInfo::new("INVALID_KEY_VALUE", "Invalid key value"));
    map.insert(125, ErrorInfo::new("NOT_SORTABLE", "Expression cannot be used for ordering"));
    map.insert(126, ErrorInfo::new("COLLECTION_NOT_ALLOWED", "Collection-valued expression not allowed here"));
    map.insert(127, ErrorInfo::new("PROPERTY_AFTER_COLLECTION", "Member access requires a single entity or value")
        .with_help("Select a single entry with a key predicate first"));

    // Resolution errors (0200-0299)
    map.insert(200, ErrorInfo::new("PROVIDER_FAILURE", "Metadata provider failure")
        .with_help("The metadata provider raised an error while resolving a schema element"));

    // Model errors (0300-0399)
    map.insert(300, ErrorInfo::new("BASE_TYPE_CYCLE", "Cyclic base type chain"));
    map.insert(301, ErrorInfo::new("BASE_TYPE_NOT_FOUND", "Base type not found"));
    map.insert(302, ErrorInfo::new("KEY_ALIAS_WITHOUT_PATH", "Key alias declared without a multi-segment path"));
    map.insert(303, ErrorInfo::new("KEY_PATH_WITHOUT_ALIAS", "Key path into a complex property requires an alias"));
    map.insert(304, ErrorInfo::new("KEY_PROPERTY_NOT_FOUND", "Key property not found"));
    map.insert(305, ErrorInfo::new("MISSING_KEY", "Entity type has no key"));
    map.insert(306, ErrorInfo::new("INVALID_ENUM_TYPE", "Invalid enum type"));
    map.insert(307, ErrorInfo::new("AMBIGUOUS_OVERLOAD", "Overload set violates uniqueness"));
    map.insert(308, ErrorInfo::new("REFERENCED_TYPE_NOT_FOUND", "Referenced type not found"));
    map.insert(309, ErrorInfo::new("INVALID_BINDING_TARGET", "Invalid navigation property binding target"));
    map.insert(310, ErrorInfo::new("INVALID_OPERATION", "Invalid operation definition"));

    // System errors (0400-0499)
    map.insert(401, ErrorInfo::new("INVALID_ARGUMENT", "Invalid argument"));
    map.insert(402, ErrorInfo::new("MODEL_RELEASED", "EDM model is no longer available"));

    map
});

// Syntax errors
pub const ODATA0001: ErrorCode = ErrorCode::new(1);
pub const ODATA0003: ErrorCode = ErrorCode::new(3);
pub const ODATA0005: ErrorCode = ErrorCode::new(5);
pub const ODATA0006: ErrorCode = ErrorCode::new(6);
pub const ODATA0007: ErrorCode = ErrorCode::new(7);
pub const ODATA0008: ErrorCode = ErrorCode::new(8);
pub const ODATA0009: ErrorCode = ErrorCode::new(9);
pub const ODATA0010: ErrorCode = ErrorCode::new(10);
pub const ODATA0011: ErrorCode = ErrorCode::new(11);
pub const ODATA0012: ErrorCode = ErrorCode::new(12);
pub const ODATA0013: ErrorCode = ErrorCode::new(13);
pub const ODATA0014: ErrorCode = ErrorCode::new(14);
pub const ODATA0015: ErrorCode = ErrorCode::new(15);
pub const ODATA0016: ErrorCode = ErrorCode::new(16);
pub const ODATA0017: ErrorCode = ErrorCode::new(17);
pub const ODATA0018: ErrorCode = ErrorCode::new(18);
pub const ODATA0019: ErrorCode = ErrorCode::new(19);

// Semantic errors
pub const ODATA0100: ErrorCode = ErrorCode::new(100);
pub const ODATA0101: ErrorCode = ErrorCode::new(101);
pub const ODATA0102: ErrorCode = ErrorCode::new(102);
pub const ODATA0103: ErrorCode = ErrorCode::new(103);
pub const ODATA0104: ErrorCode = ErrorCode::new(104);
pub const ODATA0105: ErrorCode = ErrorCode::new(105);
pub const ODATA0106: ErrorCode = ErrorCode::new(106);
pub const ODATA0107: ErrorCode = ErrorCode::new(107);
pub const ODATA0108: ErrorCode = ErrorCode::new(108);
pub const ODATA0109: ErrorCode = ErrorCode::new(109);
pub const ODATA0110: ErrorCode = ErrorCode::new(110);
pub const ODATA0111: ErrorCode = ErrorCode::new(111);
pub const ODATA0112: ErrorCode = ErrorCode::new(112);
pub const ODATA0113: ErrorCode = ErrorCode::new(113);
pub const ODATA0114: ErrorCode = ErrorCode::new(114);
pub const ODATA0115: ErrorCode = ErrorCode::new(115);
pub const ODATA0116: ErrorCode = ErrorCode::new(116);
pub const ODATA0117: ErrorCode = ErrorCode::new(117);
pub const ODATA0118: ErrorCode = ErrorCode::new(118);
pub const ODATA0119: ErrorCode = ErrorCode::new(119);
pub const ODATA0120: ErrorCode = ErrorCode::new(120);
pub const ODATA0121: ErrorCode = ErrorCode::new(121);
pub const ODATA0122: ErrorCode = ErrorCode::new(122);
pub const ODATA0123: ErrorCode = ErrorCode::new(123);
pub const ODATA0124: ErrorCode = ErrorCode::new(124);
pub const ODATA0125: ErrorCode = ErrorCode::new(125);
pub const ODATA0126: ErrorCode = ErrorCode::new(126);
pub const ODATA0127: ErrorCode = ErrorCode::new(127);

// Resolution errors
pub const ODATA0200: ErrorCode = ErrorCode::new(200);

// Model errors
pub const ODATA0300: ErrorCode = ErrorCode::new(300);
pub const ODATA0301: ErrorCode = ErrorCode::new(301);
pub const ODATA0302: ErrorCode = ErrorCode::new(302);
pub const ODATA0303: ErrorCode = ErrorCode::new(303);
pub const ODATA0304: ErrorCode = ErrorCode::new(304);
pub const ODATA0305: ErrorCode = ErrorCode::new(305);
pub const ODATA0306: ErrorCode = ErrorCode::new(306);
pub const ODATA0307: ErrorCode = ErrorCode::new(307);
pub const ODATA0308: ErrorCode = ErrorCode::new(308);
pub const ODATA0309: ErrorCode = ErrorCode::new(309);
pub const ODATA0310: ErrorCode = ErrorCode::new(310);

// System errors
pub const ODATA0401: ErrorCode = ErrorCode::new(401);
pub const ODATA0402: ErrorCode = ErrorCode::new(402);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ODATA0001.to_string(), "ODATA0001");
        assert_eq!(ODATA0107.to_string(), "ODATA0107");
    }

    #[test]
    fn test_error_categories() {
        assert!(ODATA0001.is_syntax_error());
        assert!(!ODATA0001.is_semantic_error());

        assert!(ODATA0100.is_semantic_error());
        assert!(ODATA0200.is_resolution_error());
        assert!(ODATA0300.is_model_error());
        assert!(ODATA0401.is_system_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(ODATA0107.key(), "TYPE_FILTER_NOT_CHAINABLE");
        assert_eq!(ODATA0107.info().description, "Type filter not chainable");
        assert_eq!(ErrorCode::new(999).key(), "UNKNOWN");
    }
}
