//! OData error types

use crate::{ErrorCode, ODATA0200, SourceLocation, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The request cannot be resolved
    Error,
    /// Potential issue, resolution continued
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with location and context, suitable for reporting
/// to a client in an error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    /// Stable message key of `code`
    pub key: String,
    pub message: String,
    pub location: Option<SourceLocation>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            key: code.key().to_string(),
            message: message.into(),
            location: None,
            help: code.info().help.map(str::to_string),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}] - {}", self.severity, self.code, self.key, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Shared, type-erased cause of a resolution error
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync>;

/// Main OData error type
///
/// Every failure in the EDM model and the URI parser is raised to the
/// immediate caller; no variant represents a partial result.
#[derive(Debug, Clone, Error)]
pub enum ODataError {
    /// Malformed token stream (unterminated literal, unknown system query
    /// option, malformed key-value list)
    #[error("{code}: {message}")]
    Syntax {
        code: ErrorCode,
        message: String,
        /// The full text that was being parsed
        expression: String,
        location: Option<SourceLocation>,
    },

    /// Well-formed input that does not fit the EDM (unknown names, wrong key
    /// count, incompatible types)
    #[error("{code}: {message}")]
    Semantic {
        code: ErrorCode,
        message: String,
        expression: String,
        location: Option<SourceLocation>,
        context: Option<String>,
    },

    /// The metadata provider failed while a schema element was resolved
    #[error("{code}: {message}")]
    Resolution {
        code: ErrorCode,
        message: String,
        /// Qualified name that was being resolved
        name: String,
        #[source]
        cause: ErrorCause,
    },

    /// Metadata is internally inconsistent (base type cycles, bad keys)
    #[error("{code}: {message}")]
    Model {
        code: ErrorCode,
        message: String,
        name: Option<String>,
    },

    /// Usage or configuration error
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },
}

impl ODataError {
    /// Create a syntax error without position
    pub fn syntax(code: ErrorCode, message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Syntax {
            code,
            message: message.into(),
            expression: expression.into(),
            location: None,
        }
    }

    /// Create a syntax error pointing at `span` within `expression`
    pub fn syntax_at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        span: Span,
    ) -> Self {
        let expression = expression.into();
        Self::Syntax {
            code,
            message: message.into(),
            location: Some(SourceLocation::from_span(span, &expression)),
            expression,
        }
    }

    /// Create a semantic error without position
    pub fn semantic(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Semantic {
            code,
            message: message.into(),
            expression: String::new(),
            location: None,
            context: None,
        }
    }

    /// Create a semantic error pointing at `span` within `expression`
    pub fn semantic_at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        span: Span,
    ) -> Self {
        let expression = expression.into();
        Self::Semantic {
            code,
            message: message.into(),
            location: Some(SourceLocation::from_span(span, &expression)),
            expression,
            context: None,
        }
    }

    /// Wrap a provider failure raised while resolving `name`
    pub fn resolution<E>(name: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let name = name.into();
        Self::Resolution {
            code: ODATA0200,
            message: format!("Cannot resolve '{}': {}", name, cause),
            name,
            cause: Arc::new(cause),
        }
    }

    /// Create a model error for the element `name`
    pub fn model(code: ErrorCode, message: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Model {
            code,
            message: message.into(),
            name: Some(name.into()),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { code, .. }
            | Self::Semantic { code, .. }
            | Self::Resolution { code, .. }
            | Self::Model { code, .. }
            | Self::System { code, .. } => *code,
        }
    }

    /// Stable message key of the error code
    pub fn key(&self) -> &'static str {
        self.code().key()
    }

    /// Human-readable message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. }
            | Self::Semantic { message, .. }
            | Self::Resolution { message, .. }
            | Self::Model { message, .. }
            | Self::System { message, .. } => message,
        }
    }

    /// Get the location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Syntax { location, .. } | Self::Semantic { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic { .. })
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    /// Attach the text being parsed and the offending span, unless the error
    /// already carries a location.
    ///
    /// Errors raised deep inside the EDM have no notion of the request text;
    /// the parser uses this to attribute them to the slice that triggered them.
    pub fn locate(self, source: &str, span: Span) -> Self {
        match self {
            Self::Syntax {
                code,
                message,
                location: None,
                ..
            } => Self::Syntax {
                code,
                message,
                expression: source.to_string(),
                location: Some(SourceLocation::from_span(span, source)),
            },
            Self::Semantic {
                code,
                message,
                location: None,
                context,
                ..
            } => Self::Semantic {
                code,
                message,
                expression: source.to_string(),
                location: Some(SourceLocation::from_span(span, source)),
                context,
            },
            other => other,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Syntax { code, message, location, .. } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::Semantic {
                code,
                message,
                location,
                context,
                ..
            } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Resolution { code, message, .. } | Self::Model { code, message, .. } => {
                Diagnostic::error(*code, message.clone())
            }
            Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
        }
    }
}
