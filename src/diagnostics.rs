//!
//! ****************************************************************************************
//! ** ERROR CONSTRUCTION RULES FOR Caseform Error Macros (`err_msg!`, `err_ctx!`)        **
//! ****************************************************************************************
//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for the caseform engine.
//! Every failure produced while discovering cases, combining parametrization declarations,
//! rewriting signatures or loading manifests is represented by [`CaseError`].
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for simple, message-only errors.**
//!   - `err_msg!(Configuration, "empty parameter name list")`
//!
//! - **Use `err_ctx!` for errors with a source, span and optional help.**
//!   - `err_ctx!(Manifest, "Invalid manifest", src, span, help)`
//!
//! # Rules
//!
//! - Configuration errors are raised eagerly, at discovery or wrap time.
//! - Internal errors mean an engine bug. They are never produced by valid inputs.
//! - Errors raised by user case functions travel inside `Invocation` unmodified.
//!
//! ****************************************************************************************

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

/// Error raised by user code (case functions, providers). Never inspected by the engine.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Byte range inside a manifest or configuration source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }
}

/// Type-safe error classification enum that corresponds to CaseError variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Malformed declarations, name or arity mismatches, duplicate generated names
    Configuration,
    /// Engine bugs, such as a combined values/ids length mismatch
    Internal,
    /// Errors raised by user case functions or wrapped callables
    Invocation,
    /// Unreadable or malformed manifests and configuration files
    Manifest,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Configuration => "Configuration",
            ErrorType::Internal => "Internal",
            ErrorType::Invocation => "Invocation",
            ErrorType::Manifest => "Manifest",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with only a help message.
    pub fn with_help(help: impl Into<String>) -> Self {
        Self {
            source: None,
            span: None,
            help: Some(help.into()),
        }
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for all caseform failure modes.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Invocation of '{message}' failed")]
    Invocation {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Manifest error: {message}")]
    Manifest {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxError>,
    },
}

impl CaseError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            CaseError::Configuration { ctx, .. } => ctx,
            CaseError::Internal { ctx, .. } => ctx,
            CaseError::Invocation { ctx, .. } => ctx,
            CaseError::Manifest { ctx, .. } => ctx,
        }
    }

    fn message(&self) -> &str {
        match self {
            CaseError::Configuration { message, .. } => message,
            CaseError::Internal { message, .. } => message,
            CaseError::Invocation { message, .. } => message,
            CaseError::Manifest { message, .. } => message,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            CaseError::Configuration { .. } => ErrorType::Configuration,
            CaseError::Internal { .. } => ErrorType::Internal,
            CaseError::Invocation { .. } => ErrorType::Invocation,
            CaseError::Manifest { .. } => ErrorType::Manifest,
        }
    }

    /// Wraps an error raised by user code. `callable` names what was being invoked.
    pub fn invocation(callable: &str, error: BoxError) -> Self {
        CaseError::Invocation {
            message: callable.to_string(),
            ctx: ErrorContext::none(),
            source: Some(error),
        }
    }

    /// Returns the user error carried by an `Invocation` error.
    pub fn into_user_error(self) -> Option<BoxError> {
        match self {
            CaseError::Invocation { source, .. } => source,
            _ => None,
        }
    }

    /// Attaches a help message, replacing any previous one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let ctx = match &mut self {
            CaseError::Configuration { ctx, .. } => ctx,
            CaseError::Internal { ctx, .. } => ctx,
            CaseError::Invocation { ctx, .. } => ctx,
            CaseError::Manifest { ctx, .. } => ctx,
        };
        ctx.help = Some(help.into());
        self
    }
}

impl Diagnostic for CaseError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self {
            CaseError::Configuration { .. } => "caseform::configuration",
            CaseError::Internal { .. } => "caseform::internal",
            CaseError::Invocation { .. } => "caseform::invocation",
            CaseError::Manifest { .. } => "caseform::manifest",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        if let CaseError::Internal { .. } = self {
            if self.get_ctx().help.is_none() {
                return Some(Box::new(
                    "This is an internal engine error. Please report this as a bug.",
                ));
            }
        }
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a named source string into a `SourceArc` for use in error contexts.
pub fn to_error_source(name: &str, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Converts a YAML parse failure into a `Manifest` error pointing at the failing location.
pub fn yaml_error(name: &str, source: &str, error: serde_yaml::Error) -> CaseError {
    let message = error.to_string();
    let ctx = match error.location() {
        Some(location) => {
            let offset = location.index().min(source.len().saturating_sub(1));
            ErrorContext::with_source_and_span(to_error_source(name, source), Span::at(offset))
        }
        None => ErrorContext::none(),
    };
    CaseError::Manifest {
        message,
        ctx,
        source: Some(Box::new(error)),
    }
}

/// Prints a CaseError with full miette diagnostics.
pub fn print_error(error: CaseError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

/// Constructs a CaseError variant with a formatted message and no context.
///
/// Supports formatting with any number of arguments.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:literal $(, $arg:expr)* $(,)?) => {
        $crate::CaseError::$variant {
            message: format!($msg $(, $arg)*),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::CaseError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a CaseError variant with a message, a pre-built source, a span and optional help.
#[macro_export]
macro_rules! err_ctx {
    // Message, src, span, help
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::CaseError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    // Message, src, span
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::CaseError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: None,
            },
            source: None,
        }
    };
}
