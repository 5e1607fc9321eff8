//! Diagnostics and the recoverable/fatal error split.
//!
//! A `Diagnostic` is an analysis error the builder can recover from:
//! it is collected and reported, and the build continues as far as it can.
//! A `GraphError` is what builder internals actually return; its `Shape`
//! variant wraps a diagnostic, while every other variant is an invariant
//! violation that aborts the build.

use crate::loc::Loc;
use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// A user-facing analysis error with a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    pub loc: Loc,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, loc: Loc) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message: message.into(),
            loc,
        }
    }

    pub fn warning(message: impl Into<String>, loc: Loc) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            message: message.into(),
            loc,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.loc)
    }
}

/// Errors raised while building a module type graph.
///
/// `Shape` errors are recognized during traversal, appended to the
/// diagnostics list, and the build continues. All other variants
/// propagate and abort the build.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A recoverable shape error (redeclaration, unresolved reference,
    /// non-callable call target, ...).
    #[error("{0}")]
    Shape(Diagnostic),

    /// An internal invariant was violated; the module graph is in an
    /// unknown state and the build cannot continue.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// The input tree is not a module (`Program`) node or is malformed
    /// in a way the normalization shims cannot repair.
    #[error("malformed AST: {0}")]
    MalformedAst(String),
}

impl GraphError {
    /// Shorthand for a recoverable shape error.
    pub fn shape(message: impl Into<String>, loc: Loc) -> Self {
        GraphError::Shape(Diagnostic::error(message, loc))
    }

    /// Shorthand for a fatal invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        GraphError::Invariant(message.into())
    }
}
