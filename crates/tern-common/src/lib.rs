//! Shared foundation types for the Tern type inference engine.
//!
//! This crate provides:
//! - `Position` / `Loc` - Source location tracking for AST nodes
//! - `Diagnostic` - Recoverable analysis errors reported to the user
//! - `GraphError` - The recoverable/fatal error split used by the builder

pub mod diagnostics;
pub mod loc;

pub use diagnostics::{Diagnostic, DiagnosticCategory, GraphError};
pub use loc::{Loc, Located, Position};
