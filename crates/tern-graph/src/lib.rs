//! Module type-graph builder for the Tern type inference engine.
//!
//! Given the parsed AST of a source module, `build_module_scope`
//! constructs a hierarchical scope graph decorated with variable and type
//! information, records every call site (operator applications and
//! control-flow constructs included, as pseudo-calls), infers the types
//! of function bodies and variable initializers, and returns the module
//! scope together with the diagnostics collected along the way.
//!
//! The build is two traversals over one walker seam:
//! - Pass 1 (`fill`) materializes scopes, declarations and type aliases;
//! - Pass 2 (`reduce`) turns every expression form into a call against
//!   the seeded operator repertoire and performs late inference.

pub mod check;
pub mod fill;
pub mod infer;
pub mod reduce;
pub mod scope;
pub mod seed;
pub mod types;
pub mod walk;

pub use scope::{
    BaseTypes, CallArg, CallMeta, ModuleScope, Scope, ScopeEntry, ScopeId, ScopeKey, ScopeKind,
    VariableId, VariableInfo,
};
pub use types::{Type, TypeId, TypeKind};

use fill::DeclarationFiller;
use reduce::CallResolver;
use tern_ast::{Node, NodeData, index_nodes, normalize};
use tern_common::{Diagnostic, GraphError};
use walk::walk;

/// Build the type graph of one module.
///
/// The returned diagnostics are the authoritative error report; the
/// module scope is always returned, possibly incomplete. Only invariant
/// violations (a malformed tree that escapes the normalization shims, a
/// broken type scope chain) abort the build with an error.
pub fn build_module_scope(ast: Node) -> Result<(ModuleScope, Vec<Diagnostic>), GraphError> {
    if !matches!(ast.data, NodeData::Program { .. }) {
        return Err(GraphError::MalformedAst(format!(
            "expected a Program node, got {}",
            ast.kind_name()
        )));
    }

    let mut module = ModuleScope::new();
    seed::mix_base_globals(&mut module)?;
    seed::mix_base_operators(&mut module)?;

    let mut program = normalize(ast);
    let node_count = index_nodes(&mut program);
    tracing::debug!(node_count, "normalized module tree");

    let mut errors = Vec::new();

    {
        let mut filler = DeclarationFiller::new(&mut module, &mut errors);
        walk(&program, &program, &mut filler)?;
    }
    {
        let mut resolver = CallResolver::new(&mut module, &mut errors);
        walk(&program, &program, &mut resolver)?;
    }

    // Functions were checked as Pass 2 finished each of them; calls that
    // landed in the module scope itself are checked last.
    let root = module.root;
    check::check_calls(&module, root, &mut errors);

    tracing::debug!(
        scopes = module.scope_count(),
        diagnostics = errors.len(),
        "module build finished"
    );
    Ok((module, errors))
}
