//! Pass 2: call graph construction and late inference.
//!
//! A post-order traversal that reduces every expression and statement to
//! either a resolved type/binding or a recorded call against an operator
//! or built-in variable. Control-flow constructs reduce to pseudo-calls
//! (`"if"`, `"for"`, `"throw"`, ...), so the whole module becomes one
//! uniform call calculus the checker can validate.
//!
//! Reduction is memoized per node: an expression reduces exactly once no
//! matter how many anchor statements reach it.

use crate::check;
use crate::infer;
use crate::scope::{CallArg, CallMeta, ModuleScope, ScopeId, VariableId};
use crate::types::{TypeId, TypeKind};
use crate::walk::Visitor;
use rustc_hash::FxHashMap;
use tern_ast::{Node, NodeData};
use tern_common::{Diagnostic, GraphError, Loc};
use tracing::debug;

/// The result of reducing a node: a type, or the binding it names.
#[derive(Clone, Copy, Debug)]
pub enum Reduced {
    Type(TypeId),
    Variable(VariableId),
}

impl Reduced {
    fn as_call_arg(self) -> CallArg {
        match self {
            Reduced::Type(ty) => CallArg::Type(ty),
            Reduced::Variable(variable) => CallArg::Variable(variable),
        }
    }
}

/// The Pass 2 visitor.
pub struct CallResolver<'a> {
    module: &'a mut ModuleScope,
    errors: &'a mut Vec<Diagnostic>,
    /// Per-node reduction results. `None` marks a node that already
    /// failed, so the diagnostic is not repeated when another anchor
    /// reaches the same node.
    memo: FxHashMap<u32, Option<Reduced>>,
}

impl<'a> CallResolver<'a> {
    pub fn new(module: &'a mut ModuleScope, errors: &'a mut Vec<Diagnostic>) -> Self {
        CallResolver {
            module,
            errors,
            memo: FxHashMap::default(),
        }
    }

    fn type_of(&self, reduced: &Reduced) -> TypeId {
        match reduced {
            Reduced::Type(ty) => *ty,
            Reduced::Variable(variable) => self.module.variable(*variable).ty,
        }
    }

    fn reduce(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        if let Some(memoized) = self.memo.get(&node.uid) {
            let mixed = Reduced::Type(self.module.base.mixed);
            return Ok(memoized.unwrap_or(mixed));
        }
        match self.reduce_uncached(node, scope) {
            Ok(reduced) => {
                self.memo.insert(node.uid, Some(reduced));
                Ok(reduced)
            }
            Err(shape @ GraphError::Shape(_)) => {
                self.memo.insert(node.uid, None);
                Err(shape)
            }
            Err(fatal) => Err(fatal),
        }
    }

    fn reduce_uncached(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        match &node.data {
            NodeData::Identifier { name, .. } => self
                .module
                .find_variable(scope, name)
                .map(Reduced::Variable)
                .ok_or_else(|| {
                    GraphError::shape(format!("Variable \"{name}\" is not defined"), node.loc)
                }),
            NodeData::FunctionDeclaration { .. }
            | NodeData::FunctionExpression { .. }
            | NodeData::ArrowFunctionExpression { .. }
            | NodeData::ClassDeclaration { .. }
            | NodeData::ClassExpression { .. } => {
                // A function whose scope never materialized was already
                // diagnosed in Pass 1.
                match self.module.scope_by_loc(node.loc) {
                    Some(fn_scope) => {
                        Ok(Reduced::Variable(self.module.scope(fn_scope).declaration))
                    }
                    None => Ok(Reduced::Type(self.module.base.mixed)),
                }
            }
            NodeData::BinaryExpression {
                operator,
                left,
                right,
            }
            | NodeData::LogicalExpression {
                operator,
                left,
                right,
            } => {
                let left = self.reduce(left, scope)?;
                let right = self.reduce(right, scope)?;
                self.record_operator(scope, operator, vec![left, right], node.loc)
            }
            NodeData::AssignmentExpression {
                operator,
                left,
                right,
            } => {
                let target = self.reduce(left, scope)?;
                let value = self.reduce(right, scope)?;
                if operator == "=" && let Reduced::Variable(variable) = target {
                    let declared = self.module.variable(variable).ty;
                    let value_ty = self.type_of(&value);
                    if declared != self.module.base.undefined
                        && !infer::is_assignable(self.module, value_ty, declared)
                    {
                        self.errors.push(Diagnostic::error(
                            format!(
                                "Type \"{}\" is incompatible with type \"{}\"",
                                self.module.type_name(value_ty),
                                self.module.type_name(declared)
                            ),
                            node.loc,
                        ));
                    }
                }
                self.record_operator(scope, operator, vec![target, value], node.loc)
            }
            NodeData::UnaryExpression { operator, argument }
            | NodeData::UpdateExpression {
                operator, argument, ..
            } => {
                let argument = self.reduce(argument, scope)?;
                self.record_operator(scope, operator, vec![argument], node.loc)
            }
            NodeData::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                let test = self.reduce(test, scope)?;
                let consequent = self.reduce(consequent, scope)?;
                let alternate = self.reduce(alternate, scope)?;
                self.record_operator(scope, "?:", vec![test, consequent, alternate], node.loc)
            }
            NodeData::MemberExpression { .. } => self.reduce_member(node, scope),
            NodeData::CallExpression { .. } => self.reduce_call(node, scope),
            NodeData::NewExpression { .. } => self.reduce_new(node, scope),
            NodeData::VariableDeclarator { .. } => self.reduce_declarator(node, scope),
            NodeData::ExpressionStatement { expression } => self.reduce(expression, scope),
            NodeData::ThrowStatement { argument } => {
                let argument = self.reduce(argument, scope)?;
                let thrown = self.type_of(&argument);
                let result = self.record_operator(scope, "throw", vec![argument], node.loc)?;
                self.module.push_throwable(scope, thrown);
                Ok(result)
            }
            NodeData::ReturnStatement { argument } => {
                let argument = match argument {
                    Some(argument) => self.reduce(argument, scope)?,
                    None => Reduced::Type(self.module.base.undefined),
                };
                self.record_operator(scope, "return", vec![argument], node.loc)
            }
            NodeData::IfStatement { test, .. } => {
                let test = self.reduce(test, scope)?;
                self.record_operator(scope, "if", vec![test], node.loc)
            }
            NodeData::WhileStatement { test, .. } => {
                let test = self.reduce(test, scope)?;
                self.record_operator(scope, "while", vec![test], node.loc)
            }
            NodeData::DoWhileStatement { test, .. } => {
                let test = self.reduce(test, scope)?;
                self.record_operator(scope, "do-while", vec![test], node.loc)
            }
            NodeData::ForStatement { .. } => self.reduce_for(node, scope),
            NodeData::ForInStatement { .. } | NodeData::ForOfStatement { .. } => {
                let mixed = Reduced::Type(self.module.base.mixed);
                let test = Reduced::Type(self.module.base.undefined);
                self.record_operator(scope, "for", vec![mixed, test, mixed], node.loc)
            }
            NodeData::TypeAlias { .. }
            | NodeData::EmptyStatement {}
            | NodeData::BreakStatement {}
            | NodeData::ContinueStatement {} => Ok(Reduced::Type(self.module.base.undefined)),
            _ => infer::inference_type_for_node(self.module, scope, node).map(Reduced::Type),
        }
    }

    // ── Call recording ──────────────────────────────────────────────────

    /// Record a call against a seeded operator variable.
    ///
    /// A missing pseudo-operator is a seeding-contract violation and
    /// aborts the build; a missing source-level operator token is a
    /// plain diagnostic (the module used syntax outside the seeded
    /// repertoire).
    fn record_operator(
        &mut self,
        scope: ScopeId,
        label: &str,
        args: Vec<Reduced>,
        loc: Loc,
    ) -> Result<Reduced, GraphError> {
        const PSEUDO_OPERATORS: &[&str] = &[
            "if", "while", "do-while", "for", "throw", "return", "=", ".", "?:", "new",
        ];
        let target = self.module.find_variable(scope, label).ok_or_else(|| {
            if PSEUDO_OPERATORS.contains(&label) {
                GraphError::invariant(format!("operator \"{label}\" is not seeded"))
            } else {
                GraphError::shape(format!("Operator \"{label}\" is not supported"), loc)
            }
        })?;
        self.record_call(scope, target, label, args, loc)
    }

    fn record_call(
        &mut self,
        scope: ScopeId,
        target: VariableId,
        label: &str,
        args: Vec<Reduced>,
        loc: Loc,
    ) -> Result<Reduced, GraphError> {
        let target_ty = self.module.variable(target).ty;
        if !self.module.is_callable(target_ty) {
            return Err(GraphError::shape(
                format!(
                    "Type \"{}\" is not callable",
                    self.module.type_name(target_ty)
                ),
                loc,
            ));
        }
        let arg_types: Vec<TypeId> = args.iter().map(|arg| self.type_of(arg)).collect();

        let call = CallMeta {
            target,
            arguments: args.into_iter().map(Reduced::as_call_arg).collect(),
            loc,
            label: label.to_string(),
        };
        let fn_scope = self.module.nearest_function_scope(scope);
        debug!(label, scope = fn_scope.0, "recorded call");
        self.module.scope_mut(fn_scope).calls.push(call);

        // A call inherits the callee's throwable into the caller's
        // nearest throwable scope.
        if let Some(thrown) = self.module.variable(target).throwable {
            self.module.push_throwable(scope, thrown);
        }

        let type_scope = self.module.type_scope_of(scope)?;
        let result = infer::get_invocation_type(self.module, type_scope, target_ty, &arg_types, loc)?;
        Ok(Reduced::Type(result))
    }

    // ── Form-specific reductions ────────────────────────────────────────

    fn reduce_member(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        let NodeData::MemberExpression {
            object,
            property,
            computed,
        } = &node.data
        else {
            return Ok(Reduced::Type(self.module.base.mixed));
        };
        let object_r = self.reduce(object, scope)?;
        let property_name = (!computed)
            .then(|| property.identifier_name())
            .flatten()
            .map(str::to_string);
        let property_r = match &property_name {
            Some(name) => {
                let type_scope = self.module.type_scope_of(scope)?;
                Reduced::Type(self.module.string_literal(type_scope, name))
            }
            None => self.reduce(property, scope)?,
        };
        let result = self.record_operator(scope, ".", vec![object_r, property_r], node.loc)?;

        // When the object shape is known and the property is static, the
        // access resolves to the property's own type.
        if let Some(name) = &property_name {
            let object_ty = self.type_of(&object_r);
            if let TypeKind::Object { properties } = self.module.type_kind(object_ty)
                && let Some((_, found)) = properties.iter().find(|(key, _)| key == name)
            {
                return Ok(Reduced::Type(*found));
            }
        }
        Ok(result)
    }

    fn reduce_call(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        let NodeData::CallExpression { callee, arguments } = &node.data else {
            return Ok(Reduced::Type(self.module.base.mixed));
        };
        let callee_r = self.reduce(callee, scope)?;
        let label = call_label(callee);
        let target = match callee_r {
            Reduced::Variable(variable) => variable,
            Reduced::Type(ty) => {
                // Method and expression calls resolve to a value, not a
                // binding; give the callable value a binding of its own
                // so the call meta has a target.
                if !self.module.is_callable(ty) {
                    return Err(GraphError::shape(
                        format!("Type \"{}\" is not callable", self.module.type_name(ty)),
                        node.loc,
                    ));
                }
                self.module.alloc_variable(ty, scope, callee.loc)
            }
        };
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.reduce(argument, scope)?);
        }
        self.record_call(scope, target, &label, args, node.loc)
    }

    fn reduce_new(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        let NodeData::NewExpression { callee, .. } = &node.data else {
            return Ok(Reduced::Type(self.module.base.mixed));
        };
        let callee_r = self.reduce(callee, scope)?;
        let callee_ty = self.type_of(&callee_r);
        let type_scope = self.module.type_scope_of(scope)?;
        let constructed = if self.module.is_callable(callee_ty) {
            let invoked =
                infer::get_invocation_type(self.module, type_scope, callee_ty, &[], node.loc)?;
            match self.module.type_kind(invoked) {
                TypeKind::Object { .. } => invoked,
                _ => self.module.object_type(type_scope, Vec::new()),
            }
        } else {
            self.module.object_type(type_scope, Vec::new())
        };
        self.record_operator(scope, "new", vec![Reduced::Type(constructed)], node.loc)?;
        Ok(Reduced::Type(constructed))
    }

    fn reduce_declarator(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        let NodeData::VariableDeclarator { id, init, .. } = &node.data else {
            return Ok(Reduced::Type(self.module.base.undefined));
        };
        // Non-identifier bindings were already diagnosed in Pass 1.
        let Some(name) = id.identifier_name() else {
            return Ok(Reduced::Type(self.module.base.undefined));
        };
        let Some(variable) = self.module.find_variable(scope, name) else {
            return Ok(Reduced::Type(self.module.base.undefined));
        };
        if let Some(init) = init {
            let init_r = self.reduce(init, scope)?;
            let init_ty = self.type_of(&init_r);
            let declared = self.module.variable(variable).ty;
            self.record_operator(
                scope,
                "=",
                vec![Reduced::Variable(variable), init_r],
                node.loc,
            )?;
            // Late operations apply only to the declarator that created
            // the binding; a redeclared name already got its diagnostic.
            if self.module.variable(variable).meta == node.loc {
                if declared == self.module.base.undefined {
                    // Late assignment: an unannotated declaration takes
                    // the type of its initializer, exactly once.
                    self.module.variable_mut(variable).ty = init_ty;
                } else if !infer::is_assignable(self.module, init_ty, declared) {
                    self.errors.push(Diagnostic::error(
                        format!(
                            "Type \"{}\" is incompatible with type \"{}\"",
                            self.module.type_name(init_ty),
                            self.module.type_name(declared)
                        ),
                        node.loc,
                    ));
                }
            }
        }
        Ok(Reduced::Variable(variable))
    }

    fn reduce_for(&mut self, node: &Node, scope: ScopeId) -> Result<Reduced, GraphError> {
        let NodeData::ForStatement {
            init,
            test,
            update,
            body,
        } = &node.data
        else {
            return Ok(Reduced::Type(self.module.base.undefined));
        };
        // The hoisted loop binding lives in the body scope, so the test
        // and update evaluate there. Pass 1 has completed, so the scope
        // exists unless the whole subtree was already diagnosed.
        let Some(body_scope) = self.module.scope_by_loc(body.loc) else {
            return Ok(Reduced::Type(self.module.base.undefined));
        };
        if let Some(init) = init {
            self.reduce(init, body_scope)?;
        }
        let test_r = match test {
            Some(test) => self.reduce(test, body_scope)?,
            None => Reduced::Type(self.module.base.undefined),
        };
        if let Some(update) = update {
            self.reduce(update, body_scope)?;
        }
        let mixed = Reduced::Type(self.module.base.mixed);
        self.record_operator(scope, "for", vec![mixed, test_r, mixed], node.loc)
    }

    // ── Late operations ─────────────────────────────────────────────────

    fn finish_function(&mut self, node: &Node) -> Result<(), GraphError> {
        // A function whose registration failed was diagnosed in Pass 1.
        let Some(fn_scope) = self.module.scope_by_loc(node.loc) else {
            return Ok(());
        };
        // Specialize a still-generic signature from body evidence, then
        // let the checker validate every call recorded in this function.
        infer::inference_function_type_by_scope(self.module, fn_scope)?;
        check::check_calls(self.module, fn_scope, self.errors);

        let throwable = self
            .module
            .scope(fn_scope)
            .throwable
            .clone()
            .unwrap_or_default();
        if !throwable.is_empty() {
            let type_scope = self.module.type_scope_of(fn_scope)?;
            let aggregated = self.module.union_type(type_scope, throwable);
            let declaration = self.module.scope(fn_scope).declaration;
            if !declaration.is_none() {
                self.module.variable_mut(declaration).throwable = Some(aggregated);
            }
        }
        Ok(())
    }

    fn finish_try(&mut self, node: &Node) -> Result<(), GraphError> {
        let NodeData::TryStatement { block, handler, .. } = &node.data else {
            return Ok(());
        };
        let Some(handler) = handler else {
            return Ok(());
        };
        let NodeData::CatchClause {
            param: Some(param),
            body,
        } = &handler.data
        else {
            return Ok(());
        };
        let Some(param_name) = param.identifier_name() else {
            return Ok(());
        };
        let Some(try_scope) = self.module.scope_by_loc(block.loc) else {
            return Ok(());
        };
        let error_ty = infer::inference_error_type(self.module, try_scope)?;
        if let Some(handler_scope) = self.module.scope_by_loc(body.loc)
            && let Some(variable) = self.module.find_variable_local(handler_scope, param_name)
        {
            self.module.variable_mut(variable).ty = error_ty;
        }
        Ok(())
    }
}

/// The label recorded for a non-operator call: the callee name, the
/// method name of a member call, or an anonymous marker.
fn call_label(callee: &Node) -> String {
    match &callee.data {
        NodeData::Identifier { name, .. } => name.clone(),
        NodeData::MemberExpression { property, .. } => property
            .identifier_name()
            .map(str::to_string)
            .unwrap_or_else(|| "[[computed]]".to_string()),
        _ => "[[anonymous]]".to_string(),
    }
}

impl Visitor for CallResolver<'_> {
    fn errors(&mut self) -> &mut Vec<Diagnostic> {
        self.errors
    }

    /// Tests of forward control-flow forms are reduced before the body
    /// is walked, so call recording follows source order.
    fn middle(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        match &node.data {
            NodeData::IfStatement { .. }
            | NodeData::WhileStatement { .. }
            | NodeData::ForStatement { .. }
            | NodeData::ForInStatement { .. }
            | NodeData::ForOfStatement { .. } => {
                let Ok(scope) = self.module.scope_of_parent(parent) else {
                    return Ok(());
                };
                self.reduce(node, scope)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn post(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        // A parent whose scope never materialized sits in a subtree that
        // was already diagnosed in Pass 1; there is nothing to resolve.
        let Ok(scope) = self.module.scope_of_parent(parent) else {
            return Ok(());
        };
        match &node.data {
            NodeData::VariableDeclarator { .. }
            | NodeData::ExpressionStatement { .. }
            | NodeData::ThrowStatement { .. }
            | NodeData::ReturnStatement { .. }
            | NodeData::IfStatement { .. }
            | NodeData::WhileStatement { .. }
            | NodeData::DoWhileStatement { .. }
            | NodeData::ForStatement { .. }
            | NodeData::ForInStatement { .. }
            | NodeData::ForOfStatement { .. }
            | NodeData::CallExpression { .. }
            | NodeData::NewExpression { .. } => {
                self.reduce(node, scope)?;
            }
            NodeData::FunctionDeclaration { .. }
            | NodeData::FunctionExpression { .. }
            | NodeData::ArrowFunctionExpression { .. }
            | NodeData::ClassMethod { .. }
            | NodeData::ObjectMethod { .. }
            | NodeData::ClassDeclaration { .. }
            | NodeData::ClassExpression { .. } => self.finish_function(node)?,
            NodeData::TryStatement { .. } => self.finish_try(node)?,
            _ => {}
        }
        Ok(())
    }
}
