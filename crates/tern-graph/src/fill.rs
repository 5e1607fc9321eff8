//! Pass 1: declaration filling.
//!
//! The first traversal materializes the scope hierarchy and registers
//! every declaration before any call site is looked at: type aliases into
//! the type scope chain, variable declarators and function-like
//! declarations into their parent scopes, and fresh scopes for blocks,
//! functions, classes, object literals and try/catch.
//!
//! Scopes are keyed in the module body by the source range of the node
//! that created them, so later passes can retrieve a scope from its node.

use crate::infer;
use crate::scope::{ModuleScope, ScopeEntry, ScopeKey, ScopeKind};
use crate::types::{Type, TypeKind};
use tern_ast::{Node, NodeData};
use tern_common::{Diagnostic, GraphError};
use tracing::debug;

use crate::walk::Visitor;

/// The Pass 1 visitor.
pub struct DeclarationFiller<'a> {
    module: &'a mut ModuleScope,
    errors: &'a mut Vec<Diagnostic>,
}

impl<'a> DeclarationFiller<'a> {
    pub fn new(module: &'a mut ModuleScope, errors: &'a mut Vec<Diagnostic>) -> Self {
        DeclarationFiller { module, errors }
    }

    fn fill_type_alias(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        let NodeData::TypeAlias {
            id,
            type_parameters,
            right,
            ..
        } = &node.data
        else {
            return Ok(());
        };
        let scope = self.module.scope_of_parent(parent)?;
        let type_scope = self.module.type_scope_of(scope)?;
        let name = id
            .identifier_name()
            .ok_or_else(|| GraphError::shape("Type alias name must be an identifier", id.loc))?;
        if self.module.find_type_local(type_scope, name).is_some() {
            return Err(GraphError::shape(
                format!("Type \"{name}\" is already declared"),
                node.loc,
            ));
        }

        match type_parameters.as_deref() {
            Some(declaration) => {
                let NodeData::TypeParameterDeclaration { params } = &declaration.data else {
                    return Err(GraphError::shape(
                        "Malformed type parameter list",
                        declaration.loc,
                    ));
                };
                let local = self.module.alloc_scope(ScopeKind::Block, type_scope);
                let mut vars = Vec::with_capacity(params.len());
                for param in params {
                    if let NodeData::TypeParameter {
                        name: param_name,
                        bound,
                    } = &param.data
                    {
                        let constraint = match bound {
                            Some(bound) => {
                                Some(infer::type_from_annotation(self.module, local, bound)?)
                            }
                            None => None,
                        };
                        vars.push(
                            self.module
                                .intern_type(local, Type::var(param_name.clone(), constraint)),
                        );
                    }
                }
                let body = infer::type_from_annotation(self.module, local, right)?;
                self.module.intern_type(
                    type_scope,
                    Type {
                        name: name.to_string(),
                        kind: TypeKind::Generic {
                            params: vars,
                            local_scope: local,
                            subordinate: body,
                        },
                    },
                );
            }
            None => {
                let body = infer::type_from_annotation(self.module, type_scope, right)?;
                self.module.bind_type_name(type_scope, name, body);
            }
        }
        debug!(name, "registered type alias");
        Ok(())
    }

    fn fill_declarator(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        let NodeData::VariableDeclarator { id, export_as, .. } = &node.data else {
            return Ok(());
        };
        let scope = self.module.scope_of_parent(parent)?;
        let Some(name) = id.identifier_name() else {
            return Err(GraphError::shape(
                "Destructuring declarations are not supported",
                id.loc,
            ));
        };
        let annotation = match &id.data {
            NodeData::Identifier {
                type_annotation, ..
            } => type_annotation.as_deref(),
            _ => None,
        };
        let ty = match annotation {
            Some(annotation) => {
                let type_scope = self.module.type_scope_of(scope)?;
                infer::type_from_annotation(self.module, type_scope, annotation)?
            }
            None => self.module.base.undefined,
        };
        let variable = self.module.alloc_variable(ty, scope, node.loc);
        if !self.module.declare(scope, name, variable) {
            return Err(GraphError::shape(
                format!("Variable \"{name}\" is already declared"),
                node.loc,
            ));
        }
        if let Some(export_name) = export_as {
            self.module.exports.insert(export_name.clone(), variable);
        }
        Ok(())
    }

    fn fill_function(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        if self.module.scope_by_loc(node.loc).is_some() {
            return Ok(());
        }
        let scope = self.module.scope_of_parent(parent)?;
        let type_scope = self.module.type_scope_of(scope)?;
        let signature = infer::function_signature(self.module, type_scope, node)?;

        let (name, export_as) = function_binding_name(node);
        let key = name
            .map(str::to_string)
            .unwrap_or_else(|| anonymous_key(node));

        let variable = self.module.alloc_variable(signature.ty, scope, node.loc);
        if !self.module.declare(scope, &key, variable) {
            return Err(GraphError::shape(
                format!("Variable \"{key}\" is already declared"),
                node.loc,
            ));
        }
        if let Some(export_name) = export_as {
            self.module.exports.insert(export_name, variable);
        }

        let fn_scope = self.module.alloc_scope(ScopeKind::Function, scope);
        {
            let scope_data = self.module.scope_mut(fn_scope);
            scope_data.declaration = variable;
            scope_data.throwable = Some(Vec::new());
        }
        if let Some(local) = signature.local_type_scope {
            self.module
                .scope_mut(fn_scope)
                .body
                .insert(ScopeKey::TypeScope, ScopeEntry::Scope(local));
        }
        self.module.register_scope(node.loc, fn_scope);
        debug!(name = %key, scope = fn_scope.0, "registered function");

        // Bind each parameter to its argument type in the function scope.
        let params = function_params(node);
        for (param, ty) in params.iter().zip(&signature.params) {
            if let Some(param_name) = param.identifier_name() {
                let bound = self.module.alloc_variable(*ty, fn_scope, param.loc);
                if !self.module.declare(fn_scope, param_name, bound) {
                    self.errors.push(Diagnostic::error(
                        format!("Variable \"{param_name}\" is already declared"),
                        param.loc,
                    ));
                }
            }
        }
        Ok(())
    }

    fn fill_class(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        if self.module.scope_by_loc(node.loc).is_some() {
            return Ok(());
        }
        let (id, export_as) = match &node.data {
            NodeData::ClassDeclaration { id, export_as, .. } => (id.as_deref(), export_as.clone()),
            NodeData::ClassExpression { id, .. } => (id.as_deref(), None),
            _ => return Ok(()),
        };
        let scope = self.module.scope_of_parent(parent)?;
        let type_scope = self.module.type_scope_of(scope)?;
        let name = id.and_then(Node::identifier_name);
        let ty = infer::class_signature(self.module, type_scope, name)?;

        let key = name
            .map(str::to_string)
            .unwrap_or_else(|| anonymous_key(node));
        let variable = self.module.alloc_variable(ty, scope, node.loc);
        if !self.module.declare(scope, &key, variable) {
            return Err(GraphError::shape(
                format!("Variable \"{key}\" is already declared"),
                node.loc,
            ));
        }
        if let Some(export_name) = export_as {
            self.module.exports.insert(export_name, variable);
        }

        let class_scope = self.module.alloc_scope(ScopeKind::Function, scope);
        {
            let scope_data = self.module.scope_mut(class_scope);
            scope_data.declaration = variable;
            scope_data.throwable = Some(Vec::new());
        }
        self.module.register_scope(node.loc, class_scope);
        Ok(())
    }

    fn fill_block(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        // Function bodies are claimed by the function scope; try blocks
        // and handler bodies were created when the try statement was
        // visited.
        if parent.is_function_body(node) || self.module.scope_by_loc(node.loc).is_some() {
            return Ok(());
        }
        let scope = self.module.scope_of_parent(parent)?;
        let block = self.module.alloc_scope(ScopeKind::Block, scope);
        self.module.register_scope(node.loc, block);
        Ok(())
    }

    fn fill_container(
        &mut self,
        node: &Node,
        parent: &Node,
        kind: ScopeKind,
    ) -> Result<(), GraphError> {
        if self.module.scope_by_loc(node.loc).is_some() {
            return Ok(());
        }
        let scope = self.module.scope_of_parent(parent)?;
        let container = self.module.alloc_scope(kind, scope);
        self.module.register_scope(node.loc, container);
        Ok(())
    }

    fn fill_try(&mut self, node: &Node, parent: &Node) -> Result<(), GraphError> {
        let NodeData::TryStatement { block, handler, .. } = &node.data else {
            return Ok(());
        };
        let scope = self.module.scope_of_parent(parent)?;

        let try_block = self.module.alloc_scope(ScopeKind::Block, scope);
        self.module.scope_mut(try_block).throwable = Some(Vec::new());
        self.module.register_scope(block.loc, try_block);

        if let Some(handler) = handler
            && let NodeData::CatchClause { param, body } = &handler.data
        {
            let handler_scope = self.module.alloc_scope(ScopeKind::Block, scope);
            self.module.register_scope(body.loc, handler_scope);
            if let Some(param) = param {
                match param.identifier_name() {
                    Some(param_name) => {
                        // The parameter's type is resolved in Pass 2 from
                        // the try block's throwable set.
                        let undefined = self.module.base.undefined;
                        let bound = self.module.alloc_variable(undefined, handler_scope, param.loc);
                        self.module.declare(handler_scope, param_name, bound);
                    }
                    None => self.errors.push(Diagnostic::error(
                        "Catch parameter must be an identifier",
                        param.loc,
                    )),
                }
            }
        }
        Ok(())
    }
}

/// The declared name and export name of a function-like node.
fn function_binding_name(node: &Node) -> (Option<&str>, Option<String>) {
    match &node.data {
        NodeData::FunctionDeclaration { id, export_as, .. } => (
            id.as_deref().and_then(Node::identifier_name),
            export_as.clone(),
        ),
        NodeData::FunctionExpression { id, .. } => {
            (id.as_deref().and_then(Node::identifier_name), None)
        }
        NodeData::ClassMethod { key, .. } | NodeData::ObjectMethod { key, .. } => {
            (key.identifier_name(), None)
        }
        _ => (None, None),
    }
}

fn function_params(node: &Node) -> &[Node] {
    match &node.data {
        NodeData::FunctionDeclaration { params, .. }
        | NodeData::FunctionExpression { params, .. }
        | NodeData::ArrowFunctionExpression { params, .. }
        | NodeData::ClassMethod { params, .. }
        | NodeData::ObjectMethod { params, .. } => params,
        _ => &[],
    }
}

fn anonymous_key(node: &Node) -> String {
    format!("[[Anonymous:{}]]", node.loc)
}

impl Visitor for DeclarationFiller<'_> {
    fn errors(&mut self) -> &mut Vec<Diagnostic> {
        self.errors
    }

    // Unreachable siblings are reported by Pass 2.
    fn reports_unreachable(&self) -> bool {
        false
    }

    fn pre(&mut self, node: &Node, parent: &Node) -> Result<bool, GraphError> {
        match &node.data {
            NodeData::TypeAlias { .. } => self.fill_type_alias(node, parent)?,
            NodeData::VariableDeclarator { .. } => self.fill_declarator(node, parent)?,
            NodeData::FunctionDeclaration { .. }
            | NodeData::FunctionExpression { .. }
            | NodeData::ArrowFunctionExpression { .. }
            | NodeData::ClassMethod { .. }
            | NodeData::ObjectMethod { .. } => self.fill_function(node, parent)?,
            NodeData::ClassDeclaration { .. } | NodeData::ClassExpression { .. } => {
                self.fill_class(node, parent)?
            }
            NodeData::BlockStatement { .. } => self.fill_block(node, parent)?,
            NodeData::ClassBody { .. } => self.fill_container(node, parent, ScopeKind::Class)?,
            NodeData::ObjectExpression { .. } => {
                self.fill_container(node, parent, ScopeKind::Object)?
            }
            NodeData::TryStatement { .. } => self.fill_try(node, parent)?,
            _ => {}
        }
        Ok(true)
    }
}
