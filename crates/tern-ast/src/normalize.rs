//! Normalization shims.
//!
//! The parser's tree has a handful of irregularities that would force
//! every later phase to special-case them. `normalize` applies a pipeline
//! of pure node rewrites, in a fixed order, so the builder only ever sees
//! the regular forms:
//!
//! 1. arrow functions with expression bodies are lifted into block form;
//! 2. single-statement branch/loop bodies are wrapped into blocks;
//! 3. a try block gets a back-reference to its catch clause;
//! 4. export declarations are unwrapped and annotated with their export
//!    name;
//! 5. `for`-family loop bindings are hoisted into the loop body (with
//!    pure-key / pure-value markers for `for-in` / `for-of`).
//!
//! The pipeline is idempotent: running it on its own output is a no-op.

use crate::node::{Node, NodeData};
use tern_common::Loc;

/// Normalize a whole tree: apply the shim pipeline to the node, then
/// recurse into its children.
pub fn normalize(node: Node) -> Node {
    let node = lift_arrow_body(node);
    let node = wrap_branch_bodies(node);
    let node = link_catch_block(node);
    let node = annotate_exports(node);
    let node = hoist_loop_bindings(node);
    normalize_children(node)
}

/// Assign sequential uids to every node of a (normalized) tree, in
/// pre-order. Returns the number of nodes visited.
pub fn index_nodes(root: &mut Node) -> u32 {
    let mut next = 0;
    assign_uid(root, &mut next);
    next
}

fn assign_uid(node: &mut Node, next: &mut u32) {
    node.uid = *next;
    *next += 1;
    for child in children_mut(node) {
        assign_uid(child, next);
    }
}

// ── Shim 1: arrow body lift ─────────────────────────────────────────────

fn lift_arrow_body(mut node: Node) -> Node {
    if let NodeData::ArrowFunctionExpression { body, .. } = &mut node.data
        && !matches!(body.data, NodeData::BlockStatement { .. })
    {
        let expr = std::mem::replace(
            body.as_mut(),
            Node::synthetic(Loc::dummy(), NodeData::EmptyStatement {}),
        );
        let loc = expr.loc;
        let ret = Node::synthetic(
            loc,
            NodeData::ReturnStatement {
                argument: Some(Box::new(expr)),
            },
        );
        **body = Node::synthetic(
            loc,
            NodeData::BlockStatement {
                body: vec![ret],
                catch_block: None,
            },
        );
    }
    node
}

// ── Shim 2: branch body wrap ────────────────────────────────────────────

fn wrap_in_block(stmt: &mut Box<Node>) {
    if !matches!(stmt.data, NodeData::BlockStatement { .. }) {
        let inner = std::mem::replace(
            stmt.as_mut(),
            Node::synthetic(Loc::dummy(), NodeData::EmptyStatement {}),
        );
        let loc = inner.loc;
        **stmt = Node::synthetic(
            loc,
            NodeData::BlockStatement {
                body: vec![inner],
                catch_block: None,
            },
        );
    }
}

fn wrap_branch_bodies(mut node: Node) -> Node {
    match &mut node.data {
        NodeData::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            wrap_in_block(consequent);
            if let Some(alt) = alternate {
                wrap_in_block(alt);
            }
        }
        NodeData::WhileStatement { body, .. }
        | NodeData::DoWhileStatement { body, .. }
        | NodeData::ForStatement { body, .. }
        | NodeData::ForInStatement { body, .. }
        | NodeData::ForOfStatement { body, .. } => wrap_in_block(body),
        _ => {}
    }
    node
}

// ── Shim 3: try/catch link ──────────────────────────────────────────────

fn link_catch_block(mut node: Node) -> Node {
    if let NodeData::TryStatement {
        block,
        handler: Some(handler),
        ..
    } = &mut node.data
        && let NodeData::BlockStatement {
            catch_block: catch_block @ None,
            ..
        } = &mut block.data
    {
        *catch_block = Some(handler.clone());
    }
    node
}

// ── Shim 4: export annotation ───────────────────────────────────────────

fn annotate_exports(node: Node) -> Node {
    match node.data {
        NodeData::ExportNamedDeclaration {
            declaration: Some(decl),
        } => annotate_declaration(*decl, None),
        NodeData::ExportNamedDeclaration { declaration: None } => {
            Node::synthetic(node.loc, NodeData::EmptyStatement {})
        }
        NodeData::ExportDefaultDeclaration { declaration } => {
            let decl = *declaration;
            match decl.data {
                NodeData::FunctionDeclaration { .. }
                | NodeData::ClassDeclaration { .. }
                | NodeData::TypeAlias { .. }
                | NodeData::VariableDeclaration { .. } => {
                    annotate_declaration(decl, Some("default".to_string()))
                }
                // A default-exported expression becomes a plain
                // expression statement for analysis purposes.
                _ => Node::synthetic(
                    decl.loc,
                    NodeData::ExpressionStatement {
                        expression: Box::new(decl),
                    },
                ),
            }
        }
        _ => node,
    }
}

fn annotate_declaration(mut decl: Node, forced: Option<String>) -> Node {
    match &mut decl.data {
        NodeData::FunctionDeclaration { id, export_as, .. } => {
            *export_as = forced.or_else(|| declared_name(id.as_deref()));
        }
        NodeData::ClassDeclaration { id, export_as, .. } => {
            *export_as = forced.or_else(|| declared_name(id.as_deref()));
        }
        NodeData::TypeAlias { id, export_as, .. } => {
            *export_as = forced.or_else(|| id.identifier_name().map(str::to_string));
        }
        NodeData::VariableDeclaration { declarations, .. } => {
            for declarator in declarations {
                if let NodeData::VariableDeclarator { id, export_as, .. } = &mut declarator.data {
                    *export_as = id.identifier_name().map(str::to_string);
                }
            }
        }
        _ => {}
    }
    decl
}

fn declared_name(id: Option<&Node>) -> Option<String> {
    id.and_then(Node::identifier_name).map(str::to_string)
}

// ── Shim 5: for-init hoist ──────────────────────────────────────────────

fn hoist_loop_bindings(mut node: Node) -> Node {
    match &mut node.data {
        NodeData::ForStatement { init, body, .. } => {
            if matches!(
                init.as_deref(),
                Some(Node {
                    data: NodeData::VariableDeclaration { .. },
                    ..
                })
            ) && let Some(decl) = init.take()
                && let NodeData::BlockStatement { body: stmts, .. } = &mut body.data
            {
                stmts.insert(0, *decl);
            }
        }
        NodeData::ForInStatement { left, right, body } => {
            hoist_iteration_binding(left, right.clone(), body, true);
        }
        NodeData::ForOfStatement { left, right, body } => {
            hoist_iteration_binding(left, right.clone(), body, false);
        }
        _ => {}
    }
    node
}

/// Move a `for-in`/`for-of` binding declaration into the loop body,
/// synthesizing a pure-key (`in`) or pure-value (`of`) marker as its
/// initializer so inference knows what the binding iterates.
fn hoist_iteration_binding(
    left: &mut Option<Box<Node>>,
    right: Box<Node>,
    body: &mut Box<Node>,
    keys: bool,
) {
    if !matches!(
        left.as_deref(),
        Some(Node {
            data: NodeData::VariableDeclaration { .. },
            ..
        })
    ) {
        return;
    }
    let Some(mut decl) = left.take() else { return };
    if let NodeData::VariableDeclaration { declarations, .. } = &mut decl.data {
        for declarator in declarations {
            if let NodeData::VariableDeclarator { init, .. } = &mut declarator.data {
                let marker = if keys {
                    NodeData::PureKey {
                        of: right.clone(),
                    }
                } else {
                    NodeData::PureValue {
                        of: right.clone(),
                    }
                };
                *init = Some(Box::new(Node::synthetic(right.loc, marker)));
            }
        }
    }
    if let NodeData::BlockStatement { body: stmts, .. } = &mut body.data {
        stmts.insert(0, *decl);
    }
}

// ── Child recursion ─────────────────────────────────────────────────────

fn normalize_children(mut node: Node) -> Node {
    for child in children_mut(&mut node) {
        let normalized = normalize(std::mem::replace(
            child,
            Node::synthetic(Loc::dummy(), NodeData::EmptyStatement {}),
        ));
        *child = normalized;
    }
    node
}

/// Every mutable child slot of a node, in structural order. Used by the
/// normalization recursion and uid assignment; the walker has its own,
/// narrower notion of traversal children.
fn children_mut(node: &mut Node) -> Vec<&mut Node> {
    use NodeData::*;
    let mut out: Vec<&mut Node> = Vec::new();
    macro_rules! push_opt {
        ($slot:expr) => {
            if let Some(child) = $slot {
                out.push(child);
            }
        };
    }
    match &mut node.data {
        Program { body } | ClassBody { body } => out.extend(body.iter_mut()),
        BlockStatement { body, catch_block } => {
            out.extend(body.iter_mut());
            push_opt!(catch_block);
        }
        ExpressionStatement { expression } => out.push(expression),
        VariableDeclaration { declarations, .. } => out.extend(declarations.iter_mut()),
        VariableDeclarator { id, init, .. } => {
            out.push(id);
            push_opt!(init);
        }
        FunctionDeclaration {
            id,
            params,
            body,
            return_type,
            type_parameters,
            ..
        } => {
            push_opt!(id);
            out.extend(params.iter_mut());
            out.push(body);
            push_opt!(return_type);
            push_opt!(type_parameters);
        }
        FunctionExpression {
            id,
            params,
            body,
            return_type,
            type_parameters,
        } => {
            push_opt!(id);
            out.extend(params.iter_mut());
            out.push(body);
            push_opt!(return_type);
            push_opt!(type_parameters);
        }
        ArrowFunctionExpression {
            params,
            body,
            return_type,
            type_parameters,
        } => {
            out.extend(params.iter_mut());
            out.push(body);
            push_opt!(return_type);
            push_opt!(type_parameters);
        }
        ClassDeclaration { id, body, .. } | ClassExpression { id, body } => {
            push_opt!(id);
            out.push(body);
        }
        ClassMethod {
            key,
            params,
            body,
            return_type,
        }
        | ObjectMethod {
            key,
            params,
            body,
            return_type,
        } => {
            out.push(key);
            out.extend(params.iter_mut());
            out.push(body);
            push_opt!(return_type);
        }
        ObjectExpression { properties } => out.extend(properties.iter_mut()),
        ObjectProperty { key, value } => {
            out.push(key);
            out.push(value);
        }
        IfStatement {
            test,
            consequent,
            alternate,
        } => {
            out.push(test);
            out.push(consequent);
            push_opt!(alternate);
        }
        WhileStatement { test, body } => {
            out.push(test);
            out.push(body);
        }
        DoWhileStatement { body, test } => {
            out.push(body);
            out.push(test);
        }
        ForStatement {
            init,
            test,
            update,
            body,
        } => {
            push_opt!(init);
            push_opt!(test);
            push_opt!(update);
            out.push(body);
        }
        ForInStatement { left, right, body } | ForOfStatement { left, right, body } => {
            push_opt!(left);
            out.push(right);
            out.push(body);
        }
        TryStatement {
            block,
            handler,
            finalizer,
        } => {
            out.push(block);
            push_opt!(handler);
            push_opt!(finalizer);
        }
        CatchClause { param, body } => {
            push_opt!(param);
            out.push(body);
        }
        ThrowStatement { argument } => out.push(argument),
        ReturnStatement { argument } => push_opt!(argument),
        Identifier {
            type_annotation, ..
        } => push_opt!(type_annotation),
        BinaryExpression { left, right, .. }
        | LogicalExpression { left, right, .. }
        | AssignmentExpression { left, right, .. } => {
            out.push(left);
            out.push(right);
        }
        UnaryExpression { argument, .. } | UpdateExpression { argument, .. } => out.push(argument),
        MemberExpression {
            object, property, ..
        } => {
            out.push(object);
            out.push(property);
        }
        ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            out.push(test);
            out.push(consequent);
            out.push(alternate);
        }
        CallExpression { callee, arguments } | NewExpression { callee, arguments } => {
            out.push(callee);
            out.extend(arguments.iter_mut());
        }
        ArrayExpression { elements } => out.extend(elements.iter_mut()),
        ExportNamedDeclaration { declaration } => push_opt!(declaration),
        ExportDefaultDeclaration { declaration } => out.push(declaration),
        TypeAlias {
            id,
            type_parameters,
            right,
            ..
        } => {
            out.push(id);
            push_opt!(type_parameters);
            out.push(right);
        }
        TypeParameterDeclaration { params } | TypeParameterInstantiation { params } => {
            out.extend(params.iter_mut())
        }
        TypeParameter { bound, .. } => push_opt!(bound),
        TypeAnnotation { type_annotation } => out.push(type_annotation),
        GenericTypeAnnotation {
            id,
            type_parameters,
        } => {
            out.push(id);
            push_opt!(type_parameters);
        }
        ObjectTypeAnnotation { properties } => out.extend(properties.iter_mut()),
        ObjectTypeProperty { key, value } => {
            out.push(key);
            out.push(value);
        }
        FunctionTypeAnnotation {
            params,
            return_type,
        } => {
            out.extend(params.iter_mut());
            out.push(return_type);
        }
        FunctionTypeParam {
            name,
            type_annotation,
        } => {
            push_opt!(name);
            out.push(type_annotation);
        }
        UnionTypeAnnotation { types } => out.extend(types.iter_mut()),
        PureKey { of } | PureValue { of } => out.push(of),
        EmptyStatement {}
        | BreakStatement {}
        | ContinueStatement {}
        | NumericLiteral { .. }
        | StringLiteral { .. }
        | BooleanLiteral { .. }
        | NullLiteral {}
        | NumberTypeAnnotation {}
        | StringTypeAnnotation {}
        | BooleanTypeAnnotation {}
        | MixedTypeAnnotation {}
        | VoidTypeAnnotation {} => {}
    }
    out
}
