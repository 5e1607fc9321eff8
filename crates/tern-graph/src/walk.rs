//! Generic depth-first tree walker.
//!
//! The walker drives both builder passes through a single `Visitor` seam:
//! Pass 1 hooks `pre`, Pass 2 hooks `post`. For every node it selects the
//! traversal children by a prioritized field list, recomputes the
//! effective parent (the node whose scope the child belongs to) as it
//! descends, and converts unreachable-code signals from sub-traversals
//! into diagnostics.
//!
//! Unreachability is a control-flow signal, not an error: `walk` returns
//! a `Flow` value so the caller can tell whether the subtree it just
//! visited ends every path (throw/return).

use tern_ast::{Node, NodeData};
use tern_common::{Diagnostic, GraphError};

/// Reachability signal returned by a sub-traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Reachable,
    /// The visited statement ends every path; siblings after it are dead.
    Unreachable,
}

/// The three traversal hooks. All default to no-ops; each pass overrides
/// the one it needs.
///
/// A hook returning a `Shape` error records a diagnostic and prunes only
/// the work it guarded; any other error aborts the walk.
pub trait Visitor {
    /// Diagnostics sink shared between the walker and the visitor.
    fn errors(&mut self) -> &mut Vec<Diagnostic>;

    /// Whether this pass reports unreachable siblings. Exactly one pass
    /// over a tree should, or the diagnostic would be duplicated.
    fn reports_unreachable(&self) -> bool {
        true
    }

    /// Called before a node's children. Returning `Ok(false)` prunes the
    /// subtree.
    fn pre(&mut self, _node: &Node, _parent: &Node) -> Result<bool, GraphError> {
        Ok(true)
    }

    /// Called on each child, in order, immediately before recursing into
    /// it. Lets a pass act on a statement before its subtree is walked.
    fn middle(&mut self, _node: &Node, _parent: &Node) -> Result<(), GraphError> {
        Ok(())
    }

    /// Called after a node's children (post-order position).
    fn post(&mut self, _node: &Node, _parent: &Node) -> Result<(), GraphError> {
        Ok(())
    }
}

/// Walk `node` depth-first. `parent` is the effective parent node whose
/// scope `node` belongs to; pass the program node itself at the root.
pub fn walk<V: Visitor>(node: &Node, parent: &Node, visitor: &mut V) -> Result<Flow, GraphError> {
    match visitor.pre(node, parent) {
        Ok(true) => {}
        Ok(false) => return Ok(flow_of(node)),
        Err(GraphError::Shape(diagnostic)) => {
            visitor.errors().push(diagnostic);
            return Ok(flow_of(node));
        }
        Err(fatal) => return Err(fatal),
    }

    let children = traversal_children(node);

    let last = children.len().saturating_sub(1);
    let mut reported_unreachable = false;
    for (index, &child) in children.iter().enumerate() {
        let effective = effective_parent(node, child, parent);
        match visitor.middle(child, effective) {
            Ok(()) => {}
            Err(GraphError::Shape(diagnostic)) => visitor.errors().push(diagnostic),
            Err(fatal) => return Err(fatal),
        }
        let flow = walk(child, effective, visitor)?;
        if flow == Flow::Unreachable
            && index != last
            && !reported_unreachable
            && visitor.reports_unreachable()
        {
            visitor.errors().push(Diagnostic::error(
                "Unreachable code after this line",
                children[index + 1].loc,
            ));
            reported_unreachable = true;
        }
    }

    match visitor.post(node, parent) {
        Ok(()) => {}
        Err(GraphError::Shape(diagnostic)) => visitor.errors().push(diagnostic),
        Err(fatal) => return Err(fatal),
    }

    Ok(flow_of(node))
}

fn flow_of(node: &Node) -> Flow {
    match node.data {
        NodeData::ThrowStatement { .. } | NodeData::ReturnStatement { .. } => Flow::Unreachable,
        _ => Flow::Reachable,
    }
}

/// The parent to pass down for `child`:
/// - statements of a claimed function body resolve to the function node;
/// - a scope creator claims its non-creator children, its claimed body,
///   and (for member containers) everything it holds;
/// - otherwise the parent is unchanged.
fn effective_parent<'a>(current: &'a Node, child: &Node, parent: &'a Node) -> &'a Node {
    if parent.is_function_body(current) {
        return parent;
    }
    let claims = match current.data {
        // Class and object bodies own all of their members, including
        // method forms that open scopes of their own.
        NodeData::ClassBody { .. } | NodeData::ObjectExpression { .. } => true,
        _ => {
            (current.creates_scope() && !child.creates_scope()) || current.is_scope_body(child)
        }
    };
    if claims { current } else { parent }
}

/// Traversal children of a node, in the prioritized field order the
/// builder passes rely on: container bodies first, then declarations and
/// properties, then the structural child fields.
///
/// Deliberately narrower than the full structural child set: fields whose
/// contents are consumed by Pass 2 reduction at the parent node (loop
/// tests, call arguments, annotations, identifiers in binding position)
/// are not traversed.
pub fn traversal_children(node: &Node) -> Vec<&Node> {
    use NodeData::*;

    fn callee_then_self<'a>(expr: &'a Node, out: &mut Vec<&'a Node>) {
        if let CallExpression { callee, .. } | NewExpression { callee, .. } = &expr.data {
            out.push(callee);
        }
        out.push(expr);
    }

    let mut out: Vec<&Node> = Vec::new();
    match &node.data {
        Program { body } | ClassBody { body } | BlockStatement { body, .. } => {
            out.extend(body.iter())
        }
        VariableDeclaration { declarations, .. } => out.extend(declarations.iter()),
        ObjectExpression { properties } => out.extend(properties.iter()),
        FunctionDeclaration { body, .. }
        | FunctionExpression { body, .. }
        | ArrowFunctionExpression { body, .. }
        | ClassMethod { body, .. }
        | ObjectMethod { body, .. }
        | ClassDeclaration { body, .. }
        | ClassExpression { body, .. }
        | WhileStatement { body, .. }
        | DoWhileStatement { body, .. }
        | ForStatement { body, .. } => out.push(body),
        ForInStatement { left, right, body } | ForOfStatement { left, right, body } => {
            out.push(body);
            if let Some(left) = left {
                out.push(left);
            }
            out.push(right);
        }
        TryStatement {
            block,
            handler,
            finalizer,
        } => {
            out.push(block);
            if let Some(handler) = handler {
                out.push(handler);
            }
            if let Some(finalizer) = finalizer {
                out.push(finalizer);
            }
        }
        CatchClause { body, .. } => out.push(body),
        IfStatement {
            consequent,
            alternate,
            ..
        } => {
            out.push(consequent);
            if let Some(alternate) = alternate {
                out.push(alternate);
            }
        }
        ObjectProperty { value, .. } => out.push(value),
        VariableDeclarator { init, .. } => {
            if let Some(init) = init {
                callee_then_self(init, &mut out);
            }
        }
        ExpressionStatement { expression } => callee_then_self(expression, &mut out),
        BinaryExpression { left, right, .. }
        | LogicalExpression { left, right, .. }
        | AssignmentExpression { left, right, .. } => {
            out.push(left);
            out.push(right);
        }
        MemberExpression {
            object, property, ..
        } => {
            out.push(object);
            out.push(property);
        }
        ConditionalExpression {
            consequent,
            alternate,
            ..
        } => {
            out.push(consequent);
            out.push(alternate);
        }
        ThrowStatement { argument } => out.push(argument),
        ReturnStatement { argument } => {
            if let Some(argument) = argument {
                out.push(argument);
            }
        }
        UnaryExpression { argument, .. } | UpdateExpression { argument, .. } => out.push(argument),
        CallExpression { callee, .. } | NewExpression { callee, .. } => out.push(callee),
        ArrayExpression { elements } => out.extend(elements.iter()),
        _ => {}
    }
    out
}
