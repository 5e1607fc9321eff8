//! Shared AST builders for the integration tests.
//!
//! Tests feed the builder the same ESTree-style JSON the external parser
//! emits. Every node gets a fresh source line so location-derived scope
//! keys never collide.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::atomic::{AtomicU32, Ordering};
use tern_common::Diagnostic;
use tern_graph::ModuleScope;

static NEXT_LINE: AtomicU32 = AtomicU32::new(1);

pub fn fresh_loc() -> Value {
    let line = NEXT_LINE.fetch_add(1, Ordering::Relaxed);
    json!({
        "start": { "line": line, "column": 0 },
        "end": { "line": line, "column": 40 },
    })
}

pub fn build(ast: Value) -> (ModuleScope, Vec<Diagnostic>) {
    let node = serde_json::from_value(ast).expect("AST should deserialize");
    tern_graph::build_module_scope(node).expect("build should not abort")
}

pub fn labels(module: &ModuleScope, scope: tern_graph::ScopeId) -> Vec<String> {
    module
        .scope(scope)
        .calls
        .iter()
        .map(|call| call.label.clone())
        .collect()
}

/// The function scope whose `declaration` is the given binding.
pub fn scope_of_declaration(
    module: &ModuleScope,
    declaration: tern_graph::VariableId,
) -> tern_graph::ScopeId {
    (0..module.scope_count() as u32)
        .map(tern_graph::ScopeId)
        .find(|id| module.scope(*id).declaration == declaration)
        .expect("a scope should exist for the declaration")
}

// ── Expressions ─────────────────────────────────────────────────────────

pub fn num(value: f64) -> Value {
    json!({ "type": "NumericLiteral", "value": value, "loc": fresh_loc() })
}

pub fn str_lit(value: &str) -> Value {
    json!({ "type": "StringLiteral", "value": value, "loc": fresh_loc() })
}

pub fn boolean(value: bool) -> Value {
    json!({ "type": "BooleanLiteral", "value": value, "loc": fresh_loc() })
}

pub fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name, "loc": fresh_loc() })
}

pub fn ident_typed(name: &str, annotation: Value) -> Value {
    json!({
        "type": "Identifier",
        "name": name,
        "typeAnnotation": annotation,
        "loc": fresh_loc(),
    })
}

pub fn bin(operator: &str, left: Value, right: Value) -> Value {
    json!({
        "type": "BinaryExpression",
        "operator": operator,
        "left": left,
        "right": right,
        "loc": fresh_loc(),
    })
}

pub fn assign(operator: &str, left: Value, right: Value) -> Value {
    json!({
        "type": "AssignmentExpression",
        "operator": operator,
        "left": left,
        "right": right,
        "loc": fresh_loc(),
    })
}

pub fn update(operator: &str, argument: Value) -> Value {
    json!({
        "type": "UpdateExpression",
        "operator": operator,
        "prefix": false,
        "argument": argument,
        "loc": fresh_loc(),
    })
}

pub fn unary(operator: &str, argument: Value) -> Value {
    json!({
        "type": "UnaryExpression",
        "operator": operator,
        "argument": argument,
        "loc": fresh_loc(),
    })
}

pub fn call(callee: Value, arguments: Vec<Value>) -> Value {
    json!({
        "type": "CallExpression",
        "callee": callee,
        "arguments": arguments,
        "loc": fresh_loc(),
    })
}

pub fn new_expr(callee: Value) -> Value {
    json!({
        "type": "NewExpression",
        "callee": callee,
        "arguments": [],
        "loc": fresh_loc(),
    })
}

pub fn member(object: Value, property: &str) -> Value {
    json!({
        "type": "MemberExpression",
        "object": object,
        "property": ident(property),
        "computed": false,
        "loc": fresh_loc(),
    })
}

pub fn conditional(test: Value, consequent: Value, alternate: Value) -> Value {
    json!({
        "type": "ConditionalExpression",
        "test": test,
        "consequent": consequent,
        "alternate": alternate,
        "loc": fresh_loc(),
    })
}

pub fn object_expr(properties: Vec<Value>) -> Value {
    json!({
        "type": "ObjectExpression",
        "properties": properties,
        "loc": fresh_loc(),
    })
}

pub fn object_prop(key: &str, value: Value) -> Value {
    json!({
        "type": "ObjectProperty",
        "key": ident(key),
        "value": value,
        "loc": fresh_loc(),
    })
}

pub fn object_method(key: &str, params: Vec<Value>, body: Vec<Value>) -> Value {
    json!({
        "type": "ObjectMethod",
        "key": ident(key),
        "params": params,
        "body": block(body),
        "loc": fresh_loc(),
    })
}

pub fn arrow(params: Vec<Value>, body: Value) -> Value {
    json!({
        "type": "ArrowFunctionExpression",
        "params": params,
        "body": body,
        "loc": fresh_loc(),
    })
}

// ── Statements ──────────────────────────────────────────────────────────

pub fn program(body: Vec<Value>) -> Value {
    json!({ "type": "Program", "body": body, "loc": fresh_loc() })
}

pub fn block(body: Vec<Value>) -> Value {
    json!({ "type": "BlockStatement", "body": body, "loc": fresh_loc() })
}

pub fn expr_stmt(expression: Value) -> Value {
    json!({
        "type": "ExpressionStatement",
        "expression": expression,
        "loc": fresh_loc(),
    })
}

pub fn var_decl(kind: &str, id: Value, init: Option<Value>) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": kind,
        "declarations": [{
            "type": "VariableDeclarator",
            "id": id,
            "init": init,
            "loc": fresh_loc(),
        }],
        "loc": fresh_loc(),
    })
}

pub fn fn_decl(name: &str, params: Vec<Value>, body: Vec<Value>) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": ident(name),
        "params": params,
        "body": block(body),
        "loc": fresh_loc(),
    })
}

pub fn ret(argument: Option<Value>) -> Value {
    json!({
        "type": "ReturnStatement",
        "argument": argument,
        "loc": fresh_loc(),
    })
}

pub fn throw_stmt(argument: Value) -> Value {
    json!({
        "type": "ThrowStatement",
        "argument": argument,
        "loc": fresh_loc(),
    })
}

pub fn if_stmt(test: Value, consequent: Value) -> Value {
    json!({
        "type": "IfStatement",
        "test": test,
        "consequent": consequent,
        "loc": fresh_loc(),
    })
}

pub fn while_stmt(test: Value, body: Vec<Value>) -> Value {
    json!({
        "type": "WhileStatement",
        "test": test,
        "body": block(body),
        "loc": fresh_loc(),
    })
}

pub fn for_stmt(
    init: Option<Value>,
    test: Option<Value>,
    update: Option<Value>,
    body: Vec<Value>,
) -> Value {
    json!({
        "type": "ForStatement",
        "init": init,
        "test": test,
        "update": update,
        "body": block(body),
        "loc": fresh_loc(),
    })
}

pub fn try_stmt(try_body: Vec<Value>, param: Option<&str>, catch_body: Vec<Value>) -> Value {
    json!({
        "type": "TryStatement",
        "block": block(try_body),
        "handler": {
            "type": "CatchClause",
            "param": param.map(ident),
            "body": block(catch_body),
            "loc": fresh_loc(),
        },
        "loc": fresh_loc(),
    })
}

pub fn class_decl(name: &str, methods: Vec<Value>) -> Value {
    json!({
        "type": "ClassDeclaration",
        "id": ident(name),
        "body": {
            "type": "ClassBody",
            "body": methods,
            "loc": fresh_loc(),
        },
        "loc": fresh_loc(),
    })
}

// ── Type annotations ────────────────────────────────────────────────────

fn annotation(inner: Value) -> Value {
    json!({
        "type": "TypeAnnotation",
        "typeAnnotation": inner,
        "loc": fresh_loc(),
    })
}

pub fn number_ann() -> Value {
    annotation(json!({ "type": "NumberTypeAnnotation" }))
}

pub fn string_ann() -> Value {
    annotation(json!({ "type": "StringTypeAnnotation" }))
}

pub fn boolean_ann() -> Value {
    annotation(json!({ "type": "BooleanTypeAnnotation" }))
}

pub fn union_ann(types: Vec<Value>) -> Value {
    annotation(json!({ "type": "UnionTypeAnnotation", "types": types }))
}

pub fn type_ref(name: &str) -> Value {
    json!({ "type": "GenericTypeAnnotation", "id": ident(name), "loc": fresh_loc() })
}

pub fn type_ref_ann(name: &str) -> Value {
    annotation(type_ref(name))
}

pub fn type_app_ann(name: &str, args: Vec<Value>) -> Value {
    annotation(json!({
        "type": "GenericTypeAnnotation",
        "id": ident(name),
        "typeParameters": { "type": "TypeParameterInstantiation", "params": args },
        "loc": fresh_loc(),
    }))
}

pub fn object_type(properties: Vec<(&str, Value)>) -> Value {
    let properties: Vec<Value> = properties
        .into_iter()
        .map(|(key, value)| {
            json!({
                "type": "ObjectTypeProperty",
                "key": ident(key),
                "value": value,
                "loc": fresh_loc(),
            })
        })
        .collect();
    json!({ "type": "ObjectTypeAnnotation", "properties": properties, "loc": fresh_loc() })
}

pub fn type_alias(name: &str, params: Vec<&str>, right: Value) -> Value {
    let type_parameters = if params.is_empty() {
        Value::Null
    } else {
        let params: Vec<Value> = params
            .into_iter()
            .map(|param| json!({ "type": "TypeParameter", "name": param, "loc": fresh_loc() }))
            .collect();
        json!({ "type": "TypeParameterDeclaration", "params": params })
    };
    json!({
        "type": "TypeAlias",
        "id": ident(name),
        "typeParameters": type_parameters,
        "right": right,
        "loc": fresh_loc(),
    })
}
