//! Quantified invariants, boundary cases, and determinism.

mod common;

use common::*;
use tern_graph::{ScopeEntry, ScopeId, ScopeKey, TypeKind};

fn sample_module() -> serde_json::Value {
    program(vec![
        type_alias("Box", vec!["T"], object_type(vec![("v", type_ref("T"))])),
        var_decl("let", ident("n"), Some(num(1.0))),
        fn_decl("f", vec![ident("a")], vec![ret(Some(ident("a")))]),
        expr_stmt(call(ident("f"), vec![ident("n")])),
        try_stmt(vec![throw_stmt(str_lit("e"))], Some("e"), vec![]),
        if_stmt(
            bin(">", ident("n"), num(0.0)),
            expr_stmt(assign("=", ident("n"), num(2.0))),
        ),
    ])
}

#[test]
fn every_inner_scope_is_keyed_once_and_parents_reach_the_root() {
    let (module, diagnostics) = build(sample_module());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let root = module.scope(module.root);
    let mut seen = Vec::new();
    for (key, entry) in &root.body {
        if let ScopeEntry::Scope(id) = entry {
            assert!(
                matches!(key, ScopeKey::Loc(_) | ScopeKey::TypeScope),
                "inner scopes are keyed by location: {key}"
            );
            assert!(!seen.contains(id), "scope {id:?} appears under two keys");
            seen.push(*id);

            // The parent chain of every value scope reaches the module
            // root.
            if matches!(key, ScopeKey::Loc(_)) {
                let mut current = *id;
                let mut steps = 0;
                while current != module.root {
                    current = module.scope(current).parent;
                    assert!(!current.is_none(), "scope chain must reach the root");
                    steps += 1;
                    assert!(steps < 100, "scope chain must be acyclic");
                }
            }
        }
    }
    assert!(!seen.is_empty(), "the sample module has inner scopes");
}

#[test]
fn every_recorded_call_targets_a_callable() {
    let (module, diagnostics) = build(sample_module());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let mut checked = 0;
    for id in (0..module.scope_count() as u32).map(ScopeId) {
        for call in &module.scope(id).calls {
            let target_ty = module.variable(call.target).ty;
            assert!(
                module.callable_signature(target_ty).is_some(),
                "call {:?} targets non-callable {}",
                call.label,
                module.type_name(target_ty)
            );
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn type_scope_chain_agrees_with_value_scope_chain() {
    let (module, diagnostics) = build(sample_module());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let module_ts = module.type_scope_of(module.root).unwrap();
    let f = module.find_variable(module.root, "f").unwrap();
    let f_scope = scope_of_declaration(&module, f);

    // The generic function's local type scope chains back to the module
    // type scope, mirroring the value chain f_scope -> root.
    let local_ts = module.type_scope_of(f_scope).unwrap();
    assert_ne!(local_ts, module_ts);
    assert_eq!(module.scope(local_ts).parent, module_ts);
    assert_eq!(module.scope(f_scope).parent, module.root);

    // Scopes without a sibling type scope inherit the module's.
    let try_scope = (0..module.scope_count() as u32)
        .map(ScopeId)
        .find(|id| module.scope(*id).throwable.is_some() && *id != f_scope)
        .unwrap();
    assert_eq!(module.type_scope_of(try_scope).unwrap(), module_ts);
}

#[test]
fn building_twice_yields_equal_graphs_and_diagnostics() {
    let ast = sample_module();
    let (first, first_diags) = build(ast.clone());
    let (second, second_diags) = build(ast);
    assert_eq!(first_diags, second_diags);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn empty_program_has_only_seeded_content() {
    let (module, diagnostics) = build(program(vec![]));
    assert!(diagnostics.is_empty());

    // Root and its type scope are the only scopes.
    assert_eq!(module.scope_count(), 2);
    let root = module.scope(module.root);
    assert!(root.body.contains_key(&ScopeKey::TypeScope));
    assert!(
        root.body
            .keys()
            .all(|key| !matches!(key, ScopeKey::Loc(_))),
        "an empty program registers no inner scopes"
    );
    assert!(root.calls.is_empty());
    assert!(module.find_variable(module.root, "undefined").is_some());
    assert!(module.find_variable(module.root, "+").is_some());
}

#[test]
fn unannotated_uninitialized_declaration_stays_undefined() {
    let (module, diagnostics) = build(program(vec![var_decl("let", ident("x"), None)]));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let x = module.find_variable(module.root, "x").unwrap();
    assert_eq!(module.type_name(module.variable(x).ty), "undefined");
}

#[test]
fn annotated_declarations_are_not_rewritten_by_late_assignment() {
    // let x: number | string = 1; -- the annotation survives the init.
    let (module, diagnostics) = build(program(vec![var_decl(
        "let",
        ident_typed("x", union_ann(vec![
            serde_json::json!({ "type": "NumberTypeAnnotation" }),
            serde_json::json!({ "type": "StringTypeAnnotation" }),
        ])),
        Some(num(1.0)),
    )]));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let x = module.find_variable(module.root, "x").unwrap();
    assert_eq!(module.type_name(module.variable(x).ty), "number | string");
}

#[test]
fn generic_alias_application_substitutes_type_arguments() {
    // type Box<T> = { v: T }; let b: Box<number> = { v: 1 };
    let ast = program(vec![
        type_alias("Box", vec!["T"], object_type(vec![("v", type_ref("T"))])),
        var_decl(
            "let",
            ident_typed("b", type_app_ann("Box", vec![serde_json::json!({
                "type": "NumberTypeAnnotation"
            })])),
            Some(object_expr(vec![object_prop("v", num(1.0))])),
        ),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let b = module.find_variable(module.root, "b").unwrap();
    let ty = module.variable(b).ty;
    assert_eq!(module.type_name(ty), "{ v: number }");
    let TypeKind::Object { properties } = &module.type_of(ty).kind else {
        panic!("expected an object type");
    };
    assert_eq!(properties[0].0, "v");
    assert_eq!(properties[0].1, module.base.number);
}

#[test]
fn generic_call_records_the_generic_target() {
    // function id(v) { return v; }  id("s");
    let ast = program(vec![
        fn_decl("id", vec![ident("v")], vec![ret(Some(ident("v")))]),
        expr_stmt(call(ident("id"), vec![str_lit("s")])),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let call_meta = &module.scope(module.root).calls[0];
    let target_ty = module.variable(call_meta.target).ty;
    assert!(matches!(
        module.type_of(target_ty).kind,
        TypeKind::Generic { .. }
    ));
}
