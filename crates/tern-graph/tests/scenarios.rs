//! End-to-end scenarios: one small module each, checked against the
//! recorded call graph and the inferred binding types.

mod common;

use common::*;
use tern_graph::{CallArg, TypeKind};

#[test]
fn declarator_with_binary_init() {
    // const x = 1 + 2;
    let ast = program(vec![var_decl(
        "const",
        ident("x"),
        Some(bin("+", num(1.0), num(2.0))),
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let x = module.find_variable(module.root, "x").unwrap();
    assert_eq!(module.type_name(module.variable(x).ty), "number");

    assert_eq!(labels(&module, module.root), vec!["+", "="]);
    let assignment = &module.scope(module.root).calls[1];
    assert!(matches!(assignment.arguments[0], CallArg::Variable(v) if v == x));
    match assignment.arguments[1] {
        CallArg::Type(ty) => assert_eq!(module.type_name(ty), "number"),
        other => panic!("expected a type argument, got {other:?}"),
    }
}

#[test]
fn generic_function_is_specialized_from_its_body() {
    // function f(a) { return a; }  f(42);
    let ast = program(vec![
        fn_decl("f", vec![ident("a")], vec![ret(Some(ident("a")))]),
        expr_stmt(call(ident("f"), vec![num(42.0)])),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let f = module.find_variable(module.root, "f").unwrap();
    let f_ty = module.variable(f).ty;
    assert_eq!(module.type_name(f_ty), "<T0>(T0) => T0");
    assert!(matches!(
        module.type_of(f_ty).kind,
        TypeKind::Generic { .. }
    ));

    // The parameter is bound to the type variable inside the function
    // scope, and the body recorded one return call.
    let f_scope = scope_of_declaration(&module, f);
    let a = module.find_variable_local(f_scope, "a").unwrap();
    assert_eq!(module.type_name(module.variable(a).ty), "T0");
    assert_eq!(labels(&module, f_scope), vec!["return"]);

    // The call site lands in the module scope, targeting the generic.
    let module_calls = &module.scope(module.root).calls;
    assert_eq!(module_calls.len(), 1);
    assert_eq!(module_calls[0].label, "f");
    assert_eq!(module_calls[0].target, f);
}

#[test]
fn try_throw_catch_resolves_the_catch_parameter() {
    // try { throw "e"; } catch (e) { e; }
    let ast = program(vec![try_stmt(
        vec![throw_stmt(str_lit("e"))],
        Some("e"),
        vec![expr_stmt(ident("e"))],
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    // The try block collected the thrown string.
    let try_scope = (0..module.scope_count() as u32)
        .map(tern_graph::ScopeId)
        .find(|id| {
            module.scope(*id).kind == tern_graph::ScopeKind::Block
                && module
                    .scope(*id)
                    .throwable
                    .as_ref()
                    .is_some_and(|list| !list.is_empty())
        })
        .expect("the try block scope should have a throwable list");
    let throwable = module.scope(try_scope).throwable.as_ref().unwrap();
    assert_eq!(throwable.len(), 1);
    assert_eq!(module.type_name(throwable[0]), "string");

    // The catch parameter's type was resolved from it.
    let e = (0..module.scope_count() as u32)
        .map(tern_graph::ScopeId)
        .filter(|id| *id != try_scope)
        .find_map(|id| module.find_variable_local(id, "e"))
        .expect("the catch parameter should be registered");
    assert_eq!(module.type_name(module.variable(e).ty), "string");

    assert_eq!(labels(&module, module.root), vec!["throw"]);
}

#[test]
fn generic_type_alias_builds_a_generic_with_a_local_scope() {
    // type Box<T> = { v: T };
    let ast = program(vec![type_alias(
        "Box",
        vec!["T"],
        object_type(vec![("v", type_ref("T"))]),
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let type_scope = module.type_scope_of(module.root).unwrap();
    let boxed = module.find_type(type_scope, "Box").unwrap();
    let TypeKind::Generic {
        params,
        local_scope,
        subordinate,
    } = &module.type_of(boxed).kind
    else {
        panic!("Box should be generic");
    };
    assert_eq!(params.len(), 1);
    assert_eq!(module.type_name(params[0]), "T");
    assert_eq!(module.find_type_local(*local_scope, "T"), Some(params[0]));

    let TypeKind::Object { properties } = &module.type_of(*subordinate).kind else {
        panic!("the subordinate should be an object type");
    };
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].0, "v");
    assert_eq!(properties[0].1, params[0]);
}

#[test]
fn if_branch_is_wrapped_and_calls_stay_in_source_order() {
    // let x: number = 1; let y: number = 0; if (x > 0) y = 1;
    let ast = program(vec![
        var_decl("let", ident_typed("x", number_ann()), Some(num(1.0))),
        var_decl("let", ident_typed("y", number_ann()), Some(num(0.0))),
        if_stmt(
            bin(">", ident("x"), num(0.0)),
            expr_stmt(assign("=", ident("y"), num(1.0))),
        ),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    assert_eq!(labels(&module, module.root), vec!["=", "=", ">", "if", "="]);

    // The `if` pseudo-call received the comparison's result type.
    let if_call = module
        .scope(module.root)
        .calls
        .iter()
        .find(|call| call.label == "if")
        .unwrap();
    match if_call.arguments[0] {
        CallArg::Type(ty) => assert_eq!(module.type_name(ty), "boolean"),
        other => panic!("expected a type argument, got {other:?}"),
    }
}

#[test]
fn for_loop_hoists_its_binding_and_records_loop_calls() {
    // let n = 10; let s = 0; for (let i = 0; i < n; i++) { s += i; }
    let ast = program(vec![
        var_decl("let", ident("n"), Some(num(10.0))),
        var_decl("let", ident("s"), Some(num(0.0))),
        for_stmt(
            Some(var_decl("let", ident("i"), Some(num(0.0)))),
            Some(bin("<", ident("i"), ident("n"))),
            Some(update("++", ident("i"))),
            vec![expr_stmt(assign("+=", ident("s"), ident("i")))],
        ),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let recorded = labels(&module, module.root);
    assert_eq!(recorded, vec!["=", "=", "<", "++", "for", "=", "+="]);

    // The hoisted binding lives in the loop body scope and took its
    // initializer's type.
    let i = (0..module.scope_count() as u32)
        .map(tern_graph::ScopeId)
        .find_map(|id| module.find_variable_local(id, "i"))
        .expect("i should be registered in the loop body scope");
    assert!(module.variable(i).parent != module.root);
    assert_eq!(module.type_name(module.variable(i).ty), "number");

    // The `for` pseudo-call carries [mixed, test, mixed].
    let for_call = module
        .scope(module.root)
        .calls
        .iter()
        .find(|call| call.label == "for")
        .unwrap();
    let arg_names: Vec<_> = for_call
        .arguments
        .iter()
        .map(|argument| module.type_name(module.lift_argument(*argument)).to_string())
        .collect();
    assert_eq!(arg_names, vec!["mixed", "boolean", "mixed"]);
}

#[test]
fn member_call_resolves_through_the_object_shape() {
    // console.log("hi");
    let ast = program(vec![expr_stmt(call(
        member(ident("console"), "log"),
        vec![str_lit("hi")],
    ))]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(labels(&module, module.root), vec![".", "log"]);
}

#[test]
fn object_methods_register_in_the_object_scope() {
    // const o = { m() { return 1; } }; o.m();
    let ast = program(vec![
        var_decl(
            "const",
            ident("o"),
            Some(object_expr(vec![object_method("m", vec![], vec![ret(
                Some(num(1.0)),
            )])])),
        ),
        expr_stmt(call(member(ident("o"), "m"), vec![])),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let o = module.find_variable(module.root, "o").unwrap();
    assert_eq!(
        module.type_name(module.variable(o).ty),
        "{ m: () => number }"
    );

    // The method itself was registered in an object-kind scope.
    let object_scope = (0..module.scope_count() as u32)
        .map(tern_graph::ScopeId)
        .find(|id| module.scope(*id).kind == tern_graph::ScopeKind::Object)
        .expect("the object literal should open a scope");
    assert!(module.find_variable_local(object_scope, "m").is_some());
}

#[test]
fn new_expression_constructs_the_class_instance() {
    // class C {}  const c = new C();
    let ast = program(vec![
        class_decl("C", vec![]),
        var_decl("const", ident("c"), Some(new_expr(ident("C")))),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let c = module.find_variable(module.root, "c").unwrap();
    assert_eq!(module.type_name(module.variable(c).ty), "C");
    assert_eq!(labels(&module, module.root), vec!["new", "="]);
}
