//! Throwable-effect propagation across lexical and call boundaries.

mod common;

use common::*;
use tern_graph::ScopeId;

#[test]
fn a_throwing_function_records_its_error_type() {
    // function g() { throw "boom"; }
    let ast = program(vec![fn_decl(
        "g",
        vec![],
        vec![throw_stmt(str_lit("boom"))],
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let g = module.find_variable(module.root, "g").unwrap();
    let thrown = module.variable(g).throwable.expect("g should throw");
    assert_eq!(module.type_name(thrown), "string");

    let g_scope = scope_of_declaration(&module, g);
    assert_eq!(
        module.scope(g_scope).throwable.as_deref(),
        Some(&[thrown][..])
    );
}

#[test]
fn calls_inherit_the_callee_throwable() {
    // function g() { throw "boom"; }
    // function f() { g(); }
    let ast = program(vec![
        fn_decl("g", vec![], vec![throw_stmt(str_lit("boom"))]),
        fn_decl("f", vec![], vec![expr_stmt(call(ident("g"), vec![]))]),
    ]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let f = module.find_variable(module.root, "f").unwrap();
    let inherited = module
        .variable(f)
        .throwable
        .expect("f should inherit g's throwable");
    assert_eq!(module.type_name(inherited), "string");
}

#[test]
fn a_try_block_shields_the_enclosing_function() {
    // function f() { try { throw "boom"; } catch (e) {} }
    let ast = program(vec![fn_decl(
        "f",
        vec![],
        vec![try_stmt(vec![throw_stmt(str_lit("boom"))], Some("e"), vec![])],
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let f = module.find_variable(module.root, "f").unwrap();
    assert!(
        module.variable(f).throwable.is_none(),
        "the try block should capture the throw"
    );
}

#[test]
fn nested_try_blocks_capture_independently() {
    // try {
    //   try { throw "inner"; } catch (e) {}
    //   throw 42;
    // } catch (outer) {}
    let ast = program(vec![try_stmt(
        vec![
            try_stmt(vec![throw_stmt(str_lit("inner"))], Some("e"), vec![]),
            throw_stmt(num(42.0)),
        ],
        Some("outer"),
        vec![],
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let throwables: Vec<Vec<String>> = (0..module.scope_count() as u32)
        .map(ScopeId)
        .filter_map(|id| module.scope(id).throwable.as_ref())
        .map(|list| {
            list.iter()
                .map(|ty| module.type_name(*ty).to_string())
                .collect()
        })
        .collect();
    assert!(
        throwables.contains(&vec!["string".to_string()]),
        "the inner try should hold the string: {throwables:?}"
    );
    assert!(
        throwables.contains(&vec!["number".to_string()]),
        "the outer try should hold only the number: {throwables:?}"
    );

    // Each catch parameter got its own block's error type.
    let e = (0..module.scope_count() as u32)
        .map(ScopeId)
        .find_map(|id| module.find_variable_local(id, "e"))
        .unwrap();
    assert_eq!(module.type_name(module.variable(e).ty), "string");
    let outer = (0..module.scope_count() as u32)
        .map(ScopeId)
        .find_map(|id| module.find_variable_local(id, "outer"))
        .unwrap();
    assert_eq!(module.type_name(module.variable(outer).ty), "number");
}

#[test]
fn distinct_thrown_types_aggregate_into_a_union() {
    // function f(flag: boolean) {
    //   if (flag) { throw "a"; }
    //   throw 1;
    // }
    let ast = program(vec![fn_decl(
        "f",
        vec![ident_typed("flag", boolean_ann())],
        vec![
            if_stmt(ident("flag"), throw_stmt(str_lit("a"))),
            throw_stmt(num(1.0)),
        ],
    )]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let f = module.find_variable(module.root, "f").unwrap();
    let thrown = module.variable(f).throwable.expect("f should throw");
    assert_eq!(module.type_name(thrown), "number | string");
}

#[test]
fn module_level_throws_escape_without_a_boundary() {
    // throw "top";  (nothing catches at module level)
    let ast = program(vec![throw_stmt(str_lit("top"))]);
    let (module, diagnostics) = build(ast);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert!(module.scope(module.root).throwable.is_none());
    assert_eq!(labels(&module, module.root), vec!["throw"]);
}
