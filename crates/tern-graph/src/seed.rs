//! Built-in seeding.
//!
//! Before Pass 1 the module scope is populated with the global bindings
//! and the operator repertoire. Operators are ordinary variables whose
//! types are function types; every syntactic form Pass 2 reduces to a
//! call resolves its target here. Control-flow constructs are covered by
//! pseudo-operators (`"if"`, `"for"`, `"throw"`, ...) with the same
//! shape.
//!
//! Seeding is a contract: every operator label used by reduction must be
//! resolvable from the module scope.

use crate::scope::{ModuleScope, ScopeId};
use crate::types::TypeId;
use once_cell::sync::Lazy;
use tern_common::{GraphError, Loc};

/// Shorthand for the base vocabulary used by the operator table.
#[derive(Clone, Copy, Debug)]
enum B {
    Num,
    Str,
    Bool,
    Mixed,
    Undef,
    NumOrStr,
    BoolOrUndef,
}

struct OperatorSig {
    label: &'static str,
    params: &'static [B],
    ret: B,
    /// More specific signatures checked before the primary one.
    overloads: &'static [(&'static [B], B)],
}

const fn op(label: &'static str, params: &'static [B], ret: B) -> OperatorSig {
    OperatorSig {
        label,
        params,
        ret,
        overloads: &[],
    }
}

const fn op_with(
    label: &'static str,
    params: &'static [B],
    ret: B,
    overloads: &'static [(&'static [B], B)],
) -> OperatorSig {
    OperatorSig {
        label,
        params,
        ret,
        overloads,
    }
}

/// Overloads shared by `+` and `+=`: numeric addition, string
/// concatenation, and (for `+`) the unary form.
const PLUS_OVERLOADS: &[(&[B], B)] = &[
    (&[B::Num, B::Num], B::Num),
    (&[B::Str, B::Str], B::Str),
    (&[B::Num], B::Num),
];

static OPERATOR_TABLE: Lazy<Vec<OperatorSig>> = Lazy::new(|| {
    vec![
        // Arithmetic
        op_with("+", &[B::NumOrStr, B::NumOrStr], B::NumOrStr, PLUS_OVERLOADS),
        op_with(
            "-",
            &[B::Num, B::Num],
            B::Num,
            &[(&[B::Num], B::Num)],
        ),
        op("*", &[B::Num, B::Num], B::Num),
        op("/", &[B::Num, B::Num], B::Num),
        op("%", &[B::Num, B::Num], B::Num),
        op("**", &[B::Num, B::Num], B::Num),
        // Equality and comparison
        op("==", &[B::Mixed, B::Mixed], B::Bool),
        op("!=", &[B::Mixed, B::Mixed], B::Bool),
        op("===", &[B::Mixed, B::Mixed], B::Bool),
        op("!==", &[B::Mixed, B::Mixed], B::Bool),
        op("<", &[B::NumOrStr, B::NumOrStr], B::Bool),
        op(">", &[B::NumOrStr, B::NumOrStr], B::Bool),
        op("<=", &[B::NumOrStr, B::NumOrStr], B::Bool),
        op(">=", &[B::NumOrStr, B::NumOrStr], B::Bool),
        // Logical
        op("&&", &[B::Mixed, B::Mixed], B::Bool),
        op("||", &[B::Mixed, B::Mixed], B::Bool),
        op("!", &[B::Mixed], B::Bool),
        // Unary keywords
        op("typeof", &[B::Mixed], B::Str),
        op("void", &[B::Mixed], B::Undef),
        // Updates
        op("++", &[B::Num], B::Num),
        op("--", &[B::Num], B::Num),
        // Assignment
        op("=", &[B::Mixed, B::Mixed], B::Mixed),
        op_with(
            "+=",
            &[B::NumOrStr, B::NumOrStr],
            B::NumOrStr,
            &[(&[B::Num, B::Num], B::Num), (&[B::Str, B::Str], B::Str)],
        ),
        op("-=", &[B::Num, B::Num], B::Num),
        op("*=", &[B::Num, B::Num], B::Num),
        op("/=", &[B::Num, B::Num], B::Num),
        op("%=", &[B::Num, B::Num], B::Num),
        // Control-flow pseudo-operators
        op("if", &[B::Bool], B::Undef),
        op("while", &[B::Bool], B::Undef),
        op("do-while", &[B::Bool], B::Undef),
        op("for", &[B::Mixed, B::BoolOrUndef, B::Mixed], B::Undef),
        op("throw", &[B::Mixed], B::Undef),
        op("return", &[B::Mixed], B::Mixed),
        // Access and construction
        op(".", &[B::Mixed, B::Str], B::Mixed),
        op("?:", &[B::Bool, B::Mixed, B::Mixed], B::Mixed),
        op("new", &[B::Mixed], B::Mixed),
    ]
});

fn resolve(module: &mut ModuleScope, type_scope: ScopeId, base: B) -> TypeId {
    match base {
        B::Num => module.base.number,
        B::Str => module.base.string,
        B::Bool => module.base.boolean,
        B::Mixed => module.base.mixed,
        B::Undef => module.base.undefined,
        B::NumOrStr => {
            let variants = vec![module.base.number, module.base.string];
            module.union_type(type_scope, variants)
        }
        B::BoolOrUndef => {
            let variants = vec![module.base.boolean, module.base.undefined];
            module.union_type(type_scope, variants)
        }
    }
}

/// Populate the module scope with the global value bindings.
pub fn mix_base_globals(module: &mut ModuleScope) -> Result<(), GraphError> {
    let root = module.root;
    let type_scope = module.type_scope_of(root)?;

    let globals = [
        ("undefined", module.base.undefined),
        ("null", module.base.null),
        ("NaN", module.base.number),
        ("Infinity", module.base.number),
    ];
    for (name, ty) in globals {
        let variable = module.alloc_variable(ty, root, Loc::dummy());
        module.declare(root, name, variable);
    }

    // A minimal host object so member access has something real to
    // resolve against.
    let log = module.function_type(type_scope, vec![module.base.mixed], module.base.undefined);
    let console = module.object_type(type_scope, vec![("log".to_string(), log)]);
    let variable = module.alloc_variable(console, root, Loc::dummy());
    module.declare(root, "console", variable);

    Ok(())
}

/// Populate the module scope with one variable per operator label, each
/// carrying a function type encoding the operator's semantics.
pub fn mix_base_operators(module: &mut ModuleScope) -> Result<(), GraphError> {
    let root = module.root;
    let type_scope = module.type_scope_of(root)?;

    for sig in OPERATOR_TABLE.iter() {
        let overloads = sig
            .overloads
            .iter()
            .map(|(params, ret)| {
                let params = params
                    .iter()
                    .map(|b| resolve(module, type_scope, *b))
                    .collect();
                let ret = resolve(module, type_scope, *ret);
                module.function_type(type_scope, params, ret)
            })
            .collect::<Vec<_>>();
        let params = sig
            .params
            .iter()
            .map(|b| resolve(module, type_scope, *b))
            .collect();
        let ret = resolve(module, type_scope, sig.ret);
        let ty = module.function_type_with(type_scope, params, ret, None, overloads);
        let variable = module.alloc_variable(ty, root, Loc::dummy());
        module.declare(root, sig.label, variable);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operator_label_is_resolvable() {
        let mut module = ModuleScope::new();
        mix_base_globals(&mut module).unwrap();
        mix_base_operators(&mut module).unwrap();

        for sig in OPERATOR_TABLE.iter() {
            let variable = module
                .find_variable(module.root, sig.label)
                .unwrap_or_else(|| panic!("operator {:?} is not seeded", sig.label));
            let ty = module.variable(variable).ty;
            assert!(
                module.is_callable(ty),
                "operator {:?} must carry a function type",
                sig.label
            );
        }
    }

    #[test]
    fn globals_are_seeded() {
        let mut module = ModuleScope::new();
        mix_base_globals(&mut module).unwrap();
        for name in ["undefined", "null", "NaN", "Infinity", "console"] {
            assert!(module.find_variable(module.root, name).is_some());
        }
    }

    #[test]
    fn plus_carries_its_overloads() {
        let mut module = ModuleScope::new();
        mix_base_globals(&mut module).unwrap();
        mix_base_operators(&mut module).unwrap();
        let plus = module.find_variable(module.root, "+").unwrap();
        let ty = module.variable(plus).ty;
        assert_eq!(
            module.type_name(ty),
            "(number | string, number | string) => number | string"
        );
    }
}
