//! Call checking.
//!
//! Validates every call recorded in a scope against its target's
//! signature: arity, then per-argument assignability. Operators carry
//! overload sets; a call matching any overload outright is accepted
//! before the primary signature is consulted. Diagnostics are appended
//! in call order.

use crate::infer::is_assignable;
use crate::scope::{ModuleScope, ScopeId};
use crate::types::{TypeId, TypeKind};
use tern_common::Diagnostic;

pub fn check_calls(module: &ModuleScope, scope: ScopeId, errors: &mut Vec<Diagnostic>) {
    for call in &module.scope(scope).calls {
        let target_ty = module.variable(call.target).ty;
        let Some(signature) = module.callable_signature(target_ty) else {
            errors.push(Diagnostic::error(
                format!(
                    "Type \"{}\" is not callable",
                    module.type_name(target_ty)
                ),
                call.loc,
            ));
            continue;
        };
        let TypeKind::Function {
            params, overloads, ..
        } = module.type_kind(signature)
        else {
            continue;
        };

        let args: Vec<_> = call
            .arguments
            .iter()
            .map(|argument| module.lift_argument(*argument))
            .collect();

        if overloads
            .iter()
            .any(|overload| matches_overload(module, *overload, &args))
        {
            continue;
        }

        if args.len() != params.len() {
            errors.push(Diagnostic::error(
                format!(
                    "{} arguments expected, but {} given",
                    params.len(),
                    args.len()
                ),
                call.loc,
            ));
            continue;
        }

        for (arg, param) in args.iter().zip(params) {
            if !is_assignable(module, *arg, *param) {
                errors.push(Diagnostic::error(
                    format!(
                        "Type \"{}\" is incompatible with type \"{}\"",
                        module.type_name(*arg),
                        module.type_name(*param)
                    ),
                    call.loc,
                ));
            }
        }
    }
}

fn matches_overload(module: &ModuleScope, overload: TypeId, args: &[TypeId]) -> bool {
    let TypeKind::Function { params, .. } = module.type_kind(overload) else {
        return false;
    };
    params.len() == args.len()
        && args
            .iter()
            .zip(params)
            .all(|(arg, param)| is_assignable(module, *arg, *param))
}
