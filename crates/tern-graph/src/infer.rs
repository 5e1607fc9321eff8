//! The inference oracle.
//!
//! Everything the builder needs to know about types but does not track
//! itself: materializing annotation trees, inferring a node's type from
//! its form, simulating invocation of a callable (with overload selection
//! and generic specialization), refining a generic function signature
//! from its body evidence, and computing the error type of a try block.

use crate::scope::{ModuleScope, ScopeId, ScopeKind};
use crate::types::{Type, TypeId, TypeKind};
use rustc_hash::FxHashMap;
use tern_ast::{Node, NodeData};
use tern_common::{GraphError, Loc};

/// The signature computed for a function-like declaration: its type, the
/// argument types its parameters bind to, and the local type scope when
/// the signature is generic.
pub struct FnSignature {
    pub ty: TypeId,
    pub params: Vec<TypeId>,
    pub local_type_scope: Option<ScopeId>,
}

// =============================================================================
// Annotation materialization
// =============================================================================

/// Materialize a type from an annotation tree, resolving named types
/// through the type scope chain starting at `type_scope`.
pub fn type_from_annotation(
    module: &mut ModuleScope,
    type_scope: ScopeId,
    node: &Node,
) -> Result<TypeId, GraphError> {
    match &node.data {
        NodeData::TypeAnnotation { type_annotation } => {
            type_from_annotation(module, type_scope, type_annotation)
        }
        NodeData::NumberTypeAnnotation {} => Ok(module.base.number),
        NodeData::StringTypeAnnotation {} => Ok(module.base.string),
        NodeData::BooleanTypeAnnotation {} => Ok(module.base.boolean),
        NodeData::MixedTypeAnnotation {} => Ok(module.base.mixed),
        NodeData::VoidTypeAnnotation {} => Ok(module.base.undefined),
        NodeData::GenericTypeAnnotation {
            id,
            type_parameters,
        } => {
            let name = id.identifier_name().ok_or_else(|| {
                GraphError::shape("Type reference must be a plain name", id.loc)
            })?;
            let base = module.find_type(type_scope, name).ok_or_else(|| {
                GraphError::shape(format!("Type \"{name}\" is not defined"), node.loc)
            })?;
            match type_parameters {
                None => Ok(base),
                Some(instantiation) => {
                    apply_type_arguments(module, type_scope, base, instantiation, node.loc)
                }
            }
        }
        NodeData::ObjectTypeAnnotation { properties } => {
            let mut props = Vec::with_capacity(properties.len());
            for property in properties {
                if let NodeData::ObjectTypeProperty { key, value } = &property.data {
                    let key_name = key.identifier_name().ok_or_else(|| {
                        GraphError::shape("Property key must be a plain name", key.loc)
                    })?;
                    let value = type_from_annotation(module, type_scope, value)?;
                    props.push((key_name.to_string(), value));
                }
            }
            Ok(module.object_type(type_scope, props))
        }
        NodeData::FunctionTypeAnnotation {
            params,
            return_type,
        } => {
            let mut param_types = Vec::with_capacity(params.len());
            for param in params {
                if let NodeData::FunctionTypeParam {
                    type_annotation, ..
                } = &param.data
                {
                    param_types.push(type_from_annotation(module, type_scope, type_annotation)?);
                }
            }
            let ret = type_from_annotation(module, type_scope, return_type)?;
            Ok(module.function_type(type_scope, param_types, ret))
        }
        NodeData::UnionTypeAnnotation { types } => {
            let mut variants = Vec::with_capacity(types.len());
            for ty in types {
                variants.push(type_from_annotation(module, type_scope, ty)?);
            }
            Ok(module.union_type(type_scope, variants))
        }
        _ => Err(GraphError::shape(
            format!("Unsupported type annotation \"{}\"", node.kind_name()),
            node.loc,
        )),
    }
}

/// Specialize a generic by the explicit type arguments of an annotation
/// (`Box<number>`).
fn apply_type_arguments(
    module: &mut ModuleScope,
    type_scope: ScopeId,
    base: TypeId,
    instantiation: &Node,
    loc: Loc,
) -> Result<TypeId, GraphError> {
    let NodeData::TypeParameterInstantiation { params: args } = &instantiation.data else {
        return Err(GraphError::shape("Malformed type argument list", loc));
    };
    let TypeKind::Generic {
        params,
        subordinate,
        ..
    } = module.type_kind(base)
    else {
        return Err(GraphError::shape(
            format!("Type \"{}\" is not generic", module.type_name(base)),
            loc,
        ));
    };
    let (params, subordinate) = (params.clone(), *subordinate);
    if params.len() != args.len() {
        return Err(GraphError::shape(
            format!(
                "{} type arguments expected, but {} given",
                params.len(),
                args.len()
            ),
            loc,
        ));
    }
    let mut map = FxHashMap::default();
    for (param, arg) in params.iter().zip(args) {
        let resolved = type_from_annotation(module, type_scope, arg)?;
        map.insert(*param, resolved);
    }
    Ok(substitute(module, type_scope, subordinate, &map))
}

// =============================================================================
// Node inference
// =============================================================================

/// Infer the type of a node from its form, in the context of `scope`.
/// Literals widen to their base primitive; loop-binding markers map to
/// the key/value types of iteration.
pub fn inference_type_for_node(
    module: &mut ModuleScope,
    scope: ScopeId,
    node: &Node,
) -> Result<TypeId, GraphError> {
    match &node.data {
        NodeData::NumericLiteral { .. } => Ok(module.base.number),
        NodeData::StringLiteral { .. } => Ok(module.base.string),
        NodeData::BooleanLiteral { .. } => Ok(module.base.boolean),
        NodeData::NullLiteral {} => Ok(module.base.null),
        NodeData::PureKey { .. } => Ok(module.base.string),
        NodeData::PureValue { .. } => Ok(module.base.mixed),
        NodeData::Identifier { name, .. } => module
            .find_variable(scope, name)
            .map(|variable| module.variable(variable).ty)
            .ok_or_else(|| {
                GraphError::shape(format!("Variable \"{name}\" is not defined"), node.loc)
            }),
        NodeData::ObjectExpression { properties } => {
            let type_scope = module.type_scope_of(scope)?;
            let mut props = Vec::with_capacity(properties.len());
            for property in properties {
                match &property.data {
                    NodeData::ObjectProperty { key, value } => {
                        if let Some(key_name) = key.identifier_name() {
                            let value = inference_type_for_node(module, scope, value)?;
                            props.push((key_name.to_string(), value));
                        }
                    }
                    NodeData::ObjectMethod { key, .. } => {
                        if let Some(key_name) = key.identifier_name()
                            && let Some(method_scope) = module.scope_by_loc(property.loc)
                        {
                            let declaration = module.scope(method_scope).declaration;
                            props.push((key_name.to_string(), module.variable(declaration).ty));
                        }
                    }
                    _ => {}
                }
            }
            Ok(module.object_type(type_scope, props))
        }
        NodeData::FunctionExpression { .. }
        | NodeData::ArrowFunctionExpression { .. }
        | NodeData::FunctionDeclaration { .. } => match module.scope_by_loc(node.loc) {
            Some(fn_scope) => {
                let declaration = module.scope(fn_scope).declaration;
                Ok(module.variable(declaration).ty)
            }
            None => Ok(module.base.mixed),
        },
        _ => Ok(module.base.mixed),
    }
}

// =============================================================================
// Function signatures
// =============================================================================

/// Compute the declared signature of a function-like node. Unannotated
/// parameters become fresh type variables bound in a new local type
/// scope, and the whole signature is wrapped in a generic; the return
/// type defaults to the `undefined` sentinel until late inference.
pub fn function_signature(
    module: &mut ModuleScope,
    enclosing_ts: ScopeId,
    node: &Node,
) -> Result<FnSignature, GraphError> {
    let (params, return_type, type_parameters) = match &node.data {
        NodeData::FunctionDeclaration {
            params,
            return_type,
            type_parameters,
            ..
        }
        | NodeData::FunctionExpression {
            params,
            return_type,
            type_parameters,
            ..
        }
        | NodeData::ArrowFunctionExpression {
            params,
            return_type,
            type_parameters,
            ..
        } => (params, return_type.as_deref(), type_parameters.as_deref()),
        NodeData::ClassMethod {
            params,
            return_type,
            ..
        }
        | NodeData::ObjectMethod {
            params,
            return_type,
            ..
        } => (params, return_type.as_deref(), None),
        _ => {
            return Err(GraphError::invariant(format!(
                "cannot compute a function signature for {}",
                node.kind_name()
            )));
        }
    };

    let mut local: Option<ScopeId> = None;
    let mut type_vars: Vec<TypeId> = Vec::new();

    // Declared type parameters come first.
    if let Some(declaration) = type_parameters
        && let NodeData::TypeParameterDeclaration {
            params: declared, ..
        } = &declaration.data
    {
        let local_ts =
            *local.get_or_insert_with(|| module.alloc_scope(ScopeKind::Block, enclosing_ts));
        for param in declared {
            if let NodeData::TypeParameter { name, bound } = &param.data {
                let constraint = match bound {
                    Some(bound) => Some(type_from_annotation(module, local_ts, bound)?),
                    None => None,
                };
                let var = module.intern_type(local_ts, Type::var(name.clone(), constraint));
                type_vars.push(var);
            }
        }
    }

    let mut fresh = 0u32;
    let mut param_types = Vec::with_capacity(params.len());
    for param in params {
        let annotation = match &param.data {
            NodeData::Identifier {
                type_annotation, ..
            } => type_annotation.as_deref(),
            _ => None,
        };
        let ty = match annotation {
            Some(annotation) => {
                let ts = local.unwrap_or(enclosing_ts);
                type_from_annotation(module, ts, annotation)?
            }
            None => {
                let local_ts = *local
                    .get_or_insert_with(|| module.alloc_scope(ScopeKind::Block, enclosing_ts));
                let var = module.intern_type(local_ts, Type::var(format!("T{fresh}"), None));
                fresh += 1;
                type_vars.push(var);
                var
            }
        };
        param_types.push(ty);
    }

    let ret = match return_type {
        Some(annotation) => {
            let ts = local.unwrap_or(enclosing_ts);
            type_from_annotation(module, ts, annotation)?
        }
        None => module.base.undefined,
    };

    let ty = match local {
        Some(local_ts) => {
            let subordinate = module.function_type(local_ts, param_types.clone(), ret);
            let name = module.generic_type_name(&type_vars, subordinate);
            module.intern_type(
                local_ts,
                Type {
                    name,
                    kind: TypeKind::Generic {
                        params: type_vars,
                        local_scope: local_ts,
                        subordinate,
                    },
                },
            )
        }
        None => module.function_type(enclosing_ts, param_types.clone(), ret),
    };

    Ok(FnSignature {
        ty,
        params: param_types,
        local_type_scope: local,
    })
}

/// Compute the signature of a class declaration: a constructor function
/// returning an object type named after the class, registered in the
/// enclosing type scope so annotations can reference it.
pub fn class_signature(
    module: &mut ModuleScope,
    enclosing_ts: ScopeId,
    name: Option<&str>,
) -> Result<TypeId, GraphError> {
    let instance = match name {
        Some(name) => module.intern_type(
            enclosing_ts,
            Type {
                name: name.to_string(),
                kind: TypeKind::Object {
                    properties: Vec::new(),
                },
            },
        ),
        None => module.object_type(enclosing_ts, Vec::new()),
    };
    Ok(module.function_type(enclosing_ts, Vec::new(), instance))
}

// =============================================================================
// Invocation
// =============================================================================

/// Simulate applying `callable` to `args`: overload selection for plain
/// function types, parameter-driven specialization for generics.
pub fn get_invocation_type(
    module: &mut ModuleScope,
    type_scope: ScopeId,
    callable: TypeId,
    args: &[TypeId],
    loc: Loc,
) -> Result<TypeId, GraphError> {
    match module.type_kind(callable) {
        TypeKind::Function {
            ret, overloads, ..
        } => {
            let (ret, overloads) = (*ret, overloads.clone());
            for overload in overloads {
                if let TypeKind::Function {
                    params, ret: overload_ret, ..
                } = module.type_kind(overload)
                {
                    let (params, overload_ret) = (params.clone(), *overload_ret);
                    if params.len() == args.len()
                        && args
                            .iter()
                            .zip(&params)
                            .all(|(arg, param)| is_assignable(module, *arg, *param))
                    {
                        return Ok(overload_ret);
                    }
                }
            }
            Ok(ret)
        }
        TypeKind::Generic {
            subordinate, ..
        } => {
            let subordinate = *subordinate;
            let TypeKind::Function { params, ret, .. } = module.type_kind(subordinate) else {
                return Err(GraphError::shape(
                    format!("Type \"{}\" is not callable", module.type_name(callable)),
                    loc,
                ));
            };
            let (params, ret) = (params.clone(), *ret);
            let mut map = FxHashMap::default();
            for (param, arg) in params.iter().zip(args) {
                if matches!(module.type_kind(*param), TypeKind::Var { .. }) {
                    map.entry(*param).or_insert(*arg);
                }
            }
            Ok(substitute(module, type_scope, ret, &map))
        }
        _ => Err(GraphError::shape(
            format!("Type \"{}\" is not callable", module.type_name(callable)),
            loc,
        )),
    }
}

/// Replace type variables in `ty` according to `map`, interning any
/// rebuilt compound types in `type_scope`.
pub fn substitute(
    module: &mut ModuleScope,
    type_scope: ScopeId,
    ty: TypeId,
    map: &FxHashMap<TypeId, TypeId>,
) -> TypeId {
    if let Some(replacement) = map.get(&ty) {
        return *replacement;
    }
    match module.type_kind(ty).clone() {
        TypeKind::Primitive | TypeKind::Var { .. } | TypeKind::Generic { .. } => ty,
        TypeKind::Union { variants } => {
            let variants = variants
                .into_iter()
                .map(|variant| substitute(module, type_scope, variant, map))
                .collect();
            module.union_type(type_scope, variants)
        }
        TypeKind::Object { properties } => {
            let properties = properties
                .into_iter()
                .map(|(key, value)| (key, substitute(module, type_scope, value, map)))
                .collect();
            module.object_type(type_scope, properties)
        }
        TypeKind::Function {
            params,
            ret,
            throwable,
            overloads,
        } => {
            let params = params
                .into_iter()
                .map(|param| substitute(module, type_scope, param, map))
                .collect();
            let ret = substitute(module, type_scope, ret, map);
            module.function_type_with(type_scope, params, ret, throwable, overloads)
        }
    }
}

// =============================================================================
// Late inference
// =============================================================================

/// Refine a function signature from body evidence: the return type of a
/// signature still carrying the `undefined` sentinel becomes the union of
/// the argument types of the `"return"` calls recorded in the function
/// scope. The binding's type is reassigned, never mutated in place, so
/// interned instances stay shared.
pub fn inference_function_type_by_scope(
    module: &mut ModuleScope,
    fn_scope: ScopeId,
) -> Result<(), GraphError> {
    let declaration = module.scope(fn_scope).declaration;
    if declaration.is_none() {
        return Ok(());
    }
    let evidence: Vec<TypeId> = module
        .scope(fn_scope)
        .calls
        .iter()
        .filter(|call| call.label == "return")
        .filter_map(|call| call.arguments.first())
        .map(|argument| module.lift_argument(*argument))
        .collect();
    if evidence.is_empty() {
        return Ok(());
    }

    let ty = module.variable(declaration).ty;
    let refined = match module.type_kind(ty).clone() {
        TypeKind::Generic {
            params,
            local_scope,
            subordinate,
        } => {
            let TypeKind::Function {
                params: fn_params,
                ret,
                ..
            } = module.type_kind(subordinate).clone()
            else {
                return Ok(());
            };
            if ret != module.base.undefined {
                return Ok(());
            }
            let ret = module.union_type(local_scope, evidence);
            let subordinate = module.function_type(local_scope, fn_params, ret);
            let name = module.generic_type_name(&params, subordinate);
            Some(module.intern_type(
                local_scope,
                Type {
                    name,
                    kind: TypeKind::Generic {
                        params,
                        local_scope,
                        subordinate,
                    },
                },
            ))
        }
        TypeKind::Function { params, ret, .. } if ret == module.base.undefined => {
            let type_scope = module.type_scope_of(fn_scope)?;
            let ret = module.union_type(type_scope, evidence);
            Some(module.function_type(type_scope, params, ret))
        }
        _ => None,
    };

    if let Some(refined) = refined {
        tracing::debug!(
            from = module.type_name(ty),
            to = module.type_name(refined),
            "refined function signature from body evidence"
        );
        module.variable_mut(declaration).ty = refined;
    }
    Ok(())
}

/// The type of values a try block can throw: the union of its recorded
/// throwable set, or `mixed` when nothing was tracked.
pub fn inference_error_type(
    module: &mut ModuleScope,
    try_scope: ScopeId,
) -> Result<TypeId, GraphError> {
    let list = module.scope(try_scope).throwable.clone().unwrap_or_default();
    if list.is_empty() {
        return Ok(module.base.mixed);
    }
    let type_scope = module.type_scope_of(try_scope)?;
    Ok(module.union_type(type_scope, list))
}

// =============================================================================
// Assignability
// =============================================================================

/// Structural assignability, deliberately lenient around type variables
/// (the checker treats an unconstrained variable as compatible in both
/// directions).
pub fn is_assignable(module: &ModuleScope, from: TypeId, to: TypeId) -> bool {
    if from == to || to == module.base.mixed {
        return true;
    }
    // A quoted string-literal type flows into `string`.
    if to == module.base.string
        && matches!(module.type_kind(from), TypeKind::Primitive)
        && module.type_name(from).starts_with('\'')
    {
        return true;
    }
    match (module.type_kind(from), module.type_kind(to)) {
        (TypeKind::Var { constraint }, _) => match constraint {
            Some(constraint) => is_assignable(module, *constraint, to),
            None => true,
        },
        (_, TypeKind::Var { constraint }) => match constraint {
            Some(constraint) => is_assignable(module, from, *constraint),
            None => true,
        },
        // A union flows into a target when every member does; checking
        // the source side first keeps union-to-wider-union sound.
        (TypeKind::Union { variants }, _) => variants
            .iter()
            .all(|variant| is_assignable(module, *variant, to)),
        (_, TypeKind::Union { variants }) => variants
            .iter()
            .any(|variant| is_assignable(module, from, *variant)),
        (
            TypeKind::Object {
                properties: from_props,
            },
            TypeKind::Object {
                properties: to_props,
            },
        ) => to_props.iter().all(|(key, to_ty)| {
            from_props
                .iter()
                .find(|(from_key, _)| from_key == key)
                .is_some_and(|(_, from_ty)| is_assignable(module, *from_ty, *to_ty))
        }),
        (
            TypeKind::Function {
                params: from_params,
                ret: from_ret,
                ..
            },
            TypeKind::Function {
                params: to_params,
                ret: to_ret,
                ..
            },
        ) => {
            from_params.len() == to_params.len()
                && from_params
                    .iter()
                    .zip(to_params)
                    .all(|(a, b)| is_assignable(module, *a, *b) || is_assignable(module, *b, *a))
                && is_assignable(module, *from_ret, *to_ret)
        }
        _ => false,
    }
}
