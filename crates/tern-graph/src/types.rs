//! The type lattice and per-scope interning.
//!
//! Types are identified by a canonical name and interned inside the type
//! scope that owns them: creating a type whose name already exists in the
//! target type scope yields the existing instance. Everything else in the
//! builder holds `TypeId`s.

use crate::scope::{ModuleScope, ScopeEntry, ScopeId, ScopeKey};
use serde::Serialize;

/// Unique identifier for a type in the module graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// The variants of the type lattice.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TypeKind {
    /// A base type (`number`, `mixed`, ...) or a string-literal type
    /// (quoted canonical name).
    Primitive,
    /// A type variable bound in a generic's local type scope.
    Var { constraint: Option<TypeId> },
    /// An object type with ordered named properties.
    Object { properties: Vec<(String, TypeId)> },
    /// A function type. `overloads` carries the more specific signatures
    /// of a polymorphic operator; call checking selects among them.
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
        throwable: Option<Vec<TypeId>>,
        overloads: Vec<TypeId>,
    },
    /// A parameterized type wrapping a function or object, carrying its
    /// own local type scope of type variables.
    Generic {
        params: Vec<TypeId>,
        local_scope: ScopeId,
        subordinate: TypeId,
    },
    /// An untagged union of types.
    Union { variants: Vec<TypeId> },
}

/// A type: a stable canonical name plus its lattice variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
}

impl Type {
    pub fn primitive(name: impl Into<String>) -> Self {
        Type {
            name: name.into(),
            kind: TypeKind::Primitive,
        }
    }

    pub fn var(name: impl Into<String>, constraint: Option<TypeId>) -> Self {
        Type {
            name: name.into(),
            kind: TypeKind::Var { constraint },
        }
    }
}

impl ModuleScope {
    // ── Interning ───────────────────────────────────────────────────────

    /// Intern `ty` in `type_scope`, keyed by its canonical name. If the
    /// name is already bound there, the existing instance is returned.
    pub fn intern_type(&mut self, type_scope: ScopeId, ty: Type) -> TypeId {
        let key = ScopeKey::Name(ty.name.clone());
        if let Some(ScopeEntry::Type(existing)) = self.scope(type_scope).body.get(&key) {
            return *existing;
        }
        let id = self.alloc_type(ty);
        self.scope_mut(type_scope)
            .body
            .insert(key, ScopeEntry::Type(id));
        id
    }

    /// Bind an additional name to an existing type in `type_scope`
    /// (type aliases). Returns `false` when the name is already taken.
    pub fn bind_type_name(&mut self, type_scope: ScopeId, name: &str, ty: TypeId) -> bool {
        let body = &mut self.scope_mut(type_scope).body;
        let key = ScopeKey::Name(name.to_string());
        if body.contains_key(&key) {
            return false;
        }
        body.insert(key, ScopeEntry::Type(ty));
        true
    }

    /// Look up a type name by walking the type scope chain outward.
    pub fn find_type(&self, from: ScopeId, name: &str) -> Option<TypeId> {
        let key = ScopeKey::Name(name.to_string());
        let mut current = from;
        while !current.is_none() {
            if let Some(ScopeEntry::Type(id)) = self.scope(current).body.get(&key) {
                return Some(*id);
            }
            current = self.scope(current).parent;
        }
        None
    }

    /// Look up a type name in `type_scope` only.
    pub fn find_type_local(&self, type_scope: ScopeId, name: &str) -> Option<TypeId> {
        match self
            .scope(type_scope)
            .body
            .get(&ScopeKey::Name(name.to_string()))
        {
            Some(ScopeEntry::Type(id)) => Some(*id),
            _ => None,
        }
    }

    // ── Constructors ────────────────────────────────────────────────────

    /// The string-literal type for `value` (used as the property-name
    /// argument of member access calls).
    pub fn string_literal(&mut self, type_scope: ScopeId, value: &str) -> TypeId {
        self.intern_type(type_scope, Type::primitive(format!("'{value}'")))
    }

    /// An object type with the given ordered properties.
    pub fn object_type(
        &mut self,
        type_scope: ScopeId,
        properties: Vec<(String, TypeId)>,
    ) -> TypeId {
        let name = self.object_type_name(&properties);
        self.intern_type(
            type_scope,
            Type {
                name,
                kind: TypeKind::Object { properties },
            },
        )
    }

    /// A plain function type `(params) => ret`.
    pub fn function_type(
        &mut self,
        type_scope: ScopeId,
        params: Vec<TypeId>,
        ret: TypeId,
    ) -> TypeId {
        self.function_type_with(type_scope, params, ret, None, Vec::new())
    }

    /// A function type with explicit throwable set and overload list.
    pub fn function_type_with(
        &mut self,
        type_scope: ScopeId,
        params: Vec<TypeId>,
        ret: TypeId,
        throwable: Option<Vec<TypeId>>,
        overloads: Vec<TypeId>,
    ) -> TypeId {
        let name = self.function_type_name(&params, ret);
        self.intern_type(
            type_scope,
            Type {
                name,
                kind: TypeKind::Function {
                    params,
                    ret,
                    throwable,
                    overloads,
                },
            },
        )
    }

    /// The union of `variants`: nested unions are flattened, duplicates
    /// dropped, and members ordered by canonical name. A union of one is
    /// that type; a union of none is `undefined`.
    pub fn union_type(&mut self, type_scope: ScopeId, variants: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        let mut pending = variants;
        while let Some(ty) = pending.pop() {
            match self.type_kind(ty) {
                TypeKind::Union { variants } => pending.extend(variants.iter().copied()),
                _ => {
                    if !flat.contains(&ty) {
                        flat.push(ty);
                    }
                }
            }
        }
        flat.sort_by(|a, b| self.type_name(*a).cmp(self.type_name(*b)));
        match flat.len() {
            0 => self.base.undefined,
            1 => flat[0],
            _ => {
                let name = flat
                    .iter()
                    .map(|v| self.type_name(*v).to_string())
                    .collect::<Vec<_>>()
                    .join(" | ");
                self.intern_type(
                    type_scope,
                    Type {
                        name,
                        kind: TypeKind::Union { variants: flat },
                    },
                )
            }
        }
    }

    // ── Canonical names ─────────────────────────────────────────────────

    pub fn function_type_name(&self, params: &[TypeId], ret: TypeId) -> String {
        let params = params
            .iter()
            .map(|p| self.type_name(*p).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("({}) => {}", params, self.type_name(ret))
    }

    pub fn object_type_name(&self, properties: &[(String, TypeId)]) -> String {
        if properties.is_empty() {
            return "{ }".to_string();
        }
        let props = properties
            .iter()
            .map(|(key, ty)| format!("{key}: {}", self.type_name(*ty)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{ {props} }}")
    }

    pub fn generic_type_name(&self, params: &[TypeId], subordinate: TypeId) -> String {
        let vars = params
            .iter()
            .map(|p| self.type_name(*p).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("<{vars}>{}", self.type_name(subordinate))
    }

    /// Whether a call target of this type can be invoked: a function
    /// type, or a generic wrapping one.
    pub fn is_callable(&self, ty: TypeId) -> bool {
        match self.type_kind(ty) {
            TypeKind::Function { .. } => true,
            TypeKind::Generic { subordinate, .. } => {
                matches!(self.type_kind(*subordinate), TypeKind::Function { .. })
            }
            _ => false,
        }
    }

    /// The function type behind a callable: itself, or the subordinate
    /// of a generic.
    pub fn callable_signature(&self, ty: TypeId) -> Option<TypeId> {
        match self.type_kind(ty) {
            TypeKind::Function { .. } => Some(ty),
            TypeKind::Generic { subordinate, .. } => {
                matches!(self.type_kind(*subordinate), TypeKind::Function { .. })
                    .then_some(*subordinate)
            }
            _ => None,
        }
    }
}
