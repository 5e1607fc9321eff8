//! Scope graph data model.
//!
//! The module scope graph is the central data structure of the builder:
//! a tree of lexical scopes populated with variable bindings, recorded
//! call sites, and a parallel chain of type scopes. Scopes, variables and
//! types reference each other freely, so everything lives in arenas owned
//! by `ModuleScope` and cross-references are integer ids.

use crate::types::{Type, TypeId, TypeKind};
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use tern_ast::{Node, NodeData};
use tern_common::{GraphError, Loc};

// =============================================================================
// Ids
// =============================================================================

/// Unique identifier for a scope in the module graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Unique identifier for a variable binding in the module graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VariableId(pub u32);

impl VariableId {
    pub const NONE: VariableId = VariableId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

// =============================================================================
// Scope
// =============================================================================

/// The kind of syntactic construct a scope belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    /// The module root.
    Module,
    /// A bare block, branch body, loop body, or try/catch block.
    Block,
    /// A function body (also used for class constructors).
    Function,
    /// An object literal.
    Object,
    /// A class body.
    Class,
}

/// A key in a scope body.
///
/// `TypeScope` is a distinguished constant rather than a reserved name so
/// it can never collide with a user binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// A named binding.
    Name(String),
    /// A child scope, keyed by the source range of its creator node.
    Loc(Loc),
    /// The sibling type scope of this scope.
    TypeScope,
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeKey::Name(name) => write!(f, "{name}"),
            ScopeKey::Loc(loc) => write!(f, "[{loc}]"),
            ScopeKey::TypeScope => write!(f, "[[TypeScope]]"),
        }
    }
}

impl Serialize for ScopeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An entry in a scope body: a variable binding, a child scope, or (in
/// type scopes) a named type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScopeEntry {
    Variable(VariableId),
    Scope(ScopeId),
    Type(TypeId),
}

/// An argument recorded at a call site: either an already-resolved type
/// or a reference to the variable the argument names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Type(TypeId),
    Variable(VariableId),
}

/// A recorded invocation: the call graph is a flat list of these per
/// function scope, in source order.
#[derive(Clone, Debug, Serialize)]
pub struct CallMeta {
    pub target: VariableId,
    pub arguments: Vec<CallArg>,
    pub loc: Loc,
    /// The operator label or callee name this call was reduced from.
    pub label: String,
}

/// A lexical scope.
#[derive(Clone, Debug, Serialize)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Parent scope; `NONE` only for the module root and the root type
    /// scope.
    pub parent: ScopeId,
    /// Bindings, child scopes and (for type scopes) named types.
    pub body: FxHashMap<ScopeKey, ScopeEntry>,
    /// The binding whose definition opened this scope, for function and
    /// class scopes.
    pub declaration: VariableId,
    /// Calls recorded in this scope. Only function-kind scopes and the
    /// module root accumulate calls.
    pub calls: Vec<CallMeta>,
    /// Types that may escape this scope via exception. `Some` marks a
    /// throw-collecting boundary (function scopes, try blocks); `None`
    /// means throws propagate past this scope.
    pub throwable: Option<Vec<TypeId>>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: ScopeId) -> Self {
        Scope {
            kind,
            parent,
            body: FxHashMap::default(),
            declaration: VariableId::NONE,
            calls: Vec::new(),
            throwable: None,
        }
    }

    /// Whether calls recorded under this scope stay here.
    pub fn accumulates_calls(&self) -> bool {
        matches!(self.kind, ScopeKind::Module | ScopeKind::Function)
    }
}

/// A variable binding: its (mutable during inference) type, the scope
/// that owns it, and where it was declared.
#[derive(Clone, Debug, Serialize)]
pub struct VariableInfo {
    pub ty: TypeId,
    pub parent: ScopeId,
    pub meta: Loc,
    /// Aggregated error type of calls to this binding, for functions
    /// whose body may throw.
    pub throwable: Option<TypeId>,
}

// =============================================================================
// Module scope
// =============================================================================

/// Well-known types seeded into the module type scope at construction.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BaseTypes {
    pub undefined: TypeId,
    pub null: TypeId,
    pub mixed: TypeId,
    pub number: TypeId,
    pub string: TypeId,
    pub boolean: TypeId,
}

/// The root of a module's scope graph. Owns the scope, variable and type
/// arenas; every id in the graph indexes into these.
#[derive(Debug, Serialize)]
pub struct ModuleScope {
    scopes: Vec<Scope>,
    variables: Vec<VariableInfo>,
    types: Vec<Type>,
    pub root: ScopeId,
    pub base: BaseTypes,
    /// Bindings exported from the module, by export name.
    pub exports: FxHashMap<String, VariableId>,
}

impl ModuleScope {
    pub fn new() -> Self {
        let mut module = ModuleScope {
            scopes: Vec::new(),
            variables: Vec::new(),
            types: Vec::new(),
            root: ScopeId::NONE,
            base: BaseTypes {
                undefined: TypeId::NONE,
                null: TypeId::NONE,
                mixed: TypeId::NONE,
                number: TypeId::NONE,
                string: TypeId::NONE,
                boolean: TypeId::NONE,
            },
            exports: FxHashMap::default(),
        };
        let root = module.alloc_scope(ScopeKind::Module, ScopeId::NONE);
        module.root = root;
        let type_scope = module.alloc_scope(ScopeKind::Block, ScopeId::NONE);
        module
            .scope_mut(root)
            .body
            .insert(ScopeKey::TypeScope, ScopeEntry::Scope(type_scope));
        module.base = BaseTypes {
            undefined: module.intern_type(type_scope, Type::primitive("undefined")),
            null: module.intern_type(type_scope, Type::primitive("null")),
            mixed: module.intern_type(type_scope, Type::primitive("mixed")),
            number: module.intern_type(type_scope, Type::primitive("number")),
            string: module.intern_type(type_scope, Type::primitive("string")),
            boolean: module.intern_type(type_scope, Type::primitive("boolean")),
        };
        module
    }

    // ── Arena access ────────────────────────────────────────────────────

    pub fn alloc_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn alloc_variable(&mut self, ty: TypeId, parent: ScopeId, meta: Loc) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(VariableInfo {
            ty,
            parent,
            meta,
            throwable: None,
        });
        id
    }

    pub fn variable(&self, id: VariableId) -> &VariableInfo {
        &self.variables[id.0 as usize]
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut VariableInfo {
        &mut self.variables[id.0 as usize]
    }

    pub(crate) fn alloc_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn type_of(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.0 as usize].name
    }

    pub(crate) fn type_kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize].kind
    }

    // ── Scope registration and lookup ───────────────────────────────────

    /// Register a binding under `name` in `scope`. Returns `false` when
    /// the name is already taken (redeclaration).
    pub fn declare(&mut self, scope: ScopeId, name: &str, variable: VariableId) -> bool {
        let body = &mut self.scope_mut(scope).body;
        let key = ScopeKey::Name(name.to_string());
        if body.contains_key(&key) {
            return false;
        }
        tracing::debug!(name, scope = scope.0, "declared binding");
        body.insert(key, ScopeEntry::Variable(variable));
        true
    }

    /// Register an inner scope in the module body under its creator
    /// node's source range, so any pass can retrieve it later.
    pub fn register_scope(&mut self, creator: Loc, scope: ScopeId) {
        let root = self.root;
        self.scope_mut(root)
            .body
            .insert(ScopeKey::Loc(creator), ScopeEntry::Scope(scope));
    }

    /// Find the scope created by the node at `loc`, if any.
    pub fn scope_by_loc(&self, loc: Loc) -> Option<ScopeId> {
        match self.scope(self.root).body.get(&ScopeKey::Loc(loc)) {
            Some(ScopeEntry::Scope(id)) => Some(*id),
            _ => None,
        }
    }

    /// The scope the children of `parent` belong to: the module root for
    /// the program node, otherwise the scope registered for the node.
    pub fn scope_of_parent(&self, parent: &Node) -> Result<ScopeId, GraphError> {
        if matches!(parent.data, NodeData::Program { .. }) {
            return Ok(self.root);
        }
        self.scope_by_loc(parent.loc).ok_or_else(|| {
            GraphError::invariant(format!(
                "no scope registered for {} at {}",
                parent.kind_name(),
                parent.loc
            ))
        })
    }

    /// Look up a binding by walking the scope chain outward from `from`.
    pub fn find_variable(&self, from: ScopeId, name: &str) -> Option<VariableId> {
        let key = ScopeKey::Name(name.to_string());
        let mut current = from;
        while !current.is_none() {
            if let Some(ScopeEntry::Variable(id)) = self.scope(current).body.get(&key) {
                return Some(*id);
            }
            current = self.scope(current).parent;
        }
        None
    }

    /// Look up a binding in `scope` only, without walking the chain.
    pub fn find_variable_local(&self, scope: ScopeId, name: &str) -> Option<VariableId> {
        match self.scope(scope).body.get(&ScopeKey::Name(name.to_string())) {
            Some(ScopeEntry::Variable(id)) => Some(*id),
            _ => None,
        }
    }

    /// Resolve the type scope governing `scope` by walking the value
    /// scope chain until a sibling type scope is found.
    pub fn type_scope_of(&self, scope: ScopeId) -> Result<ScopeId, GraphError> {
        let mut current = scope;
        while !current.is_none() {
            match self.scope(current).body.get(&ScopeKey::TypeScope) {
                Some(ScopeEntry::Scope(id)) => return Ok(*id),
                Some(_) => {
                    return Err(GraphError::invariant(
                        "non-scope entry under the type scope key",
                    ));
                }
                None => current = self.scope(current).parent,
            }
        }
        Err(GraphError::invariant(
            "no type scope reachable from this scope",
        ))
    }

    /// The nearest scope that accumulates calls: the enclosing function
    /// scope, or the module root when outside any function.
    pub fn nearest_function_scope(&self, from: ScopeId) -> ScopeId {
        let mut current = from;
        while !current.is_none() {
            if self.scope(current).accumulates_calls() {
                return current;
            }
            current = self.scope(current).parent;
        }
        self.root
    }

    /// The nearest scope with a throwable list (try block or function
    /// scope), if any.
    pub fn nearest_throwable(&self, from: ScopeId) -> Option<ScopeId> {
        let mut current = from;
        while !current.is_none() {
            if self.scope(current).throwable.is_some() {
                return Some(current);
            }
            current = self.scope(current).parent;
        }
        None
    }

    /// Lift a recorded call argument to its type.
    pub fn lift_argument(&self, argument: CallArg) -> TypeId {
        match argument {
            CallArg::Type(ty) => ty,
            CallArg::Variable(variable) => self.variable(variable).ty,
        }
    }

    /// Append a type to the nearest throwable scope. A throw with no
    /// catching boundary escapes the module and is dropped.
    pub fn push_throwable(&mut self, from: ScopeId, ty: TypeId) {
        if let Some(scope) = self.nearest_throwable(from)
            && let Some(list) = self.scope_mut(scope).throwable.as_mut()
            && !list.contains(&ty)
        {
            list.push(ty);
        }
    }
}

impl Default for ModuleScope {
    fn default() -> Self {
        Self::new()
    }
}
