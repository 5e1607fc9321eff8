//! AST node taxonomy.
//!
//! The AST is produced by an external parser and arrives as a JSON tree of
//! ESTree-style nodes: every node carries a `type` tag, a `loc` range, and
//! form-specific children. `NodeData` mirrors that taxonomy as a tagged
//! enum so a module tree deserializes directly with serde.
//!
//! Two fields are ours, not the parser's: `uid` (assigned after
//! normalization, used to key per-node work tables) and the synthesized
//! fields the normalization shims add (`exportAs`, `catchBlock`, pure-key
//! and pure-value markers).

use serde::{Deserialize, Serialize};
use tern_common::Loc;

/// A single AST node: a source range plus the form-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable per-build node id, assigned by `index_nodes` after
    /// normalization. Zero until then.
    #[serde(skip)]
    pub uid: u32,
    #[serde(default)]
    pub loc: Loc,
    #[serde(flatten)]
    pub data: NodeData,
}

impl Node {
    /// Create a synthesized node (normalization shims, tests).
    pub fn synthetic(loc: Loc, data: NodeData) -> Self {
        Node { uid: 0, loc, data }
    }

    /// The ESTree type tag of this node.
    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }

    /// Whether this node opens a lexical scope of its own.
    ///
    /// Function bodies and class bodies are claimed by the scope of the
    /// node that owns them and are handled through `is_scope_body`.
    pub fn creates_scope(&self) -> bool {
        matches!(
            self.data,
            NodeData::Program { .. }
                | NodeData::BlockStatement { .. }
                | NodeData::ClassBody { .. }
                | NodeData::ObjectExpression { .. }
                | NodeData::FunctionDeclaration { .. }
                | NodeData::FunctionExpression { .. }
                | NodeData::ArrowFunctionExpression { .. }
                | NodeData::ClassDeclaration { .. }
                | NodeData::ClassExpression { .. }
                | NodeData::ClassMethod { .. }
                | NodeData::ObjectMethod { .. }
        )
    }

    /// Whether this node is one of the function-like declaration forms.
    pub fn is_function_kind(&self) -> bool {
        matches!(
            self.data,
            NodeData::FunctionDeclaration { .. }
                | NodeData::FunctionExpression { .. }
                | NodeData::ArrowFunctionExpression { .. }
                | NodeData::ClassMethod { .. }
                | NodeData::ObjectMethod { .. }
        )
    }

    /// Whether `child` is the body this node claims for its own scope:
    /// the block of a function form, or the `ClassBody` of a class.
    pub fn is_scope_body(&self, child: &Node) -> bool {
        match &self.data {
            NodeData::FunctionDeclaration { body, .. }
            | NodeData::FunctionExpression { body, .. }
            | NodeData::ArrowFunctionExpression { body, .. }
            | NodeData::ClassMethod { body, .. }
            | NodeData::ObjectMethod { body, .. }
            | NodeData::ClassDeclaration { body, .. }
            | NodeData::ClassExpression { body, .. } => std::ptr::eq(body.as_ref(), child),
            _ => false,
        }
    }

    /// Whether `child` is the block claimed by this function form.
    /// Statements inside such a block belong to the function scope.
    pub fn is_function_body(&self, child: &Node) -> bool {
        self.is_function_kind() && self.is_scope_body(child)
    }

    /// The identifier name of this node, if it is an `Identifier`.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Form-specific node payloads, tagged by the ESTree `type` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeData {
    // ── Module structure ────────────────────────────────────────────────
    Program {
        #[serde(default)]
        body: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BlockStatement {
        #[serde(default)]
        body: Vec<Node>,
        /// Back-reference to the catch clause guarding this block,
        /// synthesized by the try/catch link shim.
        #[serde(default)]
        catch_block: Option<Box<Node>>,
    },
    EmptyStatement {},

    // ── Declarations ────────────────────────────────────────────────────
    VariableDeclaration {
        kind: String,
        #[serde(default)]
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        #[serde(default)]
        init: Option<Box<Node>>,
        /// Export name synthesized by the export-annotation shim.
        #[serde(default)]
        export_as: Option<String>,
    },
    FunctionDeclaration {
        #[serde(default)]
        id: Option<Box<Node>>,
        #[serde(default)]
        params: Vec<Node>,
        body: Box<Node>,
        #[serde(default)]
        return_type: Option<Box<Node>>,
        #[serde(default)]
        type_parameters: Option<Box<Node>>,
        #[serde(default)]
        export_as: Option<String>,
    },
    FunctionExpression {
        #[serde(default)]
        id: Option<Box<Node>>,
        #[serde(default)]
        params: Vec<Node>,
        body: Box<Node>,
        #[serde(default)]
        return_type: Option<Box<Node>>,
        #[serde(default)]
        type_parameters: Option<Box<Node>>,
    },
    ArrowFunctionExpression {
        #[serde(default)]
        params: Vec<Node>,
        body: Box<Node>,
        #[serde(default)]
        return_type: Option<Box<Node>>,
        #[serde(default)]
        type_parameters: Option<Box<Node>>,
    },
    ClassDeclaration {
        #[serde(default)]
        id: Option<Box<Node>>,
        body: Box<Node>,
        #[serde(default)]
        export_as: Option<String>,
    },
    ClassExpression {
        #[serde(default)]
        id: Option<Box<Node>>,
        body: Box<Node>,
    },
    ClassBody {
        #[serde(default)]
        body: Vec<Node>,
    },
    ClassMethod {
        key: Box<Node>,
        #[serde(default)]
        params: Vec<Node>,
        body: Box<Node>,
        #[serde(default)]
        return_type: Option<Box<Node>>,
    },

    // ── Object literals ─────────────────────────────────────────────────
    ObjectExpression {
        #[serde(default)]
        properties: Vec<Node>,
    },
    ObjectProperty {
        key: Box<Node>,
        value: Box<Node>,
    },
    ObjectMethod {
        key: Box<Node>,
        #[serde(default)]
        params: Vec<Node>,
        body: Box<Node>,
        #[serde(default)]
        return_type: Option<Box<Node>>,
    },

    // ── Control flow ────────────────────────────────────────────────────
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        #[serde(default)]
        alternate: Option<Box<Node>>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    ForStatement {
        #[serde(default)]
        init: Option<Box<Node>>,
        #[serde(default)]
        test: Option<Box<Node>>,
        #[serde(default)]
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        #[serde(default)]
        left: Option<Box<Node>>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForOfStatement {
        #[serde(default)]
        left: Option<Box<Node>>,
        right: Box<Node>,
        body: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        #[serde(default)]
        handler: Option<Box<Node>>,
        #[serde(default)]
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        #[serde(default)]
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    ReturnStatement {
        #[serde(default)]
        argument: Option<Box<Node>>,
    },
    BreakStatement {},
    ContinueStatement {},

    // ── Expressions ─────────────────────────────────────────────────────
    Identifier {
        name: String,
        #[serde(default)]
        type_annotation: Option<Box<Node>>,
    },
    NumericLiteral {
        value: f64,
    },
    StringLiteral {
        value: String,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral {},
    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryExpression {
        operator: String,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: String,
        #[serde(default)]
        prefix: bool,
        argument: Box<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        #[serde(default)]
        computed: bool,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    ArrayExpression {
        #[serde(default)]
        elements: Vec<Node>,
    },

    // ── Exports (unwrapped by the export-annotation shim) ───────────────
    ExportNamedDeclaration {
        #[serde(default)]
        declaration: Option<Box<Node>>,
    },
    ExportDefaultDeclaration {
        declaration: Box<Node>,
    },

    // ── Type aliases and annotations ────────────────────────────────────
    TypeAlias {
        id: Box<Node>,
        #[serde(default)]
        type_parameters: Option<Box<Node>>,
        right: Box<Node>,
        #[serde(default)]
        export_as: Option<String>,
    },
    TypeParameterDeclaration {
        #[serde(default)]
        params: Vec<Node>,
    },
    TypeParameter {
        name: String,
        #[serde(default)]
        bound: Option<Box<Node>>,
    },
    TypeParameterInstantiation {
        #[serde(default)]
        params: Vec<Node>,
    },
    TypeAnnotation {
        type_annotation: Box<Node>,
    },
    NumberTypeAnnotation {},
    StringTypeAnnotation {},
    BooleanTypeAnnotation {},
    MixedTypeAnnotation {},
    VoidTypeAnnotation {},
    GenericTypeAnnotation {
        id: Box<Node>,
        #[serde(default)]
        type_parameters: Option<Box<Node>>,
    },
    ObjectTypeAnnotation {
        #[serde(default)]
        properties: Vec<Node>,
    },
    ObjectTypeProperty {
        key: Box<Node>,
        value: Box<Node>,
    },
    FunctionTypeAnnotation {
        #[serde(default)]
        params: Vec<Node>,
        return_type: Box<Node>,
    },
    FunctionTypeParam {
        #[serde(default)]
        name: Option<Box<Node>>,
        type_annotation: Box<Node>,
    },
    UnionTypeAnnotation {
        #[serde(default)]
        types: Vec<Node>,
    },

    // ── Loop-binding markers (synthesized by the for-init hoist shim) ───
    /// Marks a `for-in` binding: iterates the keys of `of`.
    PureKey {
        of: Box<Node>,
    },
    /// Marks a `for-of` binding: iterates the values of `of`.
    PureValue {
        of: Box<Node>,
    },
}

impl NodeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Program { .. } => "Program",
            NodeData::ExpressionStatement { .. } => "ExpressionStatement",
            NodeData::BlockStatement { .. } => "BlockStatement",
            NodeData::EmptyStatement {} => "EmptyStatement",
            NodeData::VariableDeclaration { .. } => "VariableDeclaration",
            NodeData::VariableDeclarator { .. } => "VariableDeclarator",
            NodeData::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeData::FunctionExpression { .. } => "FunctionExpression",
            NodeData::ArrowFunctionExpression { .. } => "ArrowFunctionExpression",
            NodeData::ClassDeclaration { .. } => "ClassDeclaration",
            NodeData::ClassExpression { .. } => "ClassExpression",
            NodeData::ClassBody { .. } => "ClassBody",
            NodeData::ClassMethod { .. } => "ClassMethod",
            NodeData::ObjectExpression { .. } => "ObjectExpression",
            NodeData::ObjectProperty { .. } => "ObjectProperty",
            NodeData::ObjectMethod { .. } => "ObjectMethod",
            NodeData::IfStatement { .. } => "IfStatement",
            NodeData::WhileStatement { .. } => "WhileStatement",
            NodeData::DoWhileStatement { .. } => "DoWhileStatement",
            NodeData::ForStatement { .. } => "ForStatement",
            NodeData::ForInStatement { .. } => "ForInStatement",
            NodeData::ForOfStatement { .. } => "ForOfStatement",
            NodeData::TryStatement { .. } => "TryStatement",
            NodeData::CatchClause { .. } => "CatchClause",
            NodeData::ThrowStatement { .. } => "ThrowStatement",
            NodeData::ReturnStatement { .. } => "ReturnStatement",
            NodeData::BreakStatement {} => "BreakStatement",
            NodeData::ContinueStatement {} => "ContinueStatement",
            NodeData::Identifier { .. } => "Identifier",
            NodeData::NumericLiteral { .. } => "NumericLiteral",
            NodeData::StringLiteral { .. } => "StringLiteral",
            NodeData::BooleanLiteral { .. } => "BooleanLiteral",
            NodeData::NullLiteral {} => "NullLiteral",
            NodeData::BinaryExpression { .. } => "BinaryExpression",
            NodeData::LogicalExpression { .. } => "LogicalExpression",
            NodeData::AssignmentExpression { .. } => "AssignmentExpression",
            NodeData::UnaryExpression { .. } => "UnaryExpression",
            NodeData::UpdateExpression { .. } => "UpdateExpression",
            NodeData::MemberExpression { .. } => "MemberExpression",
            NodeData::ConditionalExpression { .. } => "ConditionalExpression",
            NodeData::CallExpression { .. } => "CallExpression",
            NodeData::NewExpression { .. } => "NewExpression",
            NodeData::ArrayExpression { .. } => "ArrayExpression",
            NodeData::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            NodeData::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            NodeData::TypeAlias { .. } => "TypeAlias",
            NodeData::TypeParameterDeclaration { .. } => "TypeParameterDeclaration",
            NodeData::TypeParameter { .. } => "TypeParameter",
            NodeData::TypeParameterInstantiation { .. } => "TypeParameterInstantiation",
            NodeData::TypeAnnotation { .. } => "TypeAnnotation",
            NodeData::NumberTypeAnnotation {} => "NumberTypeAnnotation",
            NodeData::StringTypeAnnotation {} => "StringTypeAnnotation",
            NodeData::BooleanTypeAnnotation {} => "BooleanTypeAnnotation",
            NodeData::MixedTypeAnnotation {} => "MixedTypeAnnotation",
            NodeData::VoidTypeAnnotation {} => "VoidTypeAnnotation",
            NodeData::GenericTypeAnnotation { .. } => "GenericTypeAnnotation",
            NodeData::ObjectTypeAnnotation { .. } => "ObjectTypeAnnotation",
            NodeData::ObjectTypeProperty { .. } => "ObjectTypeProperty",
            NodeData::FunctionTypeAnnotation { .. } => "FunctionTypeAnnotation",
            NodeData::FunctionTypeParam { .. } => "FunctionTypeParam",
            NodeData::UnionTypeAnnotation { .. } => "UnionTypeAnnotation",
            NodeData::PureKey { .. } => "PureKey",
            NodeData::PureValue { .. } => "PureValue",
        }
    }
}
