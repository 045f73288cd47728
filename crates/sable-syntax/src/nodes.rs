//! Syntax node definitions.

use sable_common::Span;
use serde::Serialize;
use smallvec::SmallVec;

/// Stable identity of a declaration node.
///
/// Ids are handed out in source (pre-order) order, so comparing two ids
/// compares declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declared visibility of a name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Locality {
    /// Visible only inside the enclosing code block or type.
    Local,
    /// Visible to the whole enclosing module.
    #[default]
    Module,
    /// Exported from the compilation unit.
    Public,
}

/// Dotted name path, e.g. `Console.WriteLine` -> `["Console", "WriteLine"]`.
pub type NamePath = SmallVec<[String; 2]>;

pub fn split_path(dotted: &str) -> NamePath {
    dotted.split('.').map(str::to_string).collect()
}

pub fn join_path(path: &[String]) -> String {
    path.join(".")
}

/// A reference to a type in source, possibly with type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeExpr {
    pub span: Span,
    pub path: NamePath,
    pub args: Vec<TypeExpr>,
}

impl TypeExpr {
    pub fn named(name: &str) -> Self {
        TypeExpr {
            span: Span::dummy(),
            path: split_path(name),
            args: Vec::new(),
        }
    }

    pub fn generic(name: &str, args: Vec<TypeExpr>) -> Self {
        TypeExpr {
            span: Span::dummy(),
            path: split_path(name),
            args,
        }
    }

    pub fn display_name(&self) -> String {
        let mut out = join_path(&self.path);
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(TypeExpr::display_name).collect();
            out.push('<');
            out.push_str(&args.join(","));
            out.push('>');
        }
        out
    }

    /// A single-segment path without arguments, i.e. a candidate type parameter.
    pub fn simple_name(&self) -> Option<&str> {
        match (self.path.as_slice(), self.args.is_empty()) {
            ([single], true) => Some(single.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Name of the user-definable function implementing this operator.
    pub const fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Sub => "op_Subtraction",
            BinaryOp::Mul => "op_Multiply",
            BinaryOp::Div => "op_Division",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExprKind {
    Int(i128),
    Bool(bool),
    Str(String),
    /// A (possibly dotted) name: local, module member, enum option, or field.
    Name(NamePath),
    Call {
        callee: NamePath,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    fn new(kind: ExprKind) -> Self {
        Expr {
            span: Span::dummy(),
            kind,
        }
    }

    pub fn int(value: i128) -> Self {
        Self::new(ExprKind::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Bool(value))
    }

    pub fn string(value: &str) -> Self {
        Self::new(ExprKind::Str(value.to_string()))
    }

    pub fn name(dotted: &str) -> Self {
        Self::new(ExprKind::Name(split_path(dotted)))
    }

    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            callee: split_path(callee),
            type_args: Vec::new(),
            args,
        })
    }

    pub fn generic_call(callee: &str, type_args: Vec<TypeExpr>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            callee: split_path(callee),
            type_args,
            args,
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Stmt {
    /// A nested declaration; resolved as its own work item.
    Decl(NodeId),
    Expr(Expr),
    Return { span: Span, value: Option<Expr> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeParam {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub span: Span,
    pub ty: TypeExpr,
    /// Implicit receiver; marks a function as a user-defined conversion candidate.
    pub is_self: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub span: Span,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumOption {
    pub name: String,
    pub span: Span,
    pub value: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TypeDeclKind {
    Struct,
    Enum,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleDecl {
    pub members: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<Field>,
    pub options: Vec<EnumOption>,
    /// Nested function declarations.
    pub methods: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    /// `None` means `Void`.
    pub return_type: Option<TypeExpr>,
    pub body: Option<CodeBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableDecl {
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    Module(ModuleDecl),
    Type(TypeDecl),
    Function(FunctionDecl),
    Variable(VariableDecl),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub locality: Locality,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn type_params(&self) -> &[TypeParam] {
        match &self.kind {
            DeclKind::Type(ty) => &ty.type_params,
            DeclKind::Function(func) => &func.type_params,
            DeclKind::Module(_) | DeclKind::Variable(_) => &[],
        }
    }

    pub fn is_template(&self) -> bool {
        !self.type_params().is_empty()
    }

    /// Declarations nested directly inside this one, in source order.
    pub fn nested(&self) -> Vec<NodeId> {
        match &self.kind {
            DeclKind::Module(module) => module.members.clone(),
            DeclKind::Type(ty) => ty.methods.clone(),
            DeclKind::Function(func) => func
                .body
                .iter()
                .flat_map(|body| body.stmts.iter())
                .filter_map(|stmt| match stmt {
                    Stmt::Decl(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            DeclKind::Variable(_) => Vec::new(),
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self.kind {
            DeclKind::Module(_) => "module",
            DeclKind::Type(_) => "type",
            DeclKind::Function(_) => "function",
            DeclKind::Variable(_) => "variable",
        }
    }
}

/// An immutable compilation unit: a flat declaration arena plus its roots.
#[derive(Clone, Debug, Serialize)]
pub struct SyntaxTree {
    pub(crate) file_name: String,
    pub(crate) nodes: Vec<Declaration>,
    pub(crate) roots: Vec<NodeId>,
}

impl SyntaxTree {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn get(&self, id: NodeId) -> Option<&Declaration> {
        self.nodes.get(id.index())
    }

    /// Top-level declarations in source order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.nodes.iter()
    }
}
