//! Builder that lays out nested declaration descriptions into a `SyntaxTree`.
//!
//! Front ends (and tests) describe a unit as nested `DeclSpec`s. The builder
//! flattens them pre-order, so `NodeId`s and spans both follow source order.

use crate::nodes::*;
use sable_common::Span;

/// A declaration before it has been laid out into the arena.
#[derive(Clone, Debug)]
pub struct DeclSpec {
    name: String,
    locality: Locality,
    kind: SpecKind,
}

#[derive(Clone, Debug)]
enum SpecKind {
    Module(Vec<DeclSpec>),
    Type {
        kind: TypeDeclKind,
        type_params: Vec<String>,
        fields: Vec<(String, TypeExpr)>,
        options: Vec<(String, Option<i64>)>,
        methods: Vec<DeclSpec>,
    },
    Function {
        type_params: Vec<String>,
        params: Vec<(String, TypeExpr)>,
        self_param: bool,
        return_type: Option<TypeExpr>,
        body: Option<Vec<StmtSpec>>,
    },
    Variable {
        ty: Option<TypeExpr>,
        init: Option<Expr>,
    },
}

#[derive(Clone, Debug)]
pub enum StmtSpec {
    Decl(DeclSpec),
    Expr(Expr),
    Return(Option<Expr>),
}

impl DeclSpec {
    fn new(name: &str, kind: SpecKind) -> Self {
        DeclSpec {
            name: name.to_string(),
            locality: Locality::Module,
            kind,
        }
    }

    pub fn module(name: &str, members: Vec<DeclSpec>) -> Self {
        Self::new(name, SpecKind::Module(members))
    }

    pub fn structure(name: &str, fields: Vec<(&str, TypeExpr)>) -> Self {
        Self::new(
            name,
            SpecKind::Type {
                kind: TypeDeclKind::Struct,
                type_params: Vec::new(),
                fields: fields
                    .into_iter()
                    .map(|(n, ty)| (n.to_string(), ty))
                    .collect(),
                options: Vec::new(),
                methods: Vec::new(),
            },
        )
    }

    pub fn enumeration(name: &str, options: Vec<(&str, Option<i64>)>) -> Self {
        Self::new(
            name,
            SpecKind::Type {
                kind: TypeDeclKind::Enum,
                type_params: Vec::new(),
                fields: Vec::new(),
                options: options
                    .into_iter()
                    .map(|(n, v)| (n.to_string(), v))
                    .collect(),
                methods: Vec::new(),
            },
        )
    }

    pub fn function(
        name: &str,
        params: Vec<(&str, TypeExpr)>,
        return_type: Option<TypeExpr>,
        body: Vec<StmtSpec>,
    ) -> Self {
        Self::new(
            name,
            SpecKind::Function {
                type_params: Vec::new(),
                params: params
                    .into_iter()
                    .map(|(n, ty)| (n.to_string(), ty))
                    .collect(),
                self_param: false,
                return_type,
                body: Some(body),
            },
        )
    }

    pub fn variable(name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> Self {
        Self::new(name, SpecKind::Variable { ty, init })
    }

    pub fn public(mut self) -> Self {
        self.locality = Locality::Public;
        self
    }

    pub fn local(mut self) -> Self {
        self.locality = Locality::Local;
        self
    }

    pub fn with_type_params(mut self, names: &[&str]) -> Self {
        let names = names.iter().map(|n| n.to_string()).collect();
        match &mut self.kind {
            SpecKind::Type { type_params, .. } | SpecKind::Function { type_params, .. } => {
                *type_params = names;
            }
            SpecKind::Module(_) | SpecKind::Variable { .. } => {}
        }
        self
    }

    /// Marks the first parameter as the implicit `self` receiver.
    pub fn with_self_param(mut self) -> Self {
        if let SpecKind::Function { self_param, .. } = &mut self.kind {
            *self_param = true;
        }
        self
    }

    /// Declaration only (external or abstract); no code block.
    pub fn without_body(mut self) -> Self {
        if let SpecKind::Function { body, .. } = &mut self.kind {
            *body = None;
        }
        self
    }

    pub fn with_methods(mut self, new_methods: Vec<DeclSpec>) -> Self {
        if let SpecKind::Type { methods, .. } = &mut self.kind {
            *methods = new_methods;
        }
        self
    }
}

/// Flattens `DeclSpec`s into a `SyntaxTree`.
pub struct SyntaxTreeBuilder {
    file_name: String,
    nodes: Vec<Declaration>,
    roots: Vec<NodeId>,
    cursor: u32,
}

impl SyntaxTreeBuilder {
    pub fn new(file_name: &str) -> Self {
        SyntaxTreeBuilder {
            file_name: file_name.to_string(),
            nodes: Vec::new(),
            roots: Vec::new(),
            cursor: 0,
        }
    }

    /// Add a top-level declaration and return its id.
    pub fn add(&mut self, spec: DeclSpec) -> NodeId {
        let id = self.lay_out(spec);
        self.roots.push(id);
        id
    }

    pub fn finish(self) -> SyntaxTree {
        SyntaxTree {
            file_name: self.file_name,
            nodes: self.nodes,
            roots: self.roots,
        }
    }

    /// Build a tree from top-level specs in one call.
    pub fn build(file_name: &str, specs: Vec<DeclSpec>) -> SyntaxTree {
        let mut builder = SyntaxTreeBuilder::new(file_name);
        for spec in specs {
            builder.add(spec);
        }
        builder.finish()
    }

    fn span(&mut self, width: usize) -> Span {
        let start = self.cursor;
        let end = start + width.max(1) as u32;
        self.cursor = end + 1;
        Span::new(start, end)
    }

    fn lay_out(&mut self, spec: DeclSpec) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let span = self.span(spec.name.len());
        // Reserve the slot first so children get later ids than their parent
        self.nodes.push(Declaration {
            id,
            span,
            name: spec.name.clone(),
            locality: spec.locality,
            kind: DeclKind::Variable(VariableDecl {
                ty: None,
                init: None,
            }),
        });

        let kind = match spec.kind {
            SpecKind::Module(members) => DeclKind::Module(ModuleDecl {
                members: members.into_iter().map(|m| self.lay_out(m)).collect(),
            }),
            SpecKind::Type {
                kind,
                type_params,
                fields,
                options,
                methods,
            } => {
                let type_params = self.type_params(type_params);
                let fields = fields
                    .into_iter()
                    .map(|(name, ty)| Field {
                        span: self.span(name.len()),
                        ty: self.type_expr(ty),
                        name,
                    })
                    .collect();
                let options = options
                    .into_iter()
                    .map(|(name, value)| EnumOption {
                        span: self.span(name.len()),
                        name,
                        value,
                    })
                    .collect();
                let methods = methods.into_iter().map(|m| self.lay_out(m)).collect();
                DeclKind::Type(TypeDecl {
                    kind,
                    type_params,
                    fields,
                    options,
                    methods,
                })
            }
            SpecKind::Function {
                type_params,
                params,
                self_param,
                return_type,
                body,
            } => {
                let type_params = self.type_params(type_params);
                let params = params
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, ty))| Param {
                        span: self.span(name.len()),
                        ty: self.type_expr(ty),
                        is_self: self_param && i == 0,
                        name,
                    })
                    .collect();
                let return_type = return_type.map(|ty| self.type_expr(ty));
                let body = body.map(|stmts| self.code_block(stmts));
                DeclKind::Function(FunctionDecl {
                    type_params,
                    params,
                    return_type,
                    body,
                })
            }
            SpecKind::Variable { ty, init } => DeclKind::Variable(VariableDecl {
                ty: ty.map(|ty| self.type_expr(ty)),
                init: init.map(|e| self.expr(e)),
            }),
        };

        self.nodes[id.index()].kind = kind;
        id
    }

    fn type_params(&mut self, names: Vec<String>) -> Vec<TypeParam> {
        names
            .into_iter()
            .map(|name| TypeParam {
                span: self.span(name.len()),
                name,
            })
            .collect()
    }

    fn code_block(&mut self, stmts: Vec<StmtSpec>) -> CodeBlock {
        let open = self.span(1);
        let stmts = stmts
            .into_iter()
            .map(|stmt| match stmt {
                StmtSpec::Decl(spec) => Stmt::Decl(self.lay_out(spec)),
                StmtSpec::Expr(expr) => Stmt::Expr(self.expr(expr)),
                StmtSpec::Return(value) => Stmt::Return {
                    span: self.span("return".len()),
                    value: value.map(|e| self.expr(e)),
                },
            })
            .collect();
        let close = self.span(1);
        CodeBlock {
            span: open.to(close),
            stmts,
        }
    }

    fn type_expr(&mut self, mut ty: TypeExpr) -> TypeExpr {
        ty.span = self.span(join_path(&ty.path).len());
        ty.args = std::mem::take(&mut ty.args)
            .into_iter()
            .map(|arg| self.type_expr(arg))
            .collect();
        ty
    }

    fn expr(&mut self, expr: Expr) -> Expr {
        let start = self.cursor;
        let kind = match expr.kind {
            ExprKind::Call {
                callee,
                type_args,
                args,
            } => {
                self.span(join_path(&callee).len());
                ExprKind::Call {
                    callee,
                    type_args: type_args.into_iter().map(|t| self.type_expr(t)).collect(),
                    args: args.into_iter().map(|a| self.expr(a)).collect(),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.expr(*lhs);
                self.span(1);
                let rhs = self.expr(*rhs);
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            ExprKind::Name(path) => {
                self.span(join_path(&path).len());
                ExprKind::Name(path)
            }
            other => {
                self.span(4);
                other
            }
        };
        Expr {
            span: Span::new(start, self.cursor.saturating_sub(1)),
            kind,
        }
    }
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
