//! CodeBlock phase: function bodies, typed initializers and duplicate
//! signatures.
//!
//! An item's CodeBlock completes only after every nested item's CodeBlock,
//! so a finished module means everything inside it is resolved.

use sable_common::DiagnosticCode;
use sable_solver::{DefId, TypeId};
use sable_syntax::{CodeBlock, DeclKind, Declaration, Stmt};

use crate::resolver::ItemResolver;
use crate::work_item::{Dependency, Phase, PhaseResult, Suspend};

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub(crate) fn check_code_block(&mut self, decl: &Declaration) -> PhaseResult {
        if let Some(children) = self.item.children.get() {
            for child in children {
                self.ctx.require(*child, Phase::CodeBlock)?;
            }
        }
        let Some(def) = self.item.def.get().copied() else {
            return Err(Suspend::Failed);
        };

        match &decl.kind {
            DeclKind::Function(func) => {
                if self.item.seed.is_none() {
                    self.check_duplicate_signature(decl, def)?;
                }
                if let Some(body) = &func.body {
                    self.check_body(def, body)?;
                }
            }
            DeclKind::Variable(var) => {
                if let (Some(_), Some(init)) = (&var.ty, &var.init) {
                    let declared = self.ctx.defs.get_var_type(def).unwrap_or(TypeId::ERROR);
                    let actual = self.resolve_expr(init)?;
                    self.expect_assignable(actual, declared, init.span)?;
                }
            }
            DeclKind::Module(_) | DeclKind::Type(_) => {}
        }
        Ok(())
    }

    /// Two overloads with equal parameter types are duplicates; the later
    /// one is reported.
    fn check_duplicate_signature(&mut self, decl: &Declaration, def: DefId) -> PhaseResult {
        let ctx = self.ctx;
        let Some(symbol) = self.item.symbol.get().and_then(|s| ctx.binder.symbol(*s)) else {
            return Ok(());
        };
        let Some(scope) = ctx.binder.scope(self.item.scope) else {
            return Ok(());
        };
        if !scope.is_frozen() {
            return Err(Suspend::Pending(Dependency::ScopeFrozen(scope.id)));
        }
        let Some(key) = ctx.defs.get(def).and_then(|info| info.overload_key) else {
            return Ok(());
        };

        for other in ctx.binder.overload_set(scope.id, &decl.name) {
            if other == symbol.id {
                continue;
            }
            let Some(earlier) = ctx.binder.symbol(other) else {
                continue;
            };
            if earlier.order >= symbol.order {
                continue;
            }
            let Some(other_def) = ctx.defs.def_of_symbol(other) else {
                continue;
            };
            ctx.require_def(other_def, Phase::Build)?;
            let other_key = ctx.defs.get(other_def).and_then(|info| info.overload_key);
            if other_key.as_deref() == Some(key.as_str()) {
                self.error(DiagnosticCode::DuplicateDeclaration, decl.span, &[&key]);
                break;
            }
        }
        Ok(())
    }

    fn check_body(&mut self, def: DefId, body: &CodeBlock) -> PhaseResult {
        let ret = self.ctx.defs.get_return_type(def).unwrap_or(TypeId::VOID);
        for stmt in &body.stmts {
            match stmt {
                Stmt::Decl(_) => {}
                Stmt::Expr(expr) => {
                    self.resolve_expr(expr)?;
                }
                Stmt::Return {
                    value: Some(value), ..
                } => {
                    let ty = self.resolve_expr(value)?;
                    self.expect_assignable(ty, ret, value.span)?;
                }
                Stmt::Return { span, value: None } => {
                    if ret != TypeId::VOID {
                        self.expect_assignable(TypeId::VOID, ret, *span)?;
                    }
                }
            }
        }
        Ok(())
    }
}
