//! Build phase: resolve the types a declaration exposes to its users.

use sable_solver::{DefId, EnumOptionInfo, FieldInfo, ParamInfo, TypeId};
use sable_syntax::{DeclKind, Declaration, EnumOption, Field, FunctionDecl, VariableDecl};

use crate::resolver::ItemResolver;
use crate::work_item::{PhaseResult, Suspend};

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub(crate) fn build(&mut self, decl: &Declaration) -> PhaseResult {
        let Some(def) = self.item.def.get().copied() else {
            return Err(Suspend::Failed);
        };
        match &decl.kind {
            DeclKind::Module(_) => Ok(()),
            DeclKind::Type(ty) => {
                self.build_fields(def, &ty.fields)?;
                self.build_options(def, &ty.options);
                Ok(())
            }
            DeclKind::Function(func) => self.build_signature(def, func),
            DeclKind::Variable(var) => self.build_variable(def, var),
        }
    }

    fn build_fields(&mut self, def: DefId, fields: &[Field]) -> PhaseResult {
        if fields.is_empty() {
            return Ok(());
        }
        let mut resolved = Vec::with_capacity(fields.len());
        for field in fields {
            let ty = self.resolve_type(&field.ty)?;
            resolved.push(FieldInfo {
                name: field.name.clone(),
                span: field.span,
                ty,
            });
        }
        self.ctx.defs.set_fields(def, resolved);
        Ok(())
    }

    /// Options without an explicit value continue from the previous one.
    fn build_options(&mut self, def: DefId, options: &[EnumOption]) {
        if options.is_empty() {
            return;
        }
        let mut next = 0i64;
        let resolved = options
            .iter()
            .map(|option| {
                let value = option.value.unwrap_or(next);
                next = value.saturating_add(1);
                EnumOptionInfo {
                    name: option.name.clone(),
                    span: option.span,
                    value,
                }
            })
            .collect();
        self.ctx.defs.set_options(def, resolved);
    }

    fn build_signature(&mut self, def: DefId, func: &FunctionDecl) -> PhaseResult {
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = self.resolve_type(&param.ty)?;
            params.push(ParamInfo {
                name: param.name.clone(),
                span: param.span,
                ty,
                is_self: param.is_self,
            });
        }
        let ret = match &func.return_type {
            Some(ty) => self.resolve_type(ty)?,
            None => TypeId::VOID,
        };

        let ctx = self.ctx;
        let qualified = ctx
            .defs
            .get(def)
            .map(|info| info.qualified_name)
            .unwrap_or_default();
        let types: Vec<TypeId> = params.iter().map(|p| p.ty).collect();
        let key = ctx.formatter().overload_key(&qualified, &types);
        ctx.defs.set_signature(def, params, ret, key);
        Ok(())
    }

    /// A declared type wins; otherwise the initializer's type, with integer
    /// literals widened to the default integer type.
    fn build_variable(&mut self, def: DefId, var: &VariableDecl) -> PhaseResult {
        let ty = match (&var.ty, &var.init) {
            (Some(ty), _) => self.resolve_type(ty)?,
            (None, Some(init)) => {
                let ty = self.resolve_expr(init)?;
                self.ctx.types.widen_literal(ty, self.ctx.default_integer())
            }
            (None, None) => TypeId::ERROR,
        };
        self.ctx.defs.set_var_type(def, ty);
        Ok(())
    }
}
