//! Resolving type expressions to `TypeId`s.

use sable_binder::{Namespace, ScopeId};
use sable_common::DiagnosticCode;
use sable_solver::{InstantiationKey, IntrinsicKind, ReferenceTarget, Substitution, TypeId};
use sable_syntax::{TypeExpr, join_path};

use crate::resolver::{ItemResolver, PathLookup};
use crate::work_item::PhaseResult;

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    /// Resolve `ty` from this phase's scope under the item's template bindings.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> PhaseResult<TypeId> {
        self.resolve_type_in(ty, self.scope, self.substitution())
    }

    /// Resolve `ty` as written inside another declaration, e.g. a template
    /// signature evaluated at a call site.
    pub(crate) fn resolve_type_in(
        &mut self,
        ty: &TypeExpr,
        scope: ScopeId,
        bindings: &Substitution,
    ) -> PhaseResult<TypeId> {
        if let Some(name) = ty.simple_name() {
            if let Some(bound) = bindings.get(name) {
                return Ok(*bound);
            }
            if let Some(kind) = IntrinsicKind::from_name(name) {
                return Ok(kind.type_id());
            }
        }

        let display = join_path(&ty.path);
        let symbols = match self.lookup_path(scope, &ty.path, Namespace::Type)? {
            PathLookup::Found(symbols) => symbols,
            PathLookup::Value { .. } | PathLookup::External | PathLookup::Missing { .. } => {
                return Ok(self.unresolved(&display, ty.span));
            }
        };
        let Some(def) = symbols.first().and_then(|symbol| self.def_of(*symbol)) else {
            return Ok(self.unresolved(&display, ty.span));
        };
        let Some(info) = self.ctx.defs.get(def) else {
            return Ok(self.unresolved(&display, ty.span));
        };
        if !info.kind.is_type() {
            return Ok(self.unresolved(&display, ty.span));
        }

        let expected = if info.is_template() {
            info.type_params.len()
        } else {
            0
        };
        if ty.args.len() != expected {
            let expected = expected.to_string();
            let supplied = ty.args.len().to_string();
            self.error(
                DiagnosticCode::TemplateArgumentCountMismatch,
                ty.span,
                &[&info.qualified_name, &expected, &supplied],
            );
            self.reference(display, ty.span, ReferenceTarget::Error);
            return Ok(TypeId::ERROR);
        }

        if expected == 0 {
            self.reference(display, ty.span, ReferenceTarget::Definition(def));
            return Ok(self.ctx.types.declared(def));
        }

        let mut args = Vec::with_capacity(ty.args.len());
        for arg in &ty.args {
            args.push(self.resolve_type_in(arg, scope, bindings)?);
        }
        if args.iter().any(|arg| arg.is_error()) {
            return Ok(TypeId::ERROR);
        }
        let instance = if self.lookup_only {
            match self.ctx.instances.get(&InstantiationKey::new(def, &args)) {
                Some(instance) => instance,
                None => {
                    self.missed_instance = true;
                    return Ok(TypeId::ERROR);
                }
            }
        } else {
            self.instantiate(def, &args, ty.span)?
        };
        let name = self.ctx.defs.get_name(instance).unwrap_or(display);
        self.reference(name, ty.span, ReferenceTarget::Definition(instance));
        Ok(self.ctx.types.declared(instance))
    }

    /// Resolve a list of type expressions in order.
    pub(crate) fn resolve_types(&mut self, types: &[TypeExpr]) -> PhaseResult<Vec<TypeId>> {
        let mut out = Vec::with_capacity(types.len());
        for ty in types {
            out.push(self.resolve_type(ty)?);
        }
        Ok(out)
    }
}
