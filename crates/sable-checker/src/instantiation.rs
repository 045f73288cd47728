//! Template instantiation and type-argument inference at use sites.
//!
//! An instance is an ordinary work item over the template's own syntax
//! node, seeded with the instance symbol and definition and carrying the
//! template's bindings. Its phases resolve the template's field, parameter
//! and body types under those bindings exactly as they would for a
//! hand-written declaration.

use sable_binder::{Namespace, ScopeId};
use sable_common::{DiagnosticCode, Span};
use sable_solver::{
    DefId, DefinitionInfo, InferenceError, InstantiationKey, TemplateInference, TypeId,
    substitution,
};
use sable_syntax::TypeExpr;
use std::sync::Arc;
use tracing::debug;

use crate::resolver::{ItemResolver, PathLookup};
use crate::work_item::{InstanceSeed, NewItem, PhaseResult, Suspend};

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    /// The instance of `template` for `args`, created on first use.
    pub(crate) fn instantiate(
        &mut self,
        template: DefId,
        args: &[TypeId],
        span: Span,
    ) -> PhaseResult<DefId> {
        let ctx = self.ctx;
        let key = InstantiationKey::new(template, args);
        if let Some(existing) = ctx.instances.get(&key) {
            return Ok(existing);
        }

        let (Some(info), Some(template_item)) =
            (ctx.defs.get(template), ctx.item_of_def(template))
        else {
            return Err(Suspend::Failed);
        };
        let name = ctx.formatter().instance_name(&info.name, args);

        let depth = self.item.depth + 1;
        if depth > ctx.options.max_instantiation_depth {
            self.error(DiagnosticCode::InstantiationDepthExceeded, span, &[&name]);
            return Err(Suspend::Failed);
        }

        let Some(symbol) = ctx.binder.symbol(info.symbol) else {
            return Err(Suspend::Failed);
        };
        let Some(scope) = ctx.binder.scope(symbol.scope) else {
            return Err(Suspend::Failed);
        };

        let (instance, created) = ctx.instances.get_or_create(key, |_| {
            let instance_symbol = ctx.binder.declare_instance(
                &scope,
                &name,
                symbol.kind,
                symbol.locality,
                symbol.order,
                symbol.span,
            );
            let qualified = ctx
                .binder
                .symbol(instance_symbol)
                .map(|s| s.qualified_name.clone())
                .unwrap_or_else(|| scope.qualify(&name));
            let def = ctx.defs.register(
                DefinitionInfo::new(
                    info.kind,
                    &name,
                    &qualified,
                    instance_symbol,
                    info.locality,
                    info.order,
                    info.span,
                )
                .with_type_params(info.type_params.clone())
                .instance(template, args.to_vec()),
            );
            ctx.defs.bind_symbol(instance_symbol, def);

            let mut bindings = (*template_item.substitution).clone();
            bindings.extend(substitution(&info.type_params, args));
            let item = ctx.spawn(NewItem {
                node: template_item.node,
                scope: template_item.scope,
                parent: None,
                substitution: Arc::new(bindings),
                depth,
                counted: false,
                seed: Some(InstanceSeed {
                    symbol: instance_symbol,
                    def,
                }),
            });
            ctx.register_def(def, item.id);
            def
        });
        if created {
            debug!(instance = %name, depth, "template instantiated");
        }
        Ok(instance)
    }

    /// Infer a template function's type arguments from call argument types.
    pub(crate) fn infer_type_args(
        &mut self,
        template: &DefinitionInfo,
        param_types: &[TypeExpr],
        scope: ScopeId,
        arg_types: &[TypeId],
    ) -> PhaseResult<Result<Vec<TypeId>, InferenceError>> {
        let mut inference = TemplateInference::new(&template.type_params);
        for (param, arg) in param_types.iter().zip(arg_types) {
            if let Err(err) = self.unify_param(&mut inference, param, *arg, scope)? {
                return Ok(Err(err));
            }
        }
        Ok(inference.finish(&self.ctx.types, self.ctx.default_integer()))
    }

    /// Bind type parameters mentioned in `param` against the argument type.
    /// A parameter written `Box<T>` matches an argument that is an instance
    /// of the same template, position by position.
    fn unify_param(
        &mut self,
        inference: &mut TemplateInference,
        param: &TypeExpr,
        arg: TypeId,
        scope: ScopeId,
    ) -> PhaseResult<Result<(), InferenceError>> {
        if let Some(name) = param.simple_name() {
            let Some(index) = inference.param_index(name) else {
                return Ok(Ok(()));
            };
            if let Some(value) = self.ctx.types.as_int_literal(arg) {
                inference.bind_literal(index, value);
                return Ok(Ok(()));
            }
            return Ok(inference.bind(index, arg));
        }
        if param.args.is_empty() {
            return Ok(Ok(()));
        }

        let Some(arg_info) = self
            .ctx
            .types
            .as_def(arg)
            .and_then(|def| self.ctx.defs.get(def))
        else {
            return Ok(Ok(()));
        };
        let Some(arg_template) = arg_info.instance_of else {
            return Ok(Ok(()));
        };
        let expected = match self.lookup_path(scope, &param.path, Namespace::Type)? {
            PathLookup::Found(symbols) => symbols.first().and_then(|s| self.def_of(*s)),
            _ => None,
        };
        if expected != Some(arg_template) {
            return Ok(Ok(()));
        }
        for (sub_param, sub_arg) in param.args.iter().zip(&arg_info.type_args) {
            if let Err(err) = self.unify_param(inference, sub_param, *sub_arg, scope)? {
                return Ok(Err(err));
            }
        }
        Ok(Ok(()))
    }

    pub(crate) fn describe_inference_error(&self, err: &InferenceError) -> String {
        match err {
            InferenceError::Conflict {
                param,
                first,
                second,
            } => format!(
                "'{}' is bound to both {} and {}",
                param,
                self.ctx.format_type(*first),
                self.ctx.format_type(*second)
            ),
            InferenceError::Unbound { param } => {
                format!("'{param}' does not appear in any argument")
            }
        }
    }
}
