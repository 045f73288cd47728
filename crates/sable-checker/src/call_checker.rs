//! Call Checking Module
//!
//! Resolves call expressions and operator applications:
//! - call-style intrinsic casts (`U8(x)`)
//! - overload sets of declared functions, including template functions
//!   whose type arguments are explicit or inferred
//! - host functions reached through the metadata bridge
//! - user-defined and host operator functions

use sable_binder::{ExternalFunction, LookupResult, Namespace, SymbolId};
use sable_common::limits::MAX_REPORTED_CANDIDATES;
use sable_common::{DiagnosticCode, Span};
use sable_solver::{
    Candidate, DefId, DefinitionInfo, IntrinsicKind, OverloadOutcome, ReferenceTarget, TypeId,
    explicit_cast_allowed, resolve_overload, substitution,
};
use sable_syntax::{BinaryOp, DeclKind, Expr, NamePath, TypeExpr, join_path};

use crate::resolver::{ItemResolver, PathLookup};
use crate::work_item::{Phase, PhaseResult};

/// What an overload candidate stands for.
#[derive(Clone, Debug)]
pub(crate) enum Callee {
    Function(DefId),
    /// A template function with its type arguments settled; instantiated
    /// only if it wins.
    Template { template: DefId, args: Vec<TypeId> },
    External(ExternalFunction),
}

/// Where a callee path led.
enum CallTargets {
    Functions(Vec<SymbolId>),
    External(Vec<ExternalFunction>),
    NotCallable,
    Unresolved,
    /// A host module was found but not the function.
    ExternalMissing,
}

enum TemplateCandidate {
    Ready(Candidate<Callee>),
    CountMismatch { expected: usize },
    InferenceFailed(String),
    Rejected,
}

/// Call-site facts shared by every candidate.
pub(crate) struct CallSite<'s> {
    pub name: &'s str,
    pub span: Span,
    pub arg_types: &'s [TypeId],
    pub arg_spans: &'s [Span],
}

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub(crate) fn resolve_call(
        &mut self,
        callee: &NamePath,
        type_args: &[TypeExpr],
        args: &[Expr],
        span: Span,
    ) -> PhaseResult<TypeId> {
        let name = join_path(callee);
        if let [single] = callee.as_slice() {
            if let Some(kind) = IntrinsicKind::from_name(single).filter(|k| k.is_numeric()) {
                return self.resolve_cast(kind, args, span);
            }
        }

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.resolve_expr(arg)?);
        }
        let arg_spans: Vec<Span> = args.iter().map(|arg| arg.span).collect();
        let site = CallSite {
            name: &name,
            span,
            arg_types: &arg_types,
            arg_spans: &arg_spans,
        };

        match self.call_targets(callee)? {
            CallTargets::Functions(symbols) => self.resolve_function_call(&site, &symbols, type_args),
            CallTargets::External(functions) => {
                let candidates = functions
                    .into_iter()
                    .filter_map(|function| {
                        let params = function
                            .params
                            .iter()
                            .map(|p| host_type(p))
                            .collect::<Option<Vec<_>>>()?;
                        Some(Candidate {
                            key: Callee::External(function),
                            params,
                        })
                    })
                    .collect::<Vec<_>>();
                self.select_overload(&site, &candidates, Vec::new())
            }
            CallTargets::NotCallable => {
                self.error(DiagnosticCode::NotCallable, span, &[&name]);
                self.reference(name, span, ReferenceTarget::Error);
                Ok(TypeId::ERROR)
            }
            CallTargets::Unresolved => Ok(self.unresolved(&name, span)),
            CallTargets::ExternalMissing => {
                self.error(DiagnosticCode::UnresolvedExternalSymbol, span, &[&name]);
                self.reference(name, span, ReferenceTarget::Error);
                Ok(TypeId::ERROR)
            }
        }
    }

    /// `U8(x)`: explicit numeric cast, or a user conversion to the intrinsic.
    fn resolve_cast(&mut self, kind: IntrinsicKind, args: &[Expr], span: Span) -> PhaseResult<TypeId> {
        let target = kind.type_id();
        let [arg] = args else {
            let mut arg_types = Vec::with_capacity(args.len());
            for arg in args {
                arg_types.push(self.resolve_expr(arg)?);
            }
            let listed = self.ctx.formatter().format_list(&arg_types);
            let rejected = format!("{}(value)", kind.name());
            self.error(
                DiagnosticCode::NoApplicableOverload,
                span,
                &[kind.name(), &listed, &rejected],
            );
            self.reference(kind.name(), span, ReferenceTarget::Error);
            return Ok(target);
        };

        let source = self.resolve_expr(arg)?;
        if explicit_cast_allowed(&self.ctx.types, source, kind) {
            self.reference(kind.name(), span, ReferenceTarget::Cast(kind));
            return Ok(target);
        }
        let conversion = self.classify(source, target)?;
        if conversion.is_applicable() {
            self.record_conversion(conversion, span);
        } else {
            let from = self.ctx.format_type(source);
            self.error(DiagnosticCode::TypeMismatch, arg.span, &[&from, kind.name()]);
            self.reference(kind.name(), span, ReferenceTarget::Error);
        }
        Ok(target)
    }

    fn call_targets(&mut self, callee: &NamePath) -> PhaseResult<CallTargets> {
        if let [single] = callee.as_slice() {
            return Ok(match self.lookup(single, Namespace::Function)? {
                LookupResult::Found { symbols, .. } => CallTargets::Functions(symbols.into_vec()),
                LookupResult::External(_) => CallTargets::NotCallable,
                LookupResult::Missing | LookupResult::Unsettled(_) => {
                    match self.lookup(single, Namespace::Any)? {
                        LookupResult::Found { .. } => CallTargets::NotCallable,
                        _ => CallTargets::Unresolved,
                    }
                }
            });
        }

        Ok(match self.lookup_path(self.scope, callee, Namespace::Function)? {
            PathLookup::Found(symbols) => CallTargets::Functions(symbols.into_vec()),
            PathLookup::Value { .. } => CallTargets::NotCallable,
            PathLookup::External | PathLookup::Missing { resolved: 0 } => {
                self.external_targets(callee)
            }
            PathLookup::Missing { resolved } if resolved + 1 == callee.len() => {
                match self.lookup_path(self.scope, callee, Namespace::Any)? {
                    PathLookup::Found(_) => CallTargets::NotCallable,
                    _ => CallTargets::Unresolved,
                }
            }
            PathLookup::Missing { .. } => CallTargets::Unresolved,
        })
    }

    /// `Console.WriteLine`: the longest prefix naming a host module, then
    /// the module's functions with the last segment's name.
    fn external_targets(&self, callee: &NamePath) -> CallTargets {
        let binder = &self.ctx.binder;
        let found = binder.lookup_external_path(callee).or_else(|| {
            let first = callee.first()?;
            binder.lookup_external_module(first).map(|module| (module, 1))
        });
        let Some((module, consumed)) = found else {
            return CallTargets::Unresolved;
        };
        if consumed + 1 != callee.len() {
            return CallTargets::ExternalMissing;
        }
        let functions: Vec<ExternalFunction> = module
            .functions_named(&callee[consumed])
            .cloned()
            .collect();
        if functions.is_empty() {
            CallTargets::ExternalMissing
        } else {
            CallTargets::External(functions)
        }
    }

    pub(crate) fn resolve_function_call(
        &mut self,
        site: &CallSite<'_>,
        symbols: &[SymbolId],
        type_args: &[TypeExpr],
    ) -> PhaseResult<TypeId> {
        let explicit = if type_args.is_empty() {
            None
        } else {
            Some(self.resolve_types(type_args)?)
        };

        let mut candidates = Vec::new();
        let mut rejected = Vec::new();
        let mut inference_failures = Vec::new();
        let mut count_mismatch = None;
        let mut templates = 0;

        for symbol in symbols {
            let Some(def) = self.def_of(*symbol) else {
                continue;
            };
            let Some(info) = self.ctx.defs.get(def) else {
                continue;
            };
            if info.is_template() {
                templates += 1;
                match self.template_candidate(def, &info, explicit.as_deref(), site.arg_types)? {
                    TemplateCandidate::Ready(candidate) => candidates.push(candidate),
                    TemplateCandidate::CountMismatch { expected } => {
                        count_mismatch = Some((info.qualified_name.clone(), expected));
                        rejected.push(template_label(&info));
                    }
                    TemplateCandidate::InferenceFailed(reason) => {
                        inference_failures.push(reason);
                        rejected.push(template_label(&info));
                    }
                    TemplateCandidate::Rejected => rejected.push(template_label(&info)),
                }
                continue;
            }
            if explicit.is_some() {
                count_mismatch.get_or_insert((info.qualified_name.clone(), 0));
                rejected.push(info.qualified_name.clone());
                continue;
            }
            self.ctx.require_def(def, Phase::Build)?;
            let params = self
                .ctx
                .defs
                .get_params(def)
                .map(|params| params.iter().map(|p| p.ty).collect::<Vec<_>>())
                .unwrap_or_default();
            candidates.push(Candidate {
                key: Callee::Function(def),
                params,
            });
        }

        if candidates.is_empty() {
            if let (Some((name, expected)), Some(explicit)) = (&count_mismatch, &explicit) {
                let expected = expected.to_string();
                let supplied = explicit.len().to_string();
                self.error(
                    DiagnosticCode::TemplateArgumentCountMismatch,
                    site.span,
                    &[name.as_str(), &expected, &supplied],
                );
                self.reference(site.name, site.span, ReferenceTarget::Error);
                return Ok(TypeId::ERROR);
            }
            if templates == symbols.len() && !inference_failures.is_empty() {
                let reasons = inference_failures.join("; ");
                self.error(
                    DiagnosticCode::TemplateArgumentInferenceFailed,
                    site.span,
                    &[site.name, &reasons],
                );
                self.reference(site.name, site.span, ReferenceTarget::Error);
                return Ok(TypeId::ERROR);
            }
        }

        self.select_overload(site, &candidates, rejected)
    }

    fn template_candidate(
        &mut self,
        def: DefId,
        info: &DefinitionInfo,
        explicit: Option<&[TypeId]>,
        arg_types: &[TypeId],
    ) -> PhaseResult<TemplateCandidate> {
        let Some(template_item) = self.ctx.item_of_def(def) else {
            return Ok(TemplateCandidate::Rejected);
        };
        let Some(DeclKind::Function(func)) = self.ctx.decl(template_item.node).map(|d| &d.kind)
        else {
            return Ok(TemplateCandidate::Rejected);
        };

        let args = match explicit {
            Some(explicit) if explicit.len() != info.type_params.len() => {
                return Ok(TemplateCandidate::CountMismatch {
                    expected: info.type_params.len(),
                });
            }
            Some(explicit) => explicit.to_vec(),
            None => {
                if func.params.len() != arg_types.len() {
                    return Ok(TemplateCandidate::Rejected);
                }
                let param_types: Vec<TypeExpr> = func.params.iter().map(|p| p.ty.clone()).collect();
                match self.infer_type_args(info, &param_types, template_item.scope, arg_types)? {
                    Ok(args) => args,
                    Err(err) => {
                        return Ok(TemplateCandidate::InferenceFailed(
                            self.describe_inference_error(&err),
                        ));
                    }
                }
            }
        };
        if args.iter().any(|arg| arg.is_error()) {
            return Ok(TemplateCandidate::Rejected);
        }

        let mut bindings = (*template_item.substitution).clone();
        bindings.extend(substitution(&info.type_params, &args));
        // Signature types of a losing candidate are not uses, and ranking
        // must not create instances. A parameter naming an instance nobody
        // has created yet cannot accept any argument.
        let mark = self.out.references.len();
        self.lookup_only = true;
        self.missed_instance = false;
        let params: PhaseResult<Vec<TypeId>> = func
            .params
            .iter()
            .map(|param| self.resolve_type_in(&param.ty, template_item.scope, &bindings))
            .collect();
        let missed = std::mem::take(&mut self.missed_instance);
        self.lookup_only = false;
        self.out.references.truncate(mark);
        let params = params?;
        if missed {
            return Ok(TemplateCandidate::Rejected);
        }

        Ok(TemplateCandidate::Ready(Candidate {
            key: Callee::Template {
                template: def,
                args,
            },
            params,
        }))
    }

    /// Rank `candidates`, record the winner and return the call's type.
    fn select_overload(
        &mut self,
        site: &CallSite<'_>,
        candidates: &[Candidate<Callee>],
        mut rejected: Vec<String>,
    ) -> PhaseResult<TypeId> {
        let outcome = resolve_overload(
            &mut self.conversions(),
            &self.ctx.types,
            candidates,
            site.arg_types,
        )?;
        let has_error_arg = site.arg_types.iter().any(|ty| ty.is_error());

        match outcome {
            OverloadOutcome::Resolved { key, conversions } => {
                for (conversion, span) in conversions.into_iter().zip(site.arg_spans) {
                    self.record_conversion(conversion, *span);
                }
                self.record_callee(site, key)
            }
            OverloadOutcome::NoApplicable { rejected: keys } => {
                if !has_error_arg {
                    let mut labels: Vec<String> = keys.iter().map(|k| self.describe(k)).collect();
                    labels.append(&mut rejected);
                    let listed = self.ctx.formatter().format_list(site.arg_types);
                    let labels = cap_candidates(labels);
                    self.error(
                        DiagnosticCode::NoApplicableOverload,
                        site.span,
                        &[site.name, &listed, &labels],
                    );
                }
                self.reference(site.name, site.span, ReferenceTarget::Error);
                Ok(TypeId::ERROR)
            }
            OverloadOutcome::Ambiguous { candidates } => {
                if !has_error_arg {
                    let labels: Vec<String> = candidates.iter().map(|k| self.describe(k)).collect();
                    let listed = self.ctx.formatter().format_list(site.arg_types);
                    let labels = cap_candidates(labels);
                    self.error(
                        DiagnosticCode::AmbiguousOverload,
                        site.span,
                        &[site.name, &listed, &labels],
                    );
                }
                self.reference(site.name, site.span, ReferenceTarget::Error);
                Ok(TypeId::ERROR)
            }
        }
    }

    fn record_callee(&mut self, site: &CallSite<'_>, callee: Callee) -> PhaseResult<TypeId> {
        match callee {
            Callee::Function(def) => {
                self.reference(site.name, site.span, ReferenceTarget::Definition(def));
                Ok(self.ctx.defs.get_return_type(def).unwrap_or(TypeId::ERROR))
            }
            Callee::Template { template, args } => {
                let instance = self.instantiate(template, &args, site.span)?;
                self.reference(site.name, site.span, ReferenceTarget::Definition(instance));
                // The instance's own Build resolves its return type.
                self.ctx.require_def(instance, Phase::Build)?;
                Ok(self.ctx.defs.get_return_type(instance).unwrap_or(TypeId::ERROR))
            }
            Callee::External(function) => {
                let ret = host_type(&function.return_type).unwrap_or(TypeId::ERROR);
                self.reference(
                    site.name,
                    site.span,
                    ReferenceTarget::External(function.qualified_name),
                );
                Ok(ret)
            }
        }
    }

    fn describe(&self, callee: &Callee) -> String {
        match callee {
            Callee::Function(def) => self
                .ctx
                .defs
                .get(*def)
                .map(|info| info.overload_key.unwrap_or(info.qualified_name))
                .unwrap_or_default(),
            Callee::Template { template, args, .. } => {
                let base = self
                    .ctx
                    .defs
                    .get(*template)
                    .map(|info| info.qualified_name)
                    .unwrap_or_default();
                self.ctx.formatter().instance_name(&base, args)
            }
            Callee::External(function) => {
                format!("{}({})", function.qualified_name, function.params.join(","))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------------

    /// `lhs op rhs` where the operands are not both intrinsic numerics of one
    /// family: a user `op_*` function in scope, else a host operator.
    pub(crate) fn resolve_operator_call(
        &mut self,
        op: BinaryOp,
        operands: [(TypeId, Span); 2],
        span: Span,
    ) -> PhaseResult<TypeId> {
        let function = op.function_name();
        let arg_types = [operands[0].0, operands[1].0];
        let arg_spans = [operands[0].1, operands[1].1];
        let site = CallSite {
            name: function,
            span,
            arg_types: &arg_types,
            arg_spans: &arg_spans,
        };

        if let LookupResult::Found { symbols, .. } = self.lookup(function, Namespace::Function)? {
            return self.resolve_function_call(&site, &symbols, &[]);
        }

        // Host signatures name types, never literal values.
        let ctx = self.ctx;
        let host_types = arg_types.map(|ty| ctx.types.widen_literal(ty, ctx.default_integer()));
        let formatter = ctx.formatter();
        let names = [formatter.format(host_types[0]), formatter.format(host_types[1])];
        let param_names = [names[0].as_str(), names[1].as_str()];
        match ctx
            .binder
            .bridge()
            .try_lookup_operator_function(function, None, &param_names)
        {
            Some(found) => {
                let ret = host_type(&found.return_type)
                    .or_else(|| {
                        names
                            .iter()
                            .position(|n| *n == found.return_type)
                            .map(|i| host_types[i])
                    })
                    .unwrap_or(TypeId::ERROR);
                self.reference(function, span, ReferenceTarget::External(found.qualified_name));
                Ok(ret)
            }
            None => {
                let signature = format!("{}({})", function, param_names.join(", "));
                self.error(DiagnosticCode::UnresolvedExternalSymbol, span, &[&signature]);
                self.reference(function, span, ReferenceTarget::Error);
                Ok(TypeId::ERROR)
            }
        }
    }
}

/// Host type names map onto intrinsics by name.
fn host_type(name: &str) -> Option<TypeId> {
    IntrinsicKind::from_name(name).map(IntrinsicKind::type_id)
}

fn template_label(info: &DefinitionInfo) -> String {
    format!("{}<{}>", info.qualified_name, info.type_params.join(","))
}

fn cap_candidates(mut labels: Vec<String>) -> String {
    if labels.len() > MAX_REPORTED_CANDIDATES {
        let hidden = labels.len() - MAX_REPORTED_CANDIDATES;
        labels.truncate(MAX_REPORTED_CANDIDATES);
        labels.push(format!("and {hidden} more"));
    }
    labels.join(", ")
}
