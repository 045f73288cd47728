//! Per-phase resolution state for one work item.
//!
//! `ItemResolver` is created for each phase run. Diagnostics and references
//! go to a private buffer that is committed only when the phase completes or
//! fails; a phase that suspends is rerun from scratch later, so its buffer
//! is dropped to avoid reporting anything twice.

use sable_binder::{LookupResult, Namespace, ScopeId, SymbolId};
use sable_common::{Diagnostic, DiagnosticCode, Span};
use sable_solver::{
    Conversion, ConversionEnv, DefId, ReferenceTarget, ResolvedReference, Substitution, TypeData,
    TypeId, UserConversion, classify,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::context::{MemberSlot, ResolverContext};
use crate::work_item::{Dependency, Phase, PhaseResult, Suspend, WorkItem};

#[derive(Default)]
pub(crate) struct PhaseOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub references: Vec<ResolvedReference>,
}

pub(crate) struct ItemResolver<'a, 'ctx> {
    pub ctx: &'a ResolverContext<'ctx>,
    pub item: &'a WorkItem,
    /// Innermost scope for lookups made by this phase.
    pub scope: ScopeId,
    pub out: PhaseOutput,
    /// Generic types resolve only to instances that already exist; a miss
    /// sets `missed_instance` instead of creating one.
    pub lookup_only: bool,
    pub missed_instance: bool,
}

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub fn new(ctx: &'a ResolverContext<'ctx>, item: &'a WorkItem, scope: ScopeId) -> Self {
        ItemResolver {
            ctx,
            item,
            scope,
            out: PhaseOutput::default(),
            lookup_only: false,
            missed_instance: false,
        }
    }

    /// Publish buffered diagnostics and attach references to the item's definition.
    pub fn commit(self) {
        let PhaseOutput {
            diagnostics,
            references,
        } = self.out;
        if let Some(def) = self.item.def.get() {
            if !references.is_empty() {
                self.ctx.defs.add_references(*def, references);
            }
        }
        self.ctx.report_all(diagnostics);
    }

    pub fn substitution(&self) -> &'a Substitution {
        &self.item.substitution
    }

    // -------------------------------------------------------------------------
    // Diagnostics and references
    // -------------------------------------------------------------------------

    /// Synthesized nodes carry empty spans; report those at the declaration.
    pub fn anchor(&self, span: Span) -> Span {
        if span.is_empty() {
            self.ctx.item_span(self.item)
        } else {
            span
        }
    }

    pub fn error(&mut self, code: DiagnosticCode, span: Span, args: &[&str]) {
        let span = self.anchor(span);
        trace!(code = code.code(), start = span.start, "diagnostic");
        let diagnostic = self.ctx.diagnostic(code, span, args);
        self.out.diagnostics.push(diagnostic);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.out.diagnostics.push(diagnostic);
    }

    pub fn reference(&mut self, name: impl Into<String>, span: Span, target: ReferenceTarget) {
        let span = self.anchor(span);
        self.out.references.push(ResolvedReference {
            name: name.into(),
            span,
            target,
        });
    }

    pub fn unresolved(&mut self, name: &str, span: Span) -> TypeId {
        self.error(DiagnosticCode::UnresolvedReference, span, &[name]);
        self.reference(name, span, ReferenceTarget::Error);
        TypeId::ERROR
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub fn lookup(&self, name: &str, namespace: Namespace) -> PhaseResult<LookupResult> {
        self.lookup_from(self.scope, name, namespace)
    }

    pub fn lookup_from(
        &self,
        scope: ScopeId,
        name: &str,
        namespace: Namespace,
    ) -> PhaseResult<LookupResult> {
        settled(self.ctx.binder.lookup(scope, name, namespace))
    }

    pub fn lookup_member(
        &self,
        owner: SymbolId,
        name: &str,
        namespace: Namespace,
    ) -> PhaseResult<LookupResult> {
        settled(self.ctx.binder.lookup_member(owner, name, namespace))
    }

    /// Walk `path` from `scope`: the first segment by ordinary lookup, the
    /// rest as members. The last segment is looked up in `last`.
    pub fn lookup_path(
        &self,
        scope: ScopeId,
        path: &[String],
        last: Namespace,
    ) -> PhaseResult<PathLookup> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(PathLookup::Missing { resolved: 0 });
        };
        let namespace = if rest.is_empty() { last } else { Namespace::Any };
        let mut symbols = match self.lookup_from(scope, first, namespace)? {
            LookupResult::Found { symbols, .. } => symbols,
            LookupResult::External(_) => return Ok(PathLookup::External),
            LookupResult::Missing | LookupResult::Unsettled(_) => {
                return Ok(PathLookup::Missing { resolved: 0 });
            }
        };
        for (index, segment) in rest.iter().enumerate() {
            let Some(owner) = symbols.first().copied() else {
                return Ok(PathLookup::Missing { resolved: index });
            };
            if self.is_value_symbol(owner) {
                return Ok(PathLookup::Value {
                    symbol: owner,
                    consumed: index + 1,
                });
            }
            let namespace = if index + 1 == rest.len() {
                last
            } else {
                Namespace::Any
            };
            symbols = match self.lookup_member(owner, segment, namespace)? {
                LookupResult::Found { symbols, .. } => symbols,
                _ => return Ok(PathLookup::Missing { resolved: index + 1 }),
            };
        }
        Ok(PathLookup::Found(symbols))
    }

    pub fn is_value_symbol(&self, symbol: SymbolId) -> bool {
        self.ctx
            .binder
            .symbol(symbol)
            .is_some_and(|s| s.kind.is_value())
    }

    pub fn def_of(&self, symbol: SymbolId) -> Option<DefId> {
        self.ctx.defs.def_of_symbol(symbol)
    }

    /// Definition a use of `symbol` refers to. Fields, enum options and
    /// parameters refer to the declaration that introduced them.
    pub fn target_def(&self, symbol: SymbolId) -> Option<DefId> {
        if let Some(def) = self.def_of(symbol) {
            return Some(def);
        }
        let member = self.ctx.member(symbol)?;
        self.ctx.item(member.item)?.def.get().copied()
    }

    /// Type of a variable, parameter, field or enum option.
    pub fn value_type(&self, symbol: SymbolId) -> PhaseResult<TypeId> {
        let Some(member) = self.ctx.member(symbol) else {
            return Ok(TypeId::ERROR);
        };
        let Some(def) = self
            .ctx
            .item(member.item)
            .and_then(|owner| owner.def.get().copied())
        else {
            return Ok(TypeId::ERROR);
        };
        if let MemberSlot::EnumOption(_) = member.slot {
            return Ok(self.ctx.types.declared(def));
        }
        self.ctx.require(member.item, Phase::Build)?;
        let defs = &self.ctx.defs;
        let ty = match member.slot {
            MemberSlot::Decl => defs.get_var_type(def),
            MemberSlot::Param(index) => defs
                .get_params(def)
                .and_then(|params| params.get(index).map(|p| p.ty)),
            MemberSlot::Field(index) => defs
                .get_fields(def)
                .and_then(|fields| fields.get(index).map(|f| f.ty)),
            MemberSlot::EnumOption(_) => None,
        };
        Ok(ty.unwrap_or(TypeId::ERROR))
    }

    // -------------------------------------------------------------------------
    // Conversions
    // -------------------------------------------------------------------------

    pub fn conversions(&self) -> ConversionLookup<'a, 'ctx> {
        ConversionLookup { ctx: self.ctx }
    }

    pub fn classify(&self, source: TypeId, target: TypeId) -> PhaseResult<Conversion> {
        classify(&mut self.conversions(), &self.ctx.types, source, target)
    }

    /// `source` must convert implicitly to `target`; otherwise `TypeMismatch`.
    pub fn expect_assignable(
        &mut self,
        source: TypeId,
        target: TypeId,
        span: Span,
    ) -> PhaseResult<()> {
        let conversion = self.classify(source, target)?;
        if !conversion.is_applicable() {
            let from = self.ctx.format_type(source);
            let to = self.ctx.format_type(target);
            self.error(DiagnosticCode::TypeMismatch, span, &[&from, &to]);
            return Ok(());
        }
        self.record_conversion(conversion, span);
        Ok(())
    }

    /// A user-defined conversion applied at `span` is a use of that function.
    pub fn record_conversion(&mut self, conversion: Conversion, span: Span) {
        if let Some(via) = conversion.via {
            let name = self
                .ctx
                .defs
                .get(via)
                .and_then(|info| info.overload_key.or(Some(info.qualified_name)))
                .unwrap_or_default();
            self.reference(name, span, ReferenceTarget::Definition(via));
        }
    }
}

fn settled(result: LookupResult) -> PhaseResult<LookupResult> {
    match result {
        LookupResult::Unsettled(scope) => Err(Suspend::Pending(Dependency::ScopeFrozen(scope))),
        other => Ok(other),
    }
}

/// Outcome of walking a dotted path through the scope tree.
pub(crate) enum PathLookup {
    /// Every segment resolved; symbols of the last one, in declaration order.
    Found(SmallVec<[SymbolId; 2]>),
    /// A value was reached after `consumed` segments; the rest are field accesses.
    Value { symbol: SymbolId, consumed: usize },
    /// The first segment names a host module.
    External,
    /// Segment `resolved` could not be found.
    Missing { resolved: usize },
}

/// Conversion environment over resolved definitions.
///
/// A user conversion to `T` is a function named `T` taking a single `self`
/// parameter and returning `T`. It is searched for next to the target's
/// declaration and next to the source's.
pub(crate) struct ConversionLookup<'a, 'ctx> {
    ctx: &'a ResolverContext<'ctx>,
}

impl ConversionLookup<'_, '_> {
    fn declaring_scope(&self, ty: TypeId) -> Option<ScopeId> {
        let def = self.ctx.types.as_def(ty)?;
        let symbol = self.ctx.defs.get(def)?.symbol;
        self.ctx.binder.symbol(symbol).map(|s| s.scope)
    }
}

impl ConversionEnv for ConversionLookup<'_, '_> {
    type Wait = Suspend;

    fn user_conversions(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Result<Vec<UserConversion>, Suspend> {
        let name = match self.ctx.types.lookup(target) {
            Some(TypeData::Declared(def)) => self.ctx.defs.get_name(def),
            Some(TypeData::Intrinsic(kind)) => Some(kind.name().to_string()),
            _ => None,
        };
        let Some(name) = name else {
            return Ok(Vec::new());
        };

        let mut scopes: SmallVec<[ScopeId; 2]> = SmallVec::new();
        for ty in [target, source] {
            if let Some(scope) = self.declaring_scope(ty) {
                if !scopes.contains(&scope) {
                    scopes.push(scope);
                }
            }
        }

        let mut found = Vec::new();
        for scope_id in scopes {
            let Some(scope) = self.ctx.binder.scope(scope_id) else {
                continue;
            };
            if !scope.is_frozen() {
                return Err(Suspend::Pending(Dependency::ScopeFrozen(scope_id)));
            }
            for symbol in self.ctx.binder.overload_set(scope_id, &name) {
                let Some(def) = self.ctx.defs.def_of_symbol(symbol) else {
                    continue;
                };
                self.ctx.require_def(def, Phase::Build)?;
                let Some(info) = self.ctx.defs.get(def) else {
                    continue;
                };
                if info.is_template() || info.return_type != Some(target) {
                    continue;
                }
                if let [param] = info.params.as_slice() {
                    if param.is_self {
                        found.push(UserConversion {
                            def,
                            source: param.ty,
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}
