//! Symbol phase: declare, open scopes, enumerate nested declarations.
//!
//! This phase never suspends. Every counted item settles its scope exactly
//! once, after everything reachable through its symbol (own scope, members,
//! definition) is registered, so a lookup that finds the symbol in a frozen
//! scope can rely on all of it.

use sable_binder::{DeclOrder, DeclareRequest, Locality, Scope, ScopeKind, SymbolId, SymbolKind};
use sable_common::Span;
use sable_solver::{DefId, DefKind, DefinitionInfo};
use sable_syntax::{DeclKind, Declaration, NodeId, TypeDeclKind};

use crate::context::{MemberRef, MemberSlot};
use crate::resolver::ItemResolver;
use crate::work_item::{Dependency, NewItem, PhaseResult, Suspend};

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub(crate) fn declare_symbol(&mut self, decl: &Declaration, template: bool) -> PhaseResult {
        let ctx = self.ctx;
        let item = self.item;
        let Some(scope) = ctx.binder.scope(item.scope) else {
            return Err(Suspend::Failed);
        };

        let (symbol, def) = match item.seed {
            Some(seed) => (seed.symbol, seed.def),
            None => self.declare_in(&scope, decl),
        };
        let _ = item.symbol.set(symbol);
        let _ = item.def.set(def);
        ctx.register_def(def, item.id);
        ctx.register_member(
            symbol,
            MemberRef {
                item: item.id,
                slot: MemberSlot::Decl,
            },
        );
        if let Some(parent_def) = item
            .parent
            .and_then(|parent| ctx.item(parent))
            .and_then(|parent| parent.def.get().copied())
        {
            ctx.defs.add_member(parent_def, def);
        }

        if !template {
            self.open_scopes(decl, symbol);
        }

        if item.counted && scope.settle_declaration() {
            ctx.scheduler.notify(ctx, Dependency::ScopeFrozen(scope.id));
        }
        Ok(())
    }

    fn declare_in(&mut self, scope: &Scope, decl: &Declaration) -> (SymbolId, DefId) {
        let ctx = self.ctx;
        let (symbol_kind, def_kind) = kinds(decl);
        let declared = ctx.binder.declare(
            scope,
            DeclareRequest {
                name: &decl.name,
                kind: symbol_kind,
                locality: decl.locality,
                order: DeclOrder::node(decl.id),
                span: decl.span,
            },
        );
        for duplicate in &declared.duplicates {
            self.push_diagnostic(duplicate.to_diagnostic(&ctx.options.file_name));
        }

        let qualified = ctx
            .binder
            .symbol(declared.symbol)
            .map(|s| s.qualified_name.clone())
            .unwrap_or_else(|| scope.qualify(&decl.name));
        let type_params = decl.type_params().iter().map(|p| p.name.clone()).collect();
        let def = ctx.defs.register(
            DefinitionInfo::new(
                def_kind,
                &decl.name,
                &qualified,
                declared.symbol,
                decl.locality,
                DeclOrder::node(decl.id),
                decl.span,
            )
            .with_type_params(type_params),
        );
        (declared.symbol, ctx.defs.bind_symbol(declared.symbol, def))
    }

    fn open_scopes(&mut self, decl: &Declaration, symbol: SymbolId) {
        let ctx = self.ctx;
        let item = self.item;
        let Some(owner) = ctx.binder.symbol(symbol) else {
            return;
        };

        match &decl.kind {
            DeclKind::Module(module) => {
                let scope = ctx.binder.create_scope(ScopeKind::Module, item.scope, Some(symbol));
                owner.set_own_scope(scope.id);
                let _ = item.inner_scope.set(scope.id);
                self.spawn_children(&scope, &module.members);
            }
            DeclKind::Type(ty) => {
                let scope = ctx.binder.create_scope(ScopeKind::Type, item.scope, Some(symbol));
                owner.set_own_scope(scope.id);
                let _ = item.inner_scope.set(scope.id);
                for (index, field) in ty.fields.iter().enumerate() {
                    self.declare_member(
                        &scope,
                        Member {
                            name: &field.name,
                            kind: SymbolKind::Field,
                            locality: Locality::Module,
                            order: DeclOrder::member(decl.id, index as u32),
                            span: field.span,
                            slot: MemberSlot::Field(index),
                        },
                    );
                }
                let first_option = ty.fields.len();
                for (index, option) in ty.options.iter().enumerate() {
                    self.declare_member(
                        &scope,
                        Member {
                            name: &option.name,
                            kind: SymbolKind::EnumOption,
                            locality: Locality::Module,
                            order: DeclOrder::member(decl.id, (first_option + index) as u32),
                            span: option.span,
                            slot: MemberSlot::EnumOption(index),
                        },
                    );
                }
                self.spawn_children(&scope, &ty.methods);
            }
            DeclKind::Function(func) => {
                let scope =
                    ctx.binder
                        .create_scope(ScopeKind::Function, item.scope, Some(symbol));
                owner.set_own_scope(scope.id);
                let _ = item.inner_scope.set(scope.id);
                for (index, param) in func.params.iter().enumerate() {
                    self.declare_member(
                        &scope,
                        Member {
                            name: &param.name,
                            kind: SymbolKind::Variable,
                            locality: Locality::Local,
                            order: DeclOrder::member(decl.id, index as u32),
                            span: param.span,
                            slot: MemberSlot::Param(index),
                        },
                    );
                }
                if func.body.is_some() {
                    let body = ctx.binder.create_scope(ScopeKind::CodeBlock, scope.id, None);
                    let _ = item.body_scope.set(body.id);
                    self.spawn_children(&body, &decl.nested());
                }
                if scope.finish_enumeration() {
                    ctx.scheduler.notify(ctx, Dependency::ScopeFrozen(scope.id));
                }
            }
            DeclKind::Variable(_) => {}
        }
    }

    fn declare_member(&mut self, scope: &Scope, member: Member<'_>) {
        let declared = self.ctx.binder.declare(
            scope,
            DeclareRequest {
                name: member.name,
                kind: member.kind,
                locality: member.locality,
                order: member.order,
                span: member.span,
            },
        );
        for duplicate in &declared.duplicates {
            self.push_diagnostic(duplicate.to_diagnostic(&self.ctx.options.file_name));
        }
        self.ctx.register_member(
            declared.symbol,
            MemberRef {
                item: self.item.id,
                slot: member.slot,
            },
        );
    }

    /// Spawn one item per nested declaration, then close enumeration of `scope`.
    fn spawn_children(&mut self, scope: &Scope, nodes: &[NodeId]) {
        let ctx = self.ctx;
        let item = self.item;
        scope.expect_declarations(nodes.len());
        let children = nodes
            .iter()
            .map(|node| {
                ctx.spawn(NewItem {
                    node: *node,
                    scope: scope.id,
                    parent: Some(item.id),
                    substitution: item.substitution.clone(),
                    depth: item.depth,
                    counted: true,
                    seed: None,
                })
                .id
            })
            .collect();
        let _ = item.children.set(children);
        if scope.finish_enumeration() {
            ctx.scheduler.notify(ctx, Dependency::ScopeFrozen(scope.id));
        }
    }
}

struct Member<'n> {
    name: &'n str,
    kind: SymbolKind,
    locality: Locality,
    order: DeclOrder,
    span: Span,
    slot: MemberSlot,
}

fn kinds(decl: &Declaration) -> (SymbolKind, DefKind) {
    match &decl.kind {
        DeclKind::Module(_) => (SymbolKind::Module, DefKind::Module),
        DeclKind::Type(ty) => match ty.kind {
            TypeDeclKind::Struct => (SymbolKind::Type, DefKind::Struct),
            TypeDeclKind::Enum => (SymbolKind::Type, DefKind::Enum),
        },
        DeclKind::Function(_) => (SymbolKind::Function, DefKind::Function),
        DeclKind::Variable(_) => (SymbolKind::Variable, DefKind::Variable),
    }
}
