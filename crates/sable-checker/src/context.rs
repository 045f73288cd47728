//! State shared by every worker during one resolution run.

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sable_binder::{BinderState, MetadataBridge, SymbolId};
use sable_common::{Diagnostic, DiagnosticCode, ShardedInterner, Span};
use sable_solver::{
    DefId, DefinitionStore, InstantiationCache, IntrinsicKind, TypeFormatter, TypeId, TypeInterner,
};
use sable_syntax::{Declaration, NodeId, SyntaxTree};
use std::sync::{Arc, Mutex, PoisonError};

use crate::options::ResolverOptions;
use crate::scheduler::Scheduler;
use crate::work_item::{
    Dependency, ItemArena, NewItem, Phase, PhaseResult, Suspend, WorkItem, WorkItemId,
};

/// Where a symbol's type lives: a declaration of its own, or a slot inside
/// the declaration that introduced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberSlot {
    Decl,
    Param(usize),
    Field(usize),
    EnumOption(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemberRef {
    pub item: WorkItemId,
    pub slot: MemberSlot,
}

pub struct ResolverContext<'t> {
    pub tree: &'t SyntaxTree,
    pub options: ResolverOptions,
    pub binder: BinderState,
    pub types: TypeInterner,
    pub defs: DefinitionStore,
    pub instances: InstantiationCache,
    pub items: ItemArena,
    pub scheduler: Scheduler,
    members: DashMap<SymbolId, MemberRef>,
    item_of_def: DashMap<DefId, WorkItemId>,
    diagnostics: Mutex<Vec<Diagnostic>>,
    /// One item per top-level declaration, in source order.
    pub(crate) slots: OnceCell<Vec<WorkItemId>>,
}

impl<'t> ResolverContext<'t> {
    pub fn new(
        tree: &'t SyntaxTree,
        options: ResolverOptions,
        bridge: Arc<dyn MetadataBridge>,
    ) -> Self {
        let binder = BinderState::new(Arc::new(ShardedInterner::new()), bridge)
            .with_imported_namespaces(options.imported_namespaces.clone());
        ResolverContext {
            tree,
            options,
            binder,
            types: TypeInterner::new(),
            defs: DefinitionStore::new(),
            instances: InstantiationCache::new(),
            items: ItemArena::new(),
            scheduler: Scheduler::new(),
            members: DashMap::new(),
            item_of_def: DashMap::new(),
            diagnostics: Mutex::new(Vec::new()),
            slots: OnceCell::new(),
        }
    }

    pub fn decl(&self, node: NodeId) -> Option<&'t Declaration> {
        self.tree.get(node)
    }

    pub fn default_integer(&self) -> IntrinsicKind {
        self.options.default_integer()
    }

    pub fn formatter(&self) -> TypeFormatter<'_> {
        TypeFormatter::new(&self.types, &self.defs)
    }

    pub fn format_type(&self, ty: TypeId) -> String {
        self.formatter().format(ty)
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    pub fn diagnostic(&self, code: DiagnosticCode, span: Span, args: &[&str]) -> Diagnostic {
        Diagnostic::from_code(code, self.options.file_name.as_str(), span, args)
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    pub fn report_all(&self, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(diagnostics);
    }

    /// Every diagnostic so far, sorted by (start, code, message).
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = std::mem::take(
            &mut *self
                .diagnostics
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        all.sort_by(|a, b| {
            (a.start, a.code, &a.message_text).cmp(&(b.start, b.code, &b.message_text))
        });
        all.dedup();
        all
    }

    // -------------------------------------------------------------------------
    // Items and symbols
    // -------------------------------------------------------------------------

    pub fn item(&self, id: WorkItemId) -> Option<Arc<WorkItem>> {
        self.items.get(id)
    }

    /// Allocate an item and hand it to the scheduler.
    pub fn spawn(&self, new: NewItem) -> Arc<WorkItem> {
        let item = self.items.alloc(new);
        self.scheduler.admit(&item);
        item
    }

    pub fn register_member(&self, symbol: SymbolId, member: MemberRef) {
        self.members.insert(symbol, member);
    }

    pub fn member(&self, symbol: SymbolId) -> Option<MemberRef> {
        self.members.get(&symbol).map(|r| *r)
    }

    pub fn register_def(&self, def: DefId, item: WorkItemId) {
        self.item_of_def.insert(def, item);
    }

    pub fn item_of_def(&self, def: DefId) -> Option<Arc<WorkItem>> {
        self.item_of_def
            .get(&def)
            .and_then(|id| self.items.get(*id))
    }

    /// Continue only once `item` has finished `phase`.
    pub fn require(&self, item: WorkItemId, phase: Phase) -> PhaseResult {
        match self.items.get(item) {
            Some(found) if found.is_done(phase) => Ok(()),
            Some(_) => Err(Suspend::Pending(Dependency::Phase(item, phase))),
            None => Err(Suspend::Failed),
        }
    }

    /// `def`'s item must have finished `phase`.
    pub fn require_def(&self, def: DefId, phase: Phase) -> PhaseResult {
        match self.item_of_def.get(&def).map(|id| *id) {
            Some(item) => self.require(item, phase),
            // Definitions without an item are complete on registration.
            None => Ok(()),
        }
    }

    pub fn is_satisfied(&self, dependency: Dependency) -> bool {
        match dependency {
            Dependency::ScopeFrozen(scope) => self
                .binder
                .scope(scope)
                .is_some_and(|scope| scope.is_frozen()),
            Dependency::Phase(item, phase) => {
                self.items.get(item).is_some_and(|item| item.is_done(phase))
            }
        }
    }

    /// Display name of an item's declaration, for diagnostics.
    pub fn item_name(&self, item: &WorkItem) -> String {
        if let Some(def) = item.def.get().and_then(|def| self.defs.get(*def)) {
            return def.qualified_name;
        }
        self.decl(item.node)
            .map(|decl| decl.name.clone())
            .unwrap_or_default()
    }

    pub fn item_span(&self, item: &WorkItem) -> Span {
        self.decl(item.node).map(|decl| decl.span).unwrap_or_default()
    }
}
