//! Work items: one per declaration, advanced phase by phase.

use bitflags::bitflags;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sable_binder::{ScopeId, SymbolId};
use sable_solver::{DefId, Substitution};
use sable_syntax::NodeId;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkItemId(pub u32);

/// Processing phases, in the order every item runs them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Phase {
    /// Declare the symbol and enumerate nested declarations.
    Symbol,
    /// Resolve signatures, field types and variable types.
    Build,
    /// Resolve bodies and initializers; wait for nested items.
    CodeBlock,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Symbol, Phase::Build, Phase::CodeBlock];

    pub const fn flag(self) -> PhaseSet {
        match self {
            Phase::Symbol => PhaseSet::SYMBOL,
            Phase::Build => PhaseSet::BUILD,
            Phase::CodeBlock => PhaseSet::CODE_BLOCK,
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PhaseSet: u8 {
        const SYMBOL = 1 << 0;
        const BUILD = 1 << 1;
        const CODE_BLOCK = 1 << 2;
    }
}

/// Something a suspended phase is waiting for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    ScopeFrozen(ScopeId),
    Phase(WorkItemId, Phase),
}

/// Why a phase stopped before completing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Suspend {
    /// Requeue once the dependency is satisfied.
    Pending(Dependency),
    /// A diagnostic was recorded and the item cannot make progress.
    Failed,
}

pub type PhaseResult<T = ()> = Result<T, Suspend>;

/// Template instance identity, fixed when the instance item is spawned.
#[derive(Copy, Clone, Debug)]
pub struct InstanceSeed {
    pub symbol: SymbolId,
    pub def: DefId,
}

pub struct WorkItem {
    pub id: WorkItemId,
    pub node: NodeId,
    /// Scope the declaration is declared into.
    pub scope: ScopeId,
    pub parent: Option<WorkItemId>,
    /// Template bindings in effect; inherited by nested items.
    pub substitution: Arc<Substitution>,
    /// Instantiation nesting depth (0 outside any instance).
    pub depth: u32,
    /// Whether the declaration counts toward its scope's pending declarations.
    pub counted: bool,
    pub seed: Option<InstanceSeed>,

    pub symbol: OnceCell<SymbolId>,
    pub def: OnceCell<DefId>,
    /// Scope lookups in this item start from (function/type/module scope).
    pub inner_scope: OnceCell<ScopeId>,
    /// Code block scope of a function body.
    pub body_scope: OnceCell<ScopeId>,
    pub children: OnceCell<Vec<WorkItemId>>,

    done: AtomicU8,
    failed: AtomicBool,
    /// Set while the item sits in the ready queue.
    queued: AtomicBool,
}

impl WorkItem {
    pub fn is_done(&self, phase: Phase) -> bool {
        PhaseSet::from_bits_truncate(self.done.load(Ordering::Acquire)).contains(phase.flag())
    }

    pub fn is_complete(&self) -> bool {
        PhaseSet::from_bits_truncate(self.done.load(Ordering::Acquire)) == PhaseSet::all()
    }

    pub(crate) fn mark_done(&self, phase: Phase) {
        self.done.fetch_or(phase.flag().bits(), Ordering::AcqRel);
    }

    /// The first phase not yet done.
    pub fn next_phase(&self) -> Option<Phase> {
        Phase::ALL.into_iter().find(|phase| !self.is_done(*phase))
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Claim the right to enqueue this item. False if it is already queued.
    pub(crate) fn try_enqueue(&self) -> bool {
        !self.queued.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn dequeued(&self) {
        self.queued.store(false, Ordering::Release);
    }
}

pub struct NewItem {
    pub node: NodeId,
    pub scope: ScopeId,
    pub parent: Option<WorkItemId>,
    pub substitution: Arc<Substitution>,
    pub depth: u32,
    pub counted: bool,
    pub seed: Option<InstanceSeed>,
}

/// Thread-safe storage for work items.
pub struct ItemArena {
    items: DashMap<WorkItemId, Arc<WorkItem>>,
    next_id: AtomicU32,
}

impl Default for ItemArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemArena {
    pub fn new() -> Self {
        ItemArena {
            items: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    pub fn alloc(&self, new: NewItem) -> Arc<WorkItem> {
        let id = WorkItemId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let item = Arc::new(WorkItem {
            id,
            node: new.node,
            scope: new.scope,
            parent: new.parent,
            substitution: new.substitution,
            depth: new.depth,
            counted: new.counted,
            seed: new.seed,
            symbol: OnceCell::new(),
            def: OnceCell::new(),
            inner_scope: OnceCell::new(),
            body_scope: OnceCell::new(),
            children: OnceCell::new(),
            done: AtomicU8::new(0),
            failed: AtomicBool::new(false),
            queued: AtomicBool::new(false),
        });
        self.items.insert(id, item.clone());
        item
    }

    pub fn get(&self, id: WorkItemId) -> Option<Arc<WorkItem>> {
        self.items.get(&id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every item, ordered by id.
    pub fn all(&self) -> Vec<Arc<WorkItem>> {
        let mut items: Vec<Arc<WorkItem>> = self.items.iter().map(|r| r.value().clone()).collect();
        items.sort_by_key(|item| item.id);
        items
    }
}
