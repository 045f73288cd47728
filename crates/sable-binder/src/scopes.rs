//! Scopes, their symbol tables, and the freeze protocol.
//!
//! A scope is frozen once every declaration that lives in it has been
//! declared. Until then a failed lookup is not final: the name may still
//! appear. Freezing needs two things: the enclosing declaration has finished
//! enumerating its children (`finish_enumeration`) and every enumerated
//! declaration has run its symbol phase (`settle_declaration`).

use dashmap::DashMap;
use sable_common::Atom;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::symbols::SymbolId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Global,
    Module,
    Type,
    Function,
    CodeBlock,
}

/// Symbols sharing one base name in one scope.
pub(crate) type NameSlot = SmallVec<[SymbolId; 2]>;

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub owner: Option<SymbolId>,
    /// Qualified name prefix for symbols declared here ("" for the global scope).
    pub prefix: String,
    pub(crate) table: DashMap<Atom, NameSlot>,
    pending_declarations: AtomicUsize,
    enumerated: AtomicBool,
    frozen: AtomicBool,
}

impl Scope {
    fn new(
        id: ScopeId,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        owner: Option<SymbolId>,
        prefix: String,
    ) -> Self {
        Scope {
            id,
            kind,
            parent,
            owner,
            prefix,
            table: DashMap::new(),
            pending_declarations: AtomicUsize::new(0),
            enumerated: AtomicBool::new(false),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn qualify(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix, name)
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Register `count` declarations that will later be declared here.
    pub fn expect_declarations(&self, count: usize) {
        self.pending_declarations
            .fetch_add(count, Ordering::AcqRel);
    }

    /// All declarations have been enumerated. Returns true if this call froze the scope.
    pub fn finish_enumeration(&self) -> bool {
        self.enumerated.store(true, Ordering::SeqCst);
        self.try_freeze()
    }

    /// One expected declaration has been declared. Returns true if this call froze the scope.
    pub fn settle_declaration(&self) -> bool {
        let before = self.pending_declarations.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(before > 0, "settle_declaration without a matching expectation");
        self.try_freeze()
    }

    fn try_freeze(&self) -> bool {
        if self.enumerated.load(Ordering::SeqCst)
            && self.pending_declarations.load(Ordering::SeqCst) == 0
        {
            // Exactly one caller observes the transition
            return !self.frozen.swap(true, Ordering::SeqCst);
        }
        false
    }

    pub(crate) fn slot(&self, name: Atom) -> Option<NameSlot> {
        self.table.get(&name).map(|slot| slot.value().clone())
    }

    /// Every name declared here, in arbitrary order.
    pub fn names(&self) -> Vec<Atom> {
        self.table.iter().map(|entry| *entry.key()).collect()
    }
}

/// Thread-safe storage for scopes.
pub struct ScopeArena {
    scopes: DashMap<ScopeId, Arc<Scope>>,
    next_id: AtomicU32,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena {
            scopes: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    pub fn create(
        &self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        owner: Option<SymbolId>,
        prefix: String,
    ) -> Arc<Scope> {
        let id = ScopeId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let scope = Arc::new(Scope::new(id, kind, parent, owner, prefix));
        self.scopes.insert(id, scope.clone());
        scope
    }

    pub fn get(&self, id: ScopeId) -> Option<Arc<Scope>> {
        self.scopes.get(&id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
