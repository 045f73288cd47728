//! Symbols and the concurrent symbol arena.

use dashmap::DashMap;
use sable_common::{Atom, Span};
use sable_syntax::{Locality, NodeId};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

use crate::scopes::ScopeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Sentinel value for invalid `SymbolId`.
    pub const INVALID: Self = Self(0);

    /// First valid `SymbolId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Module,
    Type,
    Function,
    Variable,
    Field,
    EnumOption,
}

impl SymbolKind {
    pub const fn is_value(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable | SymbolKind::Field | SymbolKind::EnumOption
        )
    }

    /// Whether a symbol of kind `self` may share its name with an existing
    /// symbol of kind `other` in the same scope.
    ///
    /// Functions overload each other, and a type may coexist with functions
    /// of the same name (its user-defined conversions).
    pub const fn can_coexist_with(self, other: SymbolKind) -> bool {
        matches!(
            (self, other),
            (SymbolKind::Function, SymbolKind::Function)
                | (SymbolKind::Function, SymbolKind::Type)
                | (SymbolKind::Type, SymbolKind::Function)
        )
    }
}

/// Source position of a declaration, used wherever "declared first" matters.
///
/// The node id orders declarations; the member index orders fields, enum
/// options and parameters within one declaration node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclOrder {
    pub node: NodeId,
    pub member: u32,
}

impl DeclOrder {
    pub const fn node(node: NodeId) -> Self {
        DeclOrder { node, member: 0 }
    }

    pub const fn member(node: NodeId, index: u32) -> Self {
        DeclOrder {
            node,
            member: index + 1,
        }
    }
}

/// A declared name.
#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    /// Base name (what lookups match on).
    pub name: Atom,
    /// Dotted qualified name, including any instantiation suffix.
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub locality: Locality,
    pub scope: ScopeId,
    pub order: DeclOrder,
    pub span: Span,
    /// Scope opened by this symbol (modules, types, functions).
    own_scope: once_cell::sync::OnceCell<ScopeId>,
    /// Set when a same-named, earlier declaration wins the scope slot.
    shadowed: AtomicBool,
    /// Use sites that resolved to this symbol.
    references: RwLock<Vec<Span>>,
}

impl Symbol {
    pub fn own_scope(&self) -> Option<ScopeId> {
        self.own_scope.get().copied()
    }

    /// Attach the scope this symbol opens. Returns the scope actually attached,
    /// which is the first one ever set.
    pub fn set_own_scope(&self, scope: ScopeId) -> ScopeId {
        *self.own_scope.get_or_init(|| scope)
    }

    pub fn is_shadowed(&self) -> bool {
        self.shadowed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_shadowed(&self) {
        self.shadowed.store(true, Ordering::Release);
    }

    pub fn record_reference(&self, site: Span) {
        if let Ok(mut refs) = self.references.write() {
            refs.push(site);
        }
    }

    /// Recorded use sites in source order.
    pub fn references(&self) -> Vec<Span> {
        let mut refs = self
            .references
            .read()
            .map(|r| r.clone())
            .unwrap_or_default();
        refs.sort();
        refs
    }
}

/// Thread-safe, append-only storage for symbols.
pub struct SymbolArena {
    symbols: DashMap<SymbolId, Arc<Symbol>>,
    next_id: AtomicU32,
}

impl Default for SymbolArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolArena {
    pub fn new() -> Self {
        Self {
            symbols: DashMap::new(),
            next_id: AtomicU32::new(SymbolId::FIRST_VALID),
        }
    }

    pub(crate) fn alloc(
        &self,
        name: Atom,
        qualified_name: String,
        kind: SymbolKind,
        locality: Locality,
        scope: ScopeId,
        order: DeclOrder,
        span: Span,
    ) -> Arc<Symbol> {
        let id = SymbolId(self.next_id.fetch_add(1, Ordering::SeqCst));
        trace!(symbol = id.0, %qualified_name, ?kind, "SymbolArena::alloc");
        let symbol = Arc::new(Symbol {
            id,
            name,
            qualified_name,
            kind,
            locality,
            scope,
            order,
            span,
            own_scope: once_cell::sync::OnceCell::new(),
            shadowed: AtomicBool::new(false),
            references: RwLock::new(Vec::new()),
        });
        self.symbols.insert(id, symbol.clone());
        symbol
    }

    pub fn get(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.symbols.get(&id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
