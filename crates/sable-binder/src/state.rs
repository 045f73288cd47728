//! Binder state: declaring names into scopes and looking them up.

use sable_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use sable_common::{Atom, Diagnostic, DiagnosticCode, ShardedInterner, Span};
use sable_syntax::Locality;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::external::{ExternalModule, MetadataBridge};
use crate::scopes::{Scope, ScopeArena, ScopeId, ScopeKind};
use crate::symbols::{DeclOrder, Symbol, SymbolArena, SymbolId, SymbolKind};

/// Which symbols a lookup may return.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Namespace {
    Any,
    Type,
    Function,
    /// Variables, fields and enum options.
    Value,
}

impl Namespace {
    pub const fn admits(self, kind: SymbolKind) -> bool {
        match self {
            Namespace::Any => true,
            Namespace::Type => matches!(kind, SymbolKind::Type),
            Namespace::Function => matches!(kind, SymbolKind::Function),
            Namespace::Value => kind.is_value(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LookupResult {
    /// Matching symbols from the innermost scope that has any, in declaration order.
    Found {
        scope: ScopeId,
        symbols: SmallVec<[SymbolId; 2]>,
    },
    /// No local declaration; the host metadata has a module of that name.
    External(ExternalModule),
    /// The name is not visible yet and this scope may still declare it.
    Unsettled(ScopeId),
    Missing,
}

impl LookupResult {
    pub fn first(&self) -> Option<SymbolId> {
        match self {
            LookupResult::Found { symbols, .. } => symbols.first().copied(),
            _ => None,
        }
    }
}

pub struct DeclareRequest<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    pub locality: Locality,
    pub order: DeclOrder,
    pub span: Span,
}

/// Two declarations competing for one name.
///
/// The later declaration in source order is always the rejected one, so the
/// report does not depend on which worker declared first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateDeclaration {
    pub name: String,
    pub rejected: SymbolId,
    pub kept: SymbolId,
    pub rejected_span: Span,
}

impl DuplicateDeclaration {
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::from_code(
            DiagnosticCode::DuplicateDeclaration,
            file,
            self.rejected_span,
            &[&self.name],
        )
    }
}

#[derive(Debug)]
pub struct Declared {
    pub symbol: SymbolId,
    pub duplicates: SmallVec<[DuplicateDeclaration; 1]>,
}

/// Scope tree, symbol arena and the host metadata view.
pub struct BinderState {
    interner: Arc<ShardedInterner>,
    pub symbols: SymbolArena,
    pub scopes: ScopeArena,
    bridge: Arc<dyn MetadataBridge>,
    imported_namespaces: Vec<String>,
    global: ScopeId,
}

impl BinderState {
    pub fn new(interner: Arc<ShardedInterner>, bridge: Arc<dyn MetadataBridge>) -> Self {
        let scopes = ScopeArena::new();
        let global = scopes.create(ScopeKind::Global, None, None, String::new()).id;
        BinderState {
            interner,
            symbols: SymbolArena::new(),
            scopes,
            bridge,
            imported_namespaces: Vec::new(),
            global,
        }
    }

    /// Host namespaces searched for unqualified external module names.
    pub fn with_imported_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.imported_namespaces = namespaces;
        self
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn interner(&self) -> &ShardedInterner {
        &self.interner
    }

    pub fn bridge(&self) -> &dyn MetadataBridge {
        self.bridge.as_ref()
    }

    pub fn scope(&self, id: ScopeId) -> Option<Arc<Scope>> {
        self.scopes.get(id)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.symbols.get(id)
    }

    pub fn name_of(&self, atom: Atom) -> Arc<str> {
        self.interner.resolve(atom)
    }

    /// Create a scope under `parent`. Scopes opened by a symbol take its
    /// qualified name as their prefix; code blocks inherit the parent's.
    pub fn create_scope(
        &self,
        kind: ScopeKind,
        parent: ScopeId,
        owner: Option<SymbolId>,
    ) -> Arc<Scope> {
        let prefix = match owner.and_then(|id| self.symbols.get(id)) {
            Some(symbol) => symbol.qualified_name.clone(),
            None => self
                .scopes
                .get(parent)
                .map(|p| p.prefix.clone())
                .unwrap_or_default(),
        };
        let scope = self.scopes.create(kind, Some(parent), owner, prefix);
        trace!(scope = scope.id.0, ?kind, parent = parent.0, "create_scope");
        scope
    }

    /// Register a name in `scope`.
    ///
    /// Functions join the overload set of their name. Any other clash is a
    /// duplicate: the earlier declaration keeps the slot and the later one is
    /// marked shadowed. The new symbol is allocated either way, so every
    /// declaration owns exactly one symbol.
    pub fn declare(&self, scope: &Scope, request: DeclareRequest<'_>) -> Declared {
        let atom = self.interner.intern(request.name);
        let symbol = self.symbols.alloc(
            atom,
            scope.qualify(request.name),
            request.kind,
            request.locality,
            scope.id,
            request.order,
            request.span,
        );

        let mut duplicates = SmallVec::new();
        let mut slot = scope.table.entry(atom).or_default();
        let conflicts: SmallVec<[Arc<Symbol>; 2]> = slot
            .iter()
            .filter_map(|id| self.symbols.get(*id))
            .filter(|existing| !request.kind.can_coexist_with(existing.kind))
            .collect();

        if conflicts.is_empty() {
            slot.push(symbol.id);
        } else if conflicts.iter().all(|existing| symbol.order < existing.order) {
            for existing in &conflicts {
                existing.mark_shadowed();
                duplicates.push(DuplicateDeclaration {
                    name: request.name.to_string(),
                    rejected: existing.id,
                    kept: symbol.id,
                    rejected_span: existing.span,
                });
            }
            slot.retain(|id| !conflicts.iter().any(|c| c.id == *id));
            slot.push(symbol.id);
        } else {
            symbol.mark_shadowed();
            let kept = conflicts
                .iter()
                .min_by_key(|existing| existing.order)
                .map(|existing| existing.id)
                .unwrap_or(SymbolId::INVALID);
            duplicates.push(DuplicateDeclaration {
                name: request.name.to_string(),
                rejected: symbol.id,
                kept,
                rejected_span: symbol.span,
            });
        }
        drop(slot);

        debug!(
            symbol = symbol.id.0,
            name = %symbol.qualified_name,
            kind = ?request.kind,
            duplicates = duplicates.len(),
            "declare"
        );
        Declared {
            symbol: symbol.id,
            duplicates,
        }
    }

    /// Register a template instance under its canonical name. The
    /// instantiation cache guarantees this runs at most once per key.
    pub fn declare_instance(
        &self,
        scope: &Scope,
        canonical_name: &str,
        kind: SymbolKind,
        locality: Locality,
        order: DeclOrder,
        span: Span,
    ) -> SymbolId {
        let atom = self.interner.intern(canonical_name);
        let symbol = self.symbols.alloc(
            atom,
            scope.qualify(canonical_name),
            kind,
            locality,
            scope.id,
            order,
            span,
        );
        scope.table.entry(atom).or_default().push(symbol.id);
        symbol.id
    }

    /// Walk the scope chain outward from `from`, innermost first.
    ///
    /// A scope that is not frozen stops the walk with `Unsettled`. Its table
    /// is not final: an overload set could still grow, an earlier duplicate
    /// could still take the slot, or the name could still appear and shadow
    /// anything further out.
    pub fn lookup(&self, from: ScopeId, name: &str, namespace: Namespace) -> LookupResult {
        let atom = self.interner.intern(name);
        let mut current = Some(from);
        let mut iterations = 0;

        while let Some(id) = current {
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                break;
            }
            let Some(scope) = self.scopes.get(id) else {
                break;
            };
            if !scope.is_frozen() {
                return LookupResult::Unsettled(id);
            }
            if let Some(found) = self.matching(&scope, atom, namespace, false) {
                return LookupResult::Found {
                    scope: id,
                    symbols: found,
                };
            }
            current = scope.parent;
        }

        match self.lookup_external_module(name) {
            Some(module) => LookupResult::External(module),
            None => LookupResult::Missing,
        }
    }

    /// Look up `name` among the members of `owner` (a module or type),
    /// as seen from outside it: `Local` members are not visible.
    pub fn lookup_member(&self, owner: SymbolId, name: &str, namespace: Namespace) -> LookupResult {
        let Some(scope) = self
            .symbols
            .get(owner)
            .and_then(|symbol| symbol.own_scope())
            .and_then(|id| self.scopes.get(id))
        else {
            return LookupResult::Missing;
        };
        if !scope.is_frozen() {
            return LookupResult::Unsettled(scope.id);
        }
        let atom = self.interner.intern(name);
        match self.matching(&scope, atom, namespace, true) {
            Some(found) => LookupResult::Found {
                scope: scope.id,
                symbols: found,
            },
            None => LookupResult::Missing,
        }
    }

    fn matching(
        &self,
        scope: &Scope,
        atom: Atom,
        namespace: Namespace,
        from_outside: bool,
    ) -> Option<SmallVec<[SymbolId; 2]>> {
        let slot = scope.slot(atom)?;
        let mut found: SmallVec<[Arc<Symbol>; 2]> = slot
            .iter()
            .filter_map(|id| self.symbols.get(*id))
            .filter(|s| namespace.admits(s.kind) && !s.is_shadowed())
            .filter(|s| !from_outside || s.locality != Locality::Local)
            .collect();
        if found.is_empty() {
            return None;
        }
        found.sort_by_key(|s| s.order);
        Some(found.iter().map(|s| s.id).collect())
    }

    /// All functions named `name` declared directly in `scope`, in declaration order.
    pub fn overload_set(&self, scope: ScopeId, name: &str) -> Vec<SymbolId> {
        let Some(scope) = self.scopes.get(scope) else {
            return Vec::new();
        };
        let atom = self.interner.intern(name);
        self.matching(&scope, atom, Namespace::Function, false)
            .map(|found| found.into_vec())
            .unwrap_or_default()
    }

    /// Resolve a module name against host metadata: first as written, then
    /// inside each imported namespace.
    pub fn lookup_external_module(&self, name: &str) -> Option<ExternalModule> {
        if let Some(module) = self.bridge.try_lookup_module(name) {
            return Some(module);
        }
        self.imported_namespaces.iter().find_map(|ns| {
            self.bridge
                .lookup_namespace(ns)
                .into_iter()
                .find(|module| module.short_name() == name)
        })
    }

    /// Longest prefix of `path` naming a host module, with the number of
    /// segments it consumed.
    pub fn lookup_external_path(&self, path: &[String]) -> Option<(ExternalModule, usize)> {
        (1..path.len()).rev().find_map(|len| {
            self.lookup_external_module(&path[..len].join("."))
                .map(|module| (module, len))
        })
    }
}

#[cfg(test)]
#[path = "../tests/binder_tests.rs"]
mod tests;
