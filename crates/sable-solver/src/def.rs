//! Definition identifiers and storage.
//!
//! A `DefId` names one resolved declaration: a hand-written one or a
//! template instance. The binder's symbols say *that* a name exists; the
//! definition store holds *what* it resolved to, filled in phase by phase as
//! work items advance.
//!
//! ## Identity
//!
//! | Source | Allocated when |
//! |--------|----------------|
//! | Declaration | its symbol phase runs |
//! | Template instance | its instantiation key misses the cache |
//!
//! `bind_symbol` makes the symbol-to-definition link insert-if-absent, so a
//! symbol's definition never changes identity once assigned.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sable_binder::{DeclOrder, Locality, SymbolId};
use sable_common::Span;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

use crate::types::{IntrinsicKind, TypeId};

// =============================================================================
// DefId
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DefKind {
    Module,
    Struct,
    Enum,
    Function,
    Variable,
}

impl DefKind {
    pub const fn is_type(self) -> bool {
        matches!(self, DefKind::Struct | DefKind::Enum)
    }
}

// =============================================================================
// Definition Info
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub span: Span,
    pub ty: TypeId,
    pub is_self: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub span: Span,
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumOptionInfo {
    pub name: String,
    pub span: Span,
    pub value: i64,
}

/// What a use site resolved to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ReferenceTarget {
    Definition(DefId),
    /// A call-style intrinsic cast such as `U8(x)`.
    Cast(IntrinsicKind),
    /// A host-platform function, by qualified name.
    External(String),
    /// Resolution failed; a diagnostic was reported for this site.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    pub name: String,
    pub span: Span,
    pub target: ReferenceTarget,
}

/// Complete information about one definition.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    /// Display name; instances carry their type arguments (`Struct<U8>`).
    pub name: String,
    pub qualified_name: String,
    pub symbol: SymbolId,
    pub locality: Locality,
    pub order: DeclOrder,
    pub span: Span,

    /// Non-empty for templates. Instances keep the template's names.
    pub type_params: Vec<String>,
    /// For instances: the concrete arguments bound to `type_params`.
    pub type_args: Vec<TypeId>,
    /// For instances: the template this was instantiated from.
    pub instance_of: Option<DefId>,

    pub fields: Vec<FieldInfo>,
    pub options: Vec<EnumOptionInfo>,
    pub params: Vec<ParamInfo>,
    /// Function return type, `None` until the build phase sets it.
    pub return_type: Option<TypeId>,
    pub var_type: Option<TypeId>,
    /// Qualified name plus parameter types; set once the parameter types are known.
    pub overload_key: Option<String>,

    /// Nested definitions, in completion order.
    pub members: Vec<DefId>,
    pub references: Vec<ResolvedReference>,
    pub failed: bool,
}

impl DefinitionInfo {
    pub fn new(
        kind: DefKind,
        name: &str,
        qualified_name: &str,
        symbol: SymbolId,
        locality: Locality,
        order: DeclOrder,
        span: Span,
    ) -> Self {
        DefinitionInfo {
            kind,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            symbol,
            locality,
            order,
            span,
            type_params: Vec::new(),
            type_args: Vec::new(),
            instance_of: None,
            fields: Vec::new(),
            options: Vec::new(),
            params: Vec::new(),
            return_type: None,
            var_type: None,
            overload_key: None,
            members: Vec::new(),
            references: Vec::new(),
            failed: false,
        }
    }

    pub fn with_type_params(mut self, names: Vec<String>) -> Self {
        self.type_params = names;
        self
    }

    pub fn instance(mut self, template: DefId, args: Vec<TypeId>) -> Self {
        self.instance_of = Some(template);
        self.type_args = args;
        self
    }

    pub fn is_template(&self) -> bool {
        !self.type_params.is_empty() && self.instance_of.is_none()
    }

    /// Parameter types in declaration order.
    pub fn param_types(&self) -> Vec<TypeId> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Thread-safe storage for definitions.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    symbol_to_def: DashMap<SymbolId, DefId>,
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            symbol_to_def: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(
            def_id = id.0,
            kind = ?info.kind,
            name = %info.qualified_name,
            "DefinitionStore::register"
        );
        self.definitions.insert(id, info);
        id
    }

    /// Link `symbol` to `def` unless it already has a definition.
    /// Returns the definition the symbol ends up bound to.
    pub fn bind_symbol(&self, symbol: SymbolId, def: DefId) -> DefId {
        match self.symbol_to_def.entry(symbol) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                slot.insert(def);
                def
            }
        }
    }

    pub fn def_of_symbol(&self, symbol: SymbolId) -> Option<DefId> {
        self.symbol_to_def.get(&symbol).map(|r| *r)
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<String> {
        self.definitions.get(&id).map(|r| r.name.clone())
    }

    pub fn get_params(&self, id: DefId) -> Option<Vec<ParamInfo>> {
        self.definitions.get(&id).map(|r| r.params.clone())
    }

    pub fn get_return_type(&self, id: DefId) -> Option<TypeId> {
        self.definitions.get(&id).and_then(|r| r.return_type)
    }

    pub fn get_var_type(&self, id: DefId) -> Option<TypeId> {
        self.definitions.get(&id).and_then(|r| r.var_type)
    }

    pub fn get_fields(&self, id: DefId) -> Option<Vec<FieldInfo>> {
        self.definitions.get(&id).map(|r| r.fields.clone())
    }

    pub fn get_options(&self, id: DefId) -> Option<Vec<EnumOptionInfo>> {
        self.definitions.get(&id).map(|r| r.options.clone())
    }

    pub fn is_failed(&self, id: DefId) -> bool {
        self.definitions.get(&id).is_some_and(|r| r.failed)
    }

    /// Record a function signature and its overload key together.
    pub fn set_signature(&self, id: DefId, params: Vec<ParamInfo>, ret: TypeId, key: String) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.params = params;
            entry.return_type = Some(ret);
            entry.overload_key = Some(key);
        }
    }

    pub fn set_fields(&self, id: DefId, fields: Vec<FieldInfo>) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.fields = fields;
        }
    }

    pub fn set_options(&self, id: DefId, options: Vec<EnumOptionInfo>) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.options = options;
        }
    }

    pub fn set_var_type(&self, id: DefId, ty: TypeId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.var_type = Some(ty);
        }
    }

    pub fn add_member(&self, id: DefId, member: DefId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.members.push(member);
        }
    }

    pub fn add_references(&self, id: DefId, refs: Vec<ResolvedReference>) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.references.extend(refs);
        }
    }

    pub fn mark_failed(&self, id: DefId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.failed = true;
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Every `DefId`, ascending.
    pub fn all_ids(&self) -> Vec<DefId> {
        let mut ids: Vec<DefId> = self.definitions.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
