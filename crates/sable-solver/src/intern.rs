//! Type interning.
//!
//! Intrinsics have fixed ids and never touch the tables. Everything else is
//! interned through a `DashMap` entry, so concurrent first use of the same
//! `TypeData` yields one id.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

use crate::def::DefId;
use crate::types::{IntrinsicKind, TypeData, TypeId};

pub struct TypeInterner {
    by_data: DashMap<TypeData, TypeId>,
    by_id: DashMap<TypeId, TypeData>,
    next_id: AtomicU32,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner {
            by_data: DashMap::new(),
            by_id: DashMap::new(),
            next_id: AtomicU32::new(TypeId::FIRST_USER),
        }
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        match data {
            TypeData::Error => return TypeId::ERROR,
            TypeData::Intrinsic(kind) => return kind.type_id(),
            TypeData::IntLiteral(_) | TypeData::Declared(_) => {}
        }
        if let Some(id) = self.by_data.get(&data) {
            return *id;
        }
        *self.by_data.entry(data.clone()).or_insert_with(|| {
            let id = TypeId(self.next_id.fetch_add(1, Ordering::SeqCst));
            trace!(type_id = id.0, ?data, "TypeInterner::intern");
            self.by_id.insert(id, data);
            id
        })
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        if id.is_error() {
            return Some(TypeData::Error);
        }
        if let Some(kind) = id.intrinsic() {
            return Some(TypeData::Intrinsic(kind));
        }
        self.by_id.get(&id).map(|data| data.clone())
    }

    pub fn declared(&self, def: DefId) -> TypeId {
        self.intern(TypeData::Declared(def))
    }

    pub fn int_literal(&self, value: i128) -> TypeId {
        self.intern(TypeData::IntLiteral(value))
    }

    pub fn as_def(&self, id: TypeId) -> Option<DefId> {
        match self.lookup(id)? {
            TypeData::Declared(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_int_literal(&self, id: TypeId) -> Option<i128> {
        match self.lookup(id)? {
            TypeData::IntLiteral(value) => Some(value),
            _ => None,
        }
    }

    /// The type a value of `id` takes when stored: integer literals become
    /// `default_integer` (or the widest type of its family that holds them).
    pub fn widen_literal(&self, id: TypeId, default_integer: IntrinsicKind) -> TypeId {
        let Some(value) = self.as_int_literal(id) else {
            return id;
        };
        if default_integer.fits(value) {
            return default_integer.type_id();
        }
        [IntrinsicKind::I64, IntrinsicKind::U64]
            .into_iter()
            .find(|kind| kind.fits(value))
            .map_or(TypeId::ERROR, IntrinsicKind::type_id)
    }

    /// Number of non-intrinsic types interned so far.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
