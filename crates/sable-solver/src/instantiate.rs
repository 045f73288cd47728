//! Template instantiation: the instance cache and type-argument inference.
//!
//! Inference uses `ena` union-find. Each template parameter is a key whose
//! value is its bound type; binding a parameter twice to different concrete
//! types is a conflict. Integer literal arguments are settled last so that a
//! literal next to a typed argument adopts that argument's type when it fits.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ena::unify::{InPlaceUnificationTable, UnifyKey, UnifyValue};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::conversion::{MatchKind, classify_intrinsic};
use crate::def::DefId;
use crate::intern::TypeInterner;
use crate::types::{IntrinsicKind, TypeId};

/// Template parameter name to its bound type, in parameter order.
pub type Substitution = IndexMap<String, TypeId, FxBuildHasher>;

pub fn substitution(names: &[String], args: &[TypeId]) -> Substitution {
    names.iter().cloned().zip(args.iter().copied()).collect()
}

// =============================================================================
// Instance cache
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstantiationKey {
    pub template: DefId,
    pub args: SmallVec<[TypeId; 2]>,
}

impl InstantiationKey {
    pub fn new(template: DefId, args: &[TypeId]) -> Self {
        InstantiationKey {
            template,
            args: args.iter().copied().collect(),
        }
    }
}

/// Created-once map from instantiation key to instance definition.
#[derive(Default)]
pub struct InstantiationCache {
    instances: DashMap<InstantiationKey, DefId>,
}

impl InstantiationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &InstantiationKey) -> Option<DefId> {
        self.instances.get(key).map(|r| *r)
    }

    /// Return the instance for `key`, running `create` on a miss. Concurrent
    /// callers with the same key wait on the entry and all see one instance.
    /// `create` must not re-enter this cache.
    pub fn get_or_create(
        &self,
        key: InstantiationKey,
        create: impl FnOnce(&InstantiationKey) -> DefId,
    ) -> (DefId, bool) {
        if let Some(hit) = self.instances.get(&key) {
            trace!(template = key.template.0, "instantiation cache hit");
            return (*hit, false);
        }
        match self.instances.entry(key) {
            Entry::Occupied(hit) => (*hit.get(), false),
            Entry::Vacant(slot) => {
                let def = create(slot.key());
                debug!(template = slot.key().template.0, instance = def.0, "instantiated");
                slot.insert(def);
                (def, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

// =============================================================================
// Inference
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamVar(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Binding(Option<TypeId>);

impl UnifyKey for TypeParamVar {
    type Value = Binding;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TypeParamVar(u)
    }

    fn tag() -> &'static str {
        "TypeParamVar"
    }
}

impl UnifyValue for Binding {
    type Error = (TypeId, TypeId);

    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        match (a.0, b.0) {
            (None, None) => Ok(Binding(None)),
            (Some(t), None) | (None, Some(t)) => Ok(Binding(Some(t))),
            (Some(x), Some(y)) if x == y => Ok(Binding(Some(x))),
            (Some(x), Some(y)) => Err((x, y)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// Two argument positions bind the parameter to different types.
    Conflict {
        param: String,
        first: TypeId,
        second: TypeId,
    },
    /// No argument position mentions the parameter.
    Unbound { param: String },
}

/// Inference state for one call of a template function.
pub struct TemplateInference {
    table: InPlaceUnificationTable<TypeParamVar>,
    params: Vec<(String, TypeParamVar)>,
    literals: Vec<(usize, i128)>,
}

impl TemplateInference {
    pub fn new(params: &[String]) -> Self {
        let mut table = InPlaceUnificationTable::new();
        let params = params
            .iter()
            .map(|name| (name.clone(), table.new_key(Binding(None))))
            .collect();
        TemplateInference {
            table,
            params,
            literals: Vec::new(),
        }
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|(n, _)| n == name)
    }

    pub fn bind(&mut self, index: usize, ty: TypeId) -> Result<(), InferenceError> {
        let Some((name, var)) = self.params.get(index).cloned() else {
            return Ok(());
        };
        self.table
            .unify_var_value(var, Binding(Some(ty)))
            .map_err(|(first, second)| InferenceError::Conflict {
                param: name,
                first,
                second,
            })
    }

    /// Defer an integer literal argument until typed arguments are bound.
    pub fn bind_literal(&mut self, index: usize, value: i128) {
        self.literals.push((index, value));
    }

    pub fn probe(&mut self, index: usize) -> Option<TypeId> {
        let var = self.params.get(index)?.1;
        self.table.probe_value(var).0
    }

    /// Settle deferred literals and return the bound argument list.
    pub fn finish(
        mut self,
        interner: &TypeInterner,
        default_integer: IntrinsicKind,
    ) -> Result<Vec<TypeId>, InferenceError> {
        for (index, value) in std::mem::take(&mut self.literals) {
            let literal = interner.int_literal(value);
            match self.probe(index) {
                Some(bound) if classify_intrinsic(interner, literal, bound) != MatchKind::NoMatch => {}
                _ => {
                    let widened = interner.widen_literal(literal, default_integer);
                    self.bind(index, widened)?;
                }
            }
        }

        let mut args = Vec::with_capacity(self.params.len());
        for index in 0..self.params.len() {
            match self.probe(index) {
                Some(ty) => args.push(ty),
                None => {
                    return Err(InferenceError::Unbound {
                        param: self.params[index].0.clone(),
                    });
                }
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
