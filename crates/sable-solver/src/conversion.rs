//! Conversion applicability between two types.
//!
//! Implicit conversions never chain. An argument gets at most one step:
//! an intrinsic widening, a literal fit, or one user-defined conversion.

use serde::Serialize;
use std::convert::Infallible;

use crate::def::DefId;
use crate::intern::TypeInterner;
use crate::types::{IntrinsicKind, NumericFamily, TypeData, TypeId};

/// How well an argument fits a parameter. Ordered worst to best.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchKind {
    NoMatch,
    Implicit,
    Exact,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub kind: MatchKind,
    /// The user-defined conversion function applied, if any.
    pub via: Option<DefId>,
}

impl Conversion {
    pub const EXACT: Conversion = Conversion {
        kind: MatchKind::Exact,
        via: None,
    };
    pub const IMPLICIT: Conversion = Conversion {
        kind: MatchKind::Implicit,
        via: None,
    };
    pub const NONE: Conversion = Conversion {
        kind: MatchKind::NoMatch,
        via: None,
    };

    pub fn is_applicable(self) -> bool {
        self.kind != MatchKind::NoMatch
    }
}

/// A function `Target(self value: Source): Target`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UserConversion {
    pub def: DefId,
    pub source: TypeId,
}

/// Supplies user-defined conversions to the resolver.
///
/// `Wait` is whatever the caller needs to suspend on when a conversion
/// function's signature is not known yet.
pub trait ConversionEnv {
    type Wait;

    /// Conversion functions producing `target` from `source`, in declaration order.
    fn user_conversions(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Result<Vec<UserConversion>, Self::Wait>;
}

/// Only intrinsic conversions.
pub struct IntrinsicOnly;

impl ConversionEnv for IntrinsicOnly {
    type Wait = Infallible;

    fn user_conversions(
        &mut self,
        _source: TypeId,
        _target: TypeId,
    ) -> Result<Vec<UserConversion>, Infallible> {
        Ok(Vec::new())
    }
}

/// Classify `source -> target` using built-in rules only.
pub fn classify_intrinsic(interner: &TypeInterner, source: TypeId, target: TypeId) -> MatchKind {
    if source == target || source.is_error() {
        return MatchKind::Exact;
    }
    // An unresolved parameter accepts anything but never outranks a real fit.
    if target.is_error() {
        return MatchKind::Implicit;
    }
    let Some(TypeData::Intrinsic(to)) = interner.lookup(target) else {
        return MatchKind::NoMatch;
    };
    match interner.lookup(source) {
        Some(TypeData::IntLiteral(value)) => match to.family() {
            Some(NumericFamily::Float) => MatchKind::Implicit,
            Some(_) if to.fits(value) => MatchKind::Exact,
            _ => MatchKind::NoMatch,
        },
        Some(TypeData::Intrinsic(from)) if widens(from, to) => MatchKind::Implicit,
        _ => MatchKind::NoMatch,
    }
}

/// A strictly widening step within one numeric family.
pub fn widens(from: IntrinsicKind, to: IntrinsicKind) -> bool {
    match (from.family(), to.family()) {
        (Some(a), Some(b)) => a == b && from.width() < to.width(),
        _ => false,
    }
}

/// Classify `source -> target`, consulting user-defined conversions when a
/// declared type is involved.
pub fn classify<E: ConversionEnv>(
    env: &mut E,
    interner: &TypeInterner,
    source: TypeId,
    target: TypeId,
) -> Result<Conversion, E::Wait> {
    match classify_intrinsic(interner, source, target) {
        MatchKind::Exact => return Ok(Conversion::EXACT),
        MatchKind::Implicit => return Ok(Conversion::IMPLICIT),
        MatchKind::NoMatch => {}
    }
    let involves_declared = interner.as_def(source).is_some() || interner.as_def(target).is_some();
    if !involves_declared {
        return Ok(Conversion::NONE);
    }
    let found = env
        .user_conversions(source, target)?
        .into_iter()
        .find(|conv| conv.source == source);
    Ok(match found {
        Some(conv) => Conversion {
            kind: MatchKind::Implicit,
            via: Some(conv.def),
        },
        None => Conversion::NONE,
    })
}

/// Whether a call-style cast `Target(value)` is allowed. Casts may narrow
/// and cross signedness, but only between numeric types.
pub fn explicit_cast_allowed(interner: &TypeInterner, source: TypeId, target: IntrinsicKind) -> bool {
    if source.is_error() || source == target.type_id() {
        return true;
    }
    match interner.lookup(source) {
        Some(TypeData::IntLiteral(_)) => target.is_numeric(),
        Some(TypeData::Intrinsic(from)) => from.is_numeric() && target.is_numeric(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "../tests/conversion_tests.rs"]
mod tests;
