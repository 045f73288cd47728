//! Overload resolution.
//!
//! Candidates must match arity exactly and accept every argument at least
//! implicitly. The candidate with the most exact positions wins; ties go to
//! the first declared, unless a tied candidate is incomparable with it (neither
//! parameter list strictly refines the other), which is ambiguous.

use tracing::trace;

use crate::conversion::{ConversionEnv, Conversion, MatchKind, classify, classify_intrinsic};
use crate::intern::TypeInterner;
use crate::types::TypeId;

/// One member of an overload set. `key` identifies it to the caller
/// (a definition, or an external function).
#[derive(Clone, Debug)]
pub struct Candidate<K> {
    pub key: K,
    pub params: Vec<TypeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OverloadOutcome<K> {
    Resolved {
        key: K,
        /// Per-argument conversion applied.
        conversions: Vec<Conversion>,
    },
    NoApplicable {
        rejected: Vec<K>,
    },
    Ambiguous {
        candidates: Vec<K>,
    },
}

struct Eligible<'c, K> {
    candidate: &'c Candidate<K>,
    exact: usize,
    conversions: Vec<Conversion>,
}

/// Pick the best candidate for `args`. `candidates` must be in declaration order.
pub fn resolve_overload<K: Clone, E: ConversionEnv>(
    env: &mut E,
    interner: &TypeInterner,
    candidates: &[Candidate<K>],
    args: &[TypeId],
) -> Result<OverloadOutcome<K>, E::Wait> {
    let mut eligible: Vec<Eligible<'_, K>> = Vec::new();

    'candidates: for candidate in candidates {
        if candidate.params.len() != args.len() {
            continue;
        }
        let mut conversions = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&candidate.params) {
            let conversion = classify(env, interner, *arg, *param)?;
            if !conversion.is_applicable() {
                continue 'candidates;
            }
            conversions.push(conversion);
        }
        let exact = conversions
            .iter()
            .filter(|c| c.kind == MatchKind::Exact)
            .count();
        eligible.push(Eligible {
            candidate,
            exact,
            conversions,
        });
    }

    let Some(best) = eligible.iter().map(|e| e.exact).max() else {
        return Ok(OverloadOutcome::NoApplicable {
            rejected: candidates.iter().map(|c| c.key.clone()).collect(),
        });
    };

    let mut tied = eligible.into_iter().filter(|e| e.exact == best);
    let Some(winner) = tied.next() else {
        return Ok(OverloadOutcome::NoApplicable {
            rejected: candidates.iter().map(|c| c.key.clone()).collect(),
        });
    };

    let incomparable: Vec<K> = tied
        .filter(|other| {
            !refines(interner, &winner.candidate.params, &other.candidate.params)
                && !refines(interner, &other.candidate.params, &winner.candidate.params)
        })
        .map(|other| other.candidate.key.clone())
        .collect();

    if !incomparable.is_empty() {
        trace!(ambiguous = incomparable.len() + 1, "resolve_overload");
        let mut all = vec![winner.candidate.key.clone()];
        all.extend(incomparable);
        return Ok(OverloadOutcome::Ambiguous { candidates: all });
    }

    Ok(OverloadOutcome::Resolved {
        key: winner.candidate.key.clone(),
        conversions: winner.conversions,
    })
}

/// `a` strictly refines `b` when every parameter of `a` converts to the
/// matching parameter of `b` and the lists differ.
pub fn refines(interner: &TypeInterner, a: &[TypeId], b: &[TypeId]) -> bool {
    a.len() == b.len()
        && a != b
        && a.iter()
            .zip(b)
            .all(|(x, y)| classify_intrinsic(interner, *x, *y) != MatchKind::NoMatch)
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
