//! Source spans (byte offsets into the unit's source text).

use serde::Serialize;

/// A half-open byte range `[start, end)` in the source text.
///
/// Spans are the only location information diagnostics carry, so they can
/// cross worker threads without referencing scopes or work items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// A zero-length span for synthesized nodes.
    pub const fn dummy() -> Self {
        Span { start: 0, end: 0 }
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
