//! Common types and utilities for the Sable compiler front end.
//!
//! This crate provides foundational types used across all sable crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, `DiagnosticCode`)
//! - Resolver limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics surface shared by every resolution phase
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticCode, DiagnosticRelatedInformation, format_message,
};

// Centralized limits and thresholds
pub mod limits;
