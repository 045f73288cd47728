//! Semantic resolution core for the Sable compiler front end.
//!
//! Takes the declaration tree of one compilation unit and produces a fully
//! resolved declaration graph: every name bound to a definition, every call
//! bound to one overload, every template use bound to one shared instance,
//! and diagnostics for everything that could not be resolved.
//!
//! The work is split across the member crates:
//!
//! | crate | role |
//! |-------|------|
//! | [`common`] | interning, spans, diagnostics, limits |
//! | [`syntax`] | the declaration tree handed in by the parser |
//! | [`binder`] | scopes, symbols, external metadata |
//! | [`solver`] | types, conversions, overloads, instantiation |
//! | [`checker`] | the concurrent scheduler and resolution phases |
//!
//! ```
//! use std::sync::Arc;
//! use sable::binder::NoExternalMetadata;
//! use sable::syntax::{DeclSpec, Expr, SyntaxTreeBuilder, TypeExpr};
//! use sable::{ResolverOptions, resolve_unit};
//!
//! let tree = SyntaxTreeBuilder::build(
//!     "unit.sb",
//!     vec![DeclSpec::variable("x", Some(TypeExpr::named("U8")), Some(Expr::int(7)))],
//! );
//! let unit = resolve_unit(&tree, ResolverOptions::default(), Arc::new(NoExternalMetadata));
//! assert!(!unit.has_errors());
//! assert_eq!(unit.find("x").and_then(|x| x.var_type.as_deref()), Some("U8"));
//! ```

use std::sync::Arc;

pub use sable_binder as binder;
pub use sable_checker as checker;
pub use sable_common as common;
pub use sable_solver as solver;
pub use sable_syntax as syntax;

pub mod tracing_config;

pub use sable_binder::{ExternalFunction, InMemoryMetadata, MetadataBridge, NoExternalMetadata};
pub use sable_checker::{
    ResolvedDeclaration, ResolvedField, ResolvedOption, ResolvedUnit, ResolvedUse,
    ResolverOptions, UseTarget,
};
pub use sable_common::{Diagnostic, DiagnosticCategory, DiagnosticCode, Span};
pub use sable_syntax::{SyntaxTree, SyntaxTreeBuilder};

/// Resolve one compilation unit.
///
/// `SABLE_WORKERS` overrides `options.worker_threads` when set.
pub fn resolve_unit(
    tree: &SyntaxTree,
    options: ResolverOptions,
    bridge: Arc<dyn MetadataBridge>,
) -> ResolvedUnit {
    sable_checker::resolve(tree, options.with_env_overrides(), bridge)
}
