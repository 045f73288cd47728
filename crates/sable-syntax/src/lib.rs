//! Syntax tree for Sable compilation units.
//!
//! The parser is an external collaborator; this crate only defines the shape
//! of what it hands to the resolver. Declarations live in a flat arena and are
//! addressed by `NodeId`, which is assigned in source order and never changes,
//! so it doubles as the dependency-identity key for work items.

pub mod builder;
pub mod nodes;

pub use builder::{DeclSpec, StmtSpec, SyntaxTreeBuilder};
pub use nodes::*;
