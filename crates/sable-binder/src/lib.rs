//! Symbol & scope model for the Sable resolver.
//!
//! Scopes form a tree (Global -> Module -> Type/Function -> CodeBlock). Each
//! scope owns a symbol table that many workers declare into concurrently.
//! Lookups walk the parent chain innermost-first and fall through to the
//! external metadata bridge at module level.

pub mod external;
pub mod scopes;
pub mod state;
pub mod symbols;

pub use external::{
    ExternalFunction, ExternalModule, InMemoryMetadata, MetadataBridge, NoExternalMetadata,
};
pub use scopes::{Scope, ScopeArena, ScopeId, ScopeKind};
pub use state::{
    BinderState, DeclareRequest, Declared, DuplicateDeclaration, LookupResult, Namespace,
};
pub use symbols::{DeclOrder, Symbol, SymbolArena, SymbolId, SymbolKind};

pub use sable_syntax::{Locality, NodeId};
