//! Type solver for the Sable resolver.
//!
//! Owns everything that reasons about types rather than names:
//!
//! - **Interning**: `TypeId` handles with O(1) equality
//! - **Definitions**: the concurrent `DefinitionStore` keyed by `DefId`
//! - **Conversions**: exact / implicit / none classification between types
//! - **Overloads**: ranking candidates against argument types
//! - **Instantiation**: the created-once instance cache and `ena`-based
//!   type-argument inference
//!
//! Nothing here waits. Where a decision needs information that another work
//! item has not produced yet, the caller's environment returns its own
//! `Wait` value and the solver propagates it unchanged.

pub mod conversion;
pub mod def;
pub mod format;
pub mod instantiate;
mod intern;
pub mod overload;
pub mod types;

pub use conversion::{
    Conversion, ConversionEnv, IntrinsicOnly, MatchKind, UserConversion, classify,
    classify_intrinsic, explicit_cast_allowed, widens,
};
pub use def::{
    DefId, DefKind, DefinitionInfo, DefinitionStore, EnumOptionInfo, FieldInfo, ParamInfo,
    ReferenceTarget, ResolvedReference,
};
pub use format::{TypeFormatter, canonical_instance_name};
pub use instantiate::{
    InferenceError, InstantiationCache, InstantiationKey, Substitution, TemplateInference,
    substitution,
};
pub use intern::TypeInterner;
pub use overload::{Candidate, OverloadOutcome, resolve_overload};
pub use types::{IntrinsicKind, NumericFamily, TypeData, TypeId};
