//! Centralized limits and thresholds for the resolver.
//!
//! Keeping these in one place prevents the scheduler, binder and solver from
//! growing their own slightly different copies of the same bound.

/// Maximum nesting depth of template instantiation.
///
/// An instance created while resolving another instance is one level deeper
/// than its creator. Self-expanding templates such as
///
/// ```text
/// Node<T> { next: Node<Box<T>> }
/// ```
///
/// never reach a fixed point; once this depth is exceeded the instance is
/// failed with `InstantiationDepthExceeded` and replaced by the error type.
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum number of parent links followed in a single scope-chain walk.
///
/// Scope chains are acyclic by construction; this only guards against a
/// corrupted arena turning a lookup into an endless loop.
pub const MAX_SCOPE_WALK_ITERATIONS: usize = 10_000;

/// Worker count used when the host cannot report its available parallelism.
pub const FALLBACK_WORKER_THREADS: usize = 4;

/// Upper bound on workers regardless of configuration.
pub const MAX_WORKER_THREADS: usize = 256;

/// Number of rejected candidates listed in a `NoApplicableOverload` message.
pub const MAX_REPORTED_CANDIDATES: usize = 8;
