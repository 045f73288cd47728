//! Declaration scheduler and resolution phases for the Sable resolver.
//!
//! Every declaration in the unit becomes a work item that advances through
//! three phases (see [`work_item::Phase`]). Items run on a pool of workers;
//! an item that needs something another item has not produced yet parks on
//! that dependency and is requeued when it is satisfied. The finished run is
//! snapshotted into a [`ResolvedUnit`].
//!
//! ```text
//! resolve()
//!   ├─ enqueue one item per top-level declaration (source-ordered slots)
//!   ├─ Scheduler::run ── workers ── phases::run(item, phase)
//!   │                                 ├─ Symbol     declare, open scopes, spawn nested items
//!   │                                 ├─ Build      signatures, fields, variable types
//!   │                                 └─ CodeBlock  bodies, initializers
//!   └─ output::collect
//! ```

mod call_checker;
pub mod context;
mod expr;
mod instantiation;
pub mod options;
pub mod output;
mod phases;
mod resolver;
pub mod scheduler;
mod type_resolution;
pub mod work_item;

use sable_binder::MetadataBridge;
use sable_solver::Substitution;
use sable_syntax::SyntaxTree;
use std::sync::Arc;
use tracing::info_span;

pub use context::{MemberRef, MemberSlot, ResolverContext};
pub use options::{ResolverOptions, WORKERS_ENV};
pub use output::{
    ResolvedDeclaration, ResolvedField, ResolvedOption, ResolvedUnit, ResolvedUse, UseTarget,
};
pub use scheduler::Scheduler;
pub use work_item::{Dependency, Phase, Suspend, WorkItem, WorkItemId};

/// Resolve every declaration in `tree`.
pub fn resolve(
    tree: &SyntaxTree,
    options: ResolverOptions,
    bridge: Arc<dyn MetadataBridge>,
) -> ResolvedUnit {
    let _span = info_span!("resolve", file = %options.file_name, nodes = tree.len()).entered();
    let workers = options.effective_workers();
    let ctx = ResolverContext::new(tree, options, bridge);
    enqueue_roots(&ctx);
    ctx.scheduler.run(&ctx, workers);
    output::collect(&ctx)
}

/// One counted item per top-level declaration, allocated in source order so
/// the output slots match the input regardless of completion order.
fn enqueue_roots(ctx: &ResolverContext<'_>) {
    let global = ctx.binder.global_scope();
    let Some(scope) = ctx.binder.scope(global) else {
        return;
    };
    let roots = ctx.tree.roots();
    scope.expect_declarations(roots.len());
    let empty = Arc::new(Substitution::default());
    let slots = roots
        .iter()
        .map(|node| {
            ctx.spawn(work_item::NewItem {
                node: *node,
                scope: global,
                parent: None,
                substitution: empty.clone(),
                depth: 0,
                counted: true,
                seed: None,
            })
            .id
        })
        .collect();
    let _ = ctx.slots.set(slots);
    if scope.finish_enumeration() {
        ctx.scheduler.notify(ctx, Dependency::ScopeFrozen(global));
    }
}
