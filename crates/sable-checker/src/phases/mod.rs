//! Processing phases.
//!
//! | Phase | Does | Suspends on |
//! |-------|------|-------------|
//! | Symbol | declares the name, opens scopes, spawns nested items | never |
//! | Build | field, parameter, return and variable types | unfrozen scopes, other items' Build |
//! | CodeBlock | bodies, initializers, duplicate signatures, nested items | the same, plus nested items' CodeBlock |
//!
//! Uninstantiated templates only run the Symbol phase; their other phases
//! run in each instance.

mod build;
mod code_block;
mod symbol;

use tracing::trace_span;

use crate::context::ResolverContext;
use crate::resolver::ItemResolver;
use crate::work_item::{Phase, PhaseResult, Suspend, WorkItem};

pub(crate) fn run(ctx: &ResolverContext<'_>, item: &WorkItem, phase: Phase) -> PhaseResult {
    let Some(decl) = ctx.decl(item.node) else {
        return Err(Suspend::Failed);
    };
    let _span = trace_span!("phase", item = item.id.0, ?phase, name = %decl.name).entered();
    let template = item.seed.is_none() && decl.is_template();

    let scope = match phase {
        Phase::Symbol => item.scope,
        Phase::Build => item.inner_scope.get().copied().unwrap_or(item.scope),
        Phase::CodeBlock => item
            .body_scope
            .get()
            .or(item.inner_scope.get())
            .copied()
            .unwrap_or(item.scope),
    };
    let mut resolver = ItemResolver::new(ctx, item, scope);
    let result = match phase {
        Phase::Symbol => resolver.declare_symbol(decl, template),
        _ if template => Ok(()),
        Phase::Build => resolver.build(decl),
        Phase::CodeBlock => resolver.check_code_block(decl),
    };
    if !matches!(result, Err(Suspend::Pending(_))) {
        resolver.commit();
    }
    result
}
