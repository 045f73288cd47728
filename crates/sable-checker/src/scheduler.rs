//! Work queue, dependency waits and deadlock detection.
//!
//! Workers pop items from one shared queue and run their next unfinished
//! phase. A phase that needs something not yet available returns
//! `Suspend::Pending(dep)`; the item is parked on `dep` and put back on the
//! queue as soon as whoever satisfies `dep` calls `notify`. No worker ever
//! blocks on a dependency, only on the queue itself.
//!
//! The run is over when every admitted item has completed. If the queue is
//! empty, nothing is in flight and items are still outstanding, every one of
//! them is parked on another parked item: that is a deadlock, and the run is
//! aborted with a `ResolutionDeadlock` per item on a wait-for cycle.

use dashmap::DashMap;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use sable_common::DiagnosticCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, debug_span, info, info_span, trace, warn};

use crate::context::ResolverContext;
use crate::phases;
use crate::work_item::{Dependency, Phase, Suspend, WorkItem, WorkItemId};

#[derive(Default)]
struct QueueState {
    ready: VecDeque<WorkItemId>,
    /// Items currently held by a worker.
    in_flight: usize,
    /// Items admitted but not yet complete.
    outstanding: usize,
    aborted: bool,
}

enum Next {
    Item(WorkItemId),
    Deadlock,
    Finished,
}

#[derive(Default)]
pub struct Scheduler {
    queue: Mutex<QueueState>,
    signal: Condvar,
    waiters: DashMap<Dependency, Vec<WorkItemId>>,
    requeues: AtomicUsize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a new item and queue it.
    pub(crate) fn admit(&self, item: &WorkItem) {
        self.lock().outstanding += 1;
        self.enqueue(item);
    }

    fn enqueue(&self, item: &WorkItem) {
        if !item.try_enqueue() {
            return;
        }
        self.lock().ready.push_back(item.id);
        self.signal.notify_one();
    }

    /// Park `item` until `dependency` is satisfied.
    ///
    /// The check runs under the waiter entry's lock, and `notify` removes the
    /// entry only after the dependency is satisfied, so a wake-up cannot slip
    /// between the check and the registration.
    fn wait_on(&self, ctx: &ResolverContext<'_>, item: &WorkItem, dependency: Dependency) {
        let mut parked = self.waiters.entry(dependency).or_default();
        if ctx.is_satisfied(dependency) {
            drop(parked);
            self.requeues.fetch_add(1, Ordering::Relaxed);
            self.enqueue(item);
        } else {
            parked.push(item.id);
        }
    }

    /// Requeue everything parked on `dependency`. Call after satisfying it.
    pub(crate) fn notify(&self, ctx: &ResolverContext<'_>, dependency: Dependency) {
        let Some((_, parked)) = self.waiters.remove(&dependency) else {
            return;
        };
        trace!(?dependency, woken = parked.len(), "notify");
        for id in parked {
            if let Some(item) = ctx.item(id) {
                self.requeues.fetch_add(1, Ordering::Relaxed);
                self.enqueue(&item);
            }
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    pub fn requeue_count(&self) -> usize {
        self.requeues.load(Ordering::Relaxed)
    }

    /// Drain the queue with `workers` threads. Returns once every item has
    /// completed or a deadlock aborted the run.
    pub fn run(&self, ctx: &ResolverContext<'_>, workers: usize) {
        let _span = info_span!("scheduler", workers).entered();
        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("sable-worker-{index}"))
            .build()
        {
            Ok(pool) => pool.scope(|scope| {
                for index in 0..workers {
                    scope.spawn(move |_| self.worker(ctx, index));
                }
            }),
            Err(err) => {
                warn!(%err, "failed to start worker pool; resolving on the calling thread");
                self.worker(ctx, 0);
            }
        }
        info!(
            items = ctx.items.len(),
            requeues = self.requeue_count(),
            aborted = self.is_aborted(),
            "resolution finished"
        );
    }

    fn worker(&self, ctx: &ResolverContext<'_>, index: usize) {
        let _span = debug_span!("worker", index).entered();
        loop {
            match self.next() {
                Next::Item(id) => {
                    let completed = ctx
                        .item(id)
                        .is_some_and(|item| self.process(ctx, &item));
                    self.release(completed);
                }
                Next::Deadlock => {
                    self.report_deadlock(ctx);
                    return;
                }
                Next::Finished => return,
            }
        }
    }

    fn next(&self) -> Next {
        let mut queue = self.lock();
        loop {
            if queue.aborted || queue.outstanding == 0 {
                return Next::Finished;
            }
            if let Some(id) = queue.ready.pop_front() {
                queue.in_flight += 1;
                return Next::Item(id);
            }
            if queue.in_flight == 0 {
                queue.aborted = true;
                self.signal.notify_all();
                return Next::Deadlock;
            }
            queue = self
                .signal
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release(&self, completed: bool) {
        let mut queue = self.lock();
        queue.in_flight -= 1;
        if completed {
            queue.outstanding -= 1;
        }
        if queue.outstanding == 0 || (queue.ready.is_empty() && queue.in_flight == 0) {
            self.signal.notify_all();
        }
    }

    /// Run phases until the item completes (true) or parks (false).
    fn process(&self, ctx: &ResolverContext<'_>, item: &WorkItem) -> bool {
        item.dequeued();
        while let Some(phase) = item.next_phase() {
            match phases::run(ctx, item, phase) {
                Ok(()) => self.finish_phase(ctx, item, phase),
                Err(Suspend::Pending(dependency)) => {
                    trace!(item = item.id.0, ?phase, ?dependency, "pending");
                    self.wait_on(ctx, item, dependency);
                    return false;
                }
                Err(Suspend::Failed) => self.fail(ctx, item),
            }
        }
        true
    }

    fn finish_phase(&self, ctx: &ResolverContext<'_>, item: &WorkItem, phase: Phase) {
        item.mark_done(phase);
        trace!(item = item.id.0, ?phase, "phase done");
        self.notify(ctx, Dependency::Phase(item.id, phase));
    }

    /// Done-with-error: every remaining phase counts as finished so
    /// dependents proceed against the error placeholder.
    fn fail(&self, ctx: &ResolverContext<'_>, item: &WorkItem) {
        debug!(item = item.id.0, name = %ctx.item_name(item), "item failed");
        item.mark_failed();
        if let Some(def) = item.def.get() {
            ctx.defs.mark_failed(*def);
        }
        for phase in Phase::ALL {
            if !item.is_done(phase) {
                self.finish_phase(ctx, item, phase);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Deadlock reporting
    // -------------------------------------------------------------------------

    fn report_deadlock(&self, ctx: &ResolverContext<'_>) {
        let mut waits_on: FxHashMap<WorkItemId, Dependency> = FxHashMap::default();
        for entry in self.waiters.iter() {
            for id in entry.value() {
                waits_on.insert(*id, *entry.key());
            }
        }
        warn!(parked = waits_on.len(), "resolution deadlock");

        let cycles = find_cycles(ctx.items.len(), &waits_on);
        if cycles.is_empty() {
            // Nothing on a cycle: report the earliest parked item.
            let earliest = waits_on
                .keys()
                .filter_map(|id| ctx.item(*id))
                .min_by_key(|item| (ctx.item_span(item), ctx.item_name(item)));
            if let Some(item) = earliest {
                let name = ctx.item_name(&item);
                let diagnostic = ctx.diagnostic(
                    DiagnosticCode::ResolutionDeadlock,
                    ctx.item_span(&item),
                    &[&name, &name],
                );
                ctx.report(diagnostic);
            }
            return;
        }

        for cycle in cycles {
            let mut members: Vec<_> = cycle.iter().filter_map(|id| ctx.item(*id)).collect();
            let Some(start) = members
                .iter()
                .enumerate()
                .min_by_key(|(_, item)| (ctx.item_span(item), ctx.item_name(item)))
                .map(|(index, _)| index)
            else {
                continue;
            };
            members.rotate_left(start);
            let mut path: Vec<String> = members.iter().map(|item| ctx.item_name(item)).collect();
            path.push(path[0].clone());
            let path = path.join(" -> ");
            for item in &members {
                let name = ctx.item_name(item);
                let diagnostic = ctx.diagnostic(
                    DiagnosticCode::ResolutionDeadlock,
                    ctx.item_span(item),
                    &[&name, &path],
                );
                ctx.report(diagnostic);
            }
        }
    }
}

/// Cycles in the wait-for graph. Every parked item waits on exactly one
/// dependency, so each item has at most one successor.
fn find_cycles(
    item_count: usize,
    waits_on: &FxHashMap<WorkItemId, Dependency>,
) -> Vec<Vec<WorkItemId>> {
    let successor = |id: WorkItemId| match waits_on.get(&id) {
        Some(Dependency::Phase(target, _)) => Some(*target),
        Some(Dependency::ScopeFrozen(_)) | None => None,
    };

    let mut starts: Vec<WorkItemId> = waits_on.keys().copied().collect();
    starts.sort();

    let mut visited = FixedBitSet::with_capacity(item_count);
    let mut on_path = FixedBitSet::with_capacity(item_count);
    let mut cycles = Vec::new();

    for start in starts {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            let index = id.0 as usize;
            if index >= item_count {
                break;
            }
            if on_path.contains(index) {
                if let Some(at) = path.iter().position(|p| *p == id) {
                    cycles.push(path[at..].to_vec());
                }
                break;
            }
            if visited.contains(index) {
                break;
            }
            visited.insert(index);
            on_path.insert(index);
            path.push(id);
            current = successor(id);
        }
        for id in &path {
            on_path.set(id.0 as usize, false);
        }
    }
    cycles
}

#[cfg(test)]
#[path = "../tests/scheduler_tests.rs"]
mod tests;
