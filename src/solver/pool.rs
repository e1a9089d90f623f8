//! Worker pool shared by the concurrent searchers.
//!
//! Workers pull nodes from a mutex-guarded frontier, expand them outside the
//! lock and hand the children back in one batch. An atomic task counter
//! (queued + running) detects exhaustion; the first goal lands in a
//! `SingleAssignmentResult`. A frontier may report a layer per node (depth or
//! estimated cost): while tasks are running, only nodes of the same layer may
//! be taken, which keeps expansion order monotone across workers.

use super::StopHandle;
use crate::common::{NodeRef, SearchNode, SingleAssignmentResult};
use crate::controller::Controller;
use crate::error::WorkerFault;

use dashmap::DashSet;
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

/// How often blocked threads re-check the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub(super) trait Frontier: Send {
    type State;
    type Move;

    fn push(&mut self, node: NodeRef<Self::State, Self::Move>, rng: &mut StdRng);

    fn peek(&self) -> Option<&NodeRef<Self::State, Self::Move>>;

    fn pop(&mut self) -> Option<NodeRef<Self::State, Self::Move>>;

    /// Layer used to gate concurrent expansion; `None` means ungated.
    fn layer_of(&self, node: &SearchNode<Self::State, Self::Move>) -> Option<u64>;

    fn len(&self) -> usize;
}

/// Outstanding expansion tasks, queued or running.
#[derive(Debug, Default)]
pub(super) struct TaskCounter(AtomicUsize);

impl TaskCounter {
    pub(super) fn schedule(&self, tasks: usize) {
        self.0.fetch_add(tasks, Ordering::AcqRel);
    }

    /// Returns `true` if this was the last outstanding task.
    pub(super) fn finish(&self) -> bool {
        self.0.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub(super) fn outstanding(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

struct QueueState<F> {
    frontier: F,
    in_flight: usize,
    layer: Option<u64>,
    closed: bool,
}

impl<F: Frontier> QueueState<F> {
    fn can_take(&self) -> bool {
        let Some(next) = self.frontier.peek() else {
            return false;
        };
        if self.in_flight == 0 {
            return true;
        }
        match (self.layer, self.frontier.layer_of(next)) {
            (Some(current), Some(layer)) => layer == current,
            _ => true,
        }
    }
}

pub(super) struct WorkQueue<F> {
    state: Mutex<QueueState<F>>,
    available: Condvar,
    tasks: TaskCounter,
}

impl<F: Frontier> WorkQueue<F> {
    pub(super) fn new(frontier: F) -> Self {
        WorkQueue {
            state: Mutex::new(QueueState {
                frontier,
                in_flight: 0,
                layer: None,
                closed: false,
            }),
            available: Condvar::new(),
            tasks: TaskCounter::default(),
        }
    }

    pub(super) fn seed(&self, root: NodeRef<F::State, F::Move>, rng: &mut StdRng) {
        let mut state = self.state.lock();
        self.tasks.schedule(1);
        state.frontier.push(root, rng);
        self.available.notify_all();
    }

    /// Block until a node may be expanded. `None` once the queue is closed or
    /// the search is stopped.
    pub(super) fn take(&self, stop: &StopHandle) -> Option<NodeRef<F::State, F::Move>> {
        let mut state = self.state.lock();
        loop {
            if state.closed || stop.is_stopped() {
                return None;
            }
            if state.can_take() {
                let node = state.frontier.pop()?;
                state.layer = state.frontier.layer_of(&node);
                state.in_flight += 1;
                return Some(node);
            }
            self.available.wait_for(&mut state, POLL_INTERVAL);
        }
    }

    /// Finish a task taken with `take`, queueing its children. Returns `true`
    /// if no task is left anywhere, in which case the queue closes itself.
    pub(super) fn complete(
        &self,
        children: Vec<NodeRef<F::State, F::Move>>,
        rng: &mut StdRng,
    ) -> bool {
        let mut state = self.state.lock();
        self.tasks.schedule(children.len());
        for child in children {
            state.frontier.push(child, rng);
        }
        state.in_flight -= 1;
        if state.in_flight == 0 {
            state.layer = None;
        }

        let exhausted = self.tasks.finish();
        debug_assert_eq!(
            self.tasks.outstanding(),
            state.frontier.len() + state.in_flight
        );
        if exhausted {
            state.closed = true;
        }
        self.available.notify_all();
        exhausted
    }

    pub(super) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
    }
}

/// What one task produced.
pub(super) enum Expansion<S, M> {
    Goal,
    Children(Vec<NodeRef<S, M>>),
    /// The node's state had already been expanded by someone else.
    Skipped,
}

/// State shared by all workers of one solve.
pub(super) struct SharedSearch<'a, C: Controller, F> {
    pub(super) controller: &'a C,
    pub(super) queue: WorkQueue<F>,
    pub(super) seen: DashSet<C::State>,
    pub(super) result: SingleAssignmentResult<NodeRef<C::State, C::Move>>,
    pub(super) stop: StopHandle,
    pub(super) faults: Mutex<Vec<WorkerFault>>,
    pub(super) expanded: AtomicU64,
    pub(super) generated: AtomicU64,
    pub(super) duplicates: AtomicU64,
}

impl<'a, C, F> SharedSearch<'a, C, F>
where
    C: Controller + Sync,
    F: Frontier<State = C::State, Move = C::Move>,
{
    pub(super) fn new(controller: &'a C, frontier: F, stop: StopHandle) -> Self {
        SharedSearch {
            controller,
            queue: WorkQueue::new(frontier),
            seen: DashSet::new(),
            result: SingleAssignmentResult::new(),
            stop,
            faults: Mutex::new(Vec::new()),
            expanded: AtomicU64::new(0),
            generated: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
        }
    }

    /// Counts an expansion and returns the running total.
    pub(super) fn record_expansion(&self) -> u64 {
        self.expanded.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn record_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether new work should still be scheduled.
    pub(super) fn is_running(&self) -> bool {
        !self.result.is_set() && !self.stop.is_stopped()
    }

    /// Run `expand` on `workers` threads until a goal is found, the frontier
    /// is exhausted or the search is stopped. Returns the goal node.
    pub(super) fn run<E>(&self, workers: usize, seed: u64, expand: E) -> Option<NodeRef<C::State, C::Move>>
    where
        E: Fn(&Self, &NodeRef<C::State, C::Move>) -> Expansion<C::State, C::Move> + Sync,
    {
        thread::scope(|scope| {
            let mut spawned = 0;
            for worker in 0..workers {
                let expand = &expand;
                let handle = thread::Builder::new()
                    .name(format!("search-worker-{worker}"))
                    .spawn_scoped(scope, move || self.work(worker, seed, expand));
                match handle {
                    Ok(_) => spawned += 1,
                    Err(err) => {
                        error!("cannot spawn worker {worker}: {err}");
                        break;
                    }
                }
            }
            if spawned == 0 {
                self.work(0, seed, &expand);
            }
            debug!("{spawned} workers running");

            let outcome = loop {
                if let Some(outcome) = self.result.wait_timeout(POLL_INTERVAL) {
                    break outcome;
                }
                if self.stop.is_stopped() {
                    debug!("search stopped");
                    break None;
                }
            };
            self.queue.close();
            outcome
        })
    }

    fn work<E>(&self, worker: usize, seed: u64, expand: &E)
    where
        E: Fn(&Self, &NodeRef<C::State, C::Move>) -> Expansion<C::State, C::Move> + Sync,
    {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker as u64));
        while let Some(node) = self.queue.take(&self.stop) {
            let children = match panic::catch_unwind(AssertUnwindSafe(|| expand(self, &node))) {
                Ok(Expansion::Goal) => {
                    if self.result.try_set(Arc::clone(&node)) {
                        debug!("worker {worker} reached a goal at depth {}", node.depth());
                        self.queue.close();
                    }
                    Vec::new()
                }
                Ok(Expansion::Children(children)) if self.is_running() => children,
                Ok(Expansion::Children(_)) | Ok(Expansion::Skipped) => Vec::new(),
                Err(payload) => {
                    let fault = WorkerFault {
                        worker,
                        depth: node.depth(),
                        message: panic_message(payload.as_ref()),
                    };
                    error!("worker {worker} failed expanding {:?}: {}", node.state(), fault.message);
                    self.faults.lock().push(fault);
                    Vec::new()
                }
            };

            if self.queue.complete(children, &mut rng) {
                debug!("frontier exhausted");
                self.result.mark_exhausted();
            }
        }
    }

    pub(super) fn take_faults(&self) -> Vec<WorkerFault> {
        std::mem::take(&mut *self.faults.lock())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
