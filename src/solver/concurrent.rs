use super::pool::{Expansion, Frontier, SharedSearch};
use super::{conclude, log_progress, Solver, StopHandle};
use crate::common::{MovePath, NodeRef, SearchNode};
use crate::config::SearchConfig;
use crate::controller::Controller;
use crate::error::{SearchError, WorkerFault};
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{instrument, trace, warn};

/// Shared work queue where each new node goes to the tail with probability
/// `breadth_bias` and to the head otherwise.
struct BiasedDeque<S, M> {
    nodes: VecDeque<NodeRef<S, M>>,
    breadth_bias: f64,
}

impl<S, M> BiasedDeque<S, M> {
    fn new(breadth_bias: f64) -> Self {
        BiasedDeque {
            nodes: VecDeque::new(),
            breadth_bias,
        }
    }

    fn is_breadth_first(&self) -> bool {
        self.breadth_bias >= 1.0
    }
}

impl<S: Send + Sync, M: Send + Sync> Frontier for BiasedDeque<S, M> {
    type State = S;
    type Move = M;

    fn push(&mut self, node: NodeRef<S, M>, rng: &mut StdRng) {
        if self.is_breadth_first() || rng.gen_bool(self.breadth_bias) {
            self.nodes.push_back(node);
        } else {
            self.nodes.push_front(node);
        }
    }

    fn peek(&self) -> Option<&NodeRef<S, M>> {
        self.nodes.front()
    }

    fn pop(&mut self) -> Option<NodeRef<S, M>> {
        self.nodes.pop_front()
    }

    // A pure FIFO expands level by level; the gate keeps workers from
    // starting the next level while the current one is still being expanded.
    fn layer_of(&self, node: &SearchNode<S, M>) -> Option<u64> {
        self.is_breadth_first().then_some(node.depth() as u64)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn clamp_bias(breadth_bias: f64) -> f64 {
    if breadth_bias.is_nan() {
        warn!("breadth bias is NaN, using 1.0");
        1.0
    } else if !(0.0..=1.0).contains(&breadth_bias) {
        let clamped = breadth_bias.clamp(0.0, 1.0);
        warn!("breadth bias {breadth_bias} out of range, using {clamped}");
        clamped
    } else {
        breadth_bias
    }
}

/// Multi-threaded search over a shared queue.
///
/// With `breadth_bias == 1.0` it behaves like a parallel breadth-first search
/// and returns a path with the fewest moves; lower values plunge deeper
/// first and return whatever path is found first.
pub struct ConcurrentSearcher {
    workers: usize,
    breadth_bias: f64,
    seed: u64,
    progress_log_interval: u64,
    stats: Stats,
    faults: Vec<WorkerFault>,
    stop: StopHandle,
}

impl ConcurrentSearcher {
    pub fn new(config: &SearchConfig) -> Self {
        ConcurrentSearcher {
            workers: config.worker_count().max(1),
            breadth_bias: clamp_bias(config.breadth_bias),
            seed: config.seed,
            progress_log_interval: config.progress_log_interval,
            stats: Stats::default(),
            faults: Vec::new(),
            stop: StopHandle::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_breadth_bias(mut self, breadth_bias: f64) -> Self {
        self.breadth_bias = clamp_bias(breadth_bias);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn breadth_bias(&self) -> f64 {
        self.breadth_bias
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Faults caught during the most recent solve.
    pub fn faults(&self) -> &[WorkerFault] {
        &self.faults
    }

    /// Solve once with a different bias; the configured one is kept for
    /// later calls.
    pub fn solve_with_bias<C: Controller + Sync>(
        &mut self,
        controller: &C,
        breadth_bias: f64,
    ) -> Option<MovePath<C::Move>> {
        let configured = std::mem::replace(&mut self.breadth_bias, clamp_bias(breadth_bias));
        let path = Solver::solve(self, controller);
        self.breadth_bias = configured;
        path
    }

    /// Like `solve`, but a search that ends without a solution after a worker
    /// panicked is reported as an error instead of as "no solution".
    #[instrument(skip_all, name = "concurrent", fields(workers = self.workers, bias = self.breadth_bias), level = "debug")]
    pub fn try_solve<C: Controller + Sync>(
        &mut self,
        controller: &C,
    ) -> Result<Option<MovePath<C::Move>>, SearchError> {
        let start = Instant::now();
        self.stop.reset();
        self.stats = Stats {
            workers: self.workers,
            ..Stats::default()
        };
        self.faults.clear();

        let initial = controller.initial_state();
        let shared = SharedSearch::new(
            controller,
            BiasedDeque::new(self.breadth_bias),
            self.stop.clone(),
        );
        controller.already_seen(&initial, &mut &shared.seen);
        let mut rng = StdRng::seed_from_u64(self.seed);
        shared.queue.seed(SearchNode::root(initial.clone(), 0), &mut rng);

        let interval = self.progress_log_interval;
        let goal = shared.run(self.workers, self.seed, |shared, node| {
            trace!("expand node: {node:?}");
            let expanded = shared.record_expansion();
            if controller.is_goal(node.state()) {
                return Expansion::Goal;
            }

            let mut seen = &shared.seen;
            let mut children = Vec::new();
            for mv in controller.legal_moves(node.state()) {
                if !shared.is_running() {
                    break;
                }
                let next = controller.apply_move(node.state(), &mv);
                shared.record_generated();
                if controller.already_seen(&next, &mut seen) {
                    shared.record_duplicate();
                    continue;
                }
                let step_cost = controller.move_cost(node.state(), &mv);
                children.push(SearchNode::child(node, next, mv, step_cost, 0));
            }

            controller.on_progress(node.state(), expanded);
            log_progress(interval, expanded, node.depth());
            Expansion::Children(children)
        });

        self.stats.expanded = shared.expanded.load(Ordering::Relaxed);
        self.stats.generated = shared.generated.load(Ordering::Relaxed);
        self.stats.duplicates = shared.duplicates.load(Ordering::Relaxed);
        self.faults = shared.take_faults();

        let path = conclude(controller, "concurrent", &mut self.stats, start, &initial, goal.as_ref());
        if path.is_none() && !self.faults.is_empty() {
            return Err(SearchError::WorkerFaults {
                faults: self.faults.clone(),
            });
        }
        Ok(path)
    }
}

impl<C: Controller + Sync> Solver<C> for ConcurrentSearcher {
    fn solve(&mut self, controller: &C) -> Option<MovePath<C::Move>> {
        self.try_solve(controller).unwrap_or_default()
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
