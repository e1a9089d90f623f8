use super::astar::OpenNode;
use super::pool::{Expansion, Frontier, SharedSearch};
use super::{conclude, log_progress, Solver, StopHandle};
use crate::common::{MovePath, NodeRef, SearchNode};
use crate::config::SearchConfig;
use crate::controller::Controller;
use crate::error::{SearchError, WorkerFault};
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{instrument, trace};

/// Open list shared by all workers, ordered like `PrioritySearcher`'s.
struct CostFrontier<S, M> {
    nodes: BTreeSet<OpenNode<S, M>>,
    order: u64,
}

impl<S, M> CostFrontier<S, M> {
    fn new() -> Self {
        CostFrontier {
            nodes: BTreeSet::new(),
            order: 0,
        }
    }
}

impl<S: Send + Sync, M: Send + Sync> Frontier for CostFrontier<S, M> {
    type State = S;
    type Move = M;

    fn push(&mut self, node: NodeRef<S, M>, _rng: &mut StdRng) {
        self.order += 1;
        self.nodes.insert(OpenNode::new(node, self.order));
    }

    fn peek(&self) -> Option<&NodeRef<S, M>> {
        self.nodes.first().map(|entry| &entry.node)
    }

    fn pop(&mut self) -> Option<NodeRef<S, M>> {
        self.nodes.pop_first().map(|entry| entry.node)
    }

    // Nodes are only expanded alongside nodes of equal estimate, so the
    // expansion order stays non-decreasing across workers.
    fn layer_of(&self, node: &SearchNode<S, M>) -> Option<u64> {
        Some(node.estimated_cost())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Multi-threaded A*. Workers always take the globally cheapest node; a
/// state is claimed in the shared seen-set when its node is taken, so no
/// state is expanded twice. The first goal found is optimal when the
/// heuristic is consistent; a state is never reopened, so an estimate that is
/// admissible but not consistent may yield a costlier path.
pub struct ConcurrentPrioritySearcher {
    workers: usize,
    seed: u64,
    progress_log_interval: u64,
    stats: Stats,
    faults: Vec<WorkerFault>,
    stop: StopHandle,
}

impl ConcurrentPrioritySearcher {
    pub fn new(config: &SearchConfig) -> Self {
        ConcurrentPrioritySearcher {
            workers: config.worker_count().max(1),
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

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn faults(&self) -> &[WorkerFault] {
        &self.faults
    }

    #[instrument(skip_all, name = "concurrent_a_star", fields(workers = self.workers), level = "debug")]
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
        let shared = SharedSearch::new(controller, CostFrontier::new(), self.stop.clone());
        let root = SearchNode::root(initial.clone(), controller.heuristic_distance(&initial));
        let mut rng = StdRng::seed_from_u64(self.seed);
        shared.queue.seed(root, &mut rng);

        let interval = self.progress_log_interval;
        let goal = shared.run(self.workers, self.seed, |shared, node| {
            let mut seen = &shared.seen;
            if controller.already_seen(node.state(), &mut seen) {
                shared.record_duplicate();
                return Expansion::Skipped;
            }
            trace!("expand node: {node:?}");
            let expanded = shared.record_expansion();
            if controller.is_goal(node.state()) {
                return Expansion::Goal;
            }

            let mut children = Vec::new();
            for mv in controller.legal_moves(node.state()) {
                if !shared.is_running() {
                    break;
                }
                let next = controller.apply_move(node.state(), &mv);
                shared.record_generated();
                if seen.contains(&next) {
                    shared.record_duplicate();
                    continue;
                }
                let step_cost = controller.move_cost(node.state(), &mv);
                let h_cost = controller.heuristic_distance(&next);
                children.push(SearchNode::child(node, next, mv, step_cost, h_cost));
            }

            controller.on_progress(node.state(), expanded);
            log_progress(interval, expanded, node.depth());
            Expansion::Children(children)
        });

        self.stats.expanded = shared.expanded.load(Ordering::Relaxed);
        self.stats.generated = shared.generated.load(Ordering::Relaxed);
        self.stats.duplicates = shared.duplicates.load(Ordering::Relaxed);
        self.faults = shared.take_faults();

        let path = conclude(
            controller,
            "concurrent-a-star",
            &mut self.stats,
            start,
            &initial,
            goal.as_ref(),
        );
        if path.is_none() && !self.faults.is_empty() {
            return Err(SearchError::WorkerFaults {
                faults: self.faults.clone(),
            });
        }
        Ok(path)
    }
}

impl<C: Controller + Sync> Solver<C> for ConcurrentPrioritySearcher {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::is_solution;
    use crate::solver::test_support::{init_tracing, Grid, Roads};
    use std::collections::HashSet;

    fn searcher(workers: usize) -> ConcurrentPrioritySearcher {
        ConcurrentPrioritySearcher::new(&SearchConfig::default()).with_workers(workers)
    }

    #[test]
    fn test_grid_path_is_optimal_for_any_worker_count() {
        init_tracing();
        let grid = Grid::new(10, 10).with_goal((9, 6));
        for workers in [1, 2, 4, 16] {
            let mut solver = searcher(workers);
            let path = solver.solve(&grid).unwrap();
            assert_eq!(path.cost, 15, "{workers} workers");
            assert!(is_solution(&grid, &path));
        }
    }

    #[test]
    fn test_cheap_detour_wins_in_parallel() {
        init_tracing();
        let toll = Roads::toll();
        for workers in [1, 3, 8] {
            let path = searcher(workers).solve(&toll).unwrap();
            assert_eq!(path.cost, 3);
            assert!(is_solution(&toll, &path));
        }
    }

    #[test]
    fn test_no_state_expanded_twice() {
        init_tracing();
        let grid = Grid::new(8, 6);
        for workers in [1, 2, 10, 100] {
            let mut solver = searcher(workers);
            assert!(solver.solve(&grid).is_none());
            assert_eq!(solver.stats().expanded, 48);

            let expansions = grid.take_expansions();
            let distinct: HashSet<_> = expansions.iter().copied().collect();
            assert_eq!(expansions.len(), 48, "{workers} workers");
            assert_eq!(distinct.len(), 48);
        }
    }

    #[test]
    fn test_expansion_order_follows_estimated_cost() {
        init_tracing();
        let grid = Grid::new(12, 12);
        for workers in [1, 8, 32] {
            let mut solver = searcher(workers);
            assert!(solver.solve(&grid).is_none());

            let estimates: Vec<u64> = grid
                .take_expansions()
                .into_iter()
                .map(|cell| grid.estimated_cost(cell))
                .collect();
            assert_eq!(estimates.len(), 144, "{workers} workers");
            assert!(
                estimates.windows(2).all(|pair| pair[0] <= pair[1]),
                "{workers} workers: {estimates:?}"
            );
        }
    }

    #[test]
    fn test_inconsistent_estimate_still_expands_each_state_once() {
        init_tracing();
        let roads = Roads::overestimated_shortcut();
        for workers in [1, 4] {
            let mut solver = searcher(workers);
            let path = solver.solve(&roads).unwrap();
            assert!(is_solution(&roads, &path));
            assert!(path.cost >= 5);
            assert_eq!(solver.stats().expanded, 4, "{workers} workers");
        }
    }

    #[test]
    fn test_worker_fault_without_solution_is_reported() {
        init_tracing();
        let grid = Grid::new(4, 1).with_goal((3, 0)).with_panic_at((2, 0));
        let mut solver = searcher(2);
        let err = solver.try_solve(&grid).unwrap_err();
        assert!(matches!(err, SearchError::WorkerFaults { ref faults } if faults.len() == 1));
        assert!(err.to_string().contains("1 worker fault(s)"));
    }
}
