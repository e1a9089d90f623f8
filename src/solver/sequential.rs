use super::{conclude, log_progress, Solver, StopHandle};
use crate::common::{MovePath, SearchNode};
use crate::config::SearchConfig;
use crate::controller::Controller;
use crate::stat::Stats;

use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, instrument, trace};

/// Frontier order for `SequentialSearcher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Stack: newest node first.
    DepthFirst,
    /// Queue: oldest node first.
    BreadthFirst,
}

/// Single-threaded exhaustive search. States are marked seen when they are
/// generated, so each reachable state is expanded at most once.
pub struct SequentialSearcher {
    discipline: Discipline,
    progress_log_interval: u64,
    stats: Stats,
    stop: StopHandle,
}

impl SequentialSearcher {
    pub fn new(discipline: Discipline, config: &SearchConfig) -> Self {
        SequentialSearcher {
            discipline,
            progress_log_interval: config.progress_log_interval,
            stats: Stats::default(),
            stop: StopHandle::new(),
        }
    }

    pub fn depth_first() -> Self {
        Self::new(Discipline::DepthFirst, &SearchConfig::default())
    }

    pub fn breadth_first() -> Self {
        Self::new(Discipline::BreadthFirst, &SearchConfig::default())
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl<C: Controller> Solver<C> for SequentialSearcher {
    #[instrument(skip_all, name = "sequential", fields(discipline = ?self.discipline), level = "debug")]
    fn solve(&mut self, controller: &C) -> Option<MovePath<C::Move>> {
        let start = Instant::now();
        self.stop.reset();
        self.stats = Stats {
            workers: 1,
            ..Stats::default()
        };

        let initial = controller.initial_state();
        let mut seen: HashSet<C::State> = HashSet::new();
        controller.already_seen(&initial, &mut seen);

        let mut frontier = VecDeque::new();
        frontier.push_back(SearchNode::root(initial.clone(), 0));

        let mut goal = None;
        loop {
            let current = match self.discipline {
                Discipline::DepthFirst => frontier.pop_back(),
                Discipline::BreadthFirst => frontier.pop_front(),
            };
            let Some(current) = current else {
                debug!("frontier exhausted");
                break;
            };
            if self.stop.is_stopped() {
                debug!("search stopped");
                break;
            }
            trace!("expand node: {current:?}");

            self.stats.expanded += 1;
            if controller.is_goal(current.state()) {
                goal = Some(current);
                break;
            }

            for mv in controller.legal_moves(current.state()) {
                let next = controller.apply_move(current.state(), &mv);
                self.stats.generated += 1;
                if controller.already_seen(&next, &mut seen) {
                    self.stats.duplicates += 1;
                    continue;
                }
                let step_cost = controller.move_cost(current.state(), &mv);
                frontier.push_back(SearchNode::child(&current, next, mv, step_cost, 0));
            }

            controller.on_progress(current.state(), self.stats.expanded);
            log_progress(self.progress_log_interval, self.stats.expanded, current.depth());
        }

        let name = match self.discipline {
            Discipline::DepthFirst => "depth-first",
            Discipline::BreadthFirst => "breadth-first",
        };
        conclude(controller, name, &mut self.stats, start, &initial, goal.as_ref())
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
    use crate::solver::test_support::{init_tracing, Grid};
    use std::time::Duration;

    #[test]
    fn test_breadth_first_finds_shortest_grid_path() {
        init_tracing();
        let grid = Grid::new(5, 4).with_goal((4, 3));
        let mut solver = SequentialSearcher::breadth_first();
        let path = solver.solve(&grid).unwrap();
        assert_eq!(path.len(), 7);
        assert!(is_solution(&grid, &path));
    }

    #[test]
    fn test_depth_first_returns_valid_path() {
        init_tracing();
        let grid = Grid::new(6, 6).with_goal((5, 0));
        let mut solver = SequentialSearcher::depth_first();
        let path = solver.solve(&grid).unwrap();
        assert!(path.len() >= 5);
        assert!(is_solution(&grid, &path));
    }

    #[test]
    fn test_unreachable_goal_expands_every_state_once() {
        init_tracing();
        let grid = Grid::new(7, 5);
        for discipline in [Discipline::DepthFirst, Discipline::BreadthFirst] {
            let mut solver = SequentialSearcher::new(discipline, &SearchConfig::default());
            assert!(solver.solve(&grid).is_none());
            assert_eq!(solver.stats().expanded, 35);
            assert_eq!(grid.take_expansions().len(), 35);
            assert!(solver.stats().cost.is_none());
        }
    }

    #[test]
    fn test_initial_goal_yields_empty_path() {
        let grid = Grid::new(3, 3).with_goal((0, 0));
        let path = SequentialSearcher::depth_first().solve(&grid).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn test_stopped_searcher_gives_up() {
        let grid = Grid::new(100, 100).with_delay(Duration::from_millis(1));
        let mut solver = SequentialSearcher::breadth_first();
        let stop = solver.stop_handle();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            stop.stop();
        });
        assert!(solver.solve(&grid).is_none());
        assert!(solver.stats().expanded < 10_000);
        stopper.join().unwrap();
        assert!(solver.stop_handle().is_stopped());
    }

    #[test]
    fn test_stop_before_solve_is_cleared() {
        let grid = Grid::new(4, 4).with_goal((3, 3));
        let mut solver = SequentialSearcher::breadth_first();
        solver.stop_handle().stop();
        let path = solver.solve(&grid).unwrap();
        assert_eq!(path.len(), 6);
        assert!(!solver.stop_handle().is_stopped());
    }
}
