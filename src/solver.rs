mod astar;
mod concurrent;
mod concurrent_astar;
mod pool;
mod sequential;
#[cfg(test)]
pub(crate) mod test_support;

pub use astar::PrioritySearcher;
pub use concurrent::ConcurrentSearcher;
pub use concurrent_astar::ConcurrentPrioritySearcher;
pub use sequential::{Discipline, SequentialSearcher};

use crate::common::{MovePath, NodeRef};
use crate::config::{SearchConfig, Strategy};
use crate::controller::Controller;
use crate::stat::Stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub trait Solver<C: Controller> {
    /// Search from `controller.initial_state()`. `None` means no goal is
    /// reachable (or the search was stopped).
    fn solve(&mut self, controller: &C) -> Option<MovePath<C::Move>>;

    /// Statistics of the most recent `solve`.
    fn stats(&self) -> &Stats;

    /// Handle that stops this solver cooperatively from another thread.
    fn stop_handle(&self) -> StopHandle;
}

impl<C: Controller, S: Solver<C> + ?Sized> Solver<C> for Box<S> {
    fn solve(&mut self, controller: &C) -> Option<MovePath<C::Move>> {
        (**self).solve(controller)
    }

    fn stats(&self) -> &Stats {
        (**self).stats()
    }

    fn stop_handle(&self) -> StopHandle {
        (**self).stop_handle()
    }
}

/// Cooperative cancellation flag. Once stopped, a solver takes no new work;
/// expansions already running finish normally. Every `solve` clears the flag
/// when it starts, so a stop only affects the solve in progress.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

pub fn build_solver<C: Controller + Sync>(
    strategy: Strategy,
    config: &SearchConfig,
) -> Box<dyn Solver<C> + Send> {
    match strategy {
        Strategy::DepthFirst => Box::new(SequentialSearcher::new(Discipline::DepthFirst, config)),
        Strategy::BreadthFirst => {
            Box::new(SequentialSearcher::new(Discipline::BreadthFirst, config))
        }
        Strategy::AStar => Box::new(PrioritySearcher::new(config)),
        Strategy::Concurrent => Box::new(ConcurrentSearcher::new(config)),
        Strategy::ConcurrentAStar => Box::new(ConcurrentPrioritySearcher::new(config)),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn log_progress(interval: u64, expanded: u64, depth: usize) {
    if interval > 0 && expanded % interval == 0 {
        debug!("expanded {expanded} nodes, current depth {depth}");
    }
}

/// Fill in the final statistics, notify the controller and turn the goal
/// node into the returned path.
fn conclude<C: Controller>(
    controller: &C,
    name: &str,
    stats: &mut Stats,
    start: Instant,
    initial: &C::State,
    goal: Option<&NodeRef<C::State, C::Move>>,
) -> Option<MovePath<C::Move>> {
    let path = goal.map(|node| node.to_move_path());
    stats.cost = path.as_ref().map(|path| path.cost);
    stats.time_ms = elapsed_ms(start);
    stats.print(name);

    let state = goal.map_or(initial, |node| node.state());
    controller.on_finished(path.as_ref(), state, stats.expanded, stats.time_ms);
    path
}
