use super::{conclude, log_progress, Solver, StopHandle};
use crate::common::{MovePath, NodeRef, SearchNode, SeenSet};
use crate::config::SearchConfig;
use crate::controller::Controller;
use crate::stat::Stats;

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::time::Instant;
use tracing::{debug, instrument, trace};

/// Open list entry ordered by estimated cost, then by insertion order.
pub(super) struct OpenNode<S, M> {
    pub(super) estimated_cost: u64,
    pub(super) order: u64,
    pub(super) node: NodeRef<S, M>,
}

impl<S, M> OpenNode<S, M> {
    pub(super) fn new(node: NodeRef<S, M>, order: u64) -> Self {
        OpenNode {
            estimated_cost: node.estimated_cost(),
            order,
            node,
        }
    }
}

impl<S, M> PartialEq for OpenNode<S, M> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost == other.estimated_cost && self.order == other.order
    }
}

impl<S, M> Eq for OpenNode<S, M> {}

impl<S, M> PartialOrd for OpenNode<S, M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S, M> Ord for OpenNode<S, M> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimated_cost
            .cmp(&other.estimated_cost)
            // Equal estimates leave in insertion order.
            .then_with(|| self.order.cmp(&other.order))
    }
}

/// Closed list seen from a node with path cost `cost`: a state is admitted
/// again only if it is now reached more cheaply than when it was closed.
struct ClosedAt<'a, S> {
    best: &'a mut HashMap<S, u64>,
    cost: u64,
}

impl<S: Eq + Hash> SeenSet<S> for ClosedAt<'_, S> {
    fn insert(&mut self, state: S) -> bool {
        match self.best.entry(state) {
            Entry::Occupied(mut entry) if *entry.get() > self.cost => {
                entry.insert(self.cost);
                true
            }
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(self.cost);
                true
            }
        }
    }

    fn contains(&self, state: &S) -> bool {
        self.best.get(state).is_some_and(|&best| best <= self.cost)
    }

    fn len(&self) -> usize {
        self.best.len()
    }
}

/// Single-threaded A*.
///
/// A state is closed when it is popped rather than when it is generated, and
/// a closed state is reopened when a cheaper path to it shows up later. The
/// returned path is optimal whenever the controller's heuristic never
/// overestimates; with a consistent heuristic no state is reopened.
pub struct PrioritySearcher {
    progress_log_interval: u64,
    stats: Stats,
    stop: StopHandle,
}

impl PrioritySearcher {
    pub fn new(config: &SearchConfig) -> Self {
        PrioritySearcher {
            progress_log_interval: config.progress_log_interval,
            stats: Stats::default(),
            stop: StopHandle::new(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl Default for PrioritySearcher {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl<C: Controller> Solver<C> for PrioritySearcher {
    #[instrument(skip_all, name = "a_star", level = "debug")]
    fn solve(&mut self, controller: &C) -> Option<MovePath<C::Move>> {
        let start = Instant::now();
        self.stop.reset();
        self.stats = Stats {
            workers: 1,
            ..Stats::default()
        };

        let initial = controller.initial_state();
        let mut open_list = BTreeSet::new();
        let mut closed_list: HashMap<C::State, u64> = HashMap::new();
        let mut order = 0u64;

        let root = SearchNode::root(initial.clone(), controller.heuristic_distance(&initial));
        open_list.insert(OpenNode::new(root, order));

        let mut goal = None;
        while let Some(OpenNode { node: current, .. }) = open_list.pop_first() {
            if self.stop.is_stopped() {
                debug!("search stopped");
                break;
            }
            let mut closed = ClosedAt {
                best: &mut closed_list,
                cost: current.path_cost(),
            };
            if controller.already_seen(current.state(), &mut closed) {
                self.stats.duplicates += 1;
                continue;
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
                let step_cost = controller.move_cost(current.state(), &mv);
                let g_cost = current.path_cost().saturating_add(step_cost);
                if closed_list.get(&next).is_some_and(|&best| best <= g_cost) {
                    self.stats.duplicates += 1;
                    continue;
                }
                let h_cost = controller.heuristic_distance(&next);
                order += 1;
                open_list.insert(OpenNode::new(
                    SearchNode::child(&current, next, mv, step_cost, h_cost),
                    order,
                ));
            }

            controller.on_progress(current.state(), self.stats.expanded);
            log_progress(self.progress_log_interval, self.stats.expanded, current.depth());
        }

        if goal.is_none() {
            debug!("cannot find solution");
        }
        conclude(controller, "a-star", &mut self.stats, start, &initial, goal.as_ref())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
