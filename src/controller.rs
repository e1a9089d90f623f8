use crate::common::{MovePath, SeenSet};

use std::fmt::Debug;
use std::hash::Hash;

/// Puzzle-specific side of a search.
///
/// Every solver in this crate drives a search purely through this trait, so
/// one implementation per puzzle is enough to run any of them. States are
/// value objects: `apply_move` must return a new state and never mutate its
/// input.
///
/// `PrioritySearcher` is optimal when `heuristic_distance` never
/// overestimates the remaining cost. `ConcurrentPrioritySearcher` also needs
/// the estimate to never drop by more than the cost of a single move. Neither
/// is checked at runtime.
pub trait Controller {
    type State: Clone + Eq + Hash + Debug + Send + Sync;
    type Move: Clone + PartialEq + Debug + Send + Sync;

    fn initial_state(&self) -> Self::State;

    fn is_goal(&self, state: &Self::State) -> bool;

    /// Moves applicable in `state`. The order only affects tie-breaking.
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    fn apply_move(&self, state: &Self::State, mv: &Self::Move) -> Self::State;

    fn move_cost(&self, _state: &Self::State, _mv: &Self::Move) -> u64 {
        1
    }

    /// Record `state` in `seen`, returning `true` if it (or a state this
    /// puzzle considers equivalent) had been recorded before.
    fn already_seen(&self, state: &Self::State, seen: &mut dyn SeenSet<Self::State>) -> bool {
        !seen.insert(state.clone())
    }

    fn heuristic_distance(&self, _state: &Self::State) -> u64 {
        0
    }

    /// Called after each expansion. Must be cheap and must not block.
    fn on_progress(&self, _state: &Self::State, _tries: u64) {}

    /// Called once per solve. `state` is the goal reached, or the initial
    /// state when no solution was found.
    fn on_finished(
        &self,
        _path: Option<&MovePath<Self::Move>>,
        _state: &Self::State,
        _tries: u64,
        _elapsed_ms: u64,
    ) {
    }
}

/// Apply `moves` from the initial state, checking each one is legal where it
/// is played. Returns the final state, or `None` at the first illegal move.
pub fn replay<C: Controller + ?Sized>(controller: &C, moves: &[C::Move]) -> Option<C::State> {
    let mut state = controller.initial_state();
    for mv in moves {
        if !controller.legal_moves(&state).contains(mv) {
            return None;
        }
        state = controller.apply_move(&state, mv);
    }
    Some(state)
}

/// Whether `path` is legal, ends in a goal and costs what it claims.
pub fn is_solution<C: Controller + ?Sized>(controller: &C, path: &MovePath<C::Move>) -> bool {
    let mut state = controller.initial_state();
    let mut cost = 0u64;
    for mv in &path.moves {
        if !controller.legal_moves(&state).contains(mv) {
            return false;
        }
        cost = cost.saturating_add(controller.move_cost(&state, mv));
        state = controller.apply_move(&state, mv);
    }
    cost == path.cost && controller.is_goal(&state)
}
