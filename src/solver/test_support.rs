//! Small controllers shared by the solver tests.

use crate::common::MovePath;
use crate::controller::Controller;

use parking_lot::Mutex;
use std::time::Duration;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Right,
    Down,
    Left,
    Up,
}

/// Open `width` x `height` grid walked from `(0, 0)` in unit steps.
pub(crate) struct Grid {
    width: i32,
    height: i32,
    goal: Option<(i32, i32)>,
    panic_at: Option<(i32, i32)>,
    delay: Option<Duration>,
    expansions: Mutex<Vec<(i32, i32)>>,
    finished: Mutex<Vec<Finished>>,
}

/// One `on_finished` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finished {
    pub(crate) state: (i32, i32),
    pub(crate) moves: Option<usize>,
    pub(crate) tries: u64,
}

impl Grid {
    /// A grid without a goal: every search exhausts it.
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            goal: None,
            panic_at: None,
            delay: None,
            expansions: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_goal(mut self, goal: (i32, i32)) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Listing the moves of `cell` panics.
    pub(crate) fn with_panic_at(mut self, cell: (i32, i32)) -> Self {
        self.panic_at = Some(cell);
        self
    }

    /// Sleep this long after every expansion.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cells expanded since the last call, in reporting order.
    pub(crate) fn take_expansions(&self) -> Vec<(i32, i32)> {
        std::mem::take(&mut *self.expansions.lock())
    }

    /// Shortest distance from the start plus the goal estimate. On an open
    /// grid this is the estimated cost A* gives `cell` when expanding it.
    pub(crate) fn estimated_cost(&self, cell: (i32, i32)) -> u64 {
        (cell.0 + cell.1) as u64 + self.heuristic_distance(&cell)
    }

    pub(crate) fn take_finished(&self) -> Vec<Finished> {
        std::mem::take(&mut *self.finished.lock())
    }

    fn contains(&self, (x, y): (i32, i32)) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }
}

impl Controller for Grid {
    type State = (i32, i32);
    type Move = Step;

    fn initial_state(&self) -> (i32, i32) {
        (0, 0)
    }

    fn is_goal(&self, state: &(i32, i32)) -> bool {
        self.goal == Some(*state)
    }

    fn legal_moves(&self, state: &(i32, i32)) -> Vec<Step> {
        if self.panic_at == Some(*state) {
            panic!("cannot list moves of {state:?}");
        }
        [Step::Right, Step::Down, Step::Left, Step::Up]
            .into_iter()
            .filter(|step| self.contains(self.apply_move(state, step)))
            .collect()
    }

    fn apply_move(&self, &(x, y): &(i32, i32), step: &Step) -> (i32, i32) {
        match step {
            Step::Right => (x + 1, y),
            Step::Down => (x, y + 1),
            Step::Left => (x - 1, y),
            Step::Up => (x, y - 1),
        }
    }

    fn heuristic_distance(&self, &(x, y): &(i32, i32)) -> u64 {
        self.goal
            .map_or(0, |(gx, gy)| (gx.abs_diff(x) + gy.abs_diff(y)) as u64)
    }

    fn on_progress(&self, state: &(i32, i32), _tries: u64) {
        self.expansions.lock().push(*state);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
    }

    fn on_finished(
        &self,
        path: Option<&MovePath<Step>>,
        state: &(i32, i32),
        tries: u64,
        _elapsed_ms: u64,
    ) {
        self.finished.lock().push(Finished {
            state: *state,
            moves: path.map(|path| path.len()),
            tries,
        });
    }
}

/// Small road map from `'S'` to `'G'` with a per-place remaining-cost
/// estimate (zero where none is given).
pub(crate) struct Roads {
    roads: Vec<(char, char, u64)>,
    estimates: Vec<(char, u64)>,
}

impl Roads {
    /// The direct road to the goal costs 10 and a three-leg detour costs 3.
    /// The direct road is listed first.
    pub(crate) fn toll() -> Self {
        Roads {
            roads: vec![('S', 'G', 10), ('S', 'A', 1), ('A', 'B', 1), ('B', 'G', 1)],
            estimates: Vec::new(),
        }
    }

    /// Best route S-A-C-G costs 5. The estimate at `A` is exact but larger
    /// than the road to `C` plus the estimate there, so the estimates never
    /// overestimate yet are not consistent.
    pub(crate) fn overestimated_shortcut() -> Self {
        Roads {
            roads: vec![('S', 'A', 1), ('A', 'C', 1), ('S', 'C', 3), ('C', 'G', 3)],
            estimates: vec![('A', 4)],
        }
    }
}

impl Controller for Roads {
    type State = char;
    type Move = (char, char);

    fn initial_state(&self) -> char {
        'S'
    }

    fn is_goal(&self, state: &char) -> bool {
        *state == 'G'
    }

    fn legal_moves(&self, state: &char) -> Vec<(char, char)> {
        self.roads
            .iter()
            .filter(|(from, _, _)| from == state)
            .map(|&(from, to, _)| (from, to))
            .collect()
    }

    fn apply_move(&self, _state: &char, &(_, to): &(char, char)) -> char {
        to
    }

    fn move_cost(&self, _state: &char, mv: &(char, char)) -> u64 {
        self.roads
            .iter()
            .find(|&&(from, to, _)| (from, to) == *mv)
            .map_or(u64::MAX, |&(_, _, cost)| cost)
    }

    fn heuristic_distance(&self, state: &char) -> u64 {
        self.estimates
            .iter()
            .find(|(place, _)| place == state)
            .map_or(0, |&(_, estimate)| estimate)
    }
}
