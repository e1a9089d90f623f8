use crate::controller::Controller;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pour {
    FillFirst,
    FillSecond,
    EmptyFirst,
    EmptySecond,
    FirstIntoSecond,
    SecondIntoFirst,
}

impl Pour {
    const ALL: [Pour; 6] = [
        Pour::FillFirst,
        Pour::FillSecond,
        Pour::EmptyFirst,
        Pour::EmptySecond,
        Pour::FirstIntoSecond,
        Pour::SecondIntoFirst,
    ];
}

impl fmt::Display for Pour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Pour::FillFirst => "fill first",
            Pour::FillSecond => "fill second",
            Pour::EmptyFirst => "empty first",
            Pour::EmptySecond => "empty second",
            Pour::FirstIntoSecond => "pour first into second",
            Pour::SecondIntoFirst => "pour second into first",
        };
        f.write_str(text)
    }
}

/// Two containers without markings, an unlimited tap and a drain. The goal
/// is to have exactly `target` units in either container.
#[derive(Debug, Clone, Copy)]
pub struct PouringPuzzle {
    first: u32,
    second: u32,
    target: u32,
}

impl PouringPuzzle {
    pub fn new(first: u32, second: u32, target: u32) -> Self {
        PouringPuzzle {
            first,
            second,
            target,
        }
    }
}

impl Controller for PouringPuzzle {
    /// Contents of the first and second container.
    type State = (u32, u32);
    type Move = Pour;

    fn initial_state(&self) -> (u32, u32) {
        (0, 0)
    }

    fn is_goal(&self, &(a, b): &(u32, u32)) -> bool {
        a == self.target || b == self.target
    }

    // Moves that leave both containers unchanged are not offered.
    fn legal_moves(&self, state: &(u32, u32)) -> Vec<Pour> {
        Pour::ALL
            .into_iter()
            .filter(|pour| self.apply_move(state, pour) != *state)
            .collect()
    }

    fn apply_move(&self, &(a, b): &(u32, u32), pour: &Pour) -> (u32, u32) {
        match pour {
            Pour::FillFirst => (self.first, b),
            Pour::FillSecond => (a, self.second),
            Pour::EmptyFirst => (0, b),
            Pour::EmptySecond => (a, 0),
            Pour::FirstIntoSecond => {
                let amount = a.min(self.second - b);
                (a - amount, b + amount)
            }
            Pour::SecondIntoFirst => {
                let amount = b.min(self.first - a);
                (a + amount, b - amount)
            }
        }
    }

    fn heuristic_distance(&self, state: &(u32, u32)) -> u64 {
        u64::from(!self.is_goal(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchConfig, Strategy};
    use crate::controller::{is_solution, replay};
    use crate::solver::{
        build_solver, ConcurrentPrioritySearcher, ConcurrentSearcher, PrioritySearcher,
        SequentialSearcher, Solver,
    };

    #[test]
    fn test_nine_and_four_measure_six_in_eight() {
        let puzzle = PouringPuzzle::new(9, 4, 6);
        let config = SearchConfig::default();
        let mut solvers: Vec<Box<dyn Solver<PouringPuzzle> + Send>> = vec![
            Box::new(SequentialSearcher::breadth_first()),
            Box::new(PrioritySearcher::default()),
            Box::new(ConcurrentSearcher::new(&config).with_workers(4)),
            Box::new(ConcurrentPrioritySearcher::new(&config).with_workers(4)),
        ];
        for solver in solvers.iter_mut() {
            let path = solver.solve(&puzzle).unwrap();
            assert_eq!(path.len(), 8);
            assert_eq!(path.cost, 8);
            let end = replay(&puzzle, &path.moves).unwrap();
            assert!(end.0 == 6 || end.1 == 6);
        }
    }

    #[test]
    fn test_empty_target_is_solved_without_moves() {
        let puzzle = PouringPuzzle::new(0, 0, 0);
        for strategy in [Strategy::DepthFirst, Strategy::AStar, Strategy::ConcurrentAStar] {
            let mut solver = build_solver::<PouringPuzzle>(strategy, &SearchConfig::default());
            let path = solver.solve(&puzzle).unwrap();
            assert!(path.is_empty());
        }
    }

    #[test]
    fn test_unmeasurable_target_has_no_solution() {
        let puzzle = PouringPuzzle::new(2, 2, 5);
        for strategy in [
            Strategy::DepthFirst,
            Strategy::BreadthFirst,
            Strategy::AStar,
            Strategy::Concurrent,
            Strategy::ConcurrentAStar,
        ] {
            let mut solver = build_solver::<PouringPuzzle>(strategy, &SearchConfig::default());
            assert!(solver.solve(&puzzle).is_none(), "{}", strategy.name());
            assert_eq!(solver.stats().expanded, 4);
        }
    }

    #[test]
    fn test_no_op_moves_are_filtered() {
        let puzzle = PouringPuzzle::new(3, 5, 4);
        assert_eq!(
            puzzle.legal_moves(&(0, 0)),
            vec![Pour::FillFirst, Pour::FillSecond]
        );
        assert_eq!(
            puzzle.legal_moves(&(3, 5)),
            vec![Pour::EmptyFirst, Pour::EmptySecond]
        );
        let path = SequentialSearcher::breadth_first().solve(&puzzle).unwrap();
        assert_eq!(path.len(), 6);
        assert!(is_solution(&puzzle, &path));
    }
}
