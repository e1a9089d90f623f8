pub mod common;
pub mod config;
pub mod controller;
pub mod deadline;
pub mod error;
pub mod puzzles;
pub mod scenario;
pub mod solver;
pub mod stat;

pub use common::{MovePath, SearchNode, SeenSet, SingleAssignmentResult};
pub use controller::{is_solution, replay, Controller};
pub use error::{SearchError, WorkerFault};
pub use solver::{
    build_solver, ConcurrentPrioritySearcher, ConcurrentSearcher, Discipline, PrioritySearcher,
    SequentialSearcher, Solver, StopHandle,
};
