//! Reference controllers used by the scenario runner and the tests.

mod bridge;
mod jugs;

pub use bridge::{BridgeCrossing, BridgeState, Crossing};
pub use jugs::{Pour, PouringPuzzle};
