use crate::common::SeenSet;
use crate::controller::Controller;

use anyhow::{anyhow, Result};
use std::fmt;

/// People who reached the far side, and where the torch is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeState {
    pub far: u32,
    pub torch_far: bool,
}

/// A group crossing with the torch. `forward` means near to far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crossing {
    pub group: u32,
    pub forward: bool,
}

impl fmt::Display for Crossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let people: Vec<String> = (0..u32::BITS)
            .filter(|person| self.group & (1u32 << person) != 0)
            .map(|person| person.to_string())
            .collect();
        let arrow = if self.forward { "->" } else { "<-" };
        write!(f, "{} {arrow}", people.join("+"))
    }
}

/// Torch-and-bridge puzzle: everybody must cross a bridge that holds at most
/// `capacity` people, and every crossing needs the single torch. A group
/// walks at the pace of its slowest member.
#[derive(Debug, Clone)]
pub struct BridgeCrossing {
    speeds: Vec<u64>,
    capacity: usize,
    everyone: u32,
    fold_symmetry: bool,
}

impl BridgeCrossing {
    pub fn new(speeds: Vec<u64>, capacity: usize) -> Result<Self> {
        if speeds.len() >= u32::BITS as usize {
            return Err(anyhow!(
                "At most {} people supported, got {}",
                u32::BITS - 1,
                speeds.len()
            ));
        }
        if capacity == 0 {
            return Err(anyhow!("Bridge capacity must be at least 1"));
        }
        let everyone = (1u32 << speeds.len()) - 1;
        Ok(BridgeCrossing {
            speeds,
            capacity,
            everyone,
            fold_symmetry: false,
        })
    }

    /// Treat people with equal speeds as interchangeable when deduplicating.
    pub fn with_symmetry_folding(mut self, fold_symmetry: bool) -> Self {
        self.fold_symmetry = fold_symmetry;
        self
    }

    pub fn speeds(&self) -> &[u64] {
        &self.speeds
    }

    fn slowest(&self, group: u32) -> u64 {
        self.speeds
            .iter()
            .enumerate()
            .filter(|&(person, _)| group & (1u32 << person) != 0)
            .map(|(_, &speed)| speed)
            .max()
            .unwrap_or(0)
    }

    /// Representative of `state` among states that differ only by swapping
    /// people of equal speed: within each speed, the lowest-numbered people
    /// are the ones on the far side.
    fn canonical(&self, state: &BridgeState) -> BridgeState {
        let mut far = 0u32;
        let mut done = 0u32;
        for (person, &speed) in self.speeds.iter().enumerate() {
            if done & (1u32 << person) != 0 {
                continue;
            }
            let peers: Vec<usize> = (person..self.speeds.len())
                .filter(|&other| self.speeds[other] == speed)
                .collect();
            let crossed = peers
                .iter()
                .filter(|&&other| state.far & (1u32 << other) != 0)
                .count();
            for (rank, &other) in peers.iter().enumerate() {
                done |= 1u32 << other;
                if rank < crossed {
                    far |= 1u32 << other;
                }
            }
        }
        BridgeState {
            far,
            torch_far: state.torch_far,
        }
    }
}

impl Controller for BridgeCrossing {
    type State = BridgeState;
    type Move = Crossing;

    fn initial_state(&self) -> BridgeState {
        BridgeState {
            far: 0,
            torch_far: false,
        }
    }

    fn is_goal(&self, state: &BridgeState) -> bool {
        state.far == self.everyone
    }

    fn legal_moves(&self, state: &BridgeState) -> Vec<Crossing> {
        let forward = !state.torch_far;
        let side = if forward {
            self.everyone & !state.far
        } else {
            state.far
        };

        let mut moves = Vec::new();
        let mut group = side;
        while group != 0 {
            if group.count_ones() as usize <= self.capacity {
                moves.push(Crossing { group, forward });
            }
            group = (group - 1) & side;
        }
        moves
    }

    fn apply_move(&self, state: &BridgeState, mv: &Crossing) -> BridgeState {
        let far = if mv.forward {
            state.far | mv.group
        } else {
            state.far & !mv.group
        };
        BridgeState {
            far,
            torch_far: mv.forward,
        }
    }

    fn move_cost(&self, _state: &BridgeState, mv: &Crossing) -> u64 {
        self.slowest(mv.group)
    }

    fn already_seen(&self, state: &BridgeState, seen: &mut dyn SeenSet<BridgeState>) -> bool {
        if self.fold_symmetry {
            !seen.insert(self.canonical(state))
        } else {
            !seen.insert(*state)
        }
    }

    // The slowest person still waiting has to cross at least once more.
    fn heuristic_distance(&self, state: &BridgeState) -> u64 {
        self.slowest(self.everyone & !state.far)
    }
}
