use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Immutable search-tree node.
///
/// A child keeps its parent alive through a shared pointer; the parent never
/// references its children. Once the last queued descendant is dropped, the
/// whole ancestor chain is released.
pub struct SearchNode<S, M> {
    state: S,
    mv: Option<M>,
    parent: Option<Arc<SearchNode<S, M>>>,
    depth: usize,
    path_cost: u64,
    estimated_cost: u64,
}

impl<S, M> SearchNode<S, M> {
    pub fn new(
        state: S,
        mv: Option<M>,
        parent: Option<Arc<SearchNode<S, M>>>,
        path_cost: u64,
        estimated_cost: u64,
    ) -> Self {
        let depth = parent.as_ref().map_or(0, |parent| parent.depth + 1);
        SearchNode {
            state,
            mv,
            parent,
            depth,
            path_cost,
            estimated_cost,
        }
    }

    pub fn root(state: S, heuristic: u64) -> Arc<Self> {
        Arc::new(Self::new(state, None, None, 0, heuristic))
    }

    /// Build the successor reached from `parent` by `mv`.
    pub fn child(parent: &Arc<Self>, state: S, mv: M, step_cost: u64, heuristic: u64) -> Arc<Self> {
        let path_cost = parent.path_cost.saturating_add(step_cost);
        Arc::new(Self::new(
            state,
            Some(mv),
            Some(Arc::clone(parent)),
            path_cost,
            path_cost.saturating_add(heuristic),
        ))
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn last_move(&self) -> Option<&M> {
        self.mv.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<SearchNode<S, M>>> {
        self.parent.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn path_cost(&self) -> u64 {
        self.path_cost
    }

    pub fn estimated_cost(&self) -> u64 {
        self.estimated_cost
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl<S, M: Clone> SearchNode<S, M> {
    /// Moves from the root to this node, in the order they must be applied.
    pub fn as_move_path(&self) -> Vec<M> {
        let mut moves = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(node) = current {
            if let Some(mv) = &node.mv {
                moves.push(mv.clone());
            }
            current = node.parent.as_deref();
        }
        moves.reverse();
        moves
    }

    pub fn to_move_path(&self) -> MovePath<M> {
        MovePath {
            moves: self.as_move_path(),
            cost: self.path_cost,
        }
    }
}

// Unlink the ancestor chain iteratively; deep depth-first plunges would
// otherwise overflow the stack through recursive drops.
impl<S, M> Drop for SearchNode<S, M> {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Arc::into_inner(node) {
                Some(mut inner) => inner.parent.take(),
                None => None,
            };
        }
    }
}

impl<S: fmt::Debug, M: fmt::Debug> fmt::Debug for SearchNode<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchNode")
            .field("state", &self.state)
            .field("move", &self.mv)
            .field("depth", &self.depth)
            .field("path_cost", &self.path_cost)
            .field("estimated_cost", &self.estimated_cost)
            .finish()
    }
}

/// A solution: the moves leading from the initial state to a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePath<M> {
    pub moves: Vec<M>,
    pub cost: u64,
}

impl<M> MovePath<M> {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.moves.iter()
    }
}
