use dashmap::DashSet;
use std::collections::HashSet;
use std::hash::Hash;

/// Record of visited states handed to `Controller::already_seen`.
///
/// `insert` is the single decision point for "may this state be expanded":
/// it must report whether the state was absent, atomically with inserting it.
pub trait SeenSet<S> {
    /// Returns `true` if `state` was not present before.
    fn insert(&mut self, state: S) -> bool;

    fn contains(&self, state: &S) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Eq + Hash> SeenSet<S> for HashSet<S> {
    fn insert(&mut self, state: S) -> bool {
        HashSet::insert(self, state)
    }

    fn contains(&self, state: &S) -> bool {
        HashSet::contains(self, state)
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }
}

// Each worker holds its own `&DashSet`; the set itself is shared.
impl<S: Eq + Hash> SeenSet<S> for &DashSet<S> {
    fn insert(&mut self, state: S) -> bool {
        DashSet::insert(*self, state)
    }

    fn contains(&self, state: &S) -> bool {
        DashSet::contains(*self, state)
    }

    fn len(&self) -> usize {
        DashSet::len(*self)
    }
}
