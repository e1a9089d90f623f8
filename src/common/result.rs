use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Assigned(T),
    Exhausted,
}

/// Write-once result shared between search workers.
///
/// The first `try_set` wins. Waiters wake up either with that value or, once
/// every producer gave up and `mark_exhausted` was called, with `None`.
#[derive(Debug)]
pub struct SingleAssignmentResult<T> {
    slot: Mutex<Slot<T>>,
    resolved: Condvar,
    assigned: AtomicBool,
}

impl<T> Default for SingleAssignmentResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleAssignmentResult<T> {
    pub fn new() -> Self {
        SingleAssignmentResult {
            slot: Mutex::new(Slot::Pending),
            resolved: Condvar::new(),
            assigned: AtomicBool::new(false),
        }
    }

    /// Store `value` if nothing was stored yet and the slot is not exhausted.
    /// Returns whether this call won.
    pub fn try_set(&self, value: T) -> bool {
        if self.assigned.load(Ordering::Acquire) {
            return false;
        }
        let mut slot = self.slot.lock();
        if !matches!(*slot, Slot::Pending) {
            return false;
        }
        *slot = Slot::Assigned(value);
        self.assigned.store(true, Ordering::Release);
        self.resolved.notify_all();
        true
    }

    /// Signal that no producer will ever call `try_set` successfully.
    /// No-op once a value is assigned.
    pub fn mark_exhausted(&self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Exhausted;
            self.resolved.notify_all();
        }
    }

    /// Lock-free check used by workers before scheduling more work.
    pub fn is_set(&self) -> bool {
        self.assigned.load(Ordering::Acquire)
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Pending)
    }

    pub fn into_inner(self) -> Option<T> {
        match self.slot.into_inner() {
            Slot::Assigned(value) => Some(value),
            Slot::Pending | Slot::Exhausted => None,
        }
    }
}

impl<T: Clone> SingleAssignmentResult<T> {
    /// Block until the slot is resolved.
    pub fn wait(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        loop {
            match &*slot {
                Slot::Assigned(value) => return Some(value.clone()),
                Slot::Exhausted => return None,
                Slot::Pending => {}
            }
            self.resolved.wait(&mut slot);
        }
    }

    /// Like `wait`, but gives up after `timeout`. The outer `None` means the
    /// slot is still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Option<T>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            match &*slot {
                Slot::Assigned(value) => return Some(Some(value.clone())),
                Slot::Exhausted => return Some(None),
                Slot::Pending => {}
            }
            if self.resolved.wait_until(&mut slot, deadline).timed_out() {
                return match &*slot {
                    Slot::Assigned(value) => Some(Some(value.clone())),
                    Slot::Exhausted => Some(None),
                    Slot::Pending => None,
                };
            }
        }
    }
}
