use std::time::Duration;
use thiserror::Error;

/// A task that panicked inside a concurrent search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub worker: usize,
    pub depth: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search ended without a solution after {} worker fault(s), first: {}", .faults.len(), first_message(.faults))]
    WorkerFaults { faults: Vec<WorkerFault> },

    #[error("search did not finish within {0:?}")]
    DeadlineElapsed(Duration),

    #[error("search thread panicked: {0}")]
    Panicked(String),
}

fn first_message(faults: &[WorkerFault]) -> &str {
    faults.first().map_or("<none>", |fault| fault.message.as_str())
}
