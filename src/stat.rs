use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub expanded: u64,
    pub generated: u64,
    pub duplicates: u64,
    pub cost: Option<u64>,
    pub time_ms: u64,
    pub workers: usize,
}

impl Stats {
    pub(crate) fn print(&self, solver: &str) {
        info!(
            "{solver}: cost {:?} time(ms) {} expanded {} generated {} duplicates {} workers {}",
            self.cost, self.time_ms, self.expanded, self.generated, self.duplicates, self.workers
        );
    }
}
