use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "puzzle-search",
    about = "Run the state-space solvers against bundled puzzle scenarios.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the YAML scenario file (built-in scenarios if absent)")]
    pub scenario_path: Option<String>,

    #[arg(long, value_enum, help = "Search strategy to use")]
    pub strategy: Option<Strategy>,

    #[arg(long, help = "Worker threads for the concurrent strategies")]
    pub workers: Option<usize>,

    #[arg(long, help = "Breadth bias in [0, 1] for the concurrent strategy")]
    pub breadth_bias: Option<f64>,

    #[arg(long, help = "Seed for the scheduling random number generators")]
    pub seed: Option<u64>,

    #[arg(long, help = "Give up on a scenario after this many milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Print a JSON report instead of log lines", default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    DepthFirst,
    BreadthFirst,
    AStar,
    Concurrent,
    ConcurrentAStar,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DepthFirst => "depth-first",
            Strategy::BreadthFirst => "breadth-first",
            Strategy::AStar => "a-star",
            Strategy::Concurrent => "concurrent",
            Strategy::ConcurrentAStar => "concurrent-a-star",
        }
    }
}

/// Tuning shared by all solvers; only the concurrent ones read `workers`,
/// `breadth_bias` and `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Worker threads; `None` means the available hardware parallelism.
    pub workers: Option<usize>,
    /// Probability that a new task goes to the tail of the shared queue.
    pub breadth_bias: f64,
    pub seed: u64,
    /// Log a progress line every this many expansions (0 disables).
    pub progress_log_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            workers: None,
            breadth_bias: 1.0,
            seed: 0,
            progress_log_interval: 10_000,
        }
    }
}

impl SearchConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.breadth_bias) {
            return Err(anyhow!(
                "Breadth bias must be within [0, 1], got {}",
                self.breadth_bias
            ));
        }
        if self.workers == Some(0) {
            return Err(anyhow!("Worker count must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scenario_path: Option<String>,
    pub strategy: Strategy,
    pub search: SearchConfig,
    pub timeout_ms: Option<u64>,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scenario_path: None,
            strategy: Strategy::AStar,
            search: SearchConfig::default(),
            timeout_ms: None,
            json: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config YAML")
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(path) = &cli.scenario_path {
            self.scenario_path = Some(path.clone());
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if let Some(workers) = cli.workers {
            self.search.workers = Some(workers);
        }
        if let Some(breadth_bias) = cli.breadth_bias {
            self.search.breadth_bias = breadth_bias;
        }
        if let Some(seed) = cli.seed {
            self.search.seed = seed;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.timeout_ms = Some(timeout_ms);
        }
        self.json |= cli.json;

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.search.validate()?;
        if self.timeout_ms == Some(0) {
            return Err(anyhow!("Timeout must be positive"));
        }
        Ok(())
    }
}
