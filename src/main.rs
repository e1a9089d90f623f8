use puzzle_search::config::{Cli, Config};
use puzzle_search::controller::{is_solution, Controller};
use puzzle_search::deadline::solve_within;
use puzzle_search::puzzles::{BridgeCrossing, PouringPuzzle};
use puzzle_search::scenario::{PuzzleSpec, Scenario, ScenarioFile};
use puzzle_search::solver::{build_solver, Solver};
use puzzle_search::stat::Stats;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct ScenarioReport {
    name: String,
    strategy: &'static str,
    solved: bool,
    moves: Vec<String>,
    cost: Option<u64>,
    expected_cost: Option<u64>,
    matches_expected: bool,
    stats: Option<Stats>,
    error: Option<String>,
}

async fn run_scenario<C>(
    controller: C,
    scenario: &Scenario,
    config: &Config,
) -> anyhow::Result<ScenarioReport>
where
    C: Controller + Send + Sync + 'static,
    C::Move: Display,
{
    let controller = Arc::new(controller);
    let solver = build_solver::<C>(config.strategy, &config.search);
    let outcome = match config.timeout_ms {
        Some(timeout_ms) => {
            solve_within(solver, Arc::clone(&controller), Duration::from_millis(timeout_ms)).await
        }
        None => {
            let mut solver = solver;
            let path = solver.solve(controller.as_ref());
            Ok((solver, path))
        }
    };

    let mut report = ScenarioReport {
        name: scenario.name.clone(),
        strategy: config.strategy.name(),
        solved: false,
        moves: Vec::new(),
        cost: None,
        expected_cost: scenario.expected_cost,
        matches_expected: false,
        stats: None,
        error: None,
    };

    match outcome {
        Ok((solver, path)) => {
            if let Some(path) = &path {
                if !is_solution(controller.as_ref(), path) {
                    bail!("{}: solver returned an invalid path", scenario.name);
                }
                report.moves = path.iter().map(|mv| mv.to_string()).collect();
            }
            report.solved = path.is_some();
            report.cost = path.as_ref().map(|path| path.cost);
            report.matches_expected = if scenario.unsolvable {
                path.is_none()
            } else {
                scenario
                    .expected_cost
                    .map_or(report.solved, |expected| report.cost == Some(expected))
            };
            report.stats = Some(solver.stats().clone());
        }
        Err(err) => {
            warn!("{}: {err}", scenario.name);
            report.error = Some(err.to_string());
        }
    }

    if report.matches_expected {
        info!(
            "{}: cost {:?} in {} moves",
            report.name,
            report.cost,
            report.moves.len()
        );
    } else {
        warn!(
            "{}: cost {:?}, expected {:?}",
            report.name, report.cost, report.expected_cost
        );
    }
    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let scenarios = if let Some(path) = config.scenario_path.as_ref() {
        ScenarioFile::load_from_file(path)?
    } else {
        info!("No scenario file specified, using built-in scenarios");
        ScenarioFile::builtin()
    };

    let mut reports = Vec::with_capacity(scenarios.scenarios.len());
    for scenario in &scenarios.scenarios {
        let report = match &scenario.puzzle {
            PuzzleSpec::Bridge {
                speeds,
                capacity,
                fold_symmetry,
            } => {
                let bridge = BridgeCrossing::new(speeds.clone(), *capacity)
                    .with_context(|| format!("error with scenario: {}", scenario.name))?
                    .with_symmetry_folding(*fold_symmetry);
                run_scenario(bridge, scenario, &config).await?
            }
            PuzzleSpec::Jugs {
                first,
                second,
                target,
            } => run_scenario(PouringPuzzle::new(*first, *second, *target), scenario, &config).await?,
        };
        reports.push(report);
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    check_reports(&reports)
}

/// Fail the run when any scenario missed its expectation.
fn check_reports(reports: &[ScenarioReport]) -> anyhow::Result<()> {
    let mismatched = reports.iter().filter(|report| !report.matches_expected).count();
    if mismatched > 0 {
        bail!(
            "{mismatched} of {} scenarios did not match their expectation",
            reports.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, matches_expected: bool) -> ScenarioReport {
        ScenarioReport {
            name: name.to_string(),
            strategy: "a-star",
            solved: true,
            moves: Vec::new(),
            cost: Some(3),
            expected_cost: Some(3),
            matches_expected,
            stats: None,
            error: None,
        }
    }

    #[test]
    fn test_matching_reports_pass() {
        assert!(check_reports(&[report("a", true), report("b", true)]).is_ok());
        assert!(check_reports(&[]).is_ok());
    }

    #[test]
    fn test_mismatched_report_fails_run() {
        let err = check_reports(&[report("a", true), report("b", false)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "1 of 2 scenarios did not match their expectation"
        );
    }
}
