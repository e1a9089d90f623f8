use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "puzzle", rename_all = "kebab-case")]
pub enum PuzzleSpec {
    Bridge {
        speeds: Vec<u64>,
        #[serde(default = "default_capacity")]
        capacity: usize,
        #[serde(default)]
        fold_symmetry: bool,
    },
    Jugs {
        first: u32,
        second: u32,
        target: u32,
    },
}

fn default_capacity() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(flatten)]
    pub puzzle: PuzzleSpec,
    /// Cost of the best solution; `None` when the puzzle has no solution or
    /// the cost is not known.
    #[serde(default)]
    pub expected_cost: Option<u64>,
    /// Set for puzzles that must come back without a solution.
    #[serde(default)]
    pub unsolvable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

impl ScenarioFile {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("invalid scenario file {path:?}"))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid scenario YAML")
    }

    /// Bridge and pouring puzzles with known answers.
    pub fn builtin() -> Self {
        let bridge = |name: &str, speeds: &[u64], cost: u64| Scenario {
            name: name.to_string(),
            puzzle: PuzzleSpec::Bridge {
                speeds: speeds.to_vec(),
                capacity: 2,
                fold_symmetry: false,
            },
            expected_cost: Some(cost),
            unsolvable: false,
        };
        let jugs = |name: &str, first: u32, second: u32, target: u32, cost: Option<u64>| Scenario {
            name: name.to_string(),
            puzzle: PuzzleSpec::Jugs {
                first,
                second,
                target,
            },
            expected_cost: cost,
            unsolvable: cost.is_none(),
        };

        ScenarioFile {
            scenarios: vec![
                bridge("bridge-two", &[3, 8], 8),
                bridge("bridge-four", &[1, 2, 5, 8], 15),
                bridge("bridge-four-slow", &[5, 10, 20, 25], 60),
                bridge("bridge-seven", &[1, 4, 5, 6, 8, 9, 12], 47),
                jugs("jugs-nine-four", 9, 4, 6, Some(8)),
                jugs("jugs-empty", 0, 0, 0, Some(0)),
                jugs("jugs-impossible", 2, 2, 5, None),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_puzzles() {
        let file = ScenarioFile::from_yaml_str(
            r#"
scenarios:
  - name: family
    puzzle: bridge
    speeds: [1, 2, 5, 8]
    expected_cost: 15
  - name: wide
    puzzle: bridge
    speeds: [1, 1, 2]
    capacity: 3
    fold_symmetry: true
  - name: die-hard
    puzzle: jugs
    first: 3
    second: 5
    target: 4
"#,
        )
        .unwrap();

        assert_eq!(file.scenarios.len(), 3);
        assert_eq!(
            file.scenarios[0].puzzle,
            PuzzleSpec::Bridge {
                speeds: vec![1, 2, 5, 8],
                capacity: 2,
                fold_symmetry: false,
            }
        );
        assert_eq!(file.scenarios[0].expected_cost, Some(15));
        assert!(matches!(
            file.scenarios[1].puzzle,
            PuzzleSpec::Bridge { capacity: 3, fold_symmetry: true, .. }
        ));
        assert_eq!(
            file.scenarios[2].puzzle,
            PuzzleSpec::Jugs {
                first: 3,
                second: 5,
                target: 4,
            }
        );
        assert!(!file.scenarios[2].unsolvable);
    }

    #[test]
    fn test_unknown_puzzle_is_rejected() {
        assert!(ScenarioFile::from_yaml_str("scenarios:\n  - name: x\n    puzzle: sokoban\n").is_err());
    }

    #[test]
    fn test_builtin_survives_yaml() {
        let builtin = ScenarioFile::builtin();
        let yaml = serde_yaml::to_string(&builtin).unwrap();
        assert_eq!(ScenarioFile::from_yaml_str(&yaml).unwrap(), builtin);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ScenarioFile::load_from_file("/nonexistent/scenarios.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenarios.yaml"));
    }
}
