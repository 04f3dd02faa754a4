//! Output formatting for CLI commands.

use serde::Serialize;

use crate::bench::{RunResult, RunSummary};
use crate::cli::args::{BenchArgs, OutputFormat};
use crate::comparator::leaders;
use crate::config::RunMode;
use crate::error::Result;
use crate::sweep::SweepResult;

/// Result structure for configuration validation.
#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub mode: RunMode,
    pub languages: Vec<String>,
    pub backends: Vec<String>,
    pub cells: usize,
    pub scorer_runs: usize,
    pub folds: usize,
    pub result_path: String,
}

/// Row of the human-readable leader table.
#[derive(Debug)]
struct LeaderRow {
    cell: String,
    metric: String,
    winner: String,
}

/// Types that know how to print themselves for humans.
pub trait HumanOutput {
    fn print_human(&self, args: &BenchArgs);
}

impl HumanOutput for ValidationResult {
    fn print_human(&self, _args: &BenchArgs) {
        println!("mode: {}", self.mode);
        println!("languages: {}", self.languages.join(", "));
        println!("backends: {}", self.backends.join(", "));
        println!(
            "cells: {} ({} scorer runs x {} folds)",
            self.cells, self.scorer_runs, self.folds
        );
        println!("result file: {}", self.result_path);
    }
}

impl HumanOutput for RunSummary {
    fn print_human(&self, args: &BenchArgs) {
        let elapsed = self.finished_at - self.started_at;
        println!("mode: {}", self.mode);
        println!("duration: {}s", elapsed.num_seconds());
        println!("result file: {}", self.result_path.display());
        println!();

        for row in leader_rows(&self.result) {
            println!("{:<32} {:<20} {}", row.cell, row.metric, row.winner);
        }

        if args.verbosity() > 1 {
            if let Ok(json) = serde_json::to_string_pretty(&self.result) {
                println!();
                println!("{json}");
            }
        }
    }
}

fn leader_rows(result: &RunResult) -> Vec<LeaderRow> {
    match result {
        RunResult::Comparison(report) => {
            let metrics: Vec<_> = report
                .iter()
                .flat_map(|(_, _, backends)| backends.values())
                .flat_map(|record| record.scores.keys().copied())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            leaders(report, &metrics)
                .into_iter()
                .map(|leader| LeaderRow {
                    cell: format!("{}/{}", leader.language, leader.criterion),
                    metric: leader.metric.to_string(),
                    winner: format!("{} ({:.4})", leader.backend, leader.score),
                })
                .collect()
        }
        RunResult::Sweep(SweepResult::Best(best)) => best
            .iter()
            .flat_map(|(language, criterion, by_metric)| {
                by_metric.iter().flat_map(move |(metric, parameters)| {
                    parameters.iter().map(move |(parameter, value)| LeaderRow {
                        cell: format!("{language}/{criterion}"),
                        metric: metric.to_string(),
                        winner: format!("{parameter} = {value}"),
                    })
                })
            })
            .collect(),
        RunResult::Sweep(SweepResult::All(grid)) => grid
            .iter()
            .flat_map(|(language, criterion, by_metric)| {
                by_metric.iter().flat_map(move |(metric, parameters)| {
                    parameters.iter().flat_map(move |(parameter, series)| {
                        series.iter().map(move |(value, score)| LeaderRow {
                            cell: format!("{language}/{criterion}"),
                            metric: metric.to_string(),
                            winner: format!("{parameter} = {value}: {score:.4}"),
                        })
                    })
                })
            })
            .collect(),
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &BenchArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &BenchArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::classifier::ParamValue;
    use crate::report::{BestParameters, ComparisonReport};
    use crate::scoring::{Metric, ScoreRecord};

    #[test]
    fn test_comparison_rows() {
        let mut report = ComparisonReport::new();
        report.insert(
            "en",
            "smalltalk_en",
            BTreeMap::from([(
                "recast".to_string(),
                ScoreRecord {
                    scores: BTreeMap::from([(Metric::Accuracy, 0.75)]),
                    risk_rate: 0.9,
                },
            )]),
        );

        let rows = leader_rows(&RunResult::Comparison(report));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell, "en/smalltalk_en");
        assert_eq!(rows[0].winner, "recast (0.7500)");
    }

    #[test]
    fn test_best_rows() {
        let mut best = BestParameters::new();
        best.insert(
            "fr",
            "mails_fr",
            BTreeMap::from([(
                Metric::Error10Penalized,
                BTreeMap::from([("strictness".to_string(), ParamValue::Integer(75))]),
            )]),
        );

        let rows = leader_rows(&RunResult::Sweep(SweepResult::Best(best)));
        assert_eq!(rows[0].metric, "error_10_penalized");
        assert_eq!(rows[0].winner, "strictness = 75");
    }
}
