//! Command implementations for the intent-bench CLI.

use std::sync::Arc;

use log::info;

use crate::bench::{Benchmark, RunPlan};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{BenchConfig, CONFIG_ENV, RunMode};
use crate::error::{BenchError, Result};
use crate::scoring::{EvaluationScope, FileOutcomeSink};

/// Execute a CLI command.
pub fn execute_command(args: BenchArgs) -> Result<()> {
    let mut config = load_config(&args)?;

    match &args.command {
        Command::Run(run_args) => {
            apply_run_args(&mut config, run_args);
            run_benchmark(config, &args)
        }
        Command::Compare(compare_args) => {
            apply_run_args(&mut config, &compare_args.run);
            config.action = RunMode::Comparator.to_string();
            if !compare_args.apis.is_empty() {
                config.apis = compare_args.apis.clone();
            }
            run_benchmark(config, &args)
        }
        Command::Sweep(sweep_args) => {
            apply_run_args(&mut config, &sweep_args.run);
            config.action = RunMode::Parametor.to_string();
            if let Some(api) = &sweep_args.api {
                config.api = Some(api.clone());
            }
            if let Some(mode) = &sweep_args.reduction_mode {
                config.reduction_mode = mode.clone();
            }
            run_benchmark(config, &args)
        }
        Command::Validate(run_args) => {
            apply_run_args(&mut config, run_args);
            validate_config(config, &args)
        }
    }
}

fn load_config(args: &BenchArgs) -> Result<BenchConfig> {
    let path = args.config.as_ref().ok_or_else(|| {
        BenchError::config(
            "config",
            format!("no configuration file given (use --config or {CONFIG_ENV})"),
        )
    })?;
    info!("loading configuration from {}", path.display());
    BenchConfig::load(path)
}

fn apply_run_args(config: &mut BenchConfig, run_args: &RunArgs) {
    if let Some(data_dir) = &run_args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(output) = &run_args.output {
        config.result_file = Some(output.clone());
    }
    if run_args.held_out {
        config.evaluation_scope = EvaluationScope::HeldOut;
    }
}

/// Validate, then run the benchmark and write its result.
fn run_benchmark(config: BenchConfig, cli_args: &BenchArgs) -> Result<()> {
    let benchmark = Benchmark::with_vendors(config);
    let preflight = benchmark.preflight()?;

    let sink = FileOutcomeSink::in_dir(benchmark.config().log_dir())?;
    let summary = benchmark.run(&preflight, Arc::new(sink))?;

    output_result("Benchmark completed", &summary, cli_args)
}

/// Run pre-flight validation only.
fn validate_config(config: BenchConfig, cli_args: &BenchArgs) -> Result<()> {
    let benchmark = Benchmark::with_vendors(config);
    let preflight = benchmark.preflight()?;

    let backends = match &preflight.plan {
        RunPlan::Compare { backends } => backends.clone(),
        RunPlan::Sweep { backend, .. } => vec![backend.clone()],
    };

    output_result(
        "Configuration is valid",
        &ValidationResult {
            mode: preflight.mode,
            languages: preflight.criteria.keys().cloned().collect(),
            backends,
            cells: preflight.cells(),
            scorer_runs: preflight.scorer_runs(),
            folds: preflight.scorer.folds,
            result_path: preflight.result_path.display().to_string(),
        },
        cli_args,
    )
}
