//! Run orchestration.
//!
//! A [`Benchmark`] turns a [`BenchConfig`] into a run in two phases:
//!
//! 1. [`Benchmark::preflight`] resolves every name in the configuration and
//!    constructs (then drops) every adapter the run will need. Adapter
//!    construction never touches the network, so unknown metrics, backends,
//!    reduction modes, parameters, parameter values, missing datasets and
//!    missing credentials are all reported before any remote training.
//! 2. [`Benchmark::execute`] drives the [`Comparator`] or the
//!    [`ParameterSweep`] and returns the result tree.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::backend::VendorAdapterFactory;
use crate::classifier::{AdapterFactory, Parameters, ThreadSleeper, TrainingPoller};
use crate::comparator::{Comparator, CriteriaPlan};
use crate::config::{BenchConfig, RunMode};
use crate::dataset::{DatasetSource, FileDatasetSource};
use crate::error::{BenchError, Result};
use crate::report::ComparisonReport;
use crate::scoring::{OutcomeSink, Scorer, ScorerConfig};
use crate::sweep::{ParameterGrid, ParameterSweep, ReductionMode, SweepResult, check_grid};
use crate::writer::JsonResultWriter;

/// What a validated run will do.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPlan {
    Compare {
        backends: Vec<String>,
    },
    Sweep {
        backend: String,
        grid: ParameterGrid,
        mode: ReductionMode,
    },
}

/// Outcome of pre-flight validation.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub mode: RunMode,
    pub scorer: ScorerConfig,
    pub criteria: CriteriaPlan,
    pub plan: RunPlan,
    pub result_path: PathBuf,
}

impl Preflight {
    /// Number of `(language, criterion)` cells.
    pub fn cells(&self) -> usize {
        self.criteria.values().map(Vec::len).sum()
    }

    /// Number of (adapter, dataset) scorer runs in the plan.
    pub fn scorer_runs(&self) -> usize {
        let per_cell = match &self.plan {
            RunPlan::Compare { backends } => backends.len(),
            RunPlan::Sweep { grid, .. } => grid.values().map(Vec::len).sum(),
        };
        self.cells() * per_cell
    }
}

/// Result tree of a run, serialized without a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunResult {
    Comparison(ComparisonReport),
    Sweep(SweepResult),
}

/// A completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result_path: PathBuf,
    pub result: RunResult,
}

/// Validates and runs one benchmark configuration.
pub struct Benchmark {
    config: BenchConfig,
    factory: Arc<dyn AdapterFactory>,
    source: Arc<dyn DatasetSource>,
}

impl Benchmark {
    pub fn new(
        config: BenchConfig,
        factory: Arc<dyn AdapterFactory>,
        source: Arc<dyn DatasetSource>,
    ) -> Self {
        Benchmark {
            config,
            factory,
            source,
        }
    }

    /// Benchmark against the real vendor backends and the on-disk datasets.
    pub fn with_vendors(config: BenchConfig) -> Self {
        let poller = TrainingPoller::new(config.poll_policy(), Arc::new(ThreadSleeper));
        let factory = VendorAdapterFactory::new(
            config.credentials.clone(),
            config.fallback_intent.clone(),
        )
        .with_poller(poller)
        .with_timeout(config.request_timeout());
        let source = FileDatasetSource::new(config.criteria_dir());

        Self::new(config, Arc::new(factory), Arc::new(source))
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Validate the whole run without any remote call.
    pub fn preflight(&self) -> Result<Preflight> {
        let config = &self.config;
        config.validate()?;
        let mode = config.run_mode()?;
        let scorer = config.scorer_config()?;

        let plan = match mode {
            RunMode::Comparator => {
                for backend in &config.apis {
                    self.factory.accepted_parameters(backend)?;
                }
                RunPlan::Compare {
                    backends: config.apis.clone(),
                }
            }
            RunMode::Parametor => {
                let backend = config.api.clone().unwrap_or_default();
                self.factory.accepted_parameters(&backend).map_err(|e| match e {
                    BenchError::Config { message, .. } => BenchError::config("api", message),
                    other => other,
                })?;
                check_grid(self.factory.as_ref(), &backend, &config.params)?;
                RunPlan::Sweep {
                    backend,
                    grid: config.params.clone(),
                    mode: config.parsed_reduction_mode()?,
                }
            }
        };

        for (language, criteria) in &config.criteria {
            for criterion in criteria {
                self.source.check(language, criterion)?;
            }
            self.check_adapters(language, &plan)?;
        }

        Ok(Preflight {
            mode,
            scorer,
            criteria: config.criteria.clone(),
            plan,
            result_path: config.result_path(mode),
        })
    }

    /// Build and drop every adapter `plan` needs for `language`.
    fn check_adapters(&self, language: &str, plan: &RunPlan) -> Result<()> {
        match plan {
            RunPlan::Compare { backends } => {
                for backend in backends {
                    self.factory.build(backend, language, &Parameters::new())?;
                }
            }
            RunPlan::Sweep { backend, grid, .. } => {
                for (parameter, values) in grid {
                    for value in values {
                        let params = Parameters::from([(parameter.clone(), value.clone())]);
                        self.factory.build(backend, language, &params)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Run a validated plan, reporting outcomes to `sink`.
    pub fn execute(&self, preflight: &Preflight, sink: Arc<dyn OutcomeSink>) -> Result<RunResult> {
        let scorer = Scorer::new(preflight.scorer.clone(), sink);
        info!(
            "{} run: {} cells, {} scorer runs of {} folds",
            preflight.mode,
            preflight.cells(),
            preflight.scorer_runs(),
            preflight.scorer.folds
        );

        match &preflight.plan {
            RunPlan::Compare { backends } => {
                let comparator =
                    Comparator::new(scorer, self.factory.clone(), self.source.clone());
                Ok(RunResult::Comparison(
                    comparator.compare(&preflight.criteria, backends)?,
                ))
            }
            RunPlan::Sweep {
                backend,
                grid,
                mode,
            } => {
                let sweep = ParameterSweep::new(scorer, self.factory.clone(), self.source.clone());
                Ok(RunResult::Sweep(sweep.run_reduced(
                    &preflight.criteria,
                    backend,
                    grid,
                    *mode,
                )?))
            }
        }
    }

    /// Execute, then write the result artifact.
    pub fn run(&self, preflight: &Preflight, sink: Arc<dyn OutcomeSink>) -> Result<RunSummary> {
        let writer = JsonResultWriter::new(&preflight.result_path);
        writer.warn_if_exists();

        let started_at = Utc::now();
        let result = self.execute(preflight, sink)?;
        writer.write(&result)?;

        Ok(RunSummary {
            mode: preflight.mode,
            started_at,
            finished_at: Utc::now(),
            result_path: preflight.result_path.clone(),
            result,
        })
    }
}
