//! Parameter sweep over one backend.
//!
//! For every language × criterion, each value of each swept parameter is
//! scored with an adapter carrying exactly that single override. The raw
//! [`SweepReport`] is then reshaped according to a [`ReductionMode`]:
//!
//! - `all`: metric becomes the outer key, values are untouched
//! - `best`: only the best value per metric and parameter is kept

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::classifier::{AdapterFactory, ParamValue, Parameters, check_parameters};
use crate::comparator::CriteriaPlan;
use crate::dataset::DatasetSource;
use crate::error::{BenchError, Result};
use crate::report::{self, BestParameters, MetricGrid, SweepReport, ValueSeries};
use crate::scoring::{Metric, Scorer};

/// Candidate values per parameter name, in grid order.
pub type ParameterGrid = BTreeMap<String, Vec<ParamValue>>;

/// How a sweep is reduced before it is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReductionMode {
    /// Every value, re-keyed by metric.
    #[default]
    All,
    /// Best value per metric and parameter.
    Best,
}

impl ReductionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionMode::All => "all",
            ReductionMode::Best => "best",
        }
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(ReductionMode::All),
            "best" => Ok(ReductionMode::Best),
            other => Err(BenchError::config(
                "reduction_mode",
                format!("unknown mode '{other}' (expected all or best)"),
            )),
        }
    }
}

/// Reduced sweep, serialized without a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SweepResult {
    All(MetricGrid),
    Best(BestParameters),
}

/// Apply `mode` to a raw sweep.
pub fn reduce(sweep: &SweepReport, metrics: &[Metric], mode: ReductionMode) -> SweepResult {
    let grid = report::invert(sweep, metrics);
    match mode {
        ReductionMode::All => SweepResult::All(grid),
        ReductionMode::Best => SweepResult::Best(report::best(&grid)),
    }
}

/// Reject grid parameter names the backend does not accept.
pub fn check_grid(factory: &dyn AdapterFactory, backend: &str, grid: &ParameterGrid) -> Result<()> {
    let accepted = factory.accepted_parameters(backend)?;
    let names: Parameters = grid
        .keys()
        .map(|name| (name.clone(), ParamValue::Boolean(true)))
        .collect();
    check_parameters(backend, accepted, &names)
}

/// Runs the [`Scorer`] across one backend's parameter grid.
pub struct ParameterSweep {
    scorer: Scorer,
    factory: Arc<dyn AdapterFactory>,
    source: Arc<dyn DatasetSource>,
}

impl ParameterSweep {
    pub fn new(
        scorer: Scorer,
        factory: Arc<dyn AdapterFactory>,
        source: Arc<dyn DatasetSource>,
    ) -> Self {
        ParameterSweep {
            scorer,
            factory,
            source,
        }
    }

    /// Score every grid value; returns the raw, unreduced tree.
    pub fn run(
        &self,
        criteria: &CriteriaPlan,
        backend: &str,
        grid: &ParameterGrid,
    ) -> Result<SweepReport> {
        check_grid(self.factory.as_ref(), backend, grid)?;
        let mut report = SweepReport::new();

        for (language, criterion_names) in criteria {
            info!("language: {language}");
            for criterion in criterion_names {
                info!("criterion: {criterion}");
                let dataset = self.source.load(language, criterion)?;

                let mut cell = BTreeMap::new();
                for (parameter, values) in grid {
                    let mut series = ValueSeries::new();
                    for value in values {
                        info!("[{backend}] {parameter} = {value}");
                        let params = Parameters::from([(parameter.clone(), value.clone())]);
                        let mut adapter = self.factory.build(backend, language, &params)?;
                        let record = self.scorer.score(adapter.as_mut(), &dataset)?;
                        series.push(value.clone(), record);
                    }
                    cell.insert(parameter.clone(), series);
                }
                report.insert(language.as_str(), criterion.as_str(), cell);
            }
        }
        Ok(report)
    }

    /// Run the sweep, then reduce it.
    pub fn run_reduced(
        &self,
        criteria: &CriteriaPlan,
        backend: &str,
        grid: &ParameterGrid,
        mode: ReductionMode,
    ) -> Result<SweepResult> {
        let sweep = self.run(criteria, backend, grid)?;
        Ok(reduce(&sweep, &self.scorer.config().metrics, mode))
    }
}
