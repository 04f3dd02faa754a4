//! Benchmark configuration.
//!
//! A run is described by one JSON document:
//!
//! ```json
//! {
//!   "action": "parametor",
//!   "metrics": ["accuracy", "error_3_penalized"],
//!   "criteria": { "en": ["smalltalk_en"] },
//!   "api": "recast",
//!   "params": { "strictness": [0, 25, 50, 75, 100] },
//!   "reduction_mode": "best",
//!   "credentials": {
//!     "recast": { "user_slug": "me", "bot_slug": "bench", "token": "..." }
//!   }
//! }
//! ```
//!
//! Names that select behavior (`action`, `metrics`, `apis`, `reduction_mode`)
//! are kept as text and parsed during pre-flight so that a bad value is
//! reported as a configuration error naming its field.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::Credentials;
use crate::classifier::PollPolicy;
use crate::comparator::CriteriaPlan;
use crate::error::{BenchError, Result};
use crate::scoring::{EvaluationScope, Metric, ScorerConfig};
use crate::sweep::{ParameterGrid, ReductionMode};

/// Environment variable holding the configuration path.
pub const CONFIG_ENV: &str = "INTENT_BENCH_CONFIG";
/// Label used when the configuration names none.
pub const DEFAULT_FALLBACK_INTENT: &str = "fallback_not_understood";

/// Which driver a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every backend on every criterion.
    Comparator,
    /// One backend across its parameter grid.
    Parametor,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Comparator => "comparator",
            RunMode::Parametor => "parametor",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "comparator" => Ok(RunMode::Comparator),
            "parametor" => Ok(RunMode::Parametor),
            other => Err(BenchError::config(
                "action",
                format!("unknown action '{other}' (expected comparator or parametor)"),
            )),
        }
    }
}

/// Whole-run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// `comparator` or `parametor`.
    pub action: String,
    /// Metric names to report.
    pub metrics: Vec<String>,
    /// Language → criteria.
    pub criteria: CriteriaPlan,
    /// Label backends return when they abstain.
    pub fallback_intent: String,
    /// Root of `criteria/`, `logs/` and `results/`.
    pub data_dir: PathBuf,

    /// Backends compared in `comparator` mode.
    pub apis: Vec<String>,
    /// Backend swept in `parametor` mode.
    pub api: Option<String>,
    /// Parameter grid swept in `parametor` mode.
    pub params: ParameterGrid,
    /// `all` or `best`.
    pub reduction_mode: String,

    pub folds: usize,
    pub test_size: f64,
    pub seed: u64,
    pub evaluation_scope: EvaluationScope,

    pub credentials: Credentials,
    /// Delay between two training status polls.
    pub poll_interval_ms: u64,
    /// Give up training after this many polls; unbounded when absent.
    pub max_polls: Option<usize>,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// Where to write the result instead of the per-mode default.
    pub result_file: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let scorer = ScorerConfig::default();
        BenchConfig {
            action: RunMode::Comparator.to_string(),
            metrics: Metric::ALL.iter().map(|m| m.to_string()).collect(),
            criteria: CriteriaPlan::new(),
            fallback_intent: DEFAULT_FALLBACK_INTENT.to_string(),
            data_dir: PathBuf::from("data"),
            apis: Vec::new(),
            api: None,
            params: ParameterGrid::new(),
            reduction_mode: ReductionMode::All.to_string(),
            folds: scorer.folds,
            test_size: scorer.test_size,
            seed: scorer.seed,
            evaluation_scope: scorer.scope,
            credentials: Credentials::default(),
            poll_interval_ms: 1000,
            max_polls: None,
            request_timeout_secs: 30,
            result_file: None,
        }
    }
}

impl BenchConfig {
    /// Read a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BenchError::config("config", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse a configuration document.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BenchError::config("config", format!("invalid configuration: {e}")))
    }

    pub fn run_mode(&self) -> Result<RunMode> {
        self.action.parse()
    }

    /// Parsed metric list; fails on the first unknown name.
    pub fn parsed_metrics(&self) -> Result<Vec<Metric>> {
        self.metrics.iter().map(|name| name.parse()).collect()
    }

    pub fn parsed_reduction_mode(&self) -> Result<ReductionMode> {
        self.reduction_mode.parse()
    }

    /// Scorer settings derived from this configuration.
    pub fn scorer_config(&self) -> Result<ScorerConfig> {
        let config = ScorerConfig {
            metrics: self.parsed_metrics()?,
            fallback_intent: self.fallback_intent.clone(),
            folds: self.folds,
            test_size: self.test_size,
            seed: self.seed,
            scope: self.evaluation_scope,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory holding `{language}/{criterion}.csv`.
    pub fn criteria_dir(&self) -> PathBuf {
        self.data_dir.join("criteria")
    }

    /// Directory holding the outcome logs.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Result artifact path for `mode`.
    pub fn result_path(&self, mode: RunMode) -> PathBuf {
        if let Some(path) = &self.result_file {
            return path.clone();
        }
        let results = self.data_dir.join("results");
        match mode {
            RunMode::Comparator => results.join("comparator").join("all_results.json"),
            RunMode::Parametor => results.join("parametor").join("result.json"),
        }
    }

    /// Checks that need neither datasets nor backends.
    pub fn validate(&self) -> Result<()> {
        let mode = self.run_mode()?;
        self.scorer_config()?;

        if self.criteria.is_empty() {
            return Err(BenchError::config("criteria", "at least one language is required"));
        }
        for (language, criteria) in &self.criteria {
            if criteria.is_empty() {
                return Err(BenchError::config(
                    "criteria",
                    format!("language '{language}' lists no criterion"),
                ));
            }
        }

        match mode {
            RunMode::Comparator => {
                if self.apis.is_empty() {
                    return Err(BenchError::config("apis", "at least one backend is required"));
                }
            }
            RunMode::Parametor => {
                if self.api.as_deref().is_none_or(|api| api.trim().is_empty()) {
                    return Err(BenchError::config("api", "a backend to sweep is required"));
                }
                self.parsed_reduction_mode()?;
                if self.params.is_empty() {
                    return Err(BenchError::config("params", "at least one parameter is required"));
                }
                for (name, values) in &self.params {
                    if values.is_empty() {
                        return Err(BenchError::config(
                            "params",
                            format!("parameter '{name}' has no candidate value"),
                        ));
                    }
                    // Values are keyed by their rendering in the result tree.
                    let mut seen = BTreeSet::new();
                    for value in values {
                        if !seen.insert(value.to_string()) {
                            return Err(BenchError::config(
                                "params",
                                format!("parameter '{name}' lists the value {value} twice"),
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
