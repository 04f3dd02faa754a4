//! # intent-bench
//!
//! Benchmark remote intent-classification services against labeled
//! datasets, across languages and tunable parameters.
//!
//! ## Features
//!
//! - One capability contract over heterogeneous vendor protocols
//! - Deterministic k-fold cross-validation with abstention-aware metrics
//! - Backend comparison and parameter sweeps with typed result trees
//! - Pre-flight validation before any remote training

pub mod backend;
pub mod bench;
pub mod classifier;
pub mod cli;
pub mod comparator;
pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod scoring;
pub mod sweep;
pub mod writer;

pub mod prelude {
    pub use crate::bench::{Benchmark, Preflight, RunResult};
    pub use crate::classifier::{AdapterFactory, ClassifierAdapter, ParamValue, Parameters};
    pub use crate::config::BenchConfig;
    pub use crate::dataset::{Dataset, DatasetSource, Example};
    pub use crate::error::{BenchError, Result};
    pub use crate::scoring::{Metric, ScoreRecord, Scorer, ScorerConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
