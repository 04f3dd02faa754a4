//! Scoring rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::scoring::outcome::OutcomeCounts;

/// A scoring rule computed from per-fold outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Share of matches.
    #[serde(rename = "accuracy")]
    Accuracy,
    /// Matches over outcomes where a miss counts three times.
    #[serde(rename = "error_3_penalized")]
    Error3Penalized,
    /// Matches over outcomes where a miss counts ten times.
    #[serde(rename = "error_10_penalized")]
    Error10Penalized,
}

impl Metric {
    /// Every implemented metric.
    pub const ALL: [Metric; 3] = [
        Metric::Accuracy,
        Metric::Error3Penalized,
        Metric::Error10Penalized,
    ];

    /// Configuration name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Error3Penalized => "error_3_penalized",
            Metric::Error10Penalized => "error_10_penalized",
        }
    }

    /// Weight of one miss in the denominator.
    fn miss_weight(&self) -> usize {
        match self {
            Metric::Accuracy => 1,
            Metric::Error3Penalized => 3,
            Metric::Error10Penalized => 10,
        }
    }

    /// Score the counts; an empty fold scores 0.
    pub fn score(&self, counts: &OutcomeCounts) -> f64 {
        let denominator = counts.matched + counts.fallback + self.miss_weight() * counts.missed;
        if denominator == 0 {
            0.0
        } else {
            counts.matched as f64 / denominator as f64
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| {
                BenchError::config(
                    "metrics",
                    format!("the metric '{s}' is not handled"),
                )
            })
    }
}
