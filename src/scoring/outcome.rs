//! Per-example classification outcomes.

use serde::{Deserialize, Serialize};

/// Result of comparing one prediction with its gold label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Prediction equals the gold label, ignoring case.
    Match,
    /// The backend abstained with the fallback label.
    Fallback,
    /// Anything else.
    Miss,
}

impl Outcome {
    /// Classify `predicted` against `gold`.
    ///
    /// The match test is case-insensitive and takes precedence; the fallback
    /// test is an exact comparison with `fallback_intent`.
    pub fn classify(predicted: &str, gold: &str, fallback_intent: &str) -> Self {
        if predicted.to_lowercase() == gold.to_lowercase() {
            Outcome::Match
        } else if predicted == fallback_intent {
            Outcome::Fallback
        } else {
            Outcome::Miss
        }
    }
}

/// Outcome counters for one fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Number of matches.
    pub matched: usize,
    /// Number of fallbacks.
    pub fallback: usize,
    /// Number of misses.
    pub missed: usize,
}

impl OutcomeCounts {
    /// Count one outcome.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Match => self.matched += 1,
            Outcome::Fallback => self.fallback += 1,
            Outcome::Miss => self.missed += 1,
        }
    }

    /// Number of evaluated examples.
    pub fn total(&self) -> usize {
        self.matched + self.fallback + self.missed
    }

    /// Share of examples the backend did not abstain on.
    ///
    /// An empty fold has nothing abstained on and reports 1.
    pub fn risk_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            1.0
        } else {
            1.0 - self.fallback as f64 / total as f64
        }
    }
}
