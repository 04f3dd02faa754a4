//! Cross-validation scoring of one classifier over one dataset.
//!
//! The [`Scorer`] runs `folds` cold train/predict cycles against a
//! [`ClassifierAdapter`](crate::classifier::ClassifierAdapter). Every
//! prediction is classified as an [`Outcome`] (match, fallback or miss) and
//! reported to an injected [`OutcomeSink`]. Per-fold [`OutcomeCounts`] feed
//! the [`Metric`] functions, and the fold means become a [`ScoreRecord`].
//!
//! # Metrics
//!
//! All metrics are pure functions of `(match, fallback, miss)`:
//!
//! | Metric | Formula |
//! |---|---|
//! | `accuracy` | `match / n` |
//! | `error_3_penalized` | `match / (match + fallback + 3 * miss)` |
//! | `error_10_penalized` | `match / (match + fallback + 10 * miss)` |
//!
//! A confident wrong answer costs more than an abstention.

mod fold;
mod metric;
mod outcome;
mod scorer;
mod sink;

pub use fold::Fold;
pub use metric::Metric;
pub use outcome::{Outcome, OutcomeCounts};
pub use scorer::{EvaluationScope, FoldReport, ScoreRecord, Scorer, ScorerConfig};
pub use sink::{
    FileOutcomeSink, MemoryOutcomeSink, NullOutcomeSink, OutcomeEvent, OutcomeSink,
    RecordedOutcome,
};
