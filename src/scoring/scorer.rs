//! K-fold cross-validation engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierAdapter;
use crate::dataset::{Dataset, Example};
use crate::error::{BenchError, Result};
use crate::scoring::fold::Fold;
use crate::scoring::metric::Metric;
use crate::scoring::outcome::{Outcome, OutcomeCounts};
use crate::scoring::sink::{OutcomeEvent, OutcomeSink};

/// Which examples are predicted after each fold's training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationScope {
    /// Predict every example of the dataset, including the training ones.
    #[default]
    FullDataset,
    /// Predict only the held-out partition.
    HeldOut,
}

/// Scorer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Metrics to report.
    pub metrics: Vec<Metric>,
    /// Label the backends return when they abstain.
    pub fallback_intent: String,
    /// Number of folds.
    pub folds: usize,
    /// Held-out share of each fold.
    pub test_size: f64,
    /// Base seed; fold `i` uses `seed + i`.
    pub seed: u64,
    /// Examples predicted after training.
    pub scope: EvaluationScope,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            metrics: Metric::ALL.to_vec(),
            fallback_intent: "fallback_not_understood".to_string(),
            folds: 5,
            test_size: 0.3,
            seed: 42,
            scope: EvaluationScope::FullDataset,
        }
    }
}

impl ScorerConfig {
    /// Ensure the configuration values are within acceptable bounds.
    pub fn validate(&self) -> Result<()> {
        if self.folds == 0 {
            return Err(BenchError::config("folds", "must be at least 1"));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(BenchError::config(
                "test_size",
                format!("must be strictly between 0 and 1, got {}", self.test_size),
            ));
        }
        if self.metrics.is_empty() {
            return Err(BenchError::config("metrics", "at least one metric is required"));
        }
        if self.fallback_intent.trim().is_empty() {
            return Err(BenchError::config("fallback_intent", "must not be empty"));
        }
        Ok(())
    }
}

/// Counts and scores of one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldReport {
    /// Fold index.
    pub index: usize,
    /// Number of training examples sent to the backend.
    pub trained_on: usize,
    /// Outcome counts over the evaluated examples.
    pub counts: OutcomeCounts,
    /// Metric values of the fold.
    pub scores: BTreeMap<Metric, f64>,
    /// `1 - fallback / total` for the fold.
    pub risk_rate: f64,
}

/// Fold-averaged scores of one (adapter, dataset) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Mean of each metric across folds.
    pub scores: BTreeMap<Metric, f64>,
    /// Mean risk rate across folds.
    pub risk_rate: f64,
}

impl ScoreRecord {
    /// Average fold reports into a record.
    pub fn from_folds(metrics: &[Metric], folds: &[FoldReport]) -> Self {
        let n = folds.len().max(1) as f64;
        let scores = metrics
            .iter()
            .map(|metric| {
                let sum: f64 = folds
                    .iter()
                    .filter_map(|fold| fold.scores.get(metric))
                    .sum();
                (*metric, sum / n)
            })
            .collect();
        let risk_rate = folds.iter().map(|fold| fold.risk_rate).sum::<f64>() / n;

        ScoreRecord { scores, risk_rate }
    }

    /// Value of `metric`, if it was computed.
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.scores.get(&metric).copied()
    }
}

/// Cross-validation engine.
///
/// Every fold trains the adapter from scratch on the fold's training
/// partition, then predicts examples one at a time. Any adapter error aborts
/// the run: no partial record is produced.
#[derive(Clone)]
pub struct Scorer {
    config: ScorerConfig,
    sink: Arc<dyn OutcomeSink>,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("config", &self.config)
            .finish()
    }
}

impl Scorer {
    /// Create a scorer that reports outcomes to `sink`.
    pub fn new(config: ScorerConfig, sink: Arc<dyn OutcomeSink>) -> Self {
        Scorer { config, sink }
    }

    /// Scorer settings.
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Run every fold and average the results.
    pub fn score(
        &self,
        adapter: &mut dyn ClassifierAdapter,
        dataset: &Dataset,
    ) -> Result<ScoreRecord> {
        let folds = self.score_folds(adapter, dataset)?;
        let record = ScoreRecord::from_folds(&self.config.metrics, &folds);

        for (metric, value) in &record.scores {
            info!("[{}] metric {metric}: {value:.4}", adapter.name());
        }
        info!("[{}] risk rate: {:.4}", adapter.name(), record.risk_rate);

        Ok(record)
    }

    /// Run every fold and return the per-fold reports.
    pub fn score_folds(
        &self,
        adapter: &mut dyn ClassifierAdapter,
        dataset: &Dataset,
    ) -> Result<Vec<FoldReport>> {
        self.config.validate()?;
        if adapter.fallback_intent() != self.config.fallback_intent {
            return Err(BenchError::config(
                "fallback_intent",
                format!(
                    "{} abstains with '{}' but the scorer expects '{}'",
                    adapter.name(),
                    adapter.fallback_intent(),
                    self.config.fallback_intent
                ),
            ));
        }
        if dataset.is_empty() {
            return Err(BenchError::dataset(format!(
                "criterion {} of language {} has no examples",
                dataset.criterion(),
                dataset.language()
            )));
        }

        let n_folds = self.config.folds;
        let mut reports = Vec::with_capacity(n_folds);
        for index in 0..n_folds {
            info!("[{}] scoring fold {}/{}", adapter.name(), index + 1, n_folds);
            let fold = Fold::split(dataset.len(), self.config.test_size, self.config.seed, index);
            reports.push(self.score_fold(adapter, dataset, &fold)?);
        }
        Ok(reports)
    }

    fn score_fold(
        &self,
        adapter: &mut dyn ClassifierAdapter,
        dataset: &Dataset,
        fold: &Fold,
    ) -> Result<FoldReport> {
        let training = dataset.select(&fold.train);
        adapter.fit(&training)?;

        let evaluated: Vec<&Example> = match self.config.scope {
            EvaluationScope::FullDataset => dataset.examples().iter().collect(),
            EvaluationScope::HeldOut => fold
                .test
                .iter()
                .filter_map(|&idx| dataset.examples().get(idx))
                .collect(),
        };

        let mut counts = OutcomeCounts::default();
        for example in evaluated {
            let predicted = self.predict_one(adapter, &example.sentence)?;
            let outcome =
                Outcome::classify(&predicted, &example.intent, &self.config.fallback_intent);
            counts.record(outcome);

            self.sink.record(&OutcomeEvent {
                backend: adapter.name(),
                sentence: &example.sentence,
                gold: &example.intent,
                predicted: &predicted,
                outcome,
            })?;
        }

        info!(
            "[{}] {} ok, {} fallback, {} errors",
            adapter.name(),
            counts.matched,
            counts.fallback,
            counts.missed
        );

        let scores = self
            .config
            .metrics
            .iter()
            .map(|metric| (*metric, metric.score(&counts)))
            .collect();

        Ok(FoldReport {
            index: fold.index,
            trained_on: training.len(),
            counts,
            scores,
            risk_rate: counts.risk_rate(),
        })
    }

    fn predict_one(&self, adapter: &mut dyn ClassifierAdapter, sentence: &str) -> Result<String> {
        let mut predictions = adapter.predict(&[sentence])?;
        if predictions.len() != 1 {
            return Err(BenchError::other(format!(
                "{} returned {} predictions for one sentence",
                adapter.name(),
                predictions.len()
            )));
        }
        Ok(predictions.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::sink::MemoryOutcomeSink;

    /// Always answers the same label; remembers training sizes.
    struct ConstantAdapter {
        answer: String,
        fits: Vec<usize>,
    }

    impl ClassifierAdapter for ConstantAdapter {
        fn name(&self) -> &str {
            "constant"
        }

        fn accepted_parameters(&self) -> &'static [&'static str] {
            &[]
        }

        fn fallback_intent(&self) -> &str {
            "none"
        }

        fn fit(&mut self, examples: &[Example]) -> Result<()> {
            self.fits.push(examples.len());
            Ok(())
        }

        fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
            Ok(sentences.iter().map(|_| self.answer.clone()).collect())
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            "en",
            "toy",
            (0..10)
                .map(|i| Example::new(format!("s{i}"), if i % 2 == 0 { "even" } else { "odd" }))
                .collect(),
        )
    }

    fn config(scope: EvaluationScope) -> ScorerConfig {
        ScorerConfig {
            fallback_intent: "none".to_string(),
            folds: 3,
            scope,
            ..ScorerConfig::default()
        }
    }

    #[test]
    fn test_counts_cover_full_dataset() {
        let scorer = Scorer::new(config(EvaluationScope::FullDataset), Arc::new(MemoryOutcomeSink::new()));
        let mut adapter = ConstantAdapter {
            answer: "even".to_string(),
            fits: Vec::new(),
        };

        let folds = scorer.score_folds(&mut adapter, &dataset()).unwrap();
        assert_eq!(folds.len(), 3);
        for fold in &folds {
            assert_eq!(fold.counts.total(), 10);
            assert_eq!(fold.counts.matched, 5);
            assert_eq!(fold.trained_on, 7);
        }
        assert_eq!(adapter.fits, vec![7, 7, 7]);
    }

    #[test]
    fn test_held_out_scope() {
        let scorer = Scorer::new(config(EvaluationScope::HeldOut), Arc::new(MemoryOutcomeSink::new()));
        let mut adapter = ConstantAdapter {
            answer: "odd".to_string(),
            fits: Vec::new(),
        };

        let folds = scorer.score_folds(&mut adapter, &dataset()).unwrap();
        for fold in &folds {
            assert_eq!(fold.counts.total(), 3);
        }
    }

    #[test]
    fn test_record_is_fold_mean() {
        let folds = vec![
            FoldReport {
                index: 0,
                trained_on: 1,
                counts: OutcomeCounts::default(),
                scores: BTreeMap::from([(Metric::Accuracy, 0.5)]),
                risk_rate: 1.0,
            },
            FoldReport {
                index: 1,
                trained_on: 1,
                counts: OutcomeCounts::default(),
                scores: BTreeMap::from([(Metric::Accuracy, 1.0)]),
                risk_rate: 0.5,
            },
        ];
        let record = ScoreRecord::from_folds(&[Metric::Accuracy], &folds);
        assert_eq!(record.score(Metric::Accuracy), Some(0.75));
        assert_eq!(record.risk_rate, 0.75);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ScorerConfig::default();
        config.folds = 0;
        assert!(config.validate().is_err());

        let mut config = ScorerConfig::default();
        config.test_size = 1.5;
        assert!(config.validate().unwrap_err().to_string().contains("test_size"));
    }

    #[test]
    fn test_fallback_label_mismatch_is_rejected() {
        let scorer = Scorer::new(ScorerConfig::default(), Arc::new(MemoryOutcomeSink::new()));
        let mut adapter = ConstantAdapter {
            answer: "none".to_string(),
            fits: Vec::new(),
        };

        let err = scorer.score(&mut adapter, &dataset()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'fallback_intent'"));
        assert!(adapter.fits.is_empty());
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let scorer = Scorer::new(ScorerConfig::default(), Arc::new(MemoryOutcomeSink::new()));
        let mut adapter = ConstantAdapter {
            answer: "x".to_string(),
            fits: Vec::new(),
        };
        let empty = Dataset::new("en", "empty", Vec::new());
        assert!(scorer.score(&mut adapter, &empty).is_err());
        assert!(adapter.fits.is_empty());
    }
}
