//! Cross-backend comparison.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::classifier::{AdapterFactory, Parameters};
use crate::dataset::DatasetSource;
use crate::error::Result;
use crate::report::ComparisonReport;
use crate::scoring::{Metric, Scorer};

/// Criteria to run, per language, in configuration order.
pub type CriteriaPlan = BTreeMap<String, Vec<String>>;

/// Runs the [`Scorer`] for every language × criterion × backend.
///
/// Every cell gets its own freshly built adapter with no parameter
/// overrides, so no remote training is shared between cells.
pub struct Comparator {
    scorer: Scorer,
    factory: Arc<dyn AdapterFactory>,
    source: Arc<dyn DatasetSource>,
}

impl Comparator {
    pub fn new(
        scorer: Scorer,
        factory: Arc<dyn AdapterFactory>,
        source: Arc<dyn DatasetSource>,
    ) -> Self {
        Comparator {
            scorer,
            factory,
            source,
        }
    }

    /// Score every backend on every criterion.
    pub fn compare(&self, criteria: &CriteriaPlan, backends: &[String]) -> Result<ComparisonReport> {
        let mut report = ComparisonReport::new();

        for (language, criterion_names) in criteria {
            info!("language: {language}");
            for criterion in criterion_names {
                info!("criterion: {criterion}");
                let dataset = self.source.load(language, criterion)?;

                let mut cell = BTreeMap::new();
                for backend in backends {
                    info!("backend: {backend}");
                    let mut adapter = self.factory.build(backend, language, &Parameters::new())?;
                    let record = self.scorer.score(adapter.as_mut(), &dataset)?;
                    cell.insert(adapter.name().to_string(), record);
                }
                report.insert(language.as_str(), criterion.as_str(), cell);
            }
        }
        Ok(report)
    }
}

/// Backend with the highest score for one metric of one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leader {
    pub language: String,
    pub criterion: String,
    pub metric: Metric,
    pub backend: String,
    pub score: f64,
}

/// Best backend per language, criterion and metric.
///
/// Backends are visited in name order; the first one wins a tie.
pub fn leaders(report: &ComparisonReport, metrics: &[Metric]) -> Vec<Leader> {
    let mut leaders = Vec::new();
    for (language, criterion, backends) in report.iter() {
        for metric in metrics {
            let mut best: Option<(&str, f64)> = None;
            for (backend, record) in backends {
                let Some(score) = record.score(*metric) else {
                    continue;
                };
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((backend.as_str(), score)),
                }
            }
            if let Some((backend, score)) = best {
                leaders.push(Leader {
                    language: language.to_string(),
                    criterion: criterion.to_string(),
                    metric: *metric,
                    backend: backend.to_string(),
                    score,
                });
            }
        }
    }
    leaders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreRecord;

    fn record(accuracy: f64) -> ScoreRecord {
        ScoreRecord {
            scores: BTreeMap::from([(Metric::Accuracy, accuracy)]),
            risk_rate: 1.0,
        }
    }

    #[test]
    fn test_leaders_pick_highest_and_first_on_tie() {
        let mut report = ComparisonReport::new();
        report.insert(
            "en",
            "smalltalk_en",
            BTreeMap::from([
                ("apiai".to_string(), record(0.7)),
                ("luis".to_string(), record(0.9)),
                ("recast".to_string(), record(0.9)),
            ]),
        );

        let leaders = leaders(&report, &[Metric::Accuracy, Metric::Error3Penalized]);
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].backend, "luis");
        assert_eq!(leaders[0].score, 0.9);
    }
}
