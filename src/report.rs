//! Typed result trees.
//!
//! Every run produces a tree keyed by language, then criterion. The leaves
//! depend on the run:
//!
//! - comparator: backend name → [`ScoreRecord`] ([`ComparisonReport`])
//! - parameter sweep: parameter name → value → [`ScoreRecord`] ([`SweepReport`])
//! - sweep "all" view: metric → parameter name → value → score ([`MetricGrid`])
//! - sweep "best" view: metric → parameter name → best value ([`BestParameters`])
//!
//! Parameter values keep their grid order in a [`ValueSeries`], which is what
//! makes "first candidate wins a tie" well defined.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::classifier::ParamValue;
use crate::scoring::{Metric, ScoreRecord};

/// Nested mapping `language → criterion → T`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTree<T> {
    languages: BTreeMap<String, BTreeMap<String, T>>,
}

impl<T> Default for ResultTree<T> {
    fn default() -> Self {
        ResultTree {
            languages: BTreeMap::new(),
        }
    }
}

impl<T> ResultTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the leaf of `language` / `criterion`, returning any previous one.
    pub fn insert<L: Into<String>, C: Into<String>>(
        &mut self,
        language: L,
        criterion: C,
        value: T,
    ) -> Option<T> {
        self.languages
            .entry(language.into())
            .or_default()
            .insert(criterion.into(), value)
    }

    /// Leaf of `language` / `criterion`.
    pub fn get(&self, language: &str, criterion: &str) -> Option<&T> {
        self.languages.get(language)?.get(criterion)
    }

    /// Languages present in the tree.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Criteria present for `language`.
    pub fn criteria<'a>(&'a self, language: &str) -> impl Iterator<Item = &'a str> + use<'a, T> {
        self.languages
            .get(language)
            .into_iter()
            .flat_map(|criteria| criteria.keys().map(String::as_str))
    }

    /// Every `(language, criterion, leaf)` triple.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &T)> {
        self.languages.iter().flat_map(|(language, criteria)| {
            criteria
                .iter()
                .map(move |(criterion, value)| (language.as_str(), criterion.as_str(), value))
        })
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.languages.values().map(BTreeMap::len).sum()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a tree of the same shape with transformed leaves.
    pub fn map<U, F>(&self, mut f: F) -> ResultTree<U>
    where
        F: FnMut(&T) -> U,
    {
        let mut mapped = ResultTree::new();
        for (language, criterion, value) in self.iter() {
            mapped.insert(language, criterion, f(value));
        }
        mapped
    }
}

/// Parameter values in grid order with their associated leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSeries<T> {
    entries: Vec<(ParamValue, T)>,
}

impl<T> Default for ValueSeries<T> {
    fn default() -> Self {
        ValueSeries {
            entries: Vec::new(),
        }
    }
}

impl<T> ValueSeries<T> {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; grid order is insertion order.
    pub fn push(&mut self, value: ParamValue, leaf: T) {
        self.entries.push((value, leaf));
    }

    /// Leaf associated with `value`.
    pub fn get(&self, value: &ParamValue) -> Option<&T> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == value)
            .map(|(_, leaf)| leaf)
    }

    /// Entries in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamValue, &T)> {
        self.entries.iter().map(|(value, leaf)| (value, leaf))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value whose key is largest; the earliest value wins ties.
    pub fn best_by<F>(&self, key: F) -> Option<&ParamValue>
    where
        F: Fn(&T) -> f64,
    {
        let mut best: Option<(&ParamValue, f64)> = None;
        for (value, leaf) in &self.entries {
            let score = key(leaf);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((value, score)),
            }
        }
        best.map(|(value, _)| value)
    }
}

impl<T: Serialize> Serialize for ValueSeries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (value, leaf) in &self.entries {
            map.serialize_entry(&value.to_string(), leaf)?;
        }
        map.end()
    }
}

/// Comparator leaves: backend name → record.
pub type BackendScores = BTreeMap<String, ScoreRecord>;
/// Comparator result tree.
pub type ComparisonReport = ResultTree<BackendScores>;

/// Sweep leaves: parameter name → value series of records.
pub type ParameterScores = BTreeMap<String, ValueSeries<ScoreRecord>>;
/// Raw parameter sweep result tree.
pub type SweepReport = ResultTree<ParameterScores>;

/// Inverted sweep leaves: metric → parameter name → value series of scores.
pub type MetricScores = BTreeMap<Metric, BTreeMap<String, ValueSeries<f64>>>;
/// Sweep result tree re-keyed by metric ("all" mode).
pub type MetricGrid = ResultTree<MetricScores>;

/// Best value per metric and parameter.
pub type BestValues = BTreeMap<Metric, BTreeMap<String, ParamValue>>;
/// Sweep result tree reduced to the best value ("best" mode).
pub type BestParameters = ResultTree<BestValues>;

/// Re-key a sweep so the metric becomes the outer key.
///
/// Values are copied untouched; only the nesting changes. Every metric in
/// `metrics` gets an entry, even when no parameter was swept.
pub fn invert(sweep: &SweepReport, metrics: &[Metric]) -> MetricGrid {
    sweep.map(|parameters| {
        let mut by_metric: MetricScores = metrics
            .iter()
            .map(|metric| (*metric, BTreeMap::new()))
            .collect();

        for (parameter, series) in parameters {
            for metric in metrics {
                let mut scores = ValueSeries::new();
                for (value, record) in series.iter() {
                    if let Some(score) = record.score(*metric) {
                        scores.push(value.clone(), score);
                    }
                }
                if let Some(per_parameter) = by_metric.get_mut(metric) {
                    per_parameter.insert(parameter.clone(), scores);
                }
            }
        }
        by_metric
    })
}

/// Keep, for every metric and parameter, the value with the highest score.
pub fn best(grid: &MetricGrid) -> BestParameters {
    grid.map(|by_metric| {
        by_metric
            .iter()
            .map(|(metric, parameters)| {
                let winners = parameters
                    .iter()
                    .filter_map(|(parameter, series)| {
                        series
                            .best_by(|score| *score)
                            .map(|value| (parameter.clone(), value.clone()))
                    })
                    .collect();
                (*metric, winners)
            })
            .collect()
    })
}
