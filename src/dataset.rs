//! Labeled intent datasets.
//!
//! A [`Dataset`] is the ordered list of `(sentence, intent)` pairs that make
//! up one criterion of one language. Datasets are obtained through a
//! [`DatasetSource`], which can also check that a criterion exists without
//! loading it, so a run can fail fast before any remote call.
//!
//! # Sources
//!
//! - [`FileDatasetSource`]: tab-separated files laid out as
//!   `<root>/criteria/<language>/<criterion>.csv`
//! - [`MemoryDatasetSource`]: in-memory datasets for tests and demos
//!
//! # Example
//!
//! ```
//! use intent_bench::dataset::{DatasetSource, Example, MemoryDatasetSource};
//!
//! # fn main() -> intent_bench::error::Result<()> {
//! let source = MemoryDatasetSource::new();
//! source.insert(
//!     "en",
//!     "smalltalk_en",
//!     vec![Example::new("hi", "greeting"), Example::new("bye", "farewell")],
//! );
//!
//! let dataset = source.load("en", "smalltalk_en")?;
//! assert_eq!(dataset.len(), 2);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod file;
pub mod memory;

pub use file::FileDatasetSource;
pub use memory::MemoryDatasetSource;

/// One labeled utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Utterance text.
    pub sentence: String,
    /// Gold intent label.
    pub intent: String,
}

impl Example {
    /// Create a new labeled example.
    pub fn new<S: Into<String>, I: Into<String>>(sentence: S, intent: I) -> Self {
        Example {
            sentence: sentence.into(),
            intent: intent.into(),
        }
    }
}

/// An immutable labeled dataset for one (language, criterion) pair.
#[derive(Debug, Clone)]
pub struct Dataset {
    language: String,
    criterion: String,
    examples: Vec<Example>,
}

impl Dataset {
    /// Create a dataset from its examples.
    pub fn new<L: Into<String>, C: Into<String>>(
        language: L,
        criterion: C,
        examples: Vec<Example>,
    ) -> Self {
        Dataset {
            language: language.into(),
            criterion: criterion.into(),
            examples,
        }
    }

    /// Language code of the dataset.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Criterion name of the dataset.
    pub fn criterion(&self) -> &str {
        &self.criterion
    }

    /// All examples in file order.
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the dataset has no examples.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Distinct intent labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for example in &self.examples {
            if !labels.contains(&example.intent.as_str()) {
                labels.push(&example.intent);
            }
        }
        labels
    }

    /// Clone the examples at `indices`, preserving the order of `indices`.
    pub fn select(&self, indices: &[usize]) -> Vec<Example> {
        indices
            .iter()
            .filter_map(|&idx| self.examples.get(idx).cloned())
            .collect()
    }
}

/// Provider of labeled datasets.
pub trait DatasetSource: Send + Sync {
    /// Check that the dataset exists without loading it.
    fn check(&self, language: &str, criterion: &str) -> Result<()>;

    /// Load the dataset for `language` / `criterion`.
    fn load(&self, language: &str, criterion: &str) -> Result<Dataset>;
}

/// Group examples by label, keeping first-seen label order and example order.
pub fn group_by_intent(examples: &[Example]) -> Vec<(&str, Vec<&str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for example in examples {
        match groups.iter_mut().find(|(label, _)| *label == example.intent) {
            Some((_, sentences)) => sentences.push(&example.sentence),
            None => groups.push((&example.intent, vec![&example.sentence])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            "en",
            "smalltalk_en",
            vec![
                Example::new("hi", "greeting"),
                Example::new("bye", "farewell"),
                Example::new("hello there", "greeting"),
            ],
        )
    }

    #[test]
    fn test_labels_first_seen_order() {
        let dataset = sample();
        assert_eq!(dataset.labels(), vec!["greeting", "farewell"]);
    }

    #[test]
    fn test_select_preserves_index_order() {
        let dataset = sample();
        let picked = dataset.select(&[2, 0]);
        assert_eq!(picked[0].sentence, "hello there");
        assert_eq!(picked[1].sentence, "hi");
    }

    #[test]
    fn test_group_by_intent() {
        let dataset = sample();
        let groups = group_by_intent(dataset.examples());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("greeting", vec!["hi", "hello there"]));
        assert_eq!(groups[1], ("farewell", vec!["bye"]));
    }
}
