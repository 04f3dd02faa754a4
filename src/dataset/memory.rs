//! In-memory dataset source for testing and demos.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{Dataset, DatasetSource, Example};
use crate::error::{BenchError, Result};

/// Dataset source backed by a map of `(language, criterion)` to examples.
#[derive(Debug, Default, Clone)]
pub struct MemoryDatasetSource {
    datasets: Arc<RwLock<HashMap<(String, String), Vec<Example>>>>,
}

impl MemoryDatasetSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the examples of one criterion.
    pub fn insert<L: Into<String>, C: Into<String>>(
        &self,
        language: L,
        criterion: C,
        examples: Vec<Example>,
    ) {
        self.datasets
            .write()
            .insert((language.into(), criterion.into()), examples);
    }

    /// Number of registered criteria.
    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    /// Whether no criteria are registered.
    pub fn is_empty(&self) -> bool {
        self.datasets.read().is_empty()
    }
}

impl DatasetSource for MemoryDatasetSource {
    fn check(&self, language: &str, criterion: &str) -> Result<()> {
        let key = (language.to_string(), criterion.to_string());
        if self.datasets.read().contains_key(&key) {
            Ok(())
        } else {
            Err(BenchError::dataset(format!(
                "criterion {criterion} of language {language} does not exist"
            )))
        }
    }

    fn load(&self, language: &str, criterion: &str) -> Result<Dataset> {
        let key = (language.to_string(), criterion.to_string());
        let datasets = self.datasets.read();
        let examples = datasets.get(&key).ok_or_else(|| {
            BenchError::dataset(format!(
                "criterion {criterion} of language {language} does not exist"
            ))
        })?;
        Ok(Dataset::new(language, criterion, examples.clone()))
    }
}
