//! Tab-separated dataset files.
//!
//! Each criterion lives in `<root>/<language>/<criterion>.csv`, a
//! tab-separated file whose header contains at least `sentence` and `intent`.
//! Other columns are ignored.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;

use crate::dataset::{Dataset, DatasetSource, Example};
use crate::error::{BenchError, Result};

/// Dataset source reading tab-separated files from a data directory.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    /// Directory holding one subdirectory per language.
    root: PathBuf,
    /// Field delimiter (default: tab).
    delimiter: u8,
}

impl FileDatasetSource {
    /// Create a source rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FileDatasetSource {
            root: root.as_ref().to_path_buf(),
            delimiter: b'\t',
        }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter as u8;
        self
    }

    /// Path of the file backing `language` / `criterion`.
    pub fn path_for(&self, language: &str, criterion: &str) -> PathBuf {
        self.root
            .join(language)
            .join(format!("{criterion}.csv"))
    }

    /// Parse tab-separated content into examples.
    pub fn parse(&self, content: &str) -> Result<Vec<Example>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        for required in ["sentence", "intent"] {
            if !headers.iter().any(|h| h == required) {
                return Err(BenchError::dataset(format!(
                    "missing required column '{required}'"
                )));
            }
        }

        let mut examples = Vec::new();
        for record in reader.deserialize::<Example>() {
            examples.push(record?);
        }
        Ok(examples)
    }
}

impl DatasetSource for FileDatasetSource {
    fn check(&self, language: &str, criterion: &str) -> Result<()> {
        if self.path_for(language, criterion).is_file() {
            Ok(())
        } else {
            Err(BenchError::dataset(format!(
                "criterion {criterion} of language {language} does not exist"
            )))
        }
    }

    fn load(&self, language: &str, criterion: &str) -> Result<Dataset> {
        self.check(language, criterion)?;
        let path = self.path_for(language, criterion);
        debug!("loading dataset {}", path.display());

        let content = std::fs::read_to_string(&path)?;
        let examples = self.parse(&content)?;
        if examples.is_empty() {
            return Err(BenchError::dataset(format!(
                "criterion {criterion} of language {language} has no examples"
            )));
        }
        Ok(Dataset::new(language, criterion, examples))
    }
}
