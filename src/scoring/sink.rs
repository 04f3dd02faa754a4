//! Outcome logs.
//!
//! Every prediction made during scoring is reported to an [`OutcomeSink`].
//! The file sink writes three tab-separated logs (success, fallback, error),
//! truncated with their header when the sink is created. Each line is
//! written with a single locked `write_all`, so lines are never torn.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::scoring::outcome::Outcome;

/// Header of the success and fallback logs.
pub const SUCCESS_HEADER: &str = "API\tINTENT\tSENTENCE";
/// Header of the error log.
pub const ERROR_HEADER: &str = "API\tINTENT_FOUND\tREAL_INTENT\tSENTENCE";

/// One classified prediction.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeEvent<'a> {
    /// Identity of the adapter that produced the prediction.
    pub backend: &'a str,
    /// Input utterance.
    pub sentence: &'a str,
    /// Gold intent.
    pub gold: &'a str,
    /// Predicted intent.
    pub predicted: &'a str,
    /// Classification of the prediction.
    pub outcome: Outcome,
}

/// Append-only destination for outcome events.
pub trait OutcomeSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: &OutcomeEvent<'_>) -> Result<()>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutcomeSink;

impl OutcomeSink for NullOutcomeSink {
    fn record(&self, _event: &OutcomeEvent<'_>) -> Result<()> {
        Ok(())
    }
}

/// Owned copy of an [`OutcomeEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    pub backend: String,
    pub sentence: String,
    pub gold: String,
    pub predicted: String,
    pub outcome: Outcome,
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryOutcomeSink {
    events: Mutex<Vec<RecordedOutcome>>,
}

impl MemoryOutcomeSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<RecordedOutcome> {
        self.events.lock().clone()
    }

    /// Number of events with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.outcome == outcome)
            .count()
    }
}

impl OutcomeSink for MemoryOutcomeSink {
    fn record(&self, event: &OutcomeEvent<'_>) -> Result<()> {
        self.events.lock().push(RecordedOutcome {
            backend: event.backend.to_string(),
            sentence: event.sentence.to_string(),
            gold: event.gold.to_string(),
            predicted: event.predicted.to_string(),
            outcome: event.outcome,
        });
        Ok(())
    }
}

/// Writes the success, fallback and error logs.
#[derive(Debug)]
pub struct FileOutcomeSink {
    success: Mutex<File>,
    fallback: Mutex<File>,
    error: Mutex<File>,
    paths: [PathBuf; 3],
}

impl FileOutcomeSink {
    /// Create (truncate) the three logs and write their headers.
    pub fn create<P: AsRef<Path>>(success: P, fallback: P, error: P) -> Result<Self> {
        let open = |path: &Path, header: &str| -> Result<File> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = File::create(path)?;
            file.write_all(format!("{header}\n").as_bytes())?;
            Ok(file)
        };

        Ok(FileOutcomeSink {
            success: Mutex::new(open(success.as_ref(), SUCCESS_HEADER)?),
            fallback: Mutex::new(open(fallback.as_ref(), SUCCESS_HEADER)?),
            error: Mutex::new(open(error.as_ref(), ERROR_HEADER)?),
            paths: [
                success.as_ref().to_path_buf(),
                fallback.as_ref().to_path_buf(),
                error.as_ref().to_path_buf(),
            ],
        })
    }

    /// Create the logs as `log_success.csv`, `log_fallback.csv` and
    /// `log_error.csv` inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::create(
            dir.join("log_success.csv"),
            dir.join("log_fallback.csv"),
            dir.join("log_error.csv"),
        )
    }

    /// Paths of the success, fallback and error logs.
    pub fn paths(&self) -> &[PathBuf; 3] {
        &self.paths
    }

    fn append(file: &Mutex<File>, fields: &[&str]) -> Result<()> {
        let mut line = fields
            .iter()
            .map(|field| clean_field(field))
            .collect::<Vec<_>>()
            .join("\t");
        line.push('\n');

        let mut file = file.lock();
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl OutcomeSink for FileOutcomeSink {
    fn record(&self, event: &OutcomeEvent<'_>) -> Result<()> {
        match event.outcome {
            Outcome::Match => {
                Self::append(&self.success, &[event.backend, event.gold, event.sentence])
            }
            Outcome::Fallback => {
                Self::append(&self.fallback, &[event.backend, event.gold, event.sentence])
            }
            Outcome::Miss => Self::append(
                &self.error,
                &[event.backend, event.predicted, event.gold, event.sentence],
            ),
        }
    }
}

/// Tabs and line breaks inside a field would shift columns.
fn clean_field(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}
