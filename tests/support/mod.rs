//! In-process backends shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use intent_bench::classifier::{AdapterFactory, ClassifierAdapter, Parameters};
use intent_bench::dataset::{Example, MemoryDatasetSource};
use intent_bench::error::{BenchError, Result};

pub const FALLBACK: &str = "none";

/// Remembers its training set.
///
/// Unknown sentences get the fallback label when `strictness >= 50`, and a
/// wrong label otherwise.
pub struct MemoAdapter {
    strictness: i64,
    learned: HashMap<String, String>,
    fits: Arc<AtomicUsize>,
}

impl ClassifierAdapter for MemoAdapter {
    fn name(&self) -> &str {
        "memo"
    }

    fn accepted_parameters(&self) -> &'static [&'static str] {
        &["strictness"]
    }

    fn fallback_intent(&self) -> &str {
        FALLBACK
    }

    fn fit(&mut self, examples: &[Example]) -> Result<()> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        self.learned = examples
            .iter()
            .map(|e| (e.sentence.clone(), e.intent.clone()))
            .collect();
        Ok(())
    }

    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
        Ok(sentences
            .iter()
            .map(|sentence| match self.learned.get(*sentence) {
                Some(intent) => intent.clone(),
                None if self.strictness >= 50 => FALLBACK.to_string(),
                None => "unknown_intent".to_string(),
            })
            .collect())
    }
}

/// Answers "greeting" for everything.
pub struct GreeterAdapter {
    fits: Arc<AtomicUsize>,
}

impl ClassifierAdapter for GreeterAdapter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn accepted_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn fallback_intent(&self) -> &str {
        FALLBACK
    }

    fn fit(&mut self, _examples: &[Example]) -> Result<()> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
        Ok(sentences.iter().map(|_| "greeting".to_string()).collect())
    }
}

/// Fails every training request.
pub struct BrokenAdapter;

impl ClassifierAdapter for BrokenAdapter {
    fn name(&self) -> &str {
        "broken"
    }

    fn accepted_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn fallback_intent(&self) -> &str {
        FALLBACK
    }

    fn fit(&mut self, _examples: &[Example]) -> Result<()> {
        Err(BenchError::backend("broken", 500, "internal error"))
    }

    fn predict(&mut self, _sentences: &[&str]) -> Result<Vec<String>> {
        Err(BenchError::training("broken", "not trained"))
    }
}

/// Factory over the stub adapters, counting constructions and trainings.
#[derive(Default)]
pub struct StubFactory {
    pub builds: AtomicUsize,
    pub fits: Arc<AtomicUsize>,
}

impl StubFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn fits(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

impl AdapterFactory for StubFactory {
    fn backends(&self) -> Vec<&'static str> {
        vec!["memo", "greeter", "broken"]
    }

    fn accepted_parameters(&self, backend: &str) -> Result<&'static [&'static str]> {
        match backend {
            "memo" => Ok(&["strictness"]),
            "greeter" | "broken" => Ok(&[]),
            other => Err(BenchError::config("apis", format!("unknown backend '{other}'"))),
        }
    }

    fn construct(
        &self,
        backend: &str,
        _language: &str,
        params: &Parameters,
    ) -> Result<Box<dyn ClassifierAdapter>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(match backend {
            "memo" => Box::new(MemoAdapter {
                strictness: params
                    .get("strictness")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(50),
                learned: HashMap::new(),
                fits: self.fits.clone(),
            }),
            "greeter" => Box::new(GreeterAdapter {
                fits: self.fits.clone(),
            }),
            "broken" => Box::new(BrokenAdapter),
            other => {
                return Err(BenchError::config("apis", format!("unknown backend '{other}'")));
            }
        })
    }
}

/// Ten examples, alternating between two intents.
pub fn smalltalk() -> Vec<Example> {
    (0..10)
        .map(|i| {
            let intent = if i % 2 == 0 { "greeting" } else { "farewell" };
            Example::new(format!("utterance {i}"), intent)
        })
        .collect()
}

/// Source with `smalltalk_en` and `smalltalk_fr`.
pub fn source() -> MemoryDatasetSource {
    let source = MemoryDatasetSource::new();
    source.insert("en", "smalltalk_en", smalltalk());
    source.insert("fr", "smalltalk_fr", smalltalk());
    source
}
