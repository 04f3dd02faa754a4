//! Classifier adapter trait definition.

use crate::dataset::Example;
use crate::error::Result;

/// A remote, stateful, trainable intent classifier.
///
/// An adapter is bound to one backend account and one language. Every call
/// to [`fit`](ClassifierAdapter::fit) fully replaces the remote intent
/// definitions, so the adapter can be retrained any number of times. The
/// contract intentionally has no provided methods: each backend's remote
/// lifecycle is implemented on its own.
pub trait ClassifierAdapter: Send {
    /// Stable backend token, used as a result-tree key and a log field.
    fn name(&self) -> &str;

    /// Names of the configuration parameters this backend accepts.
    fn accepted_parameters(&self) -> &'static [&'static str];

    /// Label returned when the backend has no confident prediction.
    fn fallback_intent(&self) -> &str;

    /// Train the remote model on `examples`.
    ///
    /// Discards previously defined remote intents, creates one intent per
    /// distinct label, ensures a fallback intent exists, triggers training
    /// and blocks until predictions can be served.
    fn fit(&mut self, examples: &[Example]) -> Result<()>;

    /// Predict one intent label per sentence, in input order.
    ///
    /// A "none / low confidence" answer is mapped to
    /// [`fallback_intent`](ClassifierAdapter::fallback_intent). An empty
    /// input yields an empty output.
    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>>;
}
