//! api.ai agent adapter.
//!
//! Training is implicit on this service: intents created with `auto: true`
//! are learned as they are posted, so `fit` only waits a fixed settle delay
//! after the last intent. The fallback intent is a real remote intent flagged
//! `fallbackIntent: true` whose action is the fallback label.

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::backend::http::{Auth, HttpTransport};
use crate::classifier::{ClassifierAdapter, TrainingPoller};
use crate::dataset::{Example, group_by_intent};
use crate::error::{BenchError, Result};

/// Backend token.
pub const NAME: &str = "apiai";
/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.api.ai/v1/";
/// Parameters accepted by this backend.
pub const ACCEPTED_PARAMETERS: &[&str] = &[];
/// Wait after intent creation before the agent answers reliably.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct IntentSummary {
    id: String,
    name: String,
}

/// Adapter for one api.ai agent.
#[derive(Debug)]
pub struct ApiaiAdapter {
    http: HttpTransport,
    language: String,
    fallback_intent: String,
    settle_delay: Duration,
    poller: TrainingPoller,
}

impl ApiaiAdapter {
    /// Create an adapter for the agent owning `token`.
    pub fn new(
        base_url: &str,
        token: &str,
        language: &str,
        fallback_intent: &str,
        poller: TrainingPoller,
        timeout: Duration,
    ) -> Result<Self> {
        debug!("[{NAME}] connect for language {language}");
        Ok(ApiaiAdapter {
            http: HttpTransport::new(NAME, base_url, Auth::Bearer(token.to_string()), timeout)?,
            language: language.to_string(),
            fallback_intent: fallback_intent.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            poller,
        })
    }

    /// Override the settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    fn intents(&self) -> Result<Vec<IntentSummary>> {
        let body = self.http.get("intents", &[])?;
        serde_json::from_value(body).map_err(|e| BenchError::decode(NAME, e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        for intent in self.intents()? {
            debug!("[{NAME}] remove intent {}", intent.name);
            self.http.delete(&format!("intents/{}", intent.id))?;
        }
        Ok(())
    }

    fn create_intent(&self, name: &str, templates: &[&str], fallback: bool) -> Result<()> {
        debug!("[{NAME}] create intent {name}");
        let payload = json!({
            "name": name,
            "templates": templates,
            "responses": [{ "action": name, "parameters": Value::Null }],
            "auto": true,
            "fallbackIntent": fallback,
            "state": "LEARNED",
        });
        self.http.post_json("intents", &payload)?;
        Ok(())
    }

    fn query(&self, sentence: &str) -> Result<String> {
        let payload = json!({ "query": sentence, "lang": self.language });
        let body = self.http.post_json("query", &payload)?;
        let action = body
            .pointer("/result/action")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if action.is_empty() {
            Ok(self.fallback_intent.clone())
        } else {
            Ok(action.to_string())
        }
    }
}

impl ClassifierAdapter for ApiaiAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn accepted_parameters(&self) -> &'static [&'static str] {
        ACCEPTED_PARAMETERS
    }

    fn fallback_intent(&self) -> &str {
        &self.fallback_intent
    }

    fn fit(&mut self, examples: &[Example]) -> Result<()> {
        self.clear()?;

        let groups = group_by_intent(examples);
        for (intent, sentences) in &groups {
            self.create_intent(intent, sentences, false)?;
        }
        self.create_intent(&self.fallback_intent, &[], true)?;
        info!("[{NAME}] created {} intents + fallback", groups.len());

        self.poller.pause(self.settle_delay);
        Ok(())
    }

    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
        sentences.iter().map(|sentence| self.query(sentence)).collect()
    }
}
