//! LUIS application adapter.
//!
//! Every `fit` deletes the previous application and creates a fresh one,
//! so no stale intent survives a retrain. Training is asynchronous: the
//! adapter triggers it, polls the per-model status through the
//! [`TrainingPoller`], then publishes the application. The built-in `None`
//! intent plays the fallback role and is mapped to the fallback label.

use std::time::Duration;

use log::{debug, info};
use serde_json::{Value, json};

use crate::backend::http::{Auth, HttpTransport, retry_transient};
use crate::classifier::{ClassifierAdapter, TrainingPoller, TrainingState};
use crate::dataset::{Example, group_by_intent};
use crate::error::{BenchError, Result};

/// Backend token.
pub const NAME: &str = "luis";
/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.projectoxford.ai/luis/";
/// Parameters accepted by this backend.
pub const ACCEPTED_PARAMETERS: &[&str] = &[];
/// Intent LUIS answers when nothing matches.
pub const NONE_INTENT: &str = "None";
/// Name of the application created on each fit.
pub const APP_NAME: &str = "intent_bench_app";

const DECODE_RETRIES: usize = 2;

/// LUIS culture for a language code.
pub fn culture_for(language: &str) -> Option<&'static str> {
    match language {
        "en" => Some("en-us"),
        "fr" => Some("fr-fr"),
        "de" => Some("de-de"),
        "es" => Some("es-es"),
        "it" => Some("it-it"),
        _ => None,
    }
}

/// Map the per-model training statuses to a single state.
fn training_state(body: &Value) -> Result<TrainingState> {
    let models = body
        .as_array()
        .ok_or_else(|| BenchError::decode(NAME, "training status is not a list"))?;

    let mut state = TrainingState::Ready;
    for model in models {
        let status = model
            .pointer("/Details/Status")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match status {
            "Success" | "Up to date" => {}
            "Fail" => {
                let reason = model
                    .pointer("/Details/FailureReason")
                    .and_then(Value::as_str)
                    .unwrap_or("training failed");
                return Ok(TrainingState::Failed(reason.to_string()));
            }
            "Queued" if state == TrainingState::Ready => state = TrainingState::Submitted,
            _ => state = TrainingState::Training,
        }
    }
    Ok(state)
}

/// Adapter for one LUIS subscription.
#[derive(Debug)]
pub struct LuisAdapter {
    http: HttpTransport,
    culture: String,
    fallback_intent: String,
    app_id: Option<String>,
    poller: TrainingPoller,
}

impl LuisAdapter {
    /// Create an adapter; the application is created on the first `fit`.
    pub fn new(
        base_url: &str,
        key: &str,
        culture: &str,
        fallback_intent: &str,
        poller: TrainingPoller,
        timeout: Duration,
    ) -> Result<Self> {
        let auth = Auth::QueryKey {
            name: "subscription-key",
            value: key.to_string(),
        };
        Ok(LuisAdapter {
            http: HttpTransport::new(NAME, base_url, auth, timeout)?,
            culture: culture.to_string(),
            fallback_intent: fallback_intent.to_string(),
            app_id: None,
            poller,
        })
    }

    /// Identifier of the current application, if one exists.
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    fn trained_app(&self) -> Result<&str> {
        self.app_id
            .as_deref()
            .ok_or_else(|| BenchError::training(NAME, "predict called before fit"))
    }

    fn clear(&mut self) -> Result<()> {
        if let Some(app_id) = self.app_id.take() {
            debug!("[{NAME}] delete app {app_id}");
            self.http.delete(&format!("v1.0/prog/apps/{app_id}"))?;
        }
        Ok(())
    }

    fn create_app(&self) -> Result<String> {
        let payload = json!({
            "Name": APP_NAME,
            "Culture": self.culture,
            "Active": true,
            "NumberOfIntents": 0,
            "NumberOfEntities": 0,
            "IsTrained": true,
        });
        let body = self.http.post_json("v1.0/prog/apps", &payload)?;
        body.as_str()
            .map(str::to_string)
            .ok_or_else(|| BenchError::decode(NAME, "application id is not a string"))
    }

    fn create_intent(&self, app_id: &str, name: &str, utterances: &[&str]) -> Result<()> {
        debug!("[{NAME}] create intent {name}");
        let path = format!("v1.0/prog/apps/{app_id}/intents");
        let payload = json!({ "Name": name, "Children": [] });
        retry_transient(NAME, DECODE_RETRIES, || self.http.post_json(&path, &payload))?;

        let path = format!("v1.0/prog/apps/{app_id}/example");
        for utterance in utterances {
            let payload = json!({
                "ExampleText": utterance,
                "SelectedIntentName": name,
                "EntityLabels": [],
            });
            self.http.post_json(&path, &payload)?;
        }
        Ok(())
    }

    fn train(&self, app_id: &str) -> Result<()> {
        let path = format!("v1.0/prog/apps/{app_id}/train");
        self.http.post_json(&path, &json!({}))?;

        let mut probe = || -> Result<TrainingState> { training_state(&self.http.get(&path, &[])?) };
        let polls = self.poller.wait(NAME, &mut probe)?;
        info!("[{NAME}] model ready after {polls} polls");
        Ok(())
    }

    fn publish(&self, app_id: &str) -> Result<()> {
        self.http
            .post_json(&format!("v1.0/prog/apps/{app_id}/publish"), &json!({}))?;
        Ok(())
    }

    fn query(&self, app_id: &str, sentence: &str) -> Result<String> {
        let intent = retry_transient(NAME, DECODE_RETRIES, || {
            let body = self
                .http
                .get("v1/application", &[("id", app_id), ("q", sentence)])?;
            body.pointer("/intents/0/intent")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| BenchError::decode(NAME, "response has no intent"))
        })?;

        if intent == NONE_INTENT {
            Ok(self.fallback_intent.clone())
        } else {
            Ok(intent)
        }
    }
}

impl ClassifierAdapter for LuisAdapter {
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
        let app_id = self.create_app()?;
        self.app_id = Some(app_id.clone());

        let groups = group_by_intent(examples);
        for (intent, utterances) in &groups {
            self.create_intent(&app_id, intent, utterances)?;
        }
        info!("[{NAME}] created {} intents in app {app_id}", groups.len());

        self.train(&app_id)?;
        self.publish(&app_id)
    }

    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
        let app_id = self.trained_app()?;
        sentences
            .iter()
            .map(|sentence| self.query(app_id, sentence))
            .collect()
    }
}
