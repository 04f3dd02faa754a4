//! Recast bot adapter.
//!
//! The bot's `strictness` (0–100) is the confidence threshold under which
//! the service answers with no intent; that empty answer maps to the
//! fallback label. Intents train as they are created, so no poll is needed.

use std::time::Duration;

use log::{debug, info};
use serde_json::{Value, json};

use crate::backend::http::{Auth, HttpTransport, retry_transient};
use crate::classifier::ClassifierAdapter;
use crate::dataset::{Example, group_by_intent};
use crate::error::{BenchError, Result};

/// Backend token.
pub const NAME: &str = "recast";
/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.recast.ai/v2";
/// Parameters accepted by this backend.
pub const ACCEPTED_PARAMETERS: &[&str] = &["strictness"];
/// Strictness used when none is configured.
pub const DEFAULT_STRICTNESS: i64 = 50;

const DECODE_RETRIES: usize = 3;

/// Adapter for one Recast bot.
#[derive(Debug)]
pub struct RecastAdapter {
    http: HttpTransport,
    bot_path: String,
    bot_slug: String,
    language: String,
    strictness: i64,
    fallback_intent: String,
}

impl RecastAdapter {
    /// Create an adapter for `user_slug/bot_slug`.
    pub fn new(
        base_url: &str,
        user_slug: &str,
        bot_slug: &str,
        token: &str,
        language: &str,
        fallback_intent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(RecastAdapter {
            http: HttpTransport::new(NAME, base_url, Auth::Token(token.to_string()), timeout)?,
            bot_path: format!("users/{user_slug}/bots/{bot_slug}"),
            bot_slug: bot_slug.to_string(),
            language: language.to_string(),
            strictness: DEFAULT_STRICTNESS,
            fallback_intent: fallback_intent.to_string(),
        })
    }

    /// Set the bot strictness pushed on every fit.
    pub fn with_strictness(mut self, strictness: i64) -> Self {
        self.strictness = strictness;
        self
    }

    /// Configured strictness.
    pub fn strictness(&self) -> i64 {
        self.strictness
    }

    fn update_bot(&self) -> Result<()> {
        debug!("[{NAME}] strictness={}", self.strictness);
        let payload = json!({ "name": self.bot_slug, "strictness": self.strictness });
        self.http.put_json(&self.bot_path, &payload)?;
        Ok(())
    }

    fn intent_slugs(&self) -> Result<Vec<String>> {
        let body = self.http.get(&format!("{}/intents", self.bot_path), &[])?;
        let intents = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| BenchError::decode(NAME, "intent list has no results"))?;
        Ok(intents
            .iter()
            .filter_map(|intent| intent.get("slug").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    fn clear(&self) -> Result<()> {
        for slug in self.intent_slugs()? {
            debug!("[{NAME}] delete intent {slug}");
            self.http
                .delete(&format!("{}/intents/{slug}", self.bot_path))?;
        }
        Ok(())
    }

    fn create_intent(&self, name: &str, expressions: &[&str]) -> Result<()> {
        debug!("[{NAME}] create intent {name}");
        let expressions: Vec<Value> = expressions
            .iter()
            .map(|source| json!({ "source": source, "language": { "isocode": self.language } }))
            .collect();
        let payload = json!({ "name": name, "description": "", "expressions": expressions });
        let path = format!("{}/intents", self.bot_path);

        retry_transient(NAME, DECODE_RETRIES, || self.http.post_json(&path, &payload))?;
        Ok(())
    }

    fn predict_one(&self, sentence: &str) -> Result<String> {
        let body = self.http.post_form(
            "request",
            &[("text", sentence), ("language", self.language.as_str())],
        )?;
        let slug = body
            .pointer("/results/intents/0/slug")
            .and_then(Value::as_str);

        Ok(match slug {
            Some(slug) => slug.to_string(),
            None => self.fallback_intent.clone(),
        })
    }
}

impl ClassifierAdapter for RecastAdapter {
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
        self.update_bot()?;
        self.clear()?;

        let groups = group_by_intent(examples);
        for (intent, expressions) in &groups {
            self.create_intent(intent, expressions)?;
        }
        info!("[{NAME}] created {} intents", groups.len());
        Ok(())
    }

    fn predict(&mut self, sentences: &[&str]) -> Result<Vec<String>> {
        sentences
            .iter()
            .map(|sentence| self.predict_one(sentence))
            .collect()
    }
}
