//! Vendor backends.
//!
//! Each submodule implements [`ClassifierAdapter`] for one remote service:
//!
//! - [`apiai`]: api.ai agents (implicit training, explicit fallback intent)
//! - [`luis`]: LUIS applications (asynchronous training, `None` intent)
//! - [`recast`]: Recast bots (tunable `strictness`)
//!
//! [`VendorAdapterFactory`] builds them from [`Credentials`] without touching
//! the network, so every configuration problem surfaces during pre-flight.

pub mod apiai;
pub mod http;
pub mod luis;
pub mod recast;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{AdapterFactory, ClassifierAdapter, Parameters, TrainingPoller};
use crate::error::{BenchError, Result};

pub use apiai::ApiaiAdapter;
pub use luis::LuisAdapter;
pub use recast::RecastAdapter;

/// Supported remote services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Apiai,
    Luis,
    Recast,
}

impl Backend {
    /// Every supported backend.
    pub const ALL: [Backend; 3] = [Backend::Apiai, Backend::Luis, Backend::Recast];

    /// Stable name token, used as result key and log field.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Apiai => apiai::NAME,
            Backend::Luis => luis::NAME,
            Backend::Recast => recast::NAME,
        }
    }

    /// Parameter names the backend accepts.
    pub fn accepted_parameters(&self) -> &'static [&'static str] {
        match self {
            Backend::Apiai => apiai::ACCEPTED_PARAMETERS,
            Backend::Luis => luis::ACCEPTED_PARAMETERS,
            Backend::Recast => recast::ACCEPTED_PARAMETERS,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| {
                BenchError::config(
                    "apis",
                    format!("unknown backend '{s}' (expected apiai, luis or recast)"),
                )
            })
    }
}

/// api.ai client tokens, one agent per language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiaiCredentials {
    /// Language code → developer access token.
    pub tokens: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// LUIS subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuisCredentials {
    /// Subscription key.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Recast bot owner and token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecastCredentials {
    pub user_slug: String,
    pub bot_slug: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Secrets for every backend; only the ones a run uses are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub apiai: Option<ApiaiCredentials>,
    pub luis: Option<LuisCredentials>,
    pub recast: Option<RecastCredentials>,
}

fn missing(backend: Backend) -> BenchError {
    BenchError::config(
        format!("credentials.{backend}"),
        format!("no credentials configured for {backend}"),
    )
}

fn require<'a>(backend: Backend, field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(BenchError::config(
            format!("credentials.{backend}.{field}"),
            "must not be empty",
        ));
    }
    Ok(value)
}

/// Strictness override, checked for type and range.
fn strictness(params: &Parameters) -> Result<i64> {
    let Some(value) = params.get("strictness") else {
        return Ok(recast::DEFAULT_STRICTNESS);
    };
    match value.as_i64() {
        Some(strictness) if (0..=100).contains(&strictness) => Ok(strictness),
        _ => Err(BenchError::config(
            "params.strictness",
            format!("must be an integer between 0 and 100, got {value}"),
        )),
    }
}

/// [`AdapterFactory`] for the vendor backends.
#[derive(Debug, Clone)]
pub struct VendorAdapterFactory {
    credentials: Credentials,
    fallback_intent: String,
    poller: TrainingPoller,
    timeout: Duration,
}

impl VendorAdapterFactory {
    /// Create a factory; adapters label abstentions with `fallback_intent`.
    pub fn new<S: Into<String>>(credentials: Credentials, fallback_intent: S) -> Self {
        VendorAdapterFactory {
            credentials,
            fallback_intent: fallback_intent.into(),
            poller: TrainingPoller::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Use `poller` for training waits and settle delays.
    pub fn with_poller(mut self, poller: TrainingPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn apiai(&self, language: &str) -> Result<ApiaiAdapter> {
        let credentials = self
            .credentials
            .apiai
            .as_ref()
            .ok_or_else(|| missing(Backend::Apiai))?;
        let token = credentials.tokens.get(language).ok_or_else(|| {
            BenchError::config(
                "credentials.apiai.tokens",
                format!("no agent token for language '{language}'"),
            )
        })?;
        ApiaiAdapter::new(
            credentials.base_url.as_deref().unwrap_or(apiai::DEFAULT_BASE_URL),
            require(Backend::Apiai, "tokens", token)?,
            language,
            &self.fallback_intent,
            self.poller.clone(),
            self.timeout,
        )
    }

    fn luis(&self, language: &str) -> Result<LuisAdapter> {
        let credentials = self
            .credentials
            .luis
            .as_ref()
            .ok_or_else(|| missing(Backend::Luis))?;
        let culture = luis::culture_for(language).ok_or_else(|| {
            BenchError::config("criteria", format!("luis has no culture for language '{language}'"))
        })?;
        LuisAdapter::new(
            credentials.base_url.as_deref().unwrap_or(luis::DEFAULT_BASE_URL),
            require(Backend::Luis, "key", &credentials.key)?,
            culture,
            &self.fallback_intent,
            self.poller.clone(),
            self.timeout,
        )
    }

    fn recast(&self, language: &str, params: &Parameters) -> Result<RecastAdapter> {
        let credentials = self
            .credentials
            .recast
            .as_ref()
            .ok_or_else(|| missing(Backend::Recast))?;
        let adapter = RecastAdapter::new(
            credentials.base_url.as_deref().unwrap_or(recast::DEFAULT_BASE_URL),
            require(Backend::Recast, "user_slug", &credentials.user_slug)?,
            require(Backend::Recast, "bot_slug", &credentials.bot_slug)?,
            require(Backend::Recast, "token", &credentials.token)?,
            language,
            &self.fallback_intent,
            self.timeout,
        )?;
        Ok(adapter.with_strictness(strictness(params)?))
    }
}

impl AdapterFactory for VendorAdapterFactory {
    fn backends(&self) -> Vec<&'static str> {
        Backend::ALL.iter().map(Backend::name).collect()
    }

    fn accepted_parameters(&self, backend: &str) -> Result<&'static [&'static str]> {
        Ok(backend.parse::<Backend>()?.accepted_parameters())
    }

    fn construct(
        &self,
        backend: &str,
        language: &str,
        params: &Parameters,
    ) -> Result<Box<dyn ClassifierAdapter>> {
        Ok(match backend.parse::<Backend>()? {
            Backend::Apiai => Box::new(self.apiai(language)?),
            Backend::Luis => Box::new(self.luis(language)?),
            Backend::Recast => Box::new(self.recast(language, params)?),
        })
    }
}
