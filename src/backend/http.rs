//! Blocking JSON-over-HTTP plumbing shared by the vendor adapters.

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;

use crate::error::{BenchError, Result};

/// How a backend authenticates its requests.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Token <token>`.
    Token(String),
    /// Key passed as a query-string parameter.
    QueryKey { name: &'static str, value: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer(***)"),
            Auth::Token(_) => f.write_str("Token(***)"),
            Auth::QueryKey { name, .. } => write!(f, "QueryKey({name}=***)"),
        }
    }
}

/// HTTP client bound to one backend's base URL and credentials.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    backend: &'static str,
    client: Client,
    base_url: String,
    auth: Auth,
}

impl HttpTransport {
    /// Create a transport; no request is sent.
    pub fn new(
        backend: &'static str,
        base_url: &str,
        auth: Auth,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport {
            backend,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET path?query`.
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        debug!("[{}] GET {path}", self.backend);
        self.send(self.client.get(self.url(path)).query(query))
    }

    /// `POST path` with a JSON body.
    pub fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        debug!("[{}] POST {path}", self.backend);
        self.send(self.client.post(self.url(path)).json(body))
    }

    /// `POST path` with a form-encoded body.
    pub fn post_form<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        debug!("[{}] POST {path} (form)", self.backend);
        self.send(self.client.post(self.url(path)).form(body))
    }

    /// `PUT path` with a JSON body.
    pub fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        debug!("[{}] PUT {path}", self.backend);
        self.send(self.client.put(self.url(path)).json(body))
    }

    /// `DELETE path`.
    pub fn delete(&self, path: &str) -> Result<Value> {
        debug!("[{}] DELETE {path}", self.backend);
        self.send(self.client.delete(self.url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Token(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            Auth::QueryKey { name, value } => request.query(&[(*name, value.as_str())]),
        }
    }

    /// Send the request and decode its JSON body.
    ///
    /// An empty body decodes to `null`. A non-success status becomes a
    /// [`BenchError::Backend`]; an undecodable success body becomes a
    /// [`BenchError::Decode`].
    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.authorize(request).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
            return Err(BenchError::backend(
                self.backend,
                status.as_u16(),
                error_message(&parsed, &body),
            ));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| BenchError::decode(self.backend, e.to_string()))
    }
}

/// Best-effort human message from an error body.
fn error_message(parsed: &Value, raw: &str) -> String {
    let candidates = [
        parsed.pointer("/status/errorDetails"),
        parsed.pointer("/error/message"),
        parsed.pointer("/message"),
        parsed.pointer("/error"),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(text) = candidate.as_str() {
            return text.to_string();
        }
    }
    let raw = raw.trim();
    if raw.is_empty() {
        "empty response".to_string()
    } else {
        raw.chars().take(200).collect()
    }
}

/// Call `call`, retrying up to `retries` extra times on transient decode errors.
pub fn retry_transient<T, F>(backend: &str, retries: usize, mut call: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut remaining = retries;
    loop {
        match call() {
            Err(err) if err.is_transient() && remaining > 0 => {
                remaining -= 1;
                warn!("[{backend}] {err}; retrying ({remaining} retries left)");
            }
            other => return other,
        }
    }
}
