//! Chat-completions endpoint access.
//!
//! Two transports implement the same logical contract: [`PooledTransport`],
//! the structured primary path over the shared pooled async client, and
//! [`RawTransport`], a traditional synchronous single-connection request used
//! as a last resort when the primary path cannot reach the endpoint. The
//! analysis client in `entities::analysis` decides when each is consulted.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LitScoutError;

const OPENAI_BASE: &str = "https://api.openai.com";
const OPENAI_BASE_ENV: &str = "LITSCOUT_OPENAI_BASE";
const COMPLETIONS_PATH: &str = "v1/chat/completions";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully resolved chat-completions URL, honoring the base override.
pub fn completions_url() -> String {
    let base = crate::sources::env_base(OPENAI_BASE, OPENAI_BASE_ENV);
    format!("{}/{}", base.trim_end_matches('/'), COMPLETIONS_PATH)
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
    }
}

/// Classified transport fault. The split matters: `Upstream` faults are never
/// retried, `Connection` faults drive the retry/fallback ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint rejected the request (auth, rate limit, malformed).
    Upstream(String),
    /// The endpoint was never reached (connect/timeout).
    Connection(String),
    /// Anything else.
    Unexpected(String),
}

fn classify_send_error(err: &reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Unexpected(err.to_string())
    }
}

/// One attempt against the completions contract. The analysis client drives
/// implementations of this seam; tests substitute scripted fakes.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError>;

    /// Endpoint named in connection-error guidance.
    fn endpoint(&self) -> &str;
}

/// Primary transport: shared pooled async client, typed payload.
pub struct PooledTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl PooledTransport {
    pub fn new(url: String, api_key: String) -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionTransport for PooledTransport {
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(req)
            .send()
            .await
            .map_err(|err| classify_send_error(&err))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| TransportError::Unexpected(format!("Failed to read body: {err}")))?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TransportError::Upstream(format!("HTTP {status}: {excerpt}")));
        }

        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::Unexpected(format!("Invalid JSON response: {err}")))?;
        parsed
            .first_content()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                TransportError::Unexpected("Completion response contained no message content".into())
            })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Fallback transport: a fresh synchronous single-connection request, driven
/// off the async runtime via `spawn_blocking`. Carries the same payload shape
/// but builds it untyped and reads the response as loose JSON.
pub struct RawTransport {
    url: String,
    api_key: String,
}

impl RawTransport {
    pub fn new(url: String, api_key: String) -> Self {
        Self { url, api_key }
    }

    fn complete_blocking(
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<String, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("litscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Unexpected(format!("HTTP client init: {err}")))?;

        let resp = client
            .post(url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .map_err(|err| classify_send_error(&err))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| TransportError::Unexpected(format!("Failed to read body: {err}")))?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(body.as_bytes());
            return Err(TransportError::Upstream(format!("HTTP {status}: {excerpt}")));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|err| TransportError::Unexpected(format!("Invalid JSON response: {err}")))?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                TransportError::Unexpected("Completion response contained no message content".into())
            })
    }
}

#[async_trait]
impl CompletionTransport for RawTransport {
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError> {
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let payload = serde_json::json!({
            "model": req.model,
            "messages": req.messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        tokio::task::spawn_blocking(move || Self::complete_blocking(&url, &api_key, &payload))
            .await
            .unwrap_or_else(|err| {
                Err(TransportError::Unexpected(format!(
                    "Fallback task failed: {err}"
                )))
            })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
