//! Shared HTTP plumbing for upstream API clients.

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::LitScoutError;

pub mod entrez;
pub mod medline;
pub mod openai;

/// Upper bound on any upstream response body we are willing to buffer.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Process-wide HTTP client with bounded timeouts and a versioned user-agent.
pub fn shared_client() -> Result<reqwest::Client, LitScoutError> {
    static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("litscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LitScoutError::HttpClientInit)?;

    match SHARED_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => SHARED_CLIENT
            .get()
            .cloned()
            .ok_or_else(|| LitScoutError::Api {
                api: "http".into(),
                message: "Shared HTTP client initialization race".into(),
            }),
    }
}

/// Base URL for an upstream API, overridable via an environment variable.
pub fn env_base(default: &'static str, env_var: &str) -> Cow<'static, str> {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Cow::Owned(value.trim().to_string()),
        _ => Cow::Borrowed(default),
    }
}

/// Reads a response body, refusing to buffer more than [`MAX_BODY_BYTES`].
pub async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, LitScoutError> {
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let chunk = match resp.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                return Err(LitScoutError::Api {
                    api: api.to_string(),
                    message: format!("Failed to read response body: {err}"),
                });
            }
        };
        if buf.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(LitScoutError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {MAX_BODY_BYTES} bytes"),
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Short printable excerpt of an (often HTML or JSON) error body.
pub fn body_excerpt(bytes: &[u8]) -> String {
    const MAX_EXCERPT_CHARS: usize = 200;

    let text = String::from_utf8_lossy(bytes);
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_EXCERPT_CHARS {
        return flat;
    }
    let cut = flat
        .char_indices()
        .nth(MAX_EXCERPT_CHARS)
        .map_or(flat.len(), |(idx, _)| idx);
    format!("{}…", &flat[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_base_falls_back_to_default() {
        let base = env_base("https://example.org", "LITSCOUT_TEST_UNSET_BASE");
        assert_eq!(base.as_ref(), "https://example.org");
    }

    #[test]
    fn body_excerpt_flattens_and_caps() {
        let body = "line one\n  line   two\n".as_bytes();
        assert_eq!(body_excerpt(body), "line one line two");

        let long = "x".repeat(500);
        let excerpt = body_excerpt(long.as_bytes());
        assert!(excerpt.chars().count() <= 201);
        assert!(excerpt.ends_with('…'));
    }
}
