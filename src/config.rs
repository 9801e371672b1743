//! Environment configuration surface.
//!
//! All knobs are plain environment variables; nothing here performs I/O beyond
//! reading the process environment at call time.

use std::env;

/// Contact email sent with every Entrez request, as NCBI etiquette requires.
pub fn ncbi_email() -> String {
    env::var("NCBI_EMAIL").unwrap_or_else(|_| "you@example.com".to_string())
}

/// Optional NCBI API key; raises Entrez rate limits when present.
pub fn ncbi_api_key() -> Option<String> {
    env::var("NCBI_API_KEY")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Credential for the completion endpoint. Absence is a classified
/// configuration error on the analysis path, never a panic.
pub fn openai_api_key() -> Option<String> {
    env::var("OPENAI_API_KEY")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
