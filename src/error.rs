use thiserror::Error;

/// Errors raised by the retrieval side of the crate.
///
/// The analysis client deliberately does not use this type: it converts every
/// fault into an [`crate::entities::analysis::AnalysisOutcome`] value instead.
#[derive(Debug, Error)]
pub enum LitScoutError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{api} error: {message}")]
    Api { api: String, message: String },

    #[error("{api} returned invalid JSON: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
