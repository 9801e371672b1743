//! Opportunity analysis of exported abstracts via the completion endpoint.
//!
//! The whole operation is an explicit Start → Primary → Retry → Fallback →
//! Done ladder: upstream rejections (auth, rate limit, malformed request) are
//! never retried, connectivity faults get exactly one backed-off retry on the
//! primary transport and then one shot on the raw fallback transport. Every
//! fault is converted into a classified [`AnalysisOutcome`]; nothing here
//! returns `Err` to the caller.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::LitScoutError;
use crate::sources::openai::{
    ChatMessage, ChatRequest, CompletionTransport, PooledTransport, RawTransport, TransportError,
    completions_url,
};

/// Model identifiers accepted by the CLI.
pub const ALLOWED_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o"];
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_CHAR_BUDGET: usize = 48_000;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

const SYSTEM_PROMPT: &str = "\
You are a biotech venture analyst. You evaluate biomedical research abstracts \
for their potential as pipeline expansion or startup (NewCo) opportunities.

For each abstract, assess:
1. **Disease Area or Target** — What is the condition or biological target?
2. **Therapeutic Modality** — Is it gene therapy, small molecule, biologic, etc.?
3. **Novelty** — What makes the approach unique or differentiated?
4. **Development Stage** — Preclinical, Phase I/II/III?
5. **Commercial Potential** — Unmet need, market size, competitive landscape
6. **Opportunity Fit** — Is this viable for pipeline expansion or a NewCo? Why or why not? Set a high bar.

Structure your answer in a clear bullet-point format for each abstract. \
Prioritize concise, decision-useful insight.";

/// Validates a user-supplied model flag against the allowed list.
pub fn validate_model(value: &str) -> Result<String, LitScoutError> {
    let value = value.trim();
    if ALLOWED_MODELS.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(LitScoutError::InvalidArgument(format!(
            "Invalid model. Expected one of: {}",
            ALLOWED_MODELS.join(", ")
        )))
    }
}

/// Character budget per model: a cost/context guard, not a correctness rule.
/// Unknown models get a conservative default.
fn char_budget_for(model: &str) -> usize {
    match model {
        "gpt-4o-mini" => 80_000,
        "gpt-4o" => 160_000,
        _ => DEFAULT_CHAR_BUDGET,
    }
}

fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Classified result of one analysis run. Always a renderable value; the
/// surrounding UI only ever switches on the variant and prints the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Report(String),
    ConfigError(String),
    UpstreamError(String),
    ConnectionError(String),
    UnexpectedError(String),
}

impl AnalysisOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::ConfigError(_) => "config-error",
            Self::UpstreamError(_) => "upstream-error",
            Self::ConnectionError(_) => "connection-error",
            Self::UnexpectedError(_) => "unexpected-error",
        }
    }

    pub fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }
}

impl std::fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report(text) => write!(f, "{text}"),
            Self::ConfigError(msg) => write!(f, "[config error] {msg}"),
            Self::UpstreamError(msg) => write!(f, "[api error] {msg}"),
            Self::ConnectionError(msg) => write!(f, "[connection error] {msg}"),
            Self::UnexpectedError(msg) => write!(f, "[unexpected error] {msg}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Primary,
    Retry,
    Fallback,
}

#[derive(Debug, PartialEq, Eq)]
enum Transition {
    BackoffThenRetry,
    FallBack,
    Done(AnalysisOutcome),
}

/// Pure transition table of the retry/fallback ladder. One transition per
/// classified outcome; no network, no clock.
fn next_transition(phase: Phase, outcome: Result<String, TransportError>) -> Transition {
    match (phase, outcome) {
        (_, Ok(text)) => Transition::Done(AnalysisOutcome::Report(text)),
        (_, Err(TransportError::Upstream(msg))) => {
            Transition::Done(AnalysisOutcome::UpstreamError(msg))
        }
        (Phase::Primary, Err(TransportError::Connection(_))) => Transition::BackoffThenRetry,
        (Phase::Retry, Err(TransportError::Connection(_))) => Transition::FallBack,
        (Phase::Fallback, Err(TransportError::Connection(msg))) => {
            Transition::Done(AnalysisOutcome::ConnectionError(msg))
        }
        (_, Err(TransportError::Unexpected(msg))) => {
            Transition::Done(AnalysisOutcome::UnexpectedError(msg))
        }
    }
}

fn build_request(text: &str, model: &str) -> ChatRequest {
    let clipped = clip_chars(text, char_budget_for(model));
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Analyze the following abstracts using the framework above:\n\n{clipped}"
            )),
        ],
        temperature: 0.4,
        max_tokens: 2048,
    }
}

/// Drives the transition table over a primary and a fallback transport.
pub struct AnalysisClient<P, F> {
    primary: P,
    fallback: F,
    backoff: Duration,
}

impl<P, F> AnalysisClient<P, F>
where
    P: CompletionTransport,
    F: CompletionTransport,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            backoff: RETRY_BACKOFF,
        }
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn analyze(&self, text: &str, model: &str) -> AnalysisOutcome {
        let request = build_request(text, model);
        let mut phase = Phase::Primary;

        loop {
            let transport: &dyn CompletionTransport = match phase {
                Phase::Primary | Phase::Retry => &self.primary,
                Phase::Fallback => &self.fallback,
            };
            let outcome = transport.complete(&request).await;

            match next_transition(phase, outcome) {
                Transition::BackoffThenRetry => {
                    debug!("Primary transport unreachable; retrying once after backoff");
                    tokio::time::sleep(self.backoff).await;
                    phase = Phase::Retry;
                }
                Transition::FallBack => {
                    warn!("Primary transport unreachable twice; trying raw fallback transport");
                    phase = Phase::Fallback;
                }
                Transition::Done(AnalysisOutcome::ConnectionError(msg)) => {
                    return AnalysisOutcome::ConnectionError(format!(
                        "Could not reach the completion endpoint at {}: {msg}. \
                         Check network access or the LITSCOUT_OPENAI_BASE override.",
                        self.fallback.endpoint()
                    ));
                }
                Transition::Done(done) => return done,
            }
        }
    }
}

async fn run_with_credential(
    credential: Option<String>,
    text: &str,
    model: &str,
) -> AnalysisOutcome {
    let Some(api_key) = credential else {
        return AnalysisOutcome::ConfigError(
            "OPENAI_API_KEY is not set; export it to enable analysis".into(),
        );
    };

    let url = completions_url();
    let primary = match PooledTransport::new(url.clone(), api_key.clone()) {
        Ok(transport) => transport,
        Err(err) => return AnalysisOutcome::UnexpectedError(err.to_string()),
    };
    let fallback = RawTransport::new(url, api_key);
    AnalysisClient::new(primary, fallback)
        .analyze(text, model)
        .await
}

/// Analyzes an export blob with the configured credential. Never fails: every
/// outcome, including a missing credential, is a renderable value.
pub async fn analyze(text: &str, model: &str) -> AnalysisOutcome {
    run_with_credential(crate::config::openai_api_key(), text, model).await
}
