use std::time::Instant;

use crate::error::LitScoutError;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub api: String,
    pub status: String,
    pub latency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affects: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# litscout Health Check\n\n");
        out.push_str("| API | Status | Latency | Affects |\n");
        out.push_str("|-----|--------|---------|---------|\n");
        for row in &self.rows {
            let affects = row.affects.as_deref().unwrap_or("-");
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.api, row.status, row.latency, affects
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} APIs healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

fn affects_for_api(api: &str) -> Option<&'static str> {
    match api {
        "Entrez" => Some("search and export commands"),
        "Completions" => Some("analyze command"),
        _ => None,
    }
}

async fn check_one(api: &str, req: reqwest::RequestBuilder) -> HealthRow {
    let start = Instant::now();
    match req.send().await {
        Ok(resp) => {
            let status = resp.status();
            let elapsed = start.elapsed().as_millis();
            if status.is_success() {
                HealthRow {
                    api: api.to_string(),
                    status: "ok".into(),
                    latency: format!("{elapsed}ms"),
                    affects: None,
                }
            } else {
                HealthRow {
                    api: api.to_string(),
                    status: "error".into(),
                    latency: format!("{elapsed}ms (HTTP {})", status.as_u16()),
                    affects: affects_for_api(api).map(str::to_string),
                }
            }
        }
        Err(err) => {
            let reason = if err.is_timeout() {
                "timeout"
            } else if err.is_connect() {
                "connect"
            } else {
                "error"
            };
            HealthRow {
                api: api.to_string(),
                status: "error".into(),
                latency: reason.into(),
                affects: affects_for_api(api).map(str::to_string),
            }
        }
    }
}

/// Runs connectivity checks against both consumed endpoints.
///
/// # Errors
///
/// Returns an error when the shared HTTP client cannot be created.
pub async fn check() -> Result<HealthReport, LitScoutError> {
    let client = crate::sources::shared_client()?;

    let entrez_base = crate::sources::env_base(
        "https://eutils.ncbi.nlm.nih.gov/entrez/eutils",
        "LITSCOUT_ENTREZ_BASE",
    );
    let entrez_req = client
        .get(format!(
            "{}/esearch.fcgi",
            entrez_base.trim_end_matches('/')
        ))
        .query(&[
            ("db", "pubmed"),
            ("term", "cancer"),
            ("retmax", "1"),
            ("retmode", "json"),
        ]);

    let completions_base =
        crate::sources::env_base("https://api.openai.com", "LITSCOUT_OPENAI_BASE");
    let mut models_req = client.get(format!(
        "{}/v1/models",
        completions_base.trim_end_matches('/')
    ));
    if let Some(key) = crate::config::openai_api_key() {
        models_req = models_req.bearer_auth(key);
    }

    let (entrez, completions) = tokio::join!(
        check_one("Entrez", entrez_req),
        check_one("Completions", models_req),
    );

    let rows = vec![entrez, completions];
    let healthy = rows.iter().filter(|r| r.status == "ok").count();
    Ok(HealthReport {
        healthy,
        total: rows.len(),
        rows,
    })
}
