use std::borrow::Cow;

use futures::future::try_join_all;
use serde::Deserialize;
use tracing::debug;

use crate::error::LitScoutError;
use crate::sources::medline::{self, MedlineRecord};

const ENTREZ_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const ENTREZ_API: &str = "entrez";
const ENTREZ_BASE_ENV: &str = "LITSCOUT_ENTREZ_BASE";
const ENTREZ_TOOL: &str = "litscout";

/// EFetch accepts long id lists, but NCBI asks for batched requests.
const EFETCH_CHUNK_SIZE: usize = 200;

/// Client for the NCBI Entrez E-utilities (ESearch + EFetch).
///
/// Deliberately has no retry of its own: retry policy lives in the analysis
/// client only, and a failed literature call surfaces immediately.
#[derive(Clone)]
pub struct EntrezClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl EntrezClient {
    pub fn new() -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(ENTREZ_BASE, ENTREZ_BASE_ENV),
        })
    }

    #[cfg(test)]
    fn new_for_test(base: String) -> Result<Self, LitScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn etiquette_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("tool", ENTREZ_TOOL.to_string()),
            ("email", crate::config::ncbi_email()),
        ];
        if let Some(key) = crate::config::ncbi_api_key() {
            params.push(("api_key", key));
        }
        params
    }

    /// Runs an ESearch query and returns matching PMIDs in rank order.
    ///
    /// An empty query returns no ids without a network call.
    pub async fn esearch_pmids(
        &self,
        query: &str,
        retmax: usize,
        min_year: i32,
    ) -> Result<Vec<String>, LitScoutError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let today = time::OffsetDateTime::now_utc().date();
        let maxdate = format!(
            "{:04}/{:02}/{:02}",
            today.year(),
            today.month() as u8,
            today.day()
        );

        let url = self.endpoint("esearch.fcgi");
        let retmax = retmax.to_string();
        let req = self
            .client
            .get(&url)
            .query(&[
                ("db", "pubmed"),
                ("term", query),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
                ("datetype", "pdat"),
            ])
            .query(&[
                ("mindate", format!("{min_year}/01/01")),
                ("maxdate", maxdate),
            ])
            .query(&self.etiquette_params());

        let resp = req.send().await.map_err(|err| LitScoutError::Api {
            api: ENTREZ_API.to_string(),
            message: format!("ESearch request failed: {err}"),
        })?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, ENTREZ_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(LitScoutError::Api {
                api: ENTREZ_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let parsed: EsearchResponse =
            serde_json::from_slice(&bytes).map_err(|source| LitScoutError::ApiJson {
                api: ENTREZ_API.to_string(),
                source,
            })?;
        let ids = parsed.esearchresult.unwrap_or_default().idlist;
        debug!(count = ids.len(), "ESearch returned PMIDs");
        Ok(ids)
    }

    /// Fetches MEDLINE records for the given PMIDs, preserving input order.
    pub async fn efetch_medline(
        &self,
        pmids: &[String],
    ) -> Result<Vec<MedlineRecord>, LitScoutError> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = pmids
            .chunks(EFETCH_CHUNK_SIZE)
            .map(|chunk| self.efetch_chunk(chunk));
        let batches = try_join_all(chunks).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    async fn efetch_chunk(&self, pmids: &[String]) -> Result<Vec<MedlineRecord>, LitScoutError> {
        let url = self.endpoint("efetch.fcgi");
        let ids = pmids.join(",");
        let req = self
            .client
            .get(&url)
            .query(&[
                ("db", "pubmed"),
                ("id", ids.as_str()),
                ("rettype", "medline"),
                ("retmode", "text"),
            ])
            .query(&self.etiquette_params());

        let resp = req.send().await.map_err(|err| LitScoutError::Api {
            api: ENTREZ_API.to_string(),
            message: format!("EFetch request failed: {err}"),
        })?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, ENTREZ_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(LitScoutError::Api {
                api: ENTREZ_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        Ok(medline::parse(&String::from_utf8_lossy(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn esearch_builds_expected_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("db", "pubmed"))
            .and(query_param("term", "(\"Pfizer\"[ad])"))
            .and(query_param("retmax", "25"))
            .and(query_param("retmode", "json"))
            .and(query_param("datetype", "pdat"))
            .and(query_param("mindate", "2005/01/01"))
            .and(query_param("tool", "litscout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"idlist": ["36000001", "36000002"]}
            })))
            .mount(&server)
            .await;

        let client = EntrezClient::new_for_test(server.uri()).unwrap();
        let ids = client
            .esearch_pmids("(\"Pfizer\"[ad])", 25, 2005)
            .await
            .unwrap();
        assert_eq!(ids, vec!["36000001".to_string(), "36000002".to_string()]);
    }

    #[tokio::test]
    async fn esearch_skips_network_for_empty_query() {
        // No server mounted; a request would fail loudly.
        let client = EntrezClient::new_for_test("http://127.0.0.1:9".into()).unwrap();
        let ids = client.esearch_pmids("   ", 10, 2005).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn esearch_surfaces_http_errors_with_excerpt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = EntrezClient::new_for_test(server.uri()).unwrap();
        let err = client
            .esearch_pmids("cancer", 10, 2005)
            .await
            .expect_err("502 should fail");
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("bad gateway"));
    }

    #[tokio::test]
    async fn efetch_parses_medline_payload() {
        let server = MockServer::start().await;
        let body = "PMID- 1\nTI  - First\n\nPMID- 2\nTI  - Second\n";
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("rettype", "medline"))
            .and(query_param("retmode", "text"))
            .and(query_param("id", "1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = EntrezClient::new_for_test(server.uri()).unwrap();
        let records = client
            .efetch_medline(&["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first("TI"), Some("First"));
        assert_eq!(records[1].first("TI"), Some("Second"));
    }

    #[tokio::test]
    async fn efetch_skips_network_for_empty_id_list() {
        let client = EntrezClient::new_for_test("http://127.0.0.1:9".into()).unwrap();
        let records = client.efetch_medline(&[]).await.unwrap();
        assert!(records.is_empty());
    }
}
