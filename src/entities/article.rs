use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LitScoutError;
use crate::sources::entrez::EntrezClient;
use crate::transform;

/// Default disease phrases for the rare-metabolic sweep.
pub const RARE_METABOLIC_DEFAULT_TERMS: &[&str] = &[
    "inborn errors of metabolism",
    "lysosomal storage disease",
    "mitochondrial disorder",
    "peroxisomal disorder",
    "rare metabolic disorder",
];

/// One normalized literature record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub pub_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    pub abstract_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Present only when the upstream per-author alignment was unambiguous.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArticleSearchFilters {
    pub affiliations: Vec<String>,
    pub disease_terms: Vec<String>,
    pub custom_terms: String,
    pub limit: usize,
    pub min_year: i32,
}

impl Default for ArticleSearchFilters {
    fn default() -> Self {
        Self {
            affiliations: Vec::new(),
            disease_terms: Vec::new(),
            custom_terms: String::new(),
            limit: 100,
            min_year: 2005,
        }
    }
}

fn or_clause(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    Some(format!("({})", terms.join(" OR ")))
}

/// Builds the boolean search expression.
///
/// Each non-empty input set becomes one parenthesized OR-clause; clauses are
/// AND-joined. Affiliation terms carry the `[ad]` field tag, disease terms and
/// comma-split custom terms the `[tiab]` tag. With no input at all the PubMed
/// catch-all subset `all[sb]` is returned so the expression is never empty.
pub fn build_query(affiliations: &[String], disease_terms: &[String], custom_terms: &str) -> String {
    let aff_terms: Vec<String> = affiliations
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| format!("\"{a}\"[ad]"))
        .collect();

    let disease: Vec<String> = disease_terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\"[tiab]"))
        .collect();

    let custom: Vec<String> = custom_terms
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\"[tiab]"))
        .collect();

    let clauses: Vec<String> = [aff_terms, disease, custom]
        .iter()
        .filter_map(|terms| or_clause(terms))
        .collect();

    if clauses.is_empty() {
        return "all[sb]".to_string();
    }
    clauses.join(" AND ")
}

/// Full retrieval pipeline: query → ESearch → EFetch → normalize.
pub async fn search(filters: &ArticleSearchFilters) -> Result<Vec<Article>, LitScoutError> {
    const MAX_SEARCH_LIMIT: usize = 500;
    if filters.limit == 0 || filters.limit > MAX_SEARCH_LIMIT {
        return Err(LitScoutError::InvalidArgument(format!(
            "--limit must be between 1 and {MAX_SEARCH_LIMIT}"
        )));
    }

    let query = build_query(
        &filters.affiliations,
        &filters.disease_terms,
        &filters.custom_terms,
    );
    debug!(%query, "Built search expression");

    let client = EntrezClient::new()?;
    let pmids = client
        .esearch_pmids(&query, filters.limit, filters.min_year)
        .await?;
    let raw = client.efetch_medline(&pmids).await?;
    Ok(transform::article::from_medline_records(&raw))
}
