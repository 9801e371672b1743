//! Markdown views for terminal output.

use crate::entities::article::Article;
use crate::entities::organization::normalize_affiliation;

/// Distinct canonical organizations matched across an article's authors, in
/// first-seen order.
fn matched_organizations(article: &Article) -> Vec<&'static str> {
    let mut orgs: Vec<&'static str> = Vec::new();
    for author in &article.authors {
        if let Some(org) = normalize_affiliation(author.affiliation.as_deref())
            && !orgs.contains(&org)
        {
            orgs.push(org);
        }
    }
    orgs
}

pub fn article_search_markdown(query: &str, articles: &[Article]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Articles ({})\n\n", articles.len()));
    out.push_str(&format!("Query: `{query}`\n\n"));

    if articles.is_empty() {
        out.push_str("No results.\n");
        return out;
    }

    for article in articles {
        out.push_str(&format!("## {}\n", article.title));
        let mut meta: Vec<String> = Vec::new();
        if !article.journal.is_empty() {
            meta.push(article.journal.clone());
        }
        if !article.pub_date.is_empty() {
            meta.push(article.pub_date.clone());
        }
        if !article.pmid.is_empty() {
            meta.push(format!("PMID {}", article.pmid));
        }
        if let Some(doi) = article.doi.as_deref() {
            meta.push(format!("DOI {doi}"));
        }
        if !meta.is_empty() {
            out.push_str(&format!("{}\n", meta.join(" | ")));
        }
        let orgs = matched_organizations(article);
        if !orgs.is_empty() {
            out.push_str(&format!("Matched organizations: {}\n", orgs.join(", ")));
        }
        out.push('\n');
    }

    out
}

pub fn analysis_markdown(model: &str, outcome: &crate::entities::analysis::AnalysisOutcome) -> String {
    format!("# Analysis ({model})\n\n{outcome}\n")
}
