use crate::entities::article::{Article, Author};
use crate::sources::medline::MedlineRecord;

fn field(rec: &MedlineRecord, tag: &str) -> String {
    rec.first(tag).unwrap_or_default().trim().to_string()
}

/// Extracts a DOI from the article-identifier list: first `AID` entry whose
/// lowercased text mentions "doi", first whitespace-delimited token.
fn extract_doi(rec: &MedlineRecord) -> Option<String> {
    rec.all("AID")
        .iter()
        .find(|aid| aid.to_lowercase().contains("doi"))
        .and_then(|aid| aid.split_whitespace().next())
        .map(str::to_string)
        .filter(|doi| !doi.is_empty())
}

/// Pairs author names with affiliations only when the cardinalities agree.
///
/// A mismatch means the upstream record lost per-author alignment; attributing
/// an affiliation to the wrong author is worse than omitting it, so every
/// affiliation is recorded as absent in that case.
fn align_authors(names: &[&str], affiliations: &[&str]) -> Vec<Author> {
    if names.len() == affiliations.len() {
        names
            .iter()
            .zip(affiliations)
            .map(|(name, affiliation)| Author {
                name: name.trim().to_string(),
                affiliation: Some(affiliation.trim().to_string()).filter(|a| !a.is_empty()),
            })
            .collect()
    } else {
        names
            .iter()
            .map(|name| Author {
                name: name.trim().to_string(),
                affiliation: None,
            })
            .collect()
    }
}

/// Normalizes one raw MEDLINE record. Never fails: missing or malformed
/// fields degrade to empty defaults so one bad record cannot sink a batch.
pub fn from_medline_record(rec: &MedlineRecord) -> Article {
    let journal = field(rec, "JT");
    let mut title = field(rec, "TI");
    if title.is_empty() {
        title = journal.clone();
    }

    Article {
        pmid: field(rec, "PMID"),
        title,
        journal,
        pub_date: field(rec, "DP"),
        doi: extract_doi(rec),
        authors: align_authors(&rec.all("AU"), &rec.all("AD")),
        abstract_text: field(rec, "AB"),
    }
}

pub fn from_medline_records(records: &[MedlineRecord]) -> Vec<Article> {
    records.iter().map(from_medline_record).collect()
}
