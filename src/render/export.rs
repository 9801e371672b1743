//! Plain-text export of normalized records.
//!
//! The layout is the de-facto file format handed to downstream consumers and
//! must stay byte-stable for identical input: record order preserved, fixed
//! field order within a record, one blank line between records, a single
//! trailing newline. Treat changes here as format changes.

use crate::entities::article::{Article, Author};
use crate::entities::organization::normalize_affiliation;

const NO_ABSTRACT_PLACEHOLDER: &str = "(no abstract)";

/// Organization matches are recomputed here on every pass; affiliation text is
/// free-form and may repeat verbatim across records, so there is nothing worth
/// caching between calls.
fn render_author(author: &Author) -> String {
    match normalize_affiliation(author.affiliation.as_deref()) {
        Some(org) => format!("**{}** ({org})", author.name),
        None => author.name.clone(),
    }
}

fn metadata_line(article: &Article) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    if !article.journal.is_empty() {
        segments.push(format!("Journal: {}", article.journal));
    }
    if !article.pub_date.is_empty() {
        segments.push(format!("PubDate: {}", article.pub_date));
    }
    if !article.pmid.is_empty() {
        segments.push(format!("PMID: {}", article.pmid));
    }
    if let Some(doi) = article.doi.as_deref().filter(|d| !d.is_empty()) {
        segments.push(format!("DOI: {doi}"));
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join(" | "))
}

/// Renders records into the export text format.
pub fn to_txt(records: &[Article]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (idx, article) in records.iter().enumerate() {
        lines.push(format!("## {}. {}", idx + 1, article.title));
        if let Some(meta) = metadata_line(article) {
            lines.push(meta);
        }
        if !article.authors.is_empty() {
            let authors: Vec<String> = article.authors.iter().map(render_author).collect();
            lines.push(format!("Authors: {}", authors.join("; ")));
        }
        lines.push(String::new());
        lines.push("Abstract:".to_string());
        if article.abstract_text.is_empty() {
            lines.push(NO_ABSTRACT_PLACEHOLDER.to_string());
        } else {
            lines.push(article.abstract_text.clone());
        }
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(pmid: &str, title: &str) -> Article {
        Article {
            pmid: pmid.into(),
            title: title.into(),
            journal: "Molecular therapy".into(),
            pub_date: "2023 Apr".into(),
            doi: Some("10.1016/j.ymthe.2023.01.001".into()),
            authors: vec![
                Author {
                    name: "Smith J".into(),
                    affiliation: Some("F. Hoffmann-La Roche AG, Basel, Switzerland.".into()),
                },
                Author {
                    name: "Doe A".into(),
                    affiliation: Some("University of Somewhere".into()),
                },
            ],
            abstract_text: "Enzyme replacement remains standard of care.".into(),
        }
    }

    #[test]
    fn golden_two_record_layout() {
        let mut second = article("36000002", "Second record");
        second.doi = None;
        second.abstract_text = String::new();
        second.authors = vec![Author {
            name: "Solo B".into(),
            affiliation: Some("La Roche-Guyon Hospital, Paris".into()),
        }];
        let records = vec![article("36000001", "A gene therapy approach"), second];

        let expected = "\
## 1. A gene therapy approach
Journal: Molecular therapy | PubDate: 2023 Apr | PMID: 36000001 | DOI: 10.1016/j.ymthe.2023.01.001
Authors: **Smith J** (Roche); Doe A

Abstract:
Enzyme replacement remains standard of care.

## 2. Second record
Journal: Molecular therapy | PubDate: 2023 Apr | PMID: 36000002
Authors: Solo B

Abstract:
(no abstract)
";
        assert_eq!(to_txt(&records), expected);
    }

    #[test]
    fn output_is_byte_stable_across_calls() {
        let records = vec![article("1", "Same"), article("2", "Input")];
        assert_eq!(to_txt(&records), to_txt(&records));
    }

    #[test]
    fn matched_authors_are_decorated_and_geography_is_not() {
        let rendered = to_txt(&[article("1", "T")]);
        assert!(rendered.contains("**Smith J** (Roche)"));
        assert!(rendered.contains("; Doe A\n"));
        assert!(!rendered.contains("**Doe A**"));
    }

    #[test]
    fn empty_metadata_segments_are_omitted() {
        let bare = Article {
            pmid: String::new(),
            title: "Only a title".into(),
            journal: String::new(),
            pub_date: String::new(),
            doi: None,
            authors: Vec::new(),
            abstract_text: String::new(),
        };
        let rendered = to_txt(&[bare]);
        assert_eq!(rendered, "## 1. Only a title\n\nAbstract:\n(no abstract)\n");
    }

    #[test]
    fn output_ends_with_exactly_one_newline() {
        let rendered = to_txt(&[article("1", "T")]);
        assert!(rendered.ends_with('\n'));
        assert!(!rendered.ends_with("\n\n"));
    }
}
