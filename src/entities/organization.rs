//! Canonical organization matching for free-text author affiliations.

use std::sync::LazyLock;

use regex::Regex;

/// Curated affiliation search terms for the default pharma sweep. These are
/// the literal strings put into the `[ad]` query clause, not match patterns.
pub const TOP_PHARMA: &[&str] = &[
    "Pfizer",
    "Roche",
    "Novartis",
    "Merck",
    "AbbVie",
    "Johnson & Johnson",
    "Janssen",
    "Bristol Myers Squibb",
    "Sanofi",
    "AstraZeneca",
    "GSK",
    "Takeda",
    "Eli Lilly",
    "Amgen",
    "Gilead",
    "Bayer",
    "Boehringer Ingelheim",
    "Novo Nordisk",
    "Moderna",
    "Biogen",
    "Regeneron",
];

/// Ordered (pattern, canonical name) rules. List order is the tie-break and
/// must be preserved: matching walks the slice top to bottom, first hit wins.
const ORG_RULES: &[(&str, &str)] = &[
    (r"\bpfizer\b", "Pfizer"),
    (r"\b(?:hoffmann[-\s]?la[-\s]?roche|genentech|roche)\b", "Roche"),
    (r"\bnovartis\b", "Novartis"),
    (r"\b(?:merck|msd)\b", "Merck"),
    (r"\babbvie\b", "AbbVie"),
    (r"\b(?:johnson\s*&\s*johnson|janssen)\b", "Johnson & Johnson"),
    (r"\b(?:bristol[-\s]myers(?:\s+squibb)?|bms)\b", "Bristol Myers Squibb"),
    (r"\bsanofi\b", "Sanofi"),
    (r"\bastrazeneca\b", "AstraZeneca"),
    (r"\b(?:glaxosmithkline|glaxo\s+smithkline|gsk)\b", "GSK"),
    (r"\btakeda\b", "Takeda"),
    (r"\b(?:eli\s+lilly|lilly)\b", "Eli Lilly"),
    (r"\bamgen\b", "Amgen"),
    (r"\bgilead\b", "Gilead"),
    (r"\bbayer\b", "Bayer"),
    (r"\bboehringer(?:[-\s]ingelheim)?\b", "Boehringer Ingelheim"),
    (r"\bnovo\s+nordisk\b", "Novo Nordisk"),
    (r"\bmoderna\b", "Moderna"),
    (r"\bbiogen\b", "Biogen"),
    (r"\bregeneron\b", "Regeneron"),
];

static COMPILED_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ORG_RULES
        .iter()
        .map(|(pattern, name)| {
            let re = Regex::new(&format!("(?i){pattern}"))
                .unwrap_or_else(|err| panic!("invalid organization rule {pattern:?}: {err}"));
            (re, *name)
        })
        .collect()
});

/// "La Roche" as a place name: La Roche-Guyon, La Roche-sur-Yon, hospitals
/// and universities named after them. Token-boundary match so "La Rochelle"
/// does not trip it.
static LA_ROCHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bla[\s-]roche\b").expect("valid la-roche pattern"));

/// Words that mark a corporate entity rather than a geography. Their presence
/// lets a "la roche" affiliation proceed to the rule table.
static CORPORATE_INDICATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:ag|sa|ltd|inc|llc|gmbh|plc|co|corp|company|pharma|pharmaceutical|pharmaceuticals|biotech|biotechnology|diagnostics|research|holding|holdings|group)\b",
    )
    .expect("valid corporate indicator pattern")
});

/// Maps a raw affiliation string to a canonical organization name.
///
/// The geographic exclusion runs strictly before the rule table: an
/// affiliation mentioning "La Roche" with no corporate indicator word is a
/// place, not the company, and must not match anything.
pub fn normalize_affiliation(raw: Option<&str>) -> Option<&'static str> {
    let text = raw.map(str::trim).filter(|t| !t.is_empty())?;

    if LA_ROCHE.is_match(text) && !CORPORATE_INDICATOR.is_match(text) {
        return None;
    }

    COMPILED_RULES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_blank_input_matches_nothing() {
        assert_eq!(normalize_affiliation(None), None);
        assert_eq!(normalize_affiliation(Some("")), None);
        assert_eq!(normalize_affiliation(Some("   ")), None);
    }

    #[test]
    fn corporate_roche_spellings_normalize() {
        assert_eq!(
            normalize_affiliation(Some("F. Hoffmann-La Roche AG, Basel, Switzerland.")),
            Some("Roche")
        );
        assert_eq!(
            normalize_affiliation(Some("Roche Diagnostics GmbH, Mannheim, Germany")),
            Some("Roche")
        );
        assert_eq!(
            normalize_affiliation(Some("Genentech, South San Francisco, CA, USA")),
            Some("Roche")
        );
        assert_eq!(
            normalize_affiliation(Some("Roche Pharma Research and Early Development")),
            Some("Roche")
        );
    }

    #[test]
    fn geographic_la_roche_is_suppressed() {
        assert_eq!(
            normalize_affiliation(Some("La Roche-Guyon Hospital, Paris, France")),
            None
        );
        assert_eq!(
            normalize_affiliation(Some("Centre Hospitalier de La Roche-sur-Yon")),
            None
        );
    }

    #[test]
    fn la_rochelle_does_not_trip_the_exclusion_or_match() {
        // No "la roche" token sequence and no rule hit either way.
        assert_eq!(
            normalize_affiliation(Some("Université de La Rochelle, France")),
            None
        );
    }

    #[test]
    fn matching_is_token_boundary_aware() {
        // "roche" embedded in an unrelated word must not match.
        assert_eq!(normalize_affiliation(Some("Enroche Consulting Ltd")), None);
        assert_eq!(normalize_affiliation(Some("Bayreuth University")), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(normalize_affiliation(Some("PFIZER INC, NEW YORK")), Some("Pfizer"));
        assert_eq!(normalize_affiliation(Some("novartis pharma ag")), Some("Novartis"));
    }

    #[test]
    fn first_rule_in_list_order_wins() {
        // Mentions both Pfizer and Roche; Pfizer sits earlier in the table.
        assert_eq!(
            normalize_affiliation(Some("Pfizer Inc (formerly Roche), NY")),
            Some("Pfizer")
        );
    }

    #[test]
    fn remaining_majors_normalize() {
        for (affiliation, expected) in [
            ("Janssen Research & Development, Beerse, Belgium", "Johnson & Johnson"),
            ("Bristol-Myers Squibb, Princeton, NJ", "Bristol Myers Squibb"),
            ("AstraZeneca R&D, Gothenburg, Sweden", "AstraZeneca"),
            ("GlaxoSmithKline, Stevenage, UK", "GSK"),
            ("Boehringer Ingelheim Pharma GmbH & Co. KG", "Boehringer Ingelheim"),
            ("Novo Nordisk A/S, Bagsvaerd, Denmark", "Novo Nordisk"),
            ("Eli Lilly and Company, Indianapolis, IN", "Eli Lilly"),
        ] {
            assert_eq!(normalize_affiliation(Some(affiliation)), Some(expected), "{affiliation}");
        }
    }

    #[test]
    fn academic_affiliations_match_nothing() {
        assert_eq!(
            normalize_affiliation(Some(
                "Department of Neurology, Massachusetts General Hospital, Boston, MA"
            )),
            None
        );
    }
}
