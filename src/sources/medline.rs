//! Parser for the MEDLINE text format returned by EFetch.
//!
//! The format is line-oriented: a field starts with a four-column tag padded
//! with spaces followed by `"- "` (e.g. `TI  - `, `PMID- `), wrapped values
//! continue on lines indented with six spaces, and records are separated by
//! blank lines. Tags repeat (one `AU` line per author), so a record is an
//! ordered multimap rather than a struct.

/// One raw record exactly as parsed, field order preserved, never mutated.
#[derive(Debug, Clone, Default)]
pub struct MedlineRecord {
    fields: Vec<(String, String)>,
}

impl MedlineRecord {
    /// First value of `tag`, if any.
    pub fn first(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of `tag`, in record order.
    pub fn all(&self, tag: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn from_fields(fields: Vec<(&str, &str)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(tag, value)| (tag.to_string(), value.to_string()))
                .collect(),
        }
    }
}

fn split_field_line(line: &str) -> Option<(&str, &str)> {
    // Tag is left-justified in the first four columns; "- " sits at 4..6.
    // Checked slicing so a stray multibyte character cannot panic the parser.
    if line.get(4..6)? != "- " {
        return None;
    }
    let tag = line.get(..4)?.trim_end();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((tag, line.get(6..)?.trim()))
}

/// Parses a full EFetch MEDLINE payload into records.
///
/// Lines that match neither a field start nor a continuation are skipped, so a
/// malformed record degrades to whatever fields did parse instead of failing
/// the batch.
pub fn parse(text: &str) -> Vec<MedlineRecord> {
    let mut records: Vec<MedlineRecord> = Vec::new();
    let mut current = MedlineRecord::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some((tag, value)) = split_field_line(line) {
            current.fields.push((tag.to_string(), value.to_string()));
        } else if line.starts_with("      ")
            && let Some((_, last)) = current.fields.last_mut()
        {
            // Wrapped value; MEDLINE folds with a single joining space.
            if !last.is_empty() {
                last.push(' ');
            }
            last.push_str(line.trim());
        }
    }

    if !current.is_empty() {
        records.push(current);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
PMID- 36000001
TI  - A gene therapy approach to Gaucher disease with a very long title
      that wraps onto a second line.
JT  - Molecular therapy
DP  - 2023 Apr
AU  - Smith J
AU  - Doe A
AD  - F. Hoffmann-La Roche AG, Basel, Switzerland.
AD  - Univ. of Somewhere, Dept. of Genetics.
AB  - Enzyme replacement remains standard of care.
AID - S1525-0016(23)00001-1 [pii]
AID - 10.1016/j.ymthe.2023.01.001 [doi]

PMID- 36000002
TI  - Second record.
AU  - Solo B
";

    #[test]
    fn blank_lines_split_records() {
        let records = parse(SAMPLE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first("PMID"), Some("36000001"));
        assert_eq!(records[1].first("PMID"), Some("36000002"));
    }

    #[test]
    fn continuation_lines_fold_into_their_field() {
        let records = parse(SAMPLE);
        let title = records[0].first("TI").unwrap();
        assert!(title.ends_with("that wraps onto a second line."));
        assert!(!title.contains('\n'));
    }

    #[test]
    fn repeated_tags_keep_order() {
        let records = parse(SAMPLE);
        assert_eq!(records[0].all("AU"), vec!["Smith J", "Doe A"]);
        assert_eq!(
            records[0].all("AID"),
            vec![
                "S1525-0016(23)00001-1 [pii]",
                "10.1016/j.ymthe.2023.01.001 [doi]"
            ]
        );
    }

    #[test]
    fn single_value_behaves_as_one_element_list() {
        let records = parse(SAMPLE);
        assert_eq!(records[1].all("AU"), vec!["Solo B"]);
        assert_eq!(records[1].all("AD").len(), 0);
    }

    #[test]
    fn garbage_lines_are_skipped_not_fatal() {
        let records = parse("not a field line\nPMID- 1\nTI  - Ok\n???\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first("TI"), Some("Ok"));
    }

    #[test]
    fn four_char_tags_parse() {
        let records = parse("PMID- 7\nLID - 10.1/x [doi]\n");
        assert_eq!(records[0].first("LID"), Some("10.1/x [doi]"));
    }
}
