use std::collections::BTreeMap;

use aho_corasick::{AhoCorasick, MatchKind};

use super::{EntityLabel, EntityRecognizer, Span};
use crate::error::{MaskgateError, Result};

/// Dictionary recognizer: finds known entity names via aho-corasick.
///
/// Matching is leftmost-longest and ASCII case-insensitive. A match only
/// counts when it is not glued to a neighbouring letter or digit, so
/// "Алма" does not fire inside "Алматы".
pub struct GazetteerRecognizer {
    automaton: AhoCorasick,
    labels: Vec<EntityLabel>,
}

impl GazetteerRecognizer {
    /// Build from a label → phrases table. Empty phrases are skipped.
    pub fn new(entries: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut phrases: Vec<&str> = Vec::new();
        let mut labels = Vec::new();
        for (label, names) in entries {
            for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
                phrases.push(name);
                labels.push(EntityLabel::parse(label));
            }
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(true)
            .build(&phrases)
            .map_err(|e| MaskgateError::InvalidPattern {
                detector: "gazetteer".into(),
                reason: e.to_string(),
            })?;

        Ok(Self { automaton, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Span>> {
        if self.labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut spans = Vec::new();
        // Character offset of `byte_cursor`, advanced incrementally.
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        for mat in self.automaton.find_iter(text) {
            let (start, end) = (mat.start(), mat.end());
            if !on_word_boundary(text, start, end) {
                continue;
            }

            char_cursor += text[byte_cursor..start].chars().count();
            byte_cursor = start;
            let value = &text[start..end];
            let char_start = char_cursor;
            let char_end = char_start + value.chars().count();

            spans.push(Span::new(
                char_start,
                char_end,
                self.labels[mat.pattern().as_usize()].clone(),
                value,
            ));
        }

        Ok(spans)
    }

    fn name(&self) -> &str {
        "gazetteer"
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BTreeMap<String, Vec<String>> {
        let mut entries = BTreeMap::new();
        entries.insert(
            "PER".to_string(),
            vec!["Иван Петров".to_string(), "John Smith".to_string()],
        );
        entries.insert("ORG".to_string(), vec!["Kaspi Bank".to_string()]);
        entries.insert("GPE".to_string(), vec!["Алматы".to_string()]);
        entries
    }

    #[test]
    fn test_finds_entities_with_char_offsets() {
        let rec = GazetteerRecognizer::new(&table()).unwrap();
        let text = "Иван Петров живёт в Алматы";
        let spans = rec.recognize(text).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, 11);
        assert_eq!(spans[0].label, EntityLabel::Person);
        assert_eq!(spans[1].start, 20);
        assert_eq!(spans[1].end, 26);
        assert_eq!(spans[1].text, "Алматы");
        assert_eq!(spans[1].label, EntityLabel::GeopoliticalEntity);
    }

    #[test]
    fn test_ascii_case_insensitive() {
        let rec = GazetteerRecognizer::new(&table()).unwrap();
        let spans = rec.recognize("account at KASPI BANK").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "KASPI BANK");
        assert_eq!(spans[0].label, EntityLabel::Organization);
    }

    #[test]
    fn test_requires_word_boundary() {
        let mut entries = BTreeMap::new();
        entries.insert("LOC".to_string(), vec!["Алма".to_string()]);
        let rec = GazetteerRecognizer::new(&entries).unwrap();
        assert!(rec.recognize("Алматы").unwrap().is_empty());
        assert_eq!(rec.recognize("Алма, город").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_table() {
        let rec = GazetteerRecognizer::new(&BTreeMap::new()).unwrap();
        assert!(rec.is_empty());
        assert!(rec.recognize("John Smith").unwrap().is_empty());
    }
}
