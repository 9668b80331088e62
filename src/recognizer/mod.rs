pub mod gazetteer;

use serde::{Deserialize, Serialize};

use crate::error::{MaskgateError, Result};

pub use gazetteer::GazetteerRecognizer;

/// Semantic category attached to a recognized span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    GeopoliticalEntity,
    Other(String),
}

impl EntityLabel {
    /// Parse a recognizer label. Accepts the spaCy spellings (`PERSON`,
    /// `PER`, `ORG`, `LOC`, `GPE`) in any case.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => EntityLabel::Person,
            "ORG" | "ORGANIZATION" => EntityLabel::Organization,
            "LOC" | "LOCATION" => EntityLabel::Location,
            "GPE" => EntityLabel::GeopoliticalEntity,
            _ => EntityLabel::Other(label.to_string()),
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityLabel::Person => write!(f, "PERSON"),
            EntityLabel::Organization => write!(f, "ORG"),
            EntityLabel::Location => write!(f, "LOC"),
            EntityLabel::GeopoliticalEntity => write!(f, "GPE"),
            EntityLabel::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for EntityLabel {
    fn from(s: String) -> Self {
        EntityLabel::parse(&s)
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.to_string()
    }
}

/// A labeled range of the recognizer's input, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    /// The covered text as the recognizer saw it. May be left empty, in
    /// which case only the offsets are used.
    #[serde(default)]
    pub text: String,
}

impl Span {
    pub fn new(start: usize, end: usize, label: EntityLabel, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label,
            text: text.into(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether two spans share at least one character.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// External entity recognizer. Implementations return spans in character
/// offsets of the exact text they were given.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<Span>>;

    /// Name of this recognizer (for logging/debugging).
    fn name(&self) -> &str;
}

/// Returns the same spans for every input.
pub struct StaticRecognizer {
    spans: Vec<Span>,
}

impl StaticRecognizer {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// A recognizer that never finds anything.
    pub fn empty() -> Self {
        Self { spans: Vec::new() }
    }
}

impl EntityRecognizer for StaticRecognizer {
    fn recognize(&self, _text: &str) -> Result<Vec<Span>> {
        Ok(self.spans.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Always fails. Stands in for a recognizer that crashed or timed out.
pub struct FailingRecognizer {
    reason: String,
}

impl FailingRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EntityRecognizer for FailingRecognizer {
    fn recognize(&self, _text: &str) -> Result<Vec<Span>> {
        Err(MaskgateError::Recognizer {
            reason: self.reason.clone(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_spacy_names() {
        assert_eq!(EntityLabel::parse("PER"), EntityLabel::Person);
        assert_eq!(EntityLabel::parse("person"), EntityLabel::Person);
        assert_eq!(EntityLabel::parse("ORG"), EntityLabel::Organization);
        assert_eq!(EntityLabel::parse("LOC"), EntityLabel::Location);
        assert_eq!(EntityLabel::parse("GPE"), EntityLabel::GeopoliticalEntity);
        assert_eq!(
            EntityLabel::parse("DATE"),
            EntityLabel::Other("DATE".into())
        );
    }

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5, EntityLabel::Person, "");
        let b = Span::new(4, 8, EntityLabel::Location, "");
        let c = Span::new(5, 8, EntityLabel::Location, "");
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.char_len(), 5);
        assert_eq!(Span::new(3, 3, EntityLabel::Person, "").char_len(), 0);
    }

    #[test]
    fn test_span_deserializes_label_string() {
        let span: Span =
            serde_json::from_str(r#"{"start":0,"end":4,"label":"PER","text":"Алия"}"#).unwrap();
        assert_eq!(span.label, EntityLabel::Person);
        assert_eq!(span.text, "Алия");
    }

    #[test]
    fn test_failing_recognizer_reports_detection_failure() {
        let err = FailingRecognizer::new("model unavailable")
            .recognize("text")
            .unwrap_err();
        assert!(err.is_detection_failure());
    }
}
