use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::MaskStage;
use crate::error::{MaskgateError, Result};
use crate::token::Masked;

/// The built-in pattern detectors, declared in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Passport,
    CreditCard,
    Iban,
    Amount,
    TaxId,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 5] = [
        DetectorKind::Passport,
        DetectorKind::CreditCard,
        DetectorKind::Iban,
        DetectorKind::Amount,
        DetectorKind::TaxId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::Passport => "passport",
            DetectorKind::CreditCard => "credit_card",
            DetectorKind::Iban => "iban",
            DetectorKind::Amount => "amount",
            DetectorKind::TaxId => "tax_id",
        }
    }

    /// The detector's pattern. Patterns with `prefix` and `value` groups
    /// keep the prefix in the output and mask only the value.
    pub fn pattern(&self) -> &'static str {
        match self {
            // "паспорт 1234 567890", "Паспорт № 1234567890"
            DetectorKind::Passport => r"(?i)паспорт\s?(?:№\s?)?\d{4}\s?\d{6}\b",
            // 16 digits in groups of four
            DetectorKind::CreditCard => r"\b\d{4}[\s-]\d{4}[\s-]\d{4}[\s-]\d{4}\b",
            // KZ IBAN: country, check digits, 16 alphanumerics, optionally spaced by 4
            DetectorKind::Iban => r"\bKZ\d{2}(?: ?[0-9A-Z]{4}){4}\b",
            DetectorKind::Amount => {
                r"(?i)сумм[аеуыой]*\s*:?\s*\d+(?:[ \x{00A0}]\d{3})*(?:[.,]\d{1,2})?\s*(?:тенге|тг\.?|₸|kzt|руб(?:лей|ля|ль)?\.?|rub|долл(?:аров|ара|ар)?|usd|\$|евро|eur)"
            }
            // ИИН (individual) / БИН (business), optionally "компании", 12 digits
            DetectorKind::TaxId => {
                r"\b(?P<prefix>(?:ИИН|БИН)(?:\s+(?i:компании))?\s*:?\s*)(?P<value>\d{12})\b"
            }
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DetectorKind {
    type Err = MaskgateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        DetectorKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| MaskgateError::UnknownDetector { name: s.to_string() })
    }
}

/// One pattern pass: every non-overlapping match is replaced by a token.
pub struct RegexDetector {
    kind: DetectorKind,
    regex: Regex,
}

impl RegexDetector {
    pub fn new(kind: DetectorKind) -> Result<Self> {
        let regex = Regex::new(kind.pattern()).map_err(|e| MaskgateError::InvalidPattern {
            detector: kind.name().into(),
            reason: e.to_string(),
        })?;
        Ok(Self { kind, regex })
    }
}

impl MaskStage for RegexDetector {
    fn apply(&self, input: Masked) -> Masked {
        let Masked { text, mut tokens } = input;
        let mut hits = 0usize;

        let replaced = self.regex.replace_all(&text, |caps: &Captures| {
            hits += 1;
            match (caps.name("prefix"), caps.name("value")) {
                (Some(prefix), Some(value)) => {
                    format!("{}{}", prefix.as_str(), tokens.mint(value.as_str()))
                }
                _ => tokens.mint(&caps[0]).to_string(),
            }
        });
        let text = replaced.into_owned();

        if hits > 0 {
            tracing::debug!(detector = self.kind.name(), hits, "detector matched");
        }
        Masked { text, tokens }
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}

/// Ordered chain of mask stages; each one scans the previous one's output.
pub struct DetectorSet {
    stages: Vec<Box<dyn MaskStage>>,
}

impl DetectorSet {
    /// Create a set from custom stages, applied in the given order.
    pub fn new(stages: Vec<Box<dyn MaskStage>>) -> Self {
        Self { stages }
    }

    /// All built-in detectors in canonical order.
    pub fn default_set() -> Result<Self> {
        Self::from_kinds(&DetectorKind::ALL)
    }

    /// Build the given detectors. Duplicates are dropped and the canonical
    /// order is restored regardless of the order they were listed in.
    pub fn from_kinds(kinds: &[DetectorKind]) -> Result<Self> {
        let mut kinds = kinds.to_vec();
        kinds.sort();
        kinds.dedup();
        let stages = kinds
            .into_iter()
            .map(|k| RegexDetector::new(k).map(|d| Box::new(d) as Box<dyn MaskStage>))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { stages })
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply(&self, input: Masked) -> Masked {
        self.stages
            .iter()
            .fold(input, |masked, stage| stage.apply(masked))
    }
}
