use std::collections::HashSet;

use crate::error::{MaskgateError, Result};
use crate::recognizer::{EntityLabel, Span};
use crate::token::Masked;

/// Replaces recognizer spans with tokens.
///
/// Only spans whose label is in the allow-list are masked. Offsets are
/// character offsets into the text the recognizer saw, so this must run on
/// the original text before any other stage.
#[derive(Debug, Clone)]
pub struct SpanMasker {
    accepted: HashSet<EntityLabel>,
}

impl Default for SpanMasker {
    fn default() -> Self {
        Self::new(Self::default_labels())
    }
}

impl SpanMasker {
    pub fn new(accepted: impl IntoIterator<Item = EntityLabel>) -> Self {
        Self {
            accepted: accepted.into_iter().collect(),
        }
    }

    /// Person, organization, location and geopolitical entity.
    pub fn default_labels() -> Vec<EntityLabel> {
        vec![
            EntityLabel::Person,
            EntityLabel::Organization,
            EntityLabel::Location,
            EntityLabel::GeopoliticalEntity,
        ]
    }

    pub fn accepts(&self, label: &EntityLabel) -> bool {
        self.accepted.contains(label)
    }

    /// Mask every accepted span of `input.text`.
    ///
    /// Fails with `InvalidSpan` if any span (accepted or not) does not fit
    /// the text; nothing is masked in that case.
    pub fn apply(&self, input: Masked, spans: &[Span]) -> Result<Masked> {
        let Masked { mut text, mut tokens } = input;

        // byte_at[i] is the byte offset of character i; the last entry is text.len().
        let byte_at: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = byte_at.len() - 1;

        for span in spans {
            validate(span, &text, &byte_at, char_len)?;
        }

        let mut candidates: Vec<&Span> = spans
            .iter()
            .filter(|s| s.char_len() > 0 && self.accepts(&s.label))
            .collect();
        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.char_len().cmp(&a.char_len()))
        });

        let mut kept: Vec<&Span> = Vec::with_capacity(candidates.len());
        for span in candidates {
            match kept.last() {
                Some(prev) if prev.overlaps(span) => {
                    tracing::debug!(
                        label = %span.label,
                        start = span.start,
                        end = span.end,
                        "discarding span overlapping an earlier one"
                    );
                }
                _ => kept.push(span),
            }
        }

        // Mint in reading order, replace right to left so earlier offsets stay valid.
        let replacements: Vec<(usize, usize, String)> = kept
            .iter()
            .map(|span| {
                let (start, end) = (byte_at[span.start], byte_at[span.end]);
                let token = tokens.mint(&text[start..end]);
                (start, end, token.to_string())
            })
            .collect();

        for (start, end, token) in replacements.iter().rev() {
            text.replace_range(*start..*end, token);
        }

        tracing::debug!(spans = spans.len(), masked = kept.len(), "span masking done");
        Ok(Masked { text, tokens })
    }
}

fn validate(span: &Span, text: &str, byte_at: &[usize], char_len: usize) -> Result<()> {
    let invalid = |reason: String| MaskgateError::InvalidSpan {
        start: span.start,
        end: span.end,
        label: span.label.to_string(),
        reason,
    };

    if span.start > span.end {
        return Err(invalid("start after end".into()));
    }
    if span.end > char_len {
        return Err(invalid(format!("text has only {char_len} characters")));
    }
    let covered = &text[byte_at[span.start]..byte_at[span.end]];
    if !span.text.is_empty() && span.text != covered {
        return Err(invalid("span text does not match the addressed range".into()));
    }
    Ok(())
}
