pub mod detectors;
pub mod spans;

use std::sync::Arc;

use crate::config::MaskingConfig;
use crate::error::{MaskgateError, Result};
use crate::recognizer::{EntityLabel, EntityRecognizer};
use crate::token::{find_placeholder, Masked};

pub use detectors::{DetectorKind, DetectorSet, RegexDetector};
pub use spans::SpanMasker;

/// A single masking stage over already partially masked text.
pub trait MaskStage: Send + Sync {
    /// Replace whatever this stage detects in `input.text` with tokens minted
    /// from `input.tokens`. Finding nothing returns the input unchanged.
    fn apply(&self, input: Masked) -> Masked;

    /// Name of this stage (for logging/debugging).
    fn name(&self) -> &str;
}

/// The complete masking pipeline: recognizer spans first, then the
/// pattern detectors in order.
pub struct MaskingPipeline {
    recognizer: Arc<dyn EntityRecognizer>,
    span_masker: SpanMasker,
    detectors: DetectorSet,
    reject_placeholder_input: bool,
}

impl MaskingPipeline {
    /// Create a pipeline from explicit parts.
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        span_masker: SpanMasker,
        detectors: DetectorSet,
    ) -> Self {
        Self {
            recognizer,
            span_masker,
            detectors,
            reject_placeholder_input: true,
        }
    }

    /// Default labels and all built-in detectors around the given recognizer.
    pub fn default_pipeline(recognizer: Arc<dyn EntityRecognizer>) -> Result<Self> {
        Ok(Self::new(
            recognizer,
            SpanMasker::default(),
            DetectorSet::default_set()?,
        ))
    }

    pub fn from_config(
        config: &MaskingConfig,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Result<Self> {
        let labels = config.accepted_labels.iter().map(|l| EntityLabel::parse(l));
        let detectors = config
            .detectors
            .iter()
            .map(|d| d.parse::<DetectorKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(
            recognizer,
            SpanMasker::new(labels),
            DetectorSet::from_kinds(&detectors)?,
        )
        .reject_placeholder_input(config.reject_placeholder_input))
    }

    /// Whether input that already contains `#TOKEN_<n>#` is refused.
    pub fn reject_placeholder_input(mut self, reject: bool) -> Self {
        self.reject_placeholder_input = reject;
        self
    }

    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.names()
    }

    /// Mask `raw`, returning the masked text and the token map needed to
    /// reverse it.
    ///
    /// Recognizer failures abort the call; no partially masked text is
    /// ever returned.
    pub fn mask(&self, raw: &str) -> Result<Masked> {
        if self.reject_placeholder_input {
            if let Some(placeholder) = find_placeholder(raw) {
                return Err(MaskgateError::PlaceholderInInput {
                    placeholder: placeholder.to_string(),
                });
            }
        }

        let spans = self.recognizer.recognize(raw).inspect_err(|e| {
            tracing::warn!(
                recognizer = self.recognizer.name(),
                error = %e,
                "entity recognition failed"
            );
        })?;

        let masked = self.span_masker.apply(Masked::new(raw), &spans)?;
        let masked = self.detectors.apply(masked);

        tracing::debug!(
            recognizer = self.recognizer.name(),
            spans = spans.len(),
            tokens = masked.tokens.len(),
            input_len = raw.len(),
            "masked input"
        );
        Ok(masked)
    }
}
