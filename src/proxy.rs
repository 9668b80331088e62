use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ProxyConfig;
use crate::error::{MaskgateError, Result};
use crate::llm::{self, LanguageModel};
use crate::mask::MaskingPipeline;
use crate::recognizer::{EntityRecognizer, GazetteerRecognizer};
use crate::unmask::{unmask, unresolved_placeholders};

/// One completed round trip, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    /// What actually left the trust boundary.
    pub masked_query: String,
    /// The model's raw answer, still containing placeholders.
    pub ai_response: String,
    /// The answer with placeholders restored.
    pub final_response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "OK".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Decode an uploaded document as UTF-8, dropping invalid byte sequences
/// instead of rejecting the document or substituting U+FFFD.
pub fn decode_document(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Masks a query, forwards it to the language model, and unmasks the answer.
///
/// The token map lives only inside [`ChatProxy::query`]; nothing about a
/// request survives it.
pub struct ChatProxy {
    pipeline: MaskingPipeline,
    model: Box<dyn LanguageModel>,
    timeout_secs: u64,
}

impl ChatProxy {
    pub fn new(
        pipeline: MaskingPipeline,
        model: Box<dyn LanguageModel>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            pipeline,
            model,
            timeout_secs,
        }
    }

    /// Wire up recognizer, pipeline and model from config. Relative paths in
    /// the config resolve against `base_dir`.
    pub fn from_config(config: &ProxyConfig, base_dir: &Path) -> Result<Self> {
        let recognizer: Arc<dyn EntityRecognizer> =
            Arc::new(GazetteerRecognizer::new(&config.recognizer.entries(base_dir)?)?);
        let pipeline = MaskingPipeline::from_config(&config.masking, recognizer)?;
        let model = llm::from_config(&config.llm)?;
        Ok(Self::new(pipeline, model, config.llm_timeout_secs))
    }

    pub fn pipeline(&self) -> &MaskingPipeline {
        &self.pipeline
    }

    pub async fn query(&self, user_query: &str) -> Result<ChatExchange> {
        let (masked_query, tokens) = self.pipeline.mask(user_query)?.into_parts();
        tracing::info!(
            backend = self.model.name(),
            tokens = tokens.len(),
            "forwarding masked query"
        );

        let timeout = Duration::from_secs(self.timeout_secs);
        let ai_response = match tokio::time::timeout(timeout, self.model.send(&masked_query)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(MaskgateError::LlmTimeout {
                    timeout_secs: self.timeout_secs,
                })
            }
        };

        let unresolved = unresolved_placeholders(&ai_response, &tokens);
        if !unresolved.is_empty() {
            tracing::warn!(
                count = unresolved.len(),
                "model reply contains placeholders that were never issued"
            );
        }
        let final_response = unmask(&ai_response, &tokens);
        Ok(ChatExchange {
            masked_query,
            ai_response,
            final_response,
        })
    }

    /// Query with the contents of an uploaded plain-text document.
    pub async fn query_document(&self, bytes: &[u8]) -> Result<ChatExchange> {
        self.query(&decode_document(bytes)).await
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok()
    }
}
