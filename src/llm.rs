use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{MaskgateError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// The external language model. Only ever sees masked text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn send(&self, text: &str) -> Result<String>;

    /// Name of this backend (for logging/debugging).
    fn name(&self) -> &str;
}

/// Build the backend selected in the config.
pub fn from_config(config: &LlmConfig) -> Result<Box<dyn LanguageModel>> {
    match config {
        LlmConfig::Echo => Ok(Box::new(EchoModel)),
        LlmConfig::Api {
            api_base_url,
            model,
            max_tokens,
            api_key_env,
        } => {
            let env = api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
            let api_key = std::env::var(env).map_err(|_| MaskgateError::Llm {
                reason: format!("{env} not set"),
            })?;
            let mut model = ChatCompletionsModel::new(
                api_key,
                model.clone().unwrap_or_else(|| DEFAULT_MODEL.into()),
            );
            if let Some(url) = api_base_url {
                model = model.with_base_url(url.clone());
            }
            model.max_tokens = *max_tokens;
            Ok(Box::new(model))
        }
    }
}

/// Simulated model: answers with a fixed phrase quoting its input.
pub struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    async fn send(&self, text: &str) -> Result<String> {
        Ok(format!("Имитированный ответ LLM для текста: '{text}'"))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` backend.
pub struct ChatCompletionsModel {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    pub max_tokens: Option<u32>,
}

impl ChatCompletionsModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Set a custom base URL (for Azure, proxies, local servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsModel {
    async fn send(&self, text: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: text,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                MaskgateError::Llm {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "chat completion api error");
            return Err(MaskgateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: ChatResponseRaw = response.json().await.map_err(|e| MaskgateError::Llm {
            reason: format!("invalid response body: {e}"),
        })?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MaskgateError::Llm {
                reason: "no choices in response".into(),
            })?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            response_len = content.len(),
            "chat completion"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_quotes_input() {
        let reply = EchoModel.send("привет #TOKEN_1#").await.unwrap();
        assert_eq!(reply, "Имитированный ответ LLM для текста: 'привет #TOKEN_1#'");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw: ChatResponseRaw = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}],"usage":{}}"#,
        )
        .unwrap();
        assert_eq!(raw.choices[0].message.content.as_deref(), Some("ok"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let model = ChatCompletionsModel::new("k", "m").with_base_url("http://localhost:8080/v1/");
        assert_eq!(model.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_from_config_echo() {
        let model = from_config(&LlmConfig::Echo).unwrap();
        assert_eq!(model.name(), "echo");
    }

    #[test]
    fn test_from_config_api_requires_key() {
        let config = LlmConfig::Api {
            api_base_url: None,
            model: None,
            max_tokens: None,
            api_key_env: Some("MASKGATE_TEST_UNSET_KEY".into()),
        };
        assert!(matches!(from_config(&config), Err(MaskgateError::Llm { .. })));
    }
}
