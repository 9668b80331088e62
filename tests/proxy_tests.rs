//! Integration tests for the chat proxy around a stub language model.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use maskgate::config::{LlmConfig, ProxyConfig};
use maskgate::llm::{EchoModel, LanguageModel};
use maskgate::proxy::ChatProxy;
use maskgate::recognizer::{EntityLabel, FailingRecognizer, Span, StaticRecognizer};
use maskgate::{MaskgateError, MaskingPipeline};

/// Records what it was sent and answers with a fixed template.
struct RecordingModel {
    seen: Arc<Mutex<Vec<String>>>,
    reply: fn(&str) -> String,
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn send(&self, text: &str) -> maskgate::Result<String> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok((self.reply)(text))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct SlowModel;

#[async_trait]
impl LanguageModel for SlowModel {
    async fn send(&self, _text: &str) -> maskgate::Result<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".into())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn pipeline(spans: Vec<Span>) -> MaskingPipeline {
    MaskingPipeline::default_pipeline(Arc::new(StaticRecognizer::new(spans))).unwrap()
}

#[tokio::test]
async fn model_only_sees_masked_text() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let model = RecordingModel {
        seen: seen.clone(),
        reply: |text| format!("Ответ для {text}"),
    };
    let spans = vec![Span::new(0, 4, EntityLabel::Person, "Алия")];
    let proxy = ChatProxy::new(pipeline(spans), Box::new(model), 5);

    let exchange = proxy
        .query("Алия, карта 4111 2222 3333 4444")
        .await
        .unwrap();

    let sent = seen.lock().unwrap().clone();
    assert_eq!(sent, vec!["#TOKEN_1#, карта #TOKEN_2#".to_string()]);
    assert_eq!(exchange.masked_query, "#TOKEN_1#, карта #TOKEN_2#");
    assert_eq!(exchange.ai_response, "Ответ для #TOKEN_1#, карта #TOKEN_2#");
    assert_eq!(
        exchange.final_response,
        "Ответ для Алия, карта 4111 2222 3333 4444"
    );
}

#[tokio::test]
async fn hallucinated_tokens_survive_unmasking() {
    let model = RecordingModel {
        seen: Arc::new(Mutex::new(Vec::new())),
        reply: |_| "см. #TOKEN_1# и #TOKEN_7#".to_string(),
    };
    let proxy = ChatProxy::new(pipeline(Vec::new()), Box::new(model), 5);

    let exchange = proxy.query("ИИН 123456789012").await.unwrap();
    assert_eq!(exchange.final_response, "см. 123456789012 и #TOKEN_7#");
}

#[tokio::test]
async fn recognizer_failure_never_reaches_model() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let model = RecordingModel {
        seen: seen.clone(),
        reply: |t| t.to_string(),
    };
    let pipeline =
        MaskingPipeline::default_pipeline(Arc::new(FailingRecognizer::new("model crashed")))
            .unwrap();
    let proxy = ChatProxy::new(pipeline, Box::new(model), 5);

    let err = proxy.query("Алия").await.unwrap_err();
    assert!(err.is_detection_failure());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slow_model_times_out() {
    let proxy = ChatProxy::new(pipeline(Vec::new()), Box::new(SlowModel), 1);
    let err = proxy.query("привет").await.unwrap_err();
    assert!(matches!(err, MaskgateError::LlmTimeout { timeout_secs: 1 }));
}

#[tokio::test]
async fn proxy_from_config_uses_gazetteer() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut config = ProxyConfig::default();
    config
        .recognizer
        .gazetteer
        .insert("ORG".into(), vec!["Halyk Bank".into()]);
    config.llm = LlmConfig::Echo;

    let proxy = ChatProxy::from_config(&config, tmp.path()).unwrap();
    let exchange = proxy.query("счёт в Halyk Bank").await.unwrap();
    assert_eq!(exchange.masked_query, "счёт в #TOKEN_1#");
    assert_eq!(
        exchange.final_response,
        "Имитированный ответ LLM для текста: 'счёт в Halyk Bank'"
    );
}

#[tokio::test]
async fn each_query_starts_numbering_afresh() {
    let proxy = ChatProxy::new(pipeline(Vec::new()), Box::new(EchoModel), 5);
    let first = proxy.query("ИИН 111111111111").await.unwrap();
    let second = proxy.query("ИИН 222222222222").await.unwrap();
    assert_eq!(first.masked_query, "ИИН #TOKEN_1#");
    assert_eq!(second.masked_query, "ИИН #TOKEN_1#");
    assert!(second.final_response.contains("222222222222"));
    assert!(!second.final_response.contains("111111111111"));
}
