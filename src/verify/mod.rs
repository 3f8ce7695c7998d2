pub mod citations;
pub mod prompts;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::llm::{CompletionError, LlmClient, Message};

pub use citations::{extract_sources, Citation, CompletionResult};

/// Final answer shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAnswer {
    pub answer_text: String,
    /// 0 to 3 entries, all of which passed the shape check.
    pub citations: Vec<Citation>,
    /// Whether the follow-up "give me sources" round-trip was made.
    pub retried: bool,
}

/// Answer retrieval plus the one-shot source retry.
pub struct VerificationEngine {
    llm: Arc<LlmClient>,
}

impl VerificationEngine {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    fn initial_messages(prompt: &str) -> Vec<Message> {
        vec![
            Message::system(prompts::system_prompt(Utc::now())),
            Message::user(prompt),
        ]
    }

    /// Single completion round-trip, split at the delimiter.
    pub async fn get_answer(&self, prompt: &str) -> Result<CompletionResult, CompletionError> {
        let raw = self.llm.chat(&Self::initial_messages(prompt)).await?;
        Ok(citations::split_answer(&raw))
    }

    /// At most two completion requests: the question, then (only if the first
    /// reply had no usable source) a demand for exactly three sources.
    /// The answer text always comes from the first reply.
    pub async fn get_verified_answer(
        &self,
        prompt: &str,
    ) -> Result<VerifiedAnswer, CompletionError> {
        let CompletionResult {
            answer_text,
            raw_source_block,
            raw,
        } = self.get_answer(prompt).await?;
        let citations = extract_sources(&raw);
        debug!(
            model = self.llm.model(),
            response_len = raw.len(),
            has_source_block = raw_source_block.is_some(),
            shapes = ?citations.iter().map(|c| c.shape).collect::<Vec<_>>(),
            "First completion extracted"
        );

        if !citations.is_empty() {
            info!(citations = citations.len(), "Verified answer ready");
            return Ok(VerifiedAnswer {
                answer_text,
                citations,
                retried: false,
            });
        }

        info!("No usable sources in first completion, requesting sources");
        let mut messages = Self::initial_messages(prompt);
        messages.push(Message::assistant(raw));
        messages.push(Message::user(prompts::retry_prompt()));

        let retry_citations = match self.llm.chat(&messages).await {
            Ok(second) => extract_sources(&second),
            Err(e) => {
                warn!(error = %e, "Source retry failed");
                Vec::new()
            }
        };

        if retry_citations.is_empty() {
            warn!("No usable sources after retry");
            return Ok(VerifiedAnswer {
                answer_text: with_disclaimer(&answer_text),
                citations: Vec::new(),
                retried: true,
            });
        }

        info!(citations = retry_citations.len(), "Verified answer ready after retry");
        Ok(VerifiedAnswer {
            answer_text,
            citations: retry_citations,
            retried: true,
        })
    }
}

fn with_disclaimer(answer: &str) -> String {
    if answer.is_empty() {
        prompts::SOURCES_UNAVAILABLE.to_string()
    } else {
        format!("{}\n\n{}", answer, prompts::SOURCES_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::CompletionConfig;

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    fn engine_with(base_url: &str, timeout_secs: u64) -> VerificationEngine {
        let config = CompletionConfig {
            api_key: "llm-key".to_string(),
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            timeout_secs,
            temperature: 0.2,
            max_tokens: 2048,
        };
        VerificationEngine::new(Arc::new(LlmClient::new(&config).unwrap()))
    }

    #[tokio::test]
    async fn first_reply_with_sources_needs_no_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(
                "Paris is the capital.\n### VERIFICATION SOURCES ###\n[Capital Facts](https://cia.gov/facts) - CIA (2020)\nnotasource\nDOI:10.1000/xyz123",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_verified_answer("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(result.answer_text, "Paris is the capital.");
        assert_eq!(result.citations.len(), 2);
        assert!(!result.retried);
    }

    #[tokio::test]
    async fn retry_sources_paired_with_first_answer() {
        let server = MockServer::start().await;
        // The retry turn is the only request that carries the retry prompt.
        Mock::given(method("POST"))
            .and(body_string_contains("did not include sources"))
            .respond_with(completion(
                "A different answer.\n### VERIFICATION SOURCES ###\nsome blog\narXiv:1706.03762v7",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(completion("Light travels at about 300,000 km/s."))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_verified_answer("How fast is light?")
            .await
            .unwrap();

        assert_eq!(result.answer_text, "Light travels at about 300,000 km/s.");
        assert_eq!(
            result
                .citations
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>(),
            vec!["arXiv:1706.03762v7"]
        );
        assert!(result.retried);
    }

    #[tokio::test]
    async fn retry_carries_prior_assistant_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("did not include sources"))
            .and(body_string_contains("Unsourced first answer."))
            .and(body_string_contains("\"role\":\"assistant\""))
            .respond_with(completion(
                "### VERIFICATION SOURCES ###\n[Paper](https://doi.org/10.1/x) - J (2020)",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(completion("Unsourced first answer."))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_verified_answer("q")
            .await
            .unwrap();
        assert_eq!(result.citations.len(), 1);
    }

    #[tokio::test]
    async fn empty_after_retry_appends_disclaimer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(
                "The sky is blue.\n### VERIFICATION SOURCES ###\nMy own knowledge",
            ))
            .expect(2)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_verified_answer("Why is the sky blue?")
            .await
            .unwrap();

        assert!(result.citations.is_empty());
        assert_eq!(
            result.answer_text,
            format!("The sky is blue.\n\n{}", prompts::SOURCES_UNAVAILABLE)
        );
        assert!(result.retried);
    }

    #[tokio::test]
    async fn failed_retry_falls_back_to_disclaimer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("did not include sources"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "internal" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(completion("Answer without sources."))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_verified_answer("q")
            .await
            .unwrap();
        assert!(result.citations.is_empty());
        assert!(result.answer_text.ends_with(prompts::SOURCES_UNAVAILABLE));
    }

    #[tokio::test]
    async fn first_call_error_skips_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid API Key" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = engine_with(&server.uri(), 60)
            .get_verified_answer("q")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error (401): Invalid API Key");
    }

    #[tokio::test]
    async fn timeout_returns_timeout_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("too late").set_delay(Duration::from_secs(3)))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_with(&server.uri(), 1);
        let err = engine.get_verified_answer("q").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout));
        assert_eq!(err.to_string(), "Timeout error");
    }

    #[tokio::test]
    async fn get_answer_splits_at_delimiter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("VERIFICATION SOURCES"))
            .respond_with(completion(
                "Body text.\n### VERIFICATION SOURCES ###\nDOI:10.1000/abc\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let result = engine_with(&server.uri(), 60)
            .get_answer("q")
            .await
            .unwrap();
        assert_eq!(
            result,
            CompletionResult {
                answer_text: "Body text.".to_string(),
                raw_source_block: Some("DOI:10.1000/abc".to_string()),
                raw: "Body text.\n### VERIFICATION SOURCES ###\nDOI:10.1000/abc\n".to_string(),
            }
        );
    }
}
