//! Live completion over an OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{
    build_summary_prompt, parse_completion, CompletionError, CompletionGateway, CompletionResult,
};

/// Raw text generation: one prompt in, the model's reply out.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    r#type: Option<String>,
}

pub struct ChatCompletionsBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl ChatCompletionsBackend {
    pub fn new(
        endpoint: String,
        model: String,
        api_key: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Backend(format!("failed to build HTTP client: {}", e)))?;

        info!(
            "Initialized chat completions backend with endpoint: {} (model {})",
            endpoint, model
        );

        Ok(Self {
            client,
            endpoint,
            model,
            api_key,
            temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionsBackend {
    async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!("Sending completion request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Backend(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Backend(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("Completion request failed with status {}: {}", status, body);

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(CompletionError::Backend(format!(
                    "{} (status {}, type: {:?})",
                    error_response.error.message, status, error_response.error.r#type
                )));
            }

            return Err(CompletionError::Backend(format!(
                "status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            CompletionError::MalformedResponse(format!("unexpected response envelope: {}", e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".to_string()))
    }
}

/// Prompt → backend → two-pass JSON parse.
pub struct LlmGateway<B: CompletionBackend> {
    backend: B,
}

impl<B: CompletionBackend> LlmGateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: CompletionBackend> CompletionGateway for LlmGateway<B> {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn complete(
        &self,
        title: &str,
        transcript: &str,
    ) -> Result<CompletionResult, CompletionError> {
        let prompt = build_summary_prompt(title, transcript);
        let raw = self.backend.generate(&prompt).await?;

        parse_completion(&raw).inspect_err(|_| {
            let preview: String = raw.chars().take(160).collect();
            warn!("Completion backend returned non-JSON output: {}", preview);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedBackend {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedBackend {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(CompletionError::Backend)
        }
    }

    #[tokio::test]
    async fn test_gateway_sends_prompt_and_parses_reply() {
        let gateway = LlmGateway::new(CannedBackend::ok(
            r#"Sure! {"summary":"Roadmap agreed.","action_items":[{"text":"Draft Q3 plan","owner":"Lee"}]}"#,
        ));

        let result = gateway.complete("Planning", "Long transcript.").await.unwrap();
        assert_eq!(result.summary, "Roadmap agreed.");
        assert_eq!(result.action_items[0].owner.as_deref(), Some("Lee"));

        let prompts = gateway.backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Title: Planning"));
        assert!(prompts[0].contains("Long transcript."));
    }

    #[tokio::test]
    async fn test_gateway_rejects_prose_reply() {
        let gateway = LlmGateway::new(CannedBackend::ok("No summary available, sorry."));
        let err = gateway.complete("t", "x").await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_gateway_propagates_backend_errors() {
        let gateway = LlmGateway::new(CannedBackend::failing("connection refused"));
        let err = gateway.complete("t", "x").await.unwrap_err();
        assert!(matches!(err, CompletionError::Backend(ref m) if m == "connection refused"));
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama-3.1-8b-instant");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_chat_response_parsing() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("{}"));

        let empty: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}
