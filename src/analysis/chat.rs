// file: src/analysis/chat.rs
// description: Chat completion client for OpenAI-compatible APIs
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::AnalysisConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the first choice's message content.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    fn model(&self) -> &str;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn describe_failure(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => format!("{}: {}", status, parsed.error.message),
            Err(_) if body.trim().is_empty() => status.to_string(),
            Err(_) => format!("{}: {}", status, body.trim()),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(
            "Requesting chat completion from {} ({} prompt chars)",
            self.model,
            user.len()
        );

        let response = self
            .authorized(self.client.post(format!("{}/chat/completions", self.base_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Analysis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Analysis(
                Self::describe_failure(response).await,
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Analysis(format!("malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PipelineError::Analysis("response contained no content".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(format!("{}/models", self.base_url)))
            .send()
            .await
            .map_err(|e| PipelineError::Analysis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Analysis(
                Self::describe_failure(response).await,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisGenerator;
    use crate::models::{CompanyMetadata, CompanyRecord};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn equinix() -> Vec<CompanyRecord> {
        vec![CompanyRecord::from_metadata(
            CompanyMetadata {
                ticker: Some("EQIX".to_string()),
                name: Some("Equinix".to_string()),
                ..Default::default()
            },
            0.9,
        )]
    }

    fn client_for(base_url: String) -> OpenAiChatClient {
        OpenAiChatClient::new(&AnalysisConfig {
            api_key: Some("sk-test".to_string()),
            base_url,
            ..AnalysisConfig::default()
        })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let completion = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "system text"},
                    {"role": "user", "content": "user text"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        {"index": 0, "message": {"role": "assistant", "content": "first"}},
                        {"index": 1, "message": {"role": "assistant", "content": "second"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(server.url());
        let text = client.complete("system text", "user text").await.unwrap();

        completion.assert_async().await;
        assert_eq!(text, "first");
    }

    #[tokio::test]
    async fn test_auth_failure_carries_api_message() {
        let mut server = mockito::Server::new_async().await;
        let _completion = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(json!({"error": {"message": "Incorrect API key provided"}}).to_string())
            .create_async()
            .await;

        let err = client_for(server.url())
            .complete("s", "u")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _completion = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let result = client_for(server.url()).complete("s", "u").await;
        assert!(matches!(result, Err(PipelineError::Analysis(_))));
    }

    #[tokio::test]
    async fn test_ping_lists_models() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(json!({"data": []}).to_string())
            .create_async()
            .await;

        assert!(client_for(server.url()).ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_analysis_error_text() {
        let mut server = mockito::Server::new_async().await;
        let _completion = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{not json")
            .create_async()
            .await;

        let generator = AnalysisGenerator::new(Arc::new(client_for(server.url())), "NYSE");
        let text = generator.analyze("data centers", &equinix()).await;

        assert_eq!(
            text,
            "Error generating analysis: malformed response: error decoding response body"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_becomes_analysis_error_text() {
        let generator = AnalysisGenerator::new(
            Arc::new(client_for("http://127.0.0.1:1".to_string())),
            "NYSE",
        );

        let text = generator.analyze("data centers", &equinix()).await;

        assert!(
            text.starts_with("Error generating analysis: request failed: "),
            "unexpected text: {}",
            text
        );
    }
}
