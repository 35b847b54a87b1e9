/// OpenAI-compatible chat-completions client
///
/// Works with any endpoint that speaks `POST {base}/chat/completions`
/// (OpenAI, Azure OpenAI v1, OpenRouter, local gateways). Requests are
/// non-streaming and never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatRequest, GenerationError, TextGenerator};
use crate::config::OpenAiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: &OpenAiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, AI summaries are disabled");
        } else {
            tracing::info!(
                base_url = %config.base_url,
                model = %config.model,
                "Initialized chat-completions client"
            );
        }

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> CompletionBody<'a> {
        CompletionBody {
            model: &self.model,
            temperature: request.temperature,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> OpenAiConfig {
        OpenAiConfig {
            api_key: api_key.map(str::to_string),
            base_url: "http://127.0.0.1:9/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.6,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let generator = OpenAiGenerator::new(&config(Some("sk-test"))).unwrap();
        let request = ChatRequest {
            system: "be brief".to_string(),
            user: "Ada — TODAY: ship".to_string(),
            temperature: 0.6,
        };

        let json = serde_json::to_value(generator.body(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be brief");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let generator = OpenAiGenerator::new(&config(None)).unwrap();
        let request = ChatRequest {
            system: String::new(),
            user: String::new(),
            temperature: 0.6,
        };

        let result = generator.generate(&request).await;
        assert!(matches!(result, Err(GenerationError::NotConfigured)));
    }

    #[test]
    fn test_response_parsing() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"<p>ok</p>"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("<p>ok</p>"));
    }
}
