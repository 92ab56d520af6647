//! `OpenAI`-compatible chat-completion backend.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ApiKey, AssistantError, AssistantRequest, ChatBackend};
use crate::config::AssistantConfig;

/// Blocking client for `POST /v1/chat/completions` and compatible servers.
pub struct OpenAiChat {
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl OpenAiChat {
    /// # Errors
    ///
    /// Returns [`AssistantError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn body<'a>(&'a self, request: &'a AssistantRequest, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Decode a response body into the answer text.
fn parse_completion(status: StatusCode, body: &str) -> Result<String, AssistantError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
        return Err(AssistantError::Provider { message });
    }

    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AssistantError::Provider {
            message: "No answer in response".to_string(),
        })
}

impl ChatBackend for OpenAiChat {
    fn complete(&self, key: &ApiKey, request: &AssistantRequest) -> Result<String, AssistantError> {
        let user = request.user_message();
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key.expose())
            .json(&self.body(request, &user))
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        parse_completion(status, &body)
    }
}
