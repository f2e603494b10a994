//! OpenAI-compatible `/chat/completions` client (Groq speaks this dialect).

use async_trait::async_trait;
use pagegen_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{LlmClient, ServiceError};

pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
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
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .build()
            .map_err(|error| ServiceError::transport(format!("http client setup failed: {error}")))?;
        Ok(Self {
            http,
            endpoint: chat_endpoint(base_url),
            api_key,
            model: model.into(),
            temperature,
        })
    }

    /// Builds the client from validated configuration and its credential.
    pub fn from_config(config: &LlmConfig, api_key: SecretString) -> Result<Self, ServiceError> {
        Self::new(&config.base_url, api_key, config.model.clone(), config.temperature)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|error| ServiceError::transport(format!("request failed: {error}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| ServiceError::transport(format!("could not read response body: {error}")))?;
        let content = read_completion(status, &body)?;

        debug!(model = %self.model, response_chars = content.len(), "completion received");
        Ok(content)
    }
}

/// Maps a raw HTTP status and body onto the completion text.
fn read_completion(status: u16, body: &str) -> Result<String, ServiceError> {
    if !(200..300).contains(&status) {
        return Err(ServiceError::status(status, truncate(body.trim(), 512)));
    }

    let payload: ChatResponse = serde_json::from_str(body)
        .map_err(|error| ServiceError::decode(format!("invalid completion payload: {error}")))?;

    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ServiceError::decode("completion payload had no message content"))
}

fn chat_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/chat/completions")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
