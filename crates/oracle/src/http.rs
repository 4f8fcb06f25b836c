// In crates/oracle/src/http.rs

use std::time::Duration;

use app_config::HttpOracleSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, OracleTransport, Result};

/// Sends prompts to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
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
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    /// Constructs a new client from `HttpOracleSettings`.
    pub fn new(settings: &HttpOracleSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Extracts the first choice's text from a completion payload.
///
/// A payload without choices is a protocol failure. A choice whose content
/// is null yields an empty reply, which is left for the caller to interpret.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let choice = response.choices.into_iter().next().ok_or(Error::EmptyResponse)?;
    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

#[async_trait]
impl OracleTransport for ChatCompletionsClient {
    fn name(&self) -> &'static str {
        "ChatCompletions"
    }

    async fn send_prompt(&mut self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let mut builder = self.http_client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(Error::RequestFailed)?;
        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            return Err(Error::ApiError {
                status: status.as_u16(),
                msg: text,
            });
        }

        let reply = parse_completion(&text)?;
        tracing::debug!(model = %self.model, chars = reply.len(), "Received completion.");
        Ok(reply)
    }
}
