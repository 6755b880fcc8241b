/// Client for an OpenAI-compatible chat-completions endpoint
///
/// The service is treated as an opaque text rewriter: a system prompt and a
/// few user messages go in, one string comes out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TextGenerationConfig;
use crate::text::TextError;

/// Marker closing the reasoning preamble of reasoning models
const THINK_END: &str = "</think>";

/// Something that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, messages: &[String]) -> Result<String, TextError>;
}

/// `reqwest`-backed chat-completions client
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
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
    pub fn new(config: &TextGenerationConfig) -> Result<Self, TextError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, system_prompt: &str, messages: &[String]) -> Result<String, TextError> {
        let mut chat = Vec::with_capacity(messages.len() + 1);
        chat.push(ChatMessage {
            role: "system",
            content: system_prompt,
        });
        chat.extend(messages.iter().map(|content| ChatMessage {
            role: "user",
            content,
        }));

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: chat,
        };

        tracing::debug!("Requesting completion from {} ({} messages)", self.endpoint, messages.len());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TextError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(TextError::EmptyResponse)?;

        clean_output(&content).ok_or(TextError::EmptyResponse)
    }
}

/// Drop a reasoning preamble and surrounding whitespace
pub fn clean_output(raw: &str) -> Option<String> {
    let answer = match raw.split_once(THINK_END) {
        Some((_, after)) => after,
        None => raw,
    };

    let answer = answer.trim();
    if answer.is_empty() {
        None
    } else {
        Some(answer.to_string())
    }
}
