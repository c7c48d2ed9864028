//! OpenAI-compatible chat-completions rewrite backend

use super::backend::{RewriteBackend, RewriteCompletion, RewriteRequest, TokenUsage};
use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A string whose `Debug` and `Display` never reveal the value
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the secret value (only for the Authorization header)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
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
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Rewrite backend speaking the OpenAI chat-completions protocol
pub struct OpenAiRewriter {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiRewriter {
    pub fn new(api_key: impl Into<SecretString>, config: &RewriteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&config.base_url),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Build from config, reading the key from `config.api_key_env`.
    ///
    /// Returns `None` when rewriting is disabled or no key is set.
    pub fn from_config(config: &RewriteConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Some(Self::new(key.trim(), config)),
            _ => {
                tracing::info!(
                    env = %config.api_key_env,
                    "No rewrite API key set, remote rewrite disabled"
                );
                None
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiRewriter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .finish()
    }
}

#[async_trait]
impl RewriteBackend for OpenAiRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteCompletion> {
        let user_message = request.user_message();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, url = %self.endpoint(), "Sending rewrite request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Remote(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(200).collect();
            return Err(Error::Remote(format!("HTTP {}: {}", status.as_u16(), snippet)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Remote(format!("invalid response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Remote("response has no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        Ok(RewriteCompletion {
            text: content,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url
        .trim_end_matches('/')
        .trim_end_matches("/v1")
        .trim_end_matches('/')
        .to_string()
}
