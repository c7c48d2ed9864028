//! Remote rewrite collaborator interface
//!
//! A backend receives only token-redacted text and category labels, and
//! answers with a single text completion.

use crate::error::Result;
use crate::privacy::Category;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fixed instruction sent with every rewrite request
pub const SYSTEM_PROMPT: &str = "You rewrite user prompts so they can be sent safely to an AI \
assistant. The text you receive has already had sensitive values replaced with bracketed \
placeholders such as [EMAIL_REDACTED]. Reword it naturally so it reads as a normal request, \
keep the user's intent and every non-sensitive detail, and refer to removed items generically \
(for example \"my email address\"). Do not output bracketed placeholders, do not invent \
replacement values, and do not add commentary. Reply with the rewritten text only.";

/// Request handed to a rewrite backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    pub system_prompt: String,
    pub redacted_text: String,
    /// Detected category labels, never raw values
    pub categories: Vec<Category>,
}

impl RewriteRequest {
    pub fn new(redacted_text: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            redacted_text: redacted_text.into(),
            categories,
        }
    }

    /// User message body: the redacted text plus the category list
    pub fn user_message(&self) -> String {
        let labels: Vec<&str> = self.categories.iter().map(|c| c.label()).collect();
        format!(
            "Detected categories: {}\n\nText:\n{}",
            if labels.is_empty() {
                "none".to_string()
            } else {
                labels.join(", ")
            },
            self.redacted_text
        )
    }
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// A backend's answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteCompletion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Remote service that rewords already-redacted text
#[async_trait]
pub trait RewriteBackend: Send + Sync {
    /// Perform a single rewrite attempt
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteCompletion>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
