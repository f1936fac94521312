//! Completion gateway — adapter over the external chat-completion API.
//!
//! The gateway does not retry; retry policy, if any, belongs to the caller.
//! Creativity and reply length are fixed configuration, not caller-supplied.

mod openai;

pub use openai::OpenAiGateway;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Role of a chat turn, in the completion API's wire vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation, in the completion API's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A successful reply from the completion API.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub content: String,
    /// Total tokens the provider reported for the exchange, when available.
    pub total_tokens: Option<u32>,
}

/// Configuration for the completion gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Hard budget for the whole upstream exchange.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: SecretString::from(""),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Adapter trait over the external language-model API.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Forward a system prompt and ordered history; return the reply text
    /// or a typed upstream failure. No internal retry.
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
    ) -> Result<CompletionReply, GatewayError>;
}
