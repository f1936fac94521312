//! OpenAI-compatible chat-completions adapter.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GatewayError;

use super::{ChatTurn, CompletionGateway, CompletionReply, GatewayConfig};

/// Gateway speaking the `POST {api_base}/chat/completions` contract with a
/// bearer credential.
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAiGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn exchange(&self, messages: Vec<ChatTurn>) -> Result<CompletionReply, GatewayError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                message,
            });
        }

        let payload: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| GatewayError::UpstreamUnavailable {
                    reason: format!("malformed completion payload: {e}"),
                })?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::UpstreamUnavailable {
                reason: "completion payload had no choices".to_string(),
            })?;

        Ok(CompletionReply {
            content,
            total_tokens: payload.usage.map(|u| u.total_tokens),
        })
    }
}

#[async_trait::async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
    ) -> Result<CompletionReply, GatewayError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatTurn::system(system_prompt));
        messages.extend_from_slice(history);

        debug!(
            model = %self.config.model,
            turns = messages.len(),
            "Forwarding completion request"
        );

        // Hard budget for the whole exchange, including reading the body.
        match tokio::time::timeout(self.config.timeout, self.exchange(messages)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::UpstreamTimeout {
                budget: self.config.timeout,
            }),
        }
    }
}
