//! Wire types for the chat endpoint.
//!
//! The success shape mirrors the upstream completion API so existing
//! clients can parse either end of the pipe.

use serde::{Deserialize, Serialize};

use crate::gateway::ChatTurn;

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Recent conversation, most-recent-last.
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Success body for `POST /chat`, mirroring the upstream shape.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Serialize)]
pub struct ResponseChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Serialize)]
pub struct ResponseMessage {
    pub content: String,
}

impl ChatResponse {
    pub fn from_reply(content: String) -> Self {
        Self {
            choices: vec![ResponseChoice {
                message: ResponseMessage { content },
            }],
        }
    }
}

/// Error body for every non-2xx chat response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
