//! Chat orchestrator — the request pipeline behind `POST /chat`.
//!
//! Every failure short of the gateway call degrades to a narrower
//! capability instead of aborting the request: a missing or unreadable
//! preference row becomes the fallback profile, an unreadable catalog
//! becomes an empty tutorial list, and a failed history write is logged
//! and skipped. Only a gateway failure propagates to the caller.

use std::sync::Arc;

use tracing::warn;

use crate::catalog::Tutorial;
use crate::config::ChatConfig;
use crate::error::GatewayError;
use crate::gateway::{ChatTurn, CompletionGateway, Role};
use crate::profile::UserPreferences;
use crate::prompt;
use crate::store::Database;

/// Result of a completed chat exchange.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    /// Total tokens the provider reported, for handler-side accounting.
    pub total_tokens: Option<u32>,
}

/// Ties preference loading, tutorial selection, prompt composition, the
/// gateway call, and turn persistence together per request.
pub struct ChatOrchestrator {
    db: Arc<dyn Database>,
    gateway: Arc<dyn CompletionGateway>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(
        db: Arc<dyn Database>,
        gateway: Arc<dyn CompletionGateway>,
        config: ChatConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            config,
        }
    }

    /// Run the pipeline for one request.
    ///
    /// `user_id: None` serves in stateless mode: full reply, no
    /// preferences, nothing persisted.
    pub async fn handle(
        &self,
        user_id: Option<&str>,
        messages: &[ChatTurn],
    ) -> Result<ChatOutcome, GatewayError> {
        let prefs = match user_id {
            Some(id) => self
                .load_preferences(id)
                .await
                .unwrap_or_else(|| UserPreferences::fallback(id)),
            None => UserPreferences::fallback(""),
        };

        let tutorials = if prefs.goals.is_empty() {
            Vec::new()
        } else {
            self.load_tutorials(&prefs.goals).await
        };

        let system_prompt = prompt::compose(&prefs, &tutorials);
        let window = truncate_history(messages, self.config.history_window);
        let reply = self.gateway.complete(&system_prompt, window).await?;

        if let Some(id) = user_id {
            self.persist_exchange(id, messages, &reply.content).await;
        }

        Ok(ChatOutcome {
            reply: reply.content,
            total_tokens: reply.total_tokens,
        })
    }

    async fn load_preferences(&self, user_id: &str) -> Option<UserPreferences> {
        match self.db.get_preferences(user_id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(user_id, error = %e, "Preference load failed, proceeding without preferences");
                None
            }
        }
    }

    async fn load_tutorials(&self, goals: &[String]) -> Vec<Tutorial> {
        match self.db.tutorials_by_categories(goals).await {
            Ok(tutorials) => tutorials,
            Err(e) => {
                warn!(error = %e, "Tutorial load failed, proceeding without tutorial context");
                Vec::new()
            }
        }
    }

    /// Persist both sides of the exchange, user turn first so a crash
    /// between the writes never leaves an assistant turn without its
    /// prompting user turn. Failures are logged, never surfaced.
    async fn persist_exchange(&self, user_id: &str, messages: &[ChatTurn], reply: &str) {
        let Some(user_turn) = messages.iter().rev().find(|t| t.role == Role::User) else {
            warn!(user_id, "No user turn in request, skipping persistence");
            return;
        };

        if let Err(e) = self
            .db
            .append_turn(user_id, Role::User, &user_turn.content)
            .await
        {
            warn!(user_id, error = %e, "Failed to persist user turn, skipping assistant turn");
            return;
        }

        if let Err(e) = self.db.append_turn(user_id, Role::Assistant, reply).await {
            warn!(user_id, error = %e, "Failed to persist assistant turn, history is incomplete");
        }
    }
}

/// The trailing `window` turns of `messages`; full history stays in the
/// conversation store for display.
fn truncate_history(messages: &[ChatTurn], window: usize) -> &[ChatTurn] {
    &messages[messages.len().saturating_sub(window)..]
}
