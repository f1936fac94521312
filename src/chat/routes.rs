//! Chat endpoints: the gated `POST /chat` pipeline plus history access.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::billing;
use crate::chat::model::{ChatRequest, ChatResponse, ErrorBody};
use crate::chat::orchestrator::ChatOrchestrator;
use crate::config::BillingConfig;
use crate::error::GatewayError;
use crate::store::Database;

/// Generic degraded-service message. Raw upstream errors never reach the
/// client; they are logged server-side only.
pub const DEGRADED_MESSAGE: &str =
    "We're having trouble connecting right now. Please try again in a moment.";

/// Shared state for chat routes.
#[derive(Clone)]
pub struct ChatRouteState {
    pub db: Arc<dyn Database>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub billing: BillingConfig,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /chat
async fn post_chat(
    State(state): State<ChatRouteState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let user_id = request.user_id.as_deref().filter(|id| !id.is_empty());

    // Entitlement gate: short-circuit before any gateway call so unentitled
    // requests never incur completion costs.
    if state.billing.enforce_entitlement {
        let Some(id) = user_id else {
            return error_response(StatusCode::UNAUTHORIZED, "Sign in to use the coach");
        };
        match billing::active_entitlement(state.db.as_ref(), id, Utc::now()).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_response(
                    StatusCode::FORBIDDEN,
                    "An active subscription is required",
                );
            }
            Err(e) => {
                // Fail closed: an unverifiable entitlement is not a free pass.
                error!(user_id = %id, error = %e, "Entitlement check failed");
                return error_response(StatusCode::SERVICE_UNAVAILABLE, DEGRADED_MESSAGE);
            }
        }
    }

    if request.messages.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "messages must not be empty");
    }

    match state.orchestrator.handle(user_id, &request.messages).await {
        Ok(outcome) => {
            if let (Some(id), Some(tokens)) = (user_id, outcome.total_tokens)
                && let Err(e) = state.db.add_tokens_used(id, tokens).await
            {
                warn!(user_id = %id, error = %e, "Failed to record token usage");
            }
            Json(ChatResponse::from_reply(outcome.reply)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Completion gateway failure");
            let status = match e {
                GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, DEGRADED_MESSAGE)
        }
    }
}

/// GET /api/chat/history/{user_id}
///
/// Full stored history, creation time ascending. Truncation applies only
/// to what is forwarded upstream, never to what is displayed.
async fn get_history(
    State(state): State<ChatRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.db.list_turns(&user_id).await {
        Ok(turns) => Json(turns).into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to load chat history");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
        }
    }
}

/// DELETE /api/chat/history/{user_id}
async fn delete_history(
    State(state): State<ChatRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.db.delete_turns(&user_id).await {
        Ok(deleted) => Json(serde_json::json!({"deleted": deleted})).into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to reset conversation");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to reset history")
        }
    }
}

/// Build the chat routes. CORS is permissive by contract: the marketing
/// site and the app are served from different origins.
pub fn chat_routes(state: ChatRouteState) -> Router {
    Router::new()
        .route("/chat", post(post_chat))
        .route(
            "/api/chat/history/{user_id}",
            get(get_history).delete(delete_history),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
