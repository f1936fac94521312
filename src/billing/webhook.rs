//! Checkout webhook — thin event handler for the payments provider.
//!
//! Delivery is at-least-once: upserts are keyed by the provider-assigned
//! event id, so a replay leaves the stored record untouched.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::billing::model::{Tier, UsageRecord};
use crate::config::BillingConfig;
use crate::store::Database;

/// Header carrying the shared secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Event type that opens (or renews) an entitlement.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Shared state for billing routes.
#[derive(Clone)]
pub struct BillingRouteState {
    pub db: Arc<dyn Database>,
    pub config: BillingConfig,
}

/// A checkout event as delivered by the payments provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutEvent {
    /// Provider-assigned event id; the idempotency key.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub user_id: String,
    pub tier: Tier,
}

/// POST /api/billing/webhook
async fn handle_webhook(
    State(state): State<BillingRouteState>,
    headers: HeaderMap,
    Json(event): Json<CheckoutEvent>,
) -> impl IntoResponse {
    if let Some(secret) = &state.config.webhook_secret {
        let presented = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.expose_secret()) {
            warn!(event_id = %event.id, "Webhook rejected: bad shared secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "invalid webhook secret"})),
            )
                .into_response();
        }
    }

    if event.event_type != CHECKOUT_COMPLETED {
        // Acknowledge so the provider stops redelivering; nothing to do.
        return Json(serde_json::json!({"received": true, "handled": false})).into_response();
    }

    let record = UsageRecord::for_checkout(&event.user_id, event.tier, &event.id, Utc::now());
    match state.db.upsert_usage(&record).await {
        Ok(applied) => {
            info!(
                event_id = %event.id,
                user_id = %event.user_id,
                tier = %event.tier,
                applied,
                "Checkout event processed"
            );
            Json(serde_json::json!({"received": true, "applied": applied})).into_response()
        }
        Err(e) => {
            error!(event_id = %event.id, error = %e, "Failed to record entitlement");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "failed to record entitlement"})),
            )
                .into_response()
        }
    }
}

/// Build the billing REST routes.
pub fn billing_routes(state: BillingRouteState) -> Router {
    Router::new()
        .route("/api/billing/webhook", post(handle_webhook))
        .with_state(state)
}
