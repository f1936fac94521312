//! REST endpoints for the onboarding survey and profile.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::profile::model::{self, SkillLevel, UserPreferences};
use crate::store::Database;

/// Shared state for profile routes.
#[derive(Clone)]
pub struct ProfileRouteState {
    pub db: Arc<dyn Database>,
}

/// Survey submission body. Replaces the stored preferences wholesale.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmission {
    pub user_id: String,
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub hours_per_week: Option<u8>,
}

/// POST /api/profile
///
/// Wholesale upsert of the user's preferences from the survey.
async fn submit_survey(
    State(state): State<ProfileRouteState>,
    Json(submission): Json<SurveySubmission>,
) -> impl IntoResponse {
    if submission.user_id.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "userId must not be empty"})),
        )
            .into_response();
    }

    let unknown: Vec<&str> = submission
        .goals
        .iter()
        .map(String::as_str)
        .filter(|g| !model::is_known_goal(g))
        .collect();
    if !unknown.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": format!("Unknown goal tags: {}", unknown.join(", "))})),
        )
            .into_response();
    }

    let prefs = UserPreferences {
        user_id: submission.user_id,
        skill_level: submission.skill_level,
        goals: submission.goals,
        age_range: submission.age_range,
        hours_per_week: submission.hours_per_week,
        updated_at: Utc::now(),
    };

    match state.db.upsert_preferences(&prefs).await {
        Ok(()) => {
            info!(user_id = %prefs.user_id, "Survey submitted");
            Json(serde_json::to_value(&prefs).unwrap_or_default()).into_response()
        }
        Err(e) => {
            error!(user_id = %prefs.user_id, error = %e, "Failed to save survey");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to save profile"})),
            )
                .into_response()
        }
    }
}

/// GET /api/profile/{user_id}
///
/// Returns the stored preferences, or 404 if the survey was never submitted.
async fn get_profile(
    State(state): State<ProfileRouteState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.db.get_preferences(&user_id).await {
        Ok(Some(prefs)) => Json(serde_json::to_value(prefs).unwrap_or_default()).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No profile exists yet"})),
        )
            .into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to load profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to load profile"})),
            )
                .into_response()
        }
    }
}

/// DELETE /api/profile/{user_id}
///
/// Survey reset: deletes the preferences row and wipes the user's chat
/// history so the next visit starts from the default greeting.
async fn reset_profile(
    State(state): State<ProfileRouteState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let deleted = match state.db.delete_preferences(&user_id).await {
        Ok(deleted) => deleted,
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to delete profile");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to reset profile"})),
            )
                .into_response();
        }
    };

    let messages_deleted = match state.db.delete_turns(&user_id).await {
        Ok(n) => n,
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to wipe chat history on reset");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to reset profile"})),
            )
                .into_response();
        }
    };

    info!(user_id = %user_id, deleted, messages_deleted, "Profile reset");
    Json(serde_json::json!({
        "deleted": deleted,
        "messagesDeleted": messages_deleted,
    }))
    .into_response()
}

/// Build the profile REST routes.
pub fn profile_routes(state: ProfileRouteState) -> Router {
    Router::new()
        .route("/api/profile", post(submit_survey))
        .route(
            "/api/profile/{user_id}",
            get(get_profile).delete(reset_profile),
        )
        .with_state(state)
}
