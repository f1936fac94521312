//! Backend-agnostic `Database` trait — single async interface for all
//! persistence the service touches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::billing::model::UsageRecord;
use crate::catalog::model::Tutorial;
use crate::error::DatabaseError;
use crate::gateway::Role;
use crate::profile::model::UserPreferences;

/// A persisted chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct StoredTurn {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic database trait covering preferences, tutorials, chat
/// turns, and usage records.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Preferences ─────────────────────────────────────────────────

    /// Load a user's preferences, if the survey was ever submitted.
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, DatabaseError>;

    /// Wholesale upsert of a user's preferences.
    async fn upsert_preferences(&self, prefs: &UserPreferences) -> Result<(), DatabaseError>;

    /// Delete a user's preferences. Returns whether a row existed.
    async fn delete_preferences(&self, user_id: &str) -> Result<bool, DatabaseError>;

    // ── Tutorials ───────────────────────────────────────────────────

    /// Insert a tutorial into the catalog (seeding and tests).
    async fn insert_tutorial(&self, tutorial: &Tutorial) -> Result<(), DatabaseError>;

    /// Number of tutorials in the catalog.
    async fn tutorial_count(&self) -> Result<i64, DatabaseError>;

    /// Tutorials whose category is in `categories`, ordered by level
    /// ascending so foundational material is listed first.
    async fn tutorials_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Tutorial>, DatabaseError>;

    // ── Chat turns ──────────────────────────────────────────────────

    /// Append one turn to a user's conversation log. Returns the row id.
    async fn append_turn(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, DatabaseError>;

    /// All of a user's turns, creation time ascending.
    async fn list_turns(&self, user_id: &str) -> Result<Vec<StoredTurn>, DatabaseError>;

    /// Bulk-delete a user's turns (conversation reset). Returns the count.
    async fn delete_turns(&self, user_id: &str) -> Result<usize, DatabaseError>;

    // ── Usage / entitlement ─────────────────────────────────────────

    /// Load a user's usage record, if any checkout ever completed.
    async fn get_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, DatabaseError>;

    /// Idempotent upsert keyed by the provider-assigned reference id.
    /// Returns `false` when the event was already applied.
    async fn upsert_usage(&self, record: &UsageRecord) -> Result<bool, DatabaseError>;

    /// Add reported completion tokens to a user's counter.
    async fn add_tokens_used(&self, user_id: &str, tokens: u32) -> Result<(), DatabaseError>;
}
