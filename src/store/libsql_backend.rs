//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases; timestamps are stored as
//! RFC 3339 text, list columns as JSON.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::billing::model::{Tier, UsageRecord};
use crate::catalog::model::Tutorial;
use crate::error::DatabaseError;
use crate::gateway::Role;
use crate::profile::model::{SkillLevel, UserPreferences};
use crate::store::migrations;
use crate::store::traits::{Database, StoredTurn};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn str_to_role(s: &str) -> Role {
    match s {
        "assistant" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

fn str_to_tier(s: &str) -> Tier {
    s.parse().unwrap_or(Tier::Starter)
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn opt_int(n: Option<u8>) -> libsql::Value {
    match n {
        Some(n) => libsql::Value::Integer(n as i64),
        None => libsql::Value::Null,
    }
}

const PREFERENCE_COLUMNS: &str = "user_id, skill_level, goals, age_range, hours_per_week, updated_at";

fn row_to_preferences(row: &libsql::Row) -> Result<UserPreferences, libsql::Error> {
    let skill_str: String = row.get(1)?;
    let goals_str: String = row.get(2)?;
    let hours: Option<i64> = row.get(4).ok();
    let updated_str: String = row.get(5)?;

    Ok(UserPreferences {
        user_id: row.get(0)?,
        skill_level: skill_str.parse().unwrap_or_default(),
        goals: serde_json::from_str(&goals_str).unwrap_or_default(),
        age_range: row.get(3).ok(),
        hours_per_week: hours.map(|h| h as u8),
        updated_at: parse_datetime(&updated_str),
    })
}

const TUTORIAL_COLUMNS: &str = "id, title, category, level, body, key_points, video_url";

fn row_to_tutorial(row: &libsql::Row) -> Result<Tutorial, libsql::Error> {
    let level: i64 = row.get(3)?;
    let key_points_str: String = row.get(5)?;

    Ok(Tutorial {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        level: SkillLevel::from_rank(level),
        body: row.get(4)?,
        key_points: serde_json::from_str(&key_points_str).unwrap_or_default(),
        video_url: row.get(6).ok(),
    })
}

const TURN_COLUMNS: &str = "id, user_id, role, content, created_at";

fn row_to_turn(row: &libsql::Row) -> Result<StoredTurn, libsql::Error> {
    let role_str: String = row.get(2)?;
    let created_str: String = row.get(4)?;

    Ok(StoredTurn {
        id: row.get(0)?,
        user_id: row.get(1)?,
        role: str_to_role(&role_str),
        content: row.get(3)?,
        created_at: parse_datetime(&created_str),
    })
}

const USAGE_COLUMNS: &str =
    "user_id, tier, tokens_used, tokens_limit, period_start, period_end, provider_ref";

fn row_to_usage(row: &libsql::Row) -> Result<UsageRecord, libsql::Error> {
    let tier_str: String = row.get(1)?;
    let tokens_used: i64 = row.get(2)?;
    let tokens_limit: i64 = row.get(3)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;

    Ok(UsageRecord {
        user_id: row.get(0)?,
        tier: str_to_tier(&tier_str),
        tokens_used: tokens_used as u32,
        tokens_limit: tokens_limit as u32,
        period_start: parse_datetime(&start_str),
        period_end: parse_datetime(&end_str),
        provider_ref: row.get(6)?,
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Preferences ─────────────────────────────────────────────────

    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {PREFERENCE_COLUMNS} FROM preferences WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_preferences: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let prefs = row_to_preferences(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_preferences row parse: {e}")))?;
                Ok(Some(prefs))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_preferences: {e}"))),
        }
    }

    async fn upsert_preferences(&self, prefs: &UserPreferences) -> Result<(), DatabaseError> {
        let goals = serde_json::to_string(&prefs.goals)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO preferences (user_id, skill_level, goals, age_range, hours_per_week, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id) DO UPDATE SET
                skill_level = excluded.skill_level,
                goals = excluded.goals,
                age_range = excluded.age_range,
                hours_per_week = excluded.hours_per_week,
                updated_at = excluded.updated_at",
            params![
                prefs.user_id.clone(),
                prefs.skill_level.to_string(),
                goals,
                opt_text(prefs.age_range.as_deref()),
                opt_int(prefs.hours_per_week),
                prefs.updated_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("upsert_preferences: {e}")))?;

        debug!(user_id = %prefs.user_id, "Preferences upserted");
        Ok(())
    }

    async fn delete_preferences(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM preferences WHERE user_id = ?1", params![user_id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_preferences: {e}")))?;
        Ok(count > 0)
    }

    // ── Tutorials ───────────────────────────────────────────────────

    async fn insert_tutorial(&self, tutorial: &Tutorial) -> Result<(), DatabaseError> {
        let key_points = serde_json::to_string(&tutorial.key_points)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.conn()
            .execute(
                "INSERT INTO tutorials (id, title, category, level, body, key_points, video_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    tutorial.id.clone(),
                    tutorial.title.clone(),
                    tutorial.category.clone(),
                    tutorial.level.rank(),
                    tutorial.body.clone(),
                    key_points,
                    opt_text(tutorial.video_url.as_deref()),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_tutorial: {e}")))?;
        Ok(())
    }

    async fn tutorial_count(&self) -> Result<i64, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM tutorials", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("tutorial_count: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => Ok(row.get(0).unwrap_or(0)),
            _ => Ok(0),
        }
    }

    async fn tutorials_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Tutorial>, DatabaseError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        // The catalog is small reference data; scan ordered and filter here
        // rather than building a variable-arity IN clause.
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TUTORIAL_COLUMNS} FROM tutorials ORDER BY level ASC, title ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("tutorials_by_categories: {e}")))?;

        let mut tutorials = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_tutorial(&row) {
                Ok(t) if categories.iter().any(|c| c == &t.category) => tutorials.push(t),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping tutorial row: {e}");
                }
            }
        }
        Ok(tutorials)
    }

    // ── Chat turns ──────────────────────────────────────────────────

    async fn append_turn(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO chat_messages (id, user_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.clone(), user_id, role_to_str(role), content, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_turn: {e}")))?;

        debug!(id = %id, user_id, role = role_to_str(role), "Chat turn appended");
        Ok(id)
    }

    async fn list_turns(&self, user_id: &str) -> Result<Vec<StoredTurn>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TURN_COLUMNS} FROM chat_messages WHERE user_id = ?1
                     ORDER BY created_at ASC"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_turns: {e}")))?;

        let mut turns = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_turn(&row) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!("Skipping chat turn row: {e}");
                }
            }
        }
        Ok(turns)
    }

    async fn delete_turns(&self, user_id: &str) -> Result<usize, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM chat_messages WHERE user_id = ?1", params![user_id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_turns: {e}")))?;

        if count > 0 {
            info!(user_id, count, "Conversation reset");
        }
        Ok(count as usize)
    }

    // ── Usage / entitlement ─────────────────────────────────────────

    async fn get_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {USAGE_COLUMNS} FROM usage_records WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_usage: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let record = row_to_usage(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_usage row parse: {e}")))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_usage: {e}"))),
        }
    }

    async fn upsert_usage(&self, record: &UsageRecord) -> Result<bool, DatabaseError> {
        // Replayed delivery of the same provider event: leave the stored
        // record untouched.
        if let Some(existing) = self.get_usage(&record.user_id).await?
            && existing.provider_ref == record.provider_ref
        {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO usage_records (user_id, tier, tokens_used, tokens_limit,
                    period_start, period_end, provider_ref, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (user_id) DO UPDATE SET
                    tier = excluded.tier,
                    tokens_used = excluded.tokens_used,
                    tokens_limit = excluded.tokens_limit,
                    period_start = excluded.period_start,
                    period_end = excluded.period_end,
                    provider_ref = excluded.provider_ref,
                    updated_at = excluded.updated_at",
                params![
                    record.user_id.clone(),
                    record.tier.to_string(),
                    record.tokens_used as i64,
                    record.tokens_limit as i64,
                    record.period_start.to_rfc3339(),
                    record.period_end.to_rfc3339(),
                    record.provider_ref.clone(),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_usage: {e}")))?;

        debug!(user_id = %record.user_id, tier = %record.tier, "Usage record upserted");
        Ok(true)
    }

    async fn add_tokens_used(&self, user_id: &str, tokens: u32) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "UPDATE usage_records SET tokens_used = tokens_used + ?1, updated_at = ?2
                 WHERE user_id = ?3",
                params![tokens as i64, now, user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("add_tokens_used: {e}")))?;
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn prefs(user_id: &str, goals: &[&str]) -> UserPreferences {
        UserPreferences {
            user_id: user_id.to_string(),
            skill_level: SkillLevel::Intermediate,
            goals: goals.iter().map(|s| s.to_string()).collect(),
            age_range: Some("25-34".to_string()),
            hours_per_week: Some(12),
            updated_at: Utc::now(),
        }
    }

    fn tutorial(id: &str, category: &str, level: SkillLevel, title: &str) -> Tutorial {
        Tutorial {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            level,
            body: "body".to_string(),
            key_points: vec!["a".to_string(), "b".to_string()],
            video_url: None,
        }
    }

    #[tokio::test]
    async fn preferences_roundtrip_and_overwrite() {
        let db = test_db().await;
        db.upsert_preferences(&prefs("u1", &["dropshipping"])).await.unwrap();

        let loaded = db.get_preferences("u1").await.unwrap().unwrap();
        assert_eq!(loaded.skill_level, SkillLevel::Intermediate);
        assert_eq!(loaded.goals, vec!["dropshipping"]);
        assert_eq!(loaded.hours_per_week, Some(12));

        // Wholesale overwrite replaces the goal set entirely.
        db.upsert_preferences(&prefs("u1", &["freelancing"])).await.unwrap();
        let loaded = db.get_preferences("u1").await.unwrap().unwrap();
        assert_eq!(loaded.goals, vec!["freelancing"]);
    }

    #[tokio::test]
    async fn preferences_absent_and_delete() {
        let db = test_db().await;
        assert!(db.get_preferences("ghost").await.unwrap().is_none());
        assert!(!db.delete_preferences("ghost").await.unwrap());

        db.upsert_preferences(&prefs("u1", &[])).await.unwrap();
        assert!(db.delete_preferences("u1").await.unwrap());
        assert!(db.get_preferences("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tutorials_filter_by_category_and_order_by_level() {
        let db = test_db().await;
        db.insert_tutorial(&tutorial("t1", "dropshipping", SkillLevel::Advanced, "Scaling"))
            .await
            .unwrap();
        db.insert_tutorial(&tutorial("t2", "dropshipping", SkillLevel::Beginner, "First Store"))
            .await
            .unwrap();
        db.insert_tutorial(&tutorial("t3", "freelancing", SkillLevel::Beginner, "Offers"))
            .await
            .unwrap();

        let found = db
            .tutorials_by_categories(&["dropshipping".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "First Store");
        assert_eq!(found[1].title, "Scaling");

        let both = db
            .tutorials_by_categories(&["dropshipping".to_string(), "freelancing".to_string()])
            .await
            .unwrap();
        assert_eq!(both.len(), 3);

        assert!(db.tutorials_by_categories(&[]).await.unwrap().is_empty());
        assert_eq!(db.tutorial_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn turns_append_in_order_and_reset() {
        let db = test_db().await;
        db.append_turn("u1", Role::User, "how do I start?").await.unwrap();
        db.append_turn("u1", Role::Assistant, "pick a niche").await.unwrap();
        // Consecutive same-role turns are legal.
        db.append_turn("u1", Role::User, "ok").await.unwrap();
        db.append_turn("u1", Role::User, "and then?").await.unwrap();
        db.append_turn("u2", Role::User, "unrelated").await.unwrap();

        let turns = db.list_turns("u1").await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "how do I start?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[3].content, "and then?");

        let deleted = db.delete_turns("u1").await.unwrap();
        assert_eq!(deleted, 4);
        assert!(db.list_turns("u1").await.unwrap().is_empty());
        // Other users' history is untouched.
        assert_eq!(db.list_turns("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn usage_upsert_is_idempotent_per_event() {
        let db = test_db().await;
        let record = UsageRecord::for_checkout("u1", Tier::Pro, "evt_1", Utc::now());

        assert!(db.upsert_usage(&record).await.unwrap());
        db.add_tokens_used("u1", 250).await.unwrap();

        // Replay of the same event id changes nothing.
        assert!(!db.upsert_usage(&record).await.unwrap());
        let loaded = db.get_usage("u1").await.unwrap().unwrap();
        assert_eq!(loaded.tokens_used, 250);
        assert_eq!(loaded.provider_ref, "evt_1");

        // A new checkout event resets the counter and window.
        let renewal = UsageRecord::for_checkout("u1", Tier::Elite, "evt_2", Utc::now());
        assert!(db.upsert_usage(&renewal).await.unwrap());
        let loaded = db.get_usage("u1").await.unwrap().unwrap();
        assert_eq!(loaded.tokens_used, 0);
        assert_eq!(loaded.tier, Tier::Elite);
        assert_eq!(loaded.provider_ref, "evt_2");
    }

    #[tokio::test]
    async fn get_usage_absent_user() {
        let db = test_db().await;
        assert!(db.get_usage("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coach.db");

        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.append_turn("u1", Role::User, "persisted?").await.unwrap();
        }

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let turns = db.list_turns("u1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "persisted?");
    }
}
