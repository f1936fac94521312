//! Preference data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-reported skill level from the onboarding survey.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for SkillLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown skill level: {other}")),
        }
    }
}

impl SkillLevel {
    /// Integer rank used for DB ordering (simpler material sorts first).
    pub fn rank(&self) -> i64 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
        }
    }

    /// Inverse of [`SkillLevel::rank`]. Unknown ranks fall back to beginner.
    pub fn from_rank(rank: i64) -> Self {
        match rank {
            2 => Self::Advanced,
            1 => Self::Intermediate,
            _ => Self::Beginner,
        }
    }
}

/// The fixed catalog of monetization categories a user can pick goals from.
pub const GOAL_CATALOG: &[&str] = &[
    "affiliate_marketing",
    "dropshipping",
    "content_creation",
    "email_marketing",
    "freelancing",
    "print_on_demand",
];

/// Fallback goal description used when a user has no stored goals.
pub const DEFAULT_GOAL: &str = "making money online";

/// Whether a goal tag is part of the fixed catalog.
pub fn is_known_goal(tag: &str) -> bool {
    GOAL_CATALOG.contains(&tag)
}

/// A user's declared goals and skill level.
///
/// One row per user. Overwritten wholesale on survey submit, deleted on
/// survey reset. The chat pipeline only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub skill_level: SkillLevel,
    /// Goal tags drawn from [`GOAL_CATALOG`].
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<u8>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Fully-populated default value substituted at the loading boundary
    /// when a user has no stored preferences, so the prompt composer never
    /// sees an absent record.
    pub fn fallback(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            skill_level: SkillLevel::default(),
            goals: Vec::new(),
            age_range: None,
            hours_per_week: None,
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Human-readable goal list for the system prompt.
    pub fn goal_line(&self) -> String {
        if self.goals.is_empty() {
            DEFAULT_GOAL.to_string()
        } else {
            self.goals.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_level_rank_roundtrip() {
        for level in [
            SkillLevel::Beginner,
            SkillLevel::Intermediate,
            SkillLevel::Advanced,
        ] {
            assert_eq!(SkillLevel::from_rank(level.rank()), level);
        }
        assert_eq!(SkillLevel::from_rank(99), SkillLevel::Beginner);
    }

    #[test]
    fn skill_level_orders_beginner_first() {
        assert!(SkillLevel::Beginner < SkillLevel::Advanced);
    }

    #[test]
    fn fallback_preferences_use_default_goal() {
        let prefs = UserPreferences::fallback("u1");
        assert_eq!(prefs.user_id, "u1");
        assert_eq!(prefs.skill_level, SkillLevel::Beginner);
        assert_eq!(prefs.goal_line(), DEFAULT_GOAL);
    }

    #[test]
    fn goal_line_joins_stored_goals() {
        let prefs = UserPreferences {
            goals: vec!["dropshipping".to_string(), "freelancing".to_string()],
            ..UserPreferences::fallback("u1")
        };
        assert_eq!(prefs.goal_line(), "dropshipping, freelancing");
    }

    #[test]
    fn goal_catalog_membership() {
        assert!(is_known_goal("dropshipping"));
        assert!(!is_known_goal("day_trading"));
    }

    #[test]
    fn preferences_serde_roundtrip() {
        let prefs = UserPreferences {
            user_id: "u1".to_string(),
            skill_level: SkillLevel::Advanced,
            goals: vec!["affiliate_marketing".to_string()],
            age_range: Some("25-34".to_string()),
            hours_per_week: Some(10),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&prefs).unwrap();
        let parsed: UserPreferences = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.skill_level, SkillLevel::Advanced);
        assert_eq!(parsed.goals, prefs.goals);
        assert_eq!(parsed.hours_per_week, Some(10));
    }
}
