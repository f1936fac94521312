//! Tutorial data model.

use serde::{Deserialize, Serialize};

use crate::profile::SkillLevel;

/// A single lesson from the course catalog.
///
/// Reference data: not user-owned, never mutated by the chat pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: String,
    pub title: String,
    /// Monetization category tag, matched against user goal tags.
    pub category: String,
    pub level: SkillLevel,
    pub body: String,
    /// Ordered talking points surfaced in the system prompt.
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}
