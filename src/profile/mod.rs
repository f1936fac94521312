//! User preference profiles from the onboarding survey.

pub mod model;
pub mod routes;

pub use model::{SkillLevel, UserPreferences, DEFAULT_GOAL, GOAL_CATALOG};
