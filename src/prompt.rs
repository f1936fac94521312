//! System prompt composer.
//!
//! Pure transformation: (preferences, tutorials) → prompt string. No I/O,
//! deterministic, so identical inputs always yield identical prompt text.

use crate::catalog::Tutorial;
use crate::profile::UserPreferences;

/// Persona framing for the coach. Always present.
const PERSONA: &str = "You are Profit Coach, an aggressive, direct, action-oriented mentor for an \
affiliate-marketing course. You push users to take concrete action today, call out excuses, and \
always end with a clear next step. No fluff, no hedging.";

/// Fixed formatting directives so the client can render replies as markdown.
const FORMATTING_DIRECTIVES: &str = "FORMATTING RULES:
- Use **bold** to emphasize the points that matter.
- Break steps and options into bullet lists.
- Use markdown links when pointing at resources.
- Use headings (##) to structure longer answers.";

/// Build the system prompt for a chat request.
///
/// Preferences arrive fully populated (the loading boundary substitutes
/// [`UserPreferences::fallback`] for absent records), so the goal line
/// degrades to the generic default rather than this function branching on
/// absence. An empty tutorial list produces no tutorials block at all.
pub fn compose(prefs: &UserPreferences, tutorials: &[Tutorial]) -> String {
    let mut sections = vec![PERSONA.to_string()];

    sections.push(format!(
        "The user is a {} working toward: {}.",
        prefs.skill_level,
        prefs.goal_line()
    ));

    if !tutorials.is_empty() {
        let mut block = vec!["AVAILABLE TUTORIALS:".to_string()];
        for tutorial in tutorials {
            block.push(format!(
                "- {} ({}): {}",
                tutorial.title,
                tutorial.level,
                tutorial.key_points.join(", ")
            ));
        }
        block.push(
            "Reference these tutorials by name whenever a relevant topic comes up.".to_string(),
        );
        sections.push(block.join("\n"));
    }

    sections.push(FORMATTING_DIRECTIVES.to_string());
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{SkillLevel, DEFAULT_GOAL};

    fn prefs_with_goals(goals: &[&str]) -> UserPreferences {
        UserPreferences {
            goals: goals.iter().map(|s| s.to_string()).collect(),
            ..UserPreferences::fallback("u1")
        }
    }

    fn tutorial(title: &str, level: SkillLevel, points: &[&str]) -> Tutorial {
        Tutorial {
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            category: "dropshipping".to_string(),
            level,
            body: String::new(),
            key_points: points.iter().map(|s| s.to_string()).collect(),
            video_url: None,
        }
    }

    #[test]
    fn identical_inputs_yield_identical_prompts() {
        let prefs = prefs_with_goals(&["dropshipping"]);
        let tutorials = vec![tutorial("Store Setup", SkillLevel::Beginner, &["suppliers"])];
        assert_eq!(compose(&prefs, &tutorials), compose(&prefs, &tutorials));
    }

    #[test]
    fn empty_tutorials_produce_no_block() {
        let prompt = compose(&prefs_with_goals(&["freelancing"]), &[]);
        assert!(!prompt.contains("AVAILABLE TUTORIALS"));
    }

    #[test]
    fn absent_goals_fall_back_to_generic_default() {
        let prompt = compose(&UserPreferences::fallback("u1"), &[]);
        assert!(prompt.contains(DEFAULT_GOAL));
    }

    #[test]
    fn prompt_always_carries_persona_goals_and_formatting() {
        let prefs = prefs_with_goals(&["dropshipping", "freelancing"]);
        let prompt = compose(&prefs, &[]);
        assert!(prompt.contains("Profit Coach"));
        assert!(prompt.contains("action-oriented"));
        assert!(prompt.contains("dropshipping, freelancing"));
        assert!(prompt.contains("FORMATTING RULES"));
        assert!(prompt.contains("**bold**"));
        assert!(prompt.contains("bullet lists"));
        assert!(prompt.contains("markdown links"));
        assert!(prompt.contains("headings"));
    }

    #[test]
    fn tutorial_block_lists_title_level_and_key_points() {
        let prefs = prefs_with_goals(&["dropshipping"]);
        let tutorials = vec![
            tutorial("First Store", SkillLevel::Beginner, &["suppliers", "research"]),
            tutorial("Scaling Up", SkillLevel::Advanced, &["ad scaling"]),
        ];
        let prompt = compose(&prefs, &tutorials);
        assert!(prompt.contains("AVAILABLE TUTORIALS"));
        assert!(prompt.contains("- First Store (beginner): suppliers, research"));
        assert!(prompt.contains("- Scaling Up (advanced): ad scaling"));
        assert!(prompt.contains("Reference these tutorials by name"));

        // Tutorials appear in the order given (level ordering is the
        // store's concern).
        let first = prompt.find("First Store").unwrap();
        let second = prompt.find("Scaling Up").unwrap();
        assert!(first < second);
    }
}
