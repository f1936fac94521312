//! Starter catalog seeded into an empty tutorials table at startup.

use tracing::info;

use crate::catalog::model::Tutorial;
use crate::error::DatabaseError;
use crate::profile::SkillLevel;
use crate::store::Database;

fn tutorial(
    id: &str,
    title: &str,
    category: &str,
    level: SkillLevel,
    body: &str,
    key_points: &[&str],
    video_url: Option<&str>,
) -> Tutorial {
    Tutorial {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        level,
        body: body.to_string(),
        key_points: key_points.iter().map(|s| s.to_string()).collect(),
        video_url: video_url.map(String::from),
    }
}

/// The built-in starter catalog: at least one lesson per goal category,
/// mixed levels so the prompt can bias foundational content first.
pub fn starter_catalog() -> Vec<Tutorial> {
    vec![
        tutorial(
            "affiliate-101",
            "Affiliate Marketing Foundations",
            "affiliate_marketing",
            SkillLevel::Beginner,
            "How affiliate programs work, how commissions are tracked, and how to \
             pick a program that pays for the audience you can actually reach.",
            &["choosing a program", "commission structures", "disclosure rules"],
            Some("https://videos.example.com/affiliate-101"),
        ),
        tutorial(
            "affiliate-funnels",
            "Building High-Converting Affiliate Funnels",
            "affiliate_marketing",
            SkillLevel::Advanced,
            "Landing pages, bridge content, and email capture stacked into a funnel \
             that converts cold traffic into tracked referrals.",
            &["landing pages", "bridge content", "split testing"],
            None,
        ),
        tutorial(
            "dropship-start",
            "Dropshipping: Your First Store",
            "dropshipping",
            SkillLevel::Beginner,
            "Supplier selection, product research, and launching a one-product \
             store without holding inventory.",
            &["supplier vetting", "product research", "store setup"],
            Some("https://videos.example.com/dropship-start"),
        ),
        tutorial(
            "dropship-scaling",
            "Scaling Past Your First 100 Orders",
            "dropshipping",
            SkillLevel::Advanced,
            "Fulfillment automation, ad budget scaling, and margin protection once \
             a product is validated.",
            &["fulfillment automation", "ad scaling", "margin protection"],
            None,
        ),
        tutorial(
            "content-engine",
            "Turning Content Into Income",
            "content_creation",
            SkillLevel::Beginner,
            "Picking a platform, posting cadence, and the three monetization \
             layers every content business stacks.",
            &["platform choice", "posting cadence", "monetization layers"],
            None,
        ),
        tutorial(
            "email-list",
            "Email Lists That Sell",
            "email_marketing",
            SkillLevel::Intermediate,
            "Lead magnets, welcome sequences, and writing broadcasts that convert \
             subscribers without burning the list.",
            &["lead magnets", "welcome sequences", "broadcast cadence"],
            None,
        ),
        tutorial(
            "freelance-offer",
            "Packaging a Freelance Offer",
            "freelancing",
            SkillLevel::Beginner,
            "Productizing a skill into a fixed-scope, fixed-price offer clients \
             can say yes to quickly.",
            &["productized services", "pricing", "outreach"],
            None,
        ),
        tutorial(
            "pod-designs",
            "Print-on-Demand Designs That Move",
            "print_on_demand",
            SkillLevel::Intermediate,
            "Niche research, design briefs, and listing optimization for \
             print-on-demand storefronts.",
            &["niche research", "design briefs", "listing optimization"],
            None,
        ),
    ]
}

/// Insert the starter catalog when the tutorials table is empty.
/// Returns the number of tutorials inserted (0 when already populated).
pub async fn seed_if_empty(db: &dyn Database) -> Result<usize, DatabaseError> {
    if db.tutorial_count().await? > 0 {
        return Ok(0);
    }
    let catalog = starter_catalog();
    for tutorial in &catalog {
        db.insert_tutorial(tutorial).await?;
    }
    info!(count = catalog.len(), "Seeded starter tutorial catalog");
    Ok(catalog.len())
}
