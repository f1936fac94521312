//! Entitlement data models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of a billing period opened by a completed checkout.
pub const PERIOD_DAYS: i64 = 30;

/// A named subscription level mapping to a fixed monthly token ceiling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Starter,
    Pro,
    Elite,
}

impl Tier {
    /// Monthly token ceiling for this tier.
    pub fn token_limit(&self) -> u32 {
        match self {
            Self::Starter => 100_000,
            Self::Pro => 500_000,
            Self::Elite => 2_000_000,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starter => write!(f, "starter"),
            Self::Pro => write!(f, "pro"),
            Self::Elite => write!(f, "elite"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            "elite" => Ok(Self::Elite),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Per-user token budget and subscription window.
///
/// Owned by the billing collaborator; the chat pipeline reads it to gate
/// access and never mutates it mid-pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub tier: Tier,
    pub tokens_used: u32,
    pub tokens_limit: u32,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Provider-assigned reference id of the checkout event that created
    /// this record. Replayed deliveries of the same event are no-ops.
    pub provider_ref: String,
}

impl UsageRecord {
    /// Fresh record for a completed checkout: zeroed counter, tier ceiling,
    /// 30-day window starting now.
    pub fn for_checkout(
        user_id: &str,
        tier: Tier,
        provider_ref: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier,
            tokens_used: 0,
            tokens_limit: tier.token_limit(),
            period_start: now,
            period_end: now + Duration::days(PERIOD_DAYS),
            provider_ref: provider_ref.to_string(),
        }
    }

    /// Whether the entitlement is still usable at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.period_end && self.tokens_used < self.tokens_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_have_increasing_ceilings() {
        assert!(Tier::Starter.token_limit() < Tier::Pro.token_limit());
        assert!(Tier::Pro.token_limit() < Tier::Elite.token_limit());
    }

    #[test]
    fn tier_display_parse_roundtrip() {
        for tier in [Tier::Starter, Tier::Pro, Tier::Elite] {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn fresh_checkout_record_is_active() {
        let now = Utc::now();
        let record = UsageRecord::for_checkout("u1", Tier::Pro, "evt_1", now);
        assert!(record.is_active(now));
        assert_eq!(record.tokens_used, 0);
        assert_eq!(record.tokens_limit, Tier::Pro.token_limit());
        assert_eq!(record.period_end - record.period_start, Duration::days(30));
    }

    #[test]
    fn elapsed_period_is_inactive() {
        let now = Utc::now();
        let record = UsageRecord::for_checkout("u1", Tier::Starter, "evt_1", now);
        assert!(!record.is_active(now + Duration::days(31)));
    }

    #[test]
    fn exhausted_budget_is_inactive() {
        let now = Utc::now();
        let mut record = UsageRecord::for_checkout("u1", Tier::Starter, "evt_1", now);
        record.tokens_used = record.tokens_limit;
        assert!(!record.is_active(now));
    }
}
