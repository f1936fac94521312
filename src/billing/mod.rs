//! Billing collaborator — entitlement records and the checkout webhook.
//!
//! The chat pipeline only reads entitlements; every mutation comes from the
//! payments provider through the webhook (or from the handler-side token
//! accounting after a completed reply).

pub mod model;
pub mod webhook;

pub use model::{Tier, UsageRecord};

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::store::Database;

/// Read-side gate: `Some(record)` iff the user holds an active entitlement.
///
/// A record whose period has elapsed or whose token budget is exhausted is
/// treated the same as no record at all.
pub async fn active_entitlement(
    db: &dyn Database,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<UsageRecord>, DatabaseError> {
    Ok(db
        .get_usage(user_id)
        .await?
        .filter(|record| record.is_active(now)))
}
