//! Configuration types.

use secrecy::SecretString;

/// Chat pipeline configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// How many trailing turns of history are forwarded to the gateway.
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_window: 10 }
    }
}

/// Billing / entitlement configuration.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Gate `POST /chat` on an active usage record.
    pub enforce_entitlement: bool,
    /// Shared secret the payments provider sends in `x-webhook-secret`.
    /// `None` disables the check (local development only).
    pub webhook_secret: Option<SecretString>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            enforce_entitlement: true,
            webhook_secret: None,
        }
    }
}

impl BillingConfig {
    /// Build from `COACH_ENFORCE_ENTITLEMENT` / `COACH_WEBHOOK_SECRET`.
    pub fn from_env() -> Self {
        let enforce_entitlement = std::env::var("COACH_ENFORCE_ENTITLEMENT")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
            .unwrap_or(true);
        let webhook_secret = std::env::var("COACH_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);
        Self {
            enforce_entitlement,
            webhook_secret,
        }
    }
}
