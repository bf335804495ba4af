// [libs/domain/models/src/security.rs]
/*!
 * Short-lived security context attached to a request or subscription
 * (spec.md §3 "Security context"). Auth itself is out of scope
 * (spec.md §1) — the core only consumes this value through the
 * `SecurityContextProvider` capability (SPEC_FULL.md §C).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent_fingerprint: String,
}

impl SecurityContext {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Coarse browser family list used to collapse a raw User-Agent string
/// into a fingerprint (spec.md §3). Matching is a case-insensitive
/// substring scan against this fixed list, in order — the first match
/// wins, so more specific entries must precede their supersets.
const BROWSER_FAMILIES: &[(&str, &str)] = &[
    ("edg", "edge"),
    ("chrome", "chrome"),
    ("firefox", "firefox"),
    ("safari", "safari"),
    ("opera", "opera"),
];

pub fn fingerprint_user_agent(user_agent: &str) -> String {
    let lowered = user_agent.to_ascii_lowercase();
    for (needle, family) in BROWSER_FAMILIES {
        if lowered.contains(needle) {
            return family.to_string();
        }
    }
    "unknown".to_string()
}

/// A long-lived client attachment to the event broadcaster (spec.md §3
/// "Subscription", §4.J). `campaign_filter = None` means "all campaigns
/// owned by `user_id`".
#[derive(Debug, Clone)]
pub struct SubscriptionDescriptor {
    pub user_id: Uuid,
    pub campaign_filter: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_prefers_more_specific_entry() {
        assert_eq!(fingerprint_user_agent("Mozilla/5.0 Edg/114.0 Chrome/114"), "edge");
        assert_eq!(fingerprint_user_agent("Mozilla/5.0 Chrome/114 Safari/537"), "chrome");
    }

    #[test]
    fn fingerprint_falls_back_to_unknown() {
        assert_eq!(fingerprint_user_agent("curl/8.0"), "unknown");
    }
}
