// [libs/domain/models/src/proxy.rs]
/*!
 * Proxy pool entities (spec.md §3 "Proxy", §4.B).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStrategy {
    RoundRobin,
    Random,
    WeightedRandom,
    LeastRecentlyUsed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AcquisitionPolicy {
    pub strategy: Option<AcquisitionStrategy>,
    pub pool_id: Option<Uuid>,
    pub geo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
    pub id: Uuid,
    pub address: String,
    pub credentials: Option<String>,
    pub protocol: ProxyProtocol,
    pub consecutive_errors: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub quarantine_until: Option<DateTime<Utc>>,
    pub geo: Option<String>,
}

impl Proxy {
    pub fn is_quarantined(&self, now: DateTime<Utc>) -> bool {
        matches!(self.quarantine_until, Some(until) if until > now)
    }
}

/// Outcome reported back to the pool on `release` (spec.md §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOutcome {
    Success,
    Failure,
}
