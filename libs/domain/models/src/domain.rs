// [libs/domain/models/src/domain.rs]
/*!
 * Generated domains and the validation results chained off them
 * (spec.md §3 "Generated domain", "DNS result", "HTTP/keyword result").
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single candidate domain produced by the generator for a given
/// offset. `(campaign_id, offset)` is unique (spec.md §3, §8.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDomain {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub offset: u64,
    pub value: String,
    pub tld: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsVerdict {
    Resolved,
    NxDomain,
    Timeout,
    ServFail,
    Other,
}

impl DnsVerdict {
    /// Strength used for the tie-break in spec.md §4.D: "resolved >
    /// nxdomain > servfail > timeout > other". Higher rank wins.
    pub fn rank(self) -> u8 {
        match self {
            DnsVerdict::Resolved => 4,
            DnsVerdict::NxDomain => 3,
            DnsVerdict::ServFail => 2,
            DnsVerdict::Timeout => 1,
            DnsVerdict::Other => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DnsVerdict::Resolved => "resolved",
            DnsVerdict::NxDomain => "nxdomain",
            DnsVerdict::Timeout => "timeout",
            DnsVerdict::ServFail => "servfail",
            DnsVerdict::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<DnsVerdict> {
        match value {
            "resolved" => Some(DnsVerdict::Resolved),
            "nxdomain" => Some(DnsVerdict::NxDomain),
            "timeout" => Some(DnsVerdict::Timeout),
            "servfail" => Some(DnsVerdict::ServFail),
            "other" => Some(DnsVerdict::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsResult {
    pub id: Uuid,
    pub generated_domain_id: Uuid,
    pub campaign_id: Uuid,
    pub verdict: DnsVerdict,
    pub records: Vec<String>,
    pub persona_used: Uuid,
    pub attempt_count: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub set_id: Option<Uuid>,
    pub keyword: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResult {
    pub id: Uuid,
    pub generated_domain_id: Uuid,
    pub campaign_id: Uuid,
    pub status_code: Option<u16>,
    pub final_url: Option<String>,
    pub body_size: Option<u64>,
    pub truncated: bool,
    pub matches: Vec<KeywordMatch>,
    pub persona_used: Uuid,
    pub proxy_used: Option<Uuid>,
    pub error_kind: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Derived aggregate: a domain with a confirmed HTTP keyword match,
/// surfaced to clients as a campaign result (spec.md §3 "Lead").
/// Attributes are intentionally opaque per spec — this repo stores the
/// analysis-stage-relevant subset as a JSON blob rather than modeling
/// every possible shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub generated_domain_id: Uuid,
    pub http_result_id: Uuid,
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_tie_break_order_matches_spec() {
        let mut verdicts = vec![DnsVerdict::Other, DnsVerdict::Resolved, DnsVerdict::Timeout, DnsVerdict::ServFail, DnsVerdict::NxDomain];
        verdicts.sort_by_key(|v| std::cmp::Reverse(v.rank()));
        assert_eq!(verdicts, vec![DnsVerdict::Resolved, DnsVerdict::NxDomain, DnsVerdict::ServFail, DnsVerdict::Timeout, DnsVerdict::Other]);
    }
}
