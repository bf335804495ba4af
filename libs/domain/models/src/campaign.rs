// [libs/domain/models/src/campaign.rs]
/*!
 * Campaign aggregate root: identity, lifecycle, and progress counters.
 * Mirrors spec.md §3 "Campaign" and "Phase configuration" invariants.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed four-stage pipeline a campaign advances through. Order is
/// significant: `next()` encodes the only legal advancement path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    DomainGeneration,
    DnsValidation,
    HttpKeywordValidation,
    Analysis,
}

impl Phase {
    /// The phase that follows this one, or `None` when this is the last
    /// phase in the pipeline (`Analysis`).
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::DomainGeneration => Some(Phase::DnsValidation),
            Phase::DnsValidation => Some(Phase::HttpKeywordValidation),
            Phase::HttpKeywordValidation => Some(Phase::Analysis),
            Phase::Analysis => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::DomainGeneration => "domain_generation",
            Phase::DnsValidation => "dns_validation",
            Phase::HttpKeywordValidation => "http_keyword_validation",
            Phase::Analysis => "analysis",
        }
    }

    pub fn parse(value: &str) -> Option<Phase> {
        match value {
            "domain_generation" => Some(Phase::DomainGeneration),
            "dns_validation" => Some(Phase::DnsValidation),
            "http_keyword_validation" => Some(Phase::HttpKeywordValidation),
            "analysis" => Some(Phase::Analysis),
            _ => None,
        }
    }
}

/// Per-phase status, shared by the campaign's `current_phase` pointer
/// and by `CampaignPhaseProgress` rows for every phase the campaign has
/// touched. See spec.md §4.H for the full transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    NotStarted,
    Ready,
    Configured,
    InProgress,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl PhaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::NotStarted => "not_started",
            PhaseStatus::Ready => "ready",
            PhaseStatus::Configured => "configured",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Paused => "paused",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<PhaseStatus> {
        match value {
            "not_started" => Some(PhaseStatus::NotStarted),
            "ready" => Some(PhaseStatus::Ready),
            "configured" => Some(PhaseStatus::Configured),
            "in_progress" => Some(PhaseStatus::InProgress),
            "paused" => Some(PhaseStatus::Paused),
            "completed" => Some(PhaseStatus::Completed),
            "failed" => Some(PhaseStatus::Failed),
            "cancelled" => Some(PhaseStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseStatus::Completed | PhaseStatus::Failed | PhaseStatus::Cancelled)
    }
}

/// Progress counters shared by both the cumulative campaign-level view
/// and the per-phase view. Invariant (spec.md §3, §8.2):
/// `processed == successful + failed <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounters {
    pub total_items: u64,
    pub processed_items: u64,
    pub successful_items: u64,
    pub failed_items: u64,
}

impl ProgressCounters {
    pub fn is_consistent(&self) -> bool {
        self.processed_items == self.successful_items + self.failed_items
            && self.processed_items <= self.total_items
    }

    pub fn is_complete(&self) -> bool {
        self.total_items == self.processed_items
    }

    /// Applies the outcome of one finished unit of work. `success` adds
    /// to `successful_items`, otherwise to `failed_items`; `processed_items`
    /// always grows by the same amount. Counters never decrease here —
    /// the only reset path is an explicit `reset()` at phase configuration.
    pub fn record(&mut self, success: bool) {
        self.processed_items += 1;
        if success {
            self.successful_items += 1;
        } else {
            self.failed_items += 1;
        }
    }

    pub fn reset(&mut self, total_items: u64) {
        self.total_items = total_items;
        self.processed_items = 0;
        self.successful_items = 0;
        self.failed_items = 0;
    }

    pub fn failed_fraction(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.failed_items as f64 / self.total_items as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub current_phase: Phase,
    pub phase_status: PhaseStatus,
    pub progress: ProgressCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Campaign {
    /// A freshly created campaign per spec.md §4.I `CreateCampaign`:
    /// domain generation phase, `ready` status, zeroed counters.
    pub fn new(id: Uuid, name: impl Into<String>, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            current_phase: Phase::DomainGeneration,
            phase_status: PhaseStatus::Ready,
            progress: ProgressCounters::default(),
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

/// Progress scoped to a single (campaign, phase) pair. Distinct storage
/// from the campaign's cumulative counters, but the same shape and the
/// same monotonicity invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPhaseProgress {
    pub campaign_id: Uuid,
    pub phase: Phase,
    pub progress: ProgressCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl CampaignPhaseProgress {
    pub fn new(campaign_id: Uuid, phase: Phase) -> Self {
        Self {
            campaign_id,
            phase,
            progress: ProgressCounters::default(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_advances_in_fixed_order() {
        assert_eq!(Phase::DomainGeneration.next(), Some(Phase::DnsValidation));
        assert_eq!(Phase::DnsValidation.next(), Some(Phase::HttpKeywordValidation));
        assert_eq!(Phase::HttpKeywordValidation.next(), Some(Phase::Analysis));
        assert_eq!(Phase::Analysis.next(), None);
    }

    #[test]
    fn phase_round_trips_through_str() {
        for phase in [Phase::DomainGeneration, Phase::DnsValidation, Phase::HttpKeywordValidation, Phase::Analysis] {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
    }

    #[test]
    fn counters_reject_inconsistent_state() {
        let bad = ProgressCounters { total_items: 10, processed_items: 5, successful_items: 1, failed_items: 1 };
        assert!(!bad.is_consistent());

        let good = ProgressCounters { total_items: 10, processed_items: 5, successful_items: 3, failed_items: 2 };
        assert!(good.is_consistent());
    }

    #[test]
    fn record_is_monotonic_until_reset() {
        let mut counters = ProgressCounters { total_items: 4, ..Default::default() };
        counters.record(true);
        counters.record(false);
        assert_eq!(counters.processed_items, 2);
        assert_eq!(counters.successful_items, 1);
        assert_eq!(counters.failed_items, 1);

        counters.reset(8);
        assert_eq!(counters.processed_items, 0);
        assert_eq!(counters.total_items, 8);
    }
}
