// [libs/domain/campaign-state/src/transitions.rs]
/*!
 * Pure transition functions over `Campaign` and `CampaignPhaseProgress`
 * (spec.md §4.H). No I/O: the orchestrator is responsible for wrapping
 * every call in a campaign-scoped transaction (§4.I, §9's
 * `WithCampaignTransaction` note) and persisting the result.
 */

use campaign_domain_models::{Campaign, CampaignPhaseProgress, Phase, PhaseStatus};
use chrono::{DateTime, Utc};

use crate::errors::TransitionError;

fn require_status(
    actual: PhaseStatus,
    allowed: &[PhaseStatus],
) -> Result<(), TransitionError> {
    if allowed.contains(&actual) {
        Ok(())
    } else if actual.is_terminal() {
        Err(TransitionError::AlreadyTerminal(actual))
    } else {
        Err(TransitionError::WrongStatus { expected: allowed.to_vec(), actual })
    }
}

/// `Configure(phase, payload)`: legal on `ready`, or re-configuring an
/// already `configured`/`completed` phase (idempotent reset). Resets
/// the phase's counters to `total_items` and clears its timestamps —
/// callers are expected to also clear persisted results for the phase.
pub fn configure_phase(
    campaign: &mut Campaign,
    progress: &mut CampaignPhaseProgress,
    total_items: u64,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if campaign.current_phase != progress.phase {
        return Err(TransitionError::NotCurrentPhase);
    }
    require_status(
        campaign.phase_status,
        &[PhaseStatus::Ready, PhaseStatus::Configured, PhaseStatus::Completed],
    )?;

    progress.progress.reset(total_items);
    progress.started_at = None;
    progress.completed_at = None;
    progress.error_message = None;

    campaign.phase_status = PhaseStatus::Configured;
    campaign.progress.reset(total_items);
    campaign.updated_at = now;

    Ok(())
}

/// `Start(phase)`: legal only on `configured`. Not idempotent — calling
/// it again on `in_progress` is `invalid_state` (spec.md §8 round-trip
/// laws).
pub fn start_phase(
    campaign: &mut Campaign,
    progress: &mut CampaignPhaseProgress,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    require_status(campaign.phase_status, &[PhaseStatus::Configured])?;

    campaign.phase_status = PhaseStatus::InProgress;
    campaign.started_at.get_or_insert(now);
    campaign.updated_at = now;

    progress.started_at.get_or_insert(now);

    Ok(())
}

/// `PausePhase`: halts new leases; counters freeze in place.
pub fn pause_phase(campaign: &mut Campaign, now: DateTime<Utc>) -> Result<(), TransitionError> {
    require_status(campaign.phase_status, &[PhaseStatus::InProgress])?;
    campaign.phase_status = PhaseStatus::Paused;
    campaign.updated_at = now;
    Ok(())
}

/// `ResumePhase`: returns to `in_progress` without re-enqueueing
/// anything; the worker pool picks up leasing again on its own.
pub fn resume_phase(campaign: &mut Campaign, now: DateTime<Utc>) -> Result<(), TransitionError> {
    require_status(campaign.phase_status, &[PhaseStatus::Paused])?;
    campaign.phase_status = PhaseStatus::InProgress;
    campaign.updated_at = now;
    Ok(())
}

/// Outcome of trying to finalize a phase after a job completion, per
/// spec.md §4.H: "When `processed_items == total_items` and no jobs
/// remain queued or leased for this campaign×phase, the machine
/// transitions `in_progress → completed`". `no_jobs_outstanding` is
/// supplied by the caller (the job queue is outside this crate).
pub enum CompletionOutcome {
    /// Not all work is done yet; no transition.
    StillInProgress,
    /// Phase completed; campaign advanced to `next_phase` in `ready`,
    /// or (for the last phase) the whole campaign completed.
    PhaseCompleted { advanced_to: Option<Phase> },
}

pub fn try_complete_phase(
    campaign: &mut Campaign,
    progress: &mut CampaignPhaseProgress,
    no_jobs_outstanding: bool,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, TransitionError> {
    require_status(campaign.phase_status, &[PhaseStatus::InProgress])?;

    if !(progress.progress.is_complete() && no_jobs_outstanding) {
        return Ok(CompletionOutcome::StillInProgress);
    }

    progress.completed_at = Some(now);

    match campaign.current_phase.next() {
        Some(next_phase) => {
            campaign.current_phase = next_phase;
            campaign.phase_status = PhaseStatus::Ready;
            campaign.updated_at = now;
            Ok(CompletionOutcome::PhaseCompleted { advanced_to: Some(next_phase) })
        }
        None => {
            campaign.phase_status = PhaseStatus::Completed;
            campaign.completed_at = Some(now);
            campaign.updated_at = now;
            Ok(CompletionOutcome::PhaseCompleted { advanced_to: None })
        }
    }
}

/// Checks the configured fatality threshold (SPEC_FULL.md §C): a phase
/// fails once `failed_items / total_items` exceeds `fraction_threshold`
/// AND `total_items >= min_total`, guarding against tiny phases failing
/// on a single bad item.
pub fn exceeds_failure_threshold(
    progress: &CampaignPhaseProgress,
    fraction_threshold: f64,
    min_total: u64,
) -> bool {
    progress.progress.total_items >= min_total
        && progress.progress.failed_fraction() > fraction_threshold
}

/// Fails the current phase, either from the threshold check above or
/// from an executor's explicit fatal classification.
pub fn fail_phase(
    campaign: &mut Campaign,
    progress: &mut CampaignPhaseProgress,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    require_status(
        campaign.phase_status,
        &[PhaseStatus::InProgress, PhaseStatus::Paused],
    )?;

    let reason = reason.into();
    progress.completed_at = Some(now);
    progress.error_message = Some(reason.clone());

    campaign.phase_status = PhaseStatus::Failed;
    campaign.error_message = Some(reason);
    campaign.completed_at = Some(now);
    campaign.updated_at = now;

    Ok(())
}

/// `CancelCampaign`: terminal, reachable from any non-terminal state.
pub fn cancel_campaign(campaign: &mut Campaign, now: DateTime<Utc>) -> Result<(), TransitionError> {
    if campaign.phase_status.is_terminal() {
        return Err(TransitionError::AlreadyTerminal(campaign.phase_status));
    }
    campaign.phase_status = PhaseStatus::Cancelled;
    campaign.completed_at = Some(now);
    campaign.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn fresh_pair() -> (Campaign, CampaignPhaseProgress) {
        let campaign = Campaign::new(Uuid::new_v4(), "test", Uuid::new_v4(), now());
        let progress = CampaignPhaseProgress::new(campaign.id, campaign.current_phase);
        (campaign, progress)
    }

    #[test]
    fn configure_then_start_then_complete_advances_phase() {
        let (mut campaign, mut progress) = fresh_pair();

        configure_phase(&mut campaign, &mut progress, 4, now()).unwrap();
        assert_eq!(campaign.phase_status, PhaseStatus::Configured);

        start_phase(&mut campaign, &mut progress, now()).unwrap();
        assert_eq!(campaign.phase_status, PhaseStatus::InProgress);

        for _ in 0..4 {
            progress.progress.record(true);
            campaign.progress.record(true);
        }

        let outcome = try_complete_phase(&mut campaign, &mut progress, true, now()).unwrap();
        assert!(matches!(outcome, CompletionOutcome::PhaseCompleted { advanced_to: Some(Phase::DnsValidation) }));
        assert_eq!(campaign.current_phase, Phase::DnsValidation);
        assert_eq!(campaign.phase_status, PhaseStatus::Ready);
    }

    #[test]
    fn start_phase_is_not_idempotent() {
        let (mut campaign, mut progress) = fresh_pair();
        configure_phase(&mut campaign, &mut progress, 4, now()).unwrap();
        start_phase(&mut campaign, &mut progress, now()).unwrap();

        let second = start_phase(&mut campaign, &mut progress, now());
        assert!(matches!(second, Err(TransitionError::WrongStatus { .. })));
    }

    #[test]
    fn pause_then_resume_round_trips() {
        let (mut campaign, mut progress) = fresh_pair();
        configure_phase(&mut campaign, &mut progress, 4, now()).unwrap();
        start_phase(&mut campaign, &mut progress, now()).unwrap();

        pause_phase(&mut campaign, now()).unwrap();
        assert_eq!(campaign.phase_status, PhaseStatus::Paused);

        resume_phase(&mut campaign, now()).unwrap();
        assert_eq!(campaign.phase_status, PhaseStatus::InProgress);
    }

    #[test]
    fn cancel_is_reachable_from_any_non_terminal_state() {
        let (mut campaign, _progress) = fresh_pair();
        cancel_campaign(&mut campaign, now()).unwrap();
        assert_eq!(campaign.phase_status, PhaseStatus::Cancelled);

        let second = cancel_campaign(&mut campaign, now());
        assert!(matches!(second, Err(TransitionError::AlreadyTerminal(PhaseStatus::Cancelled))));
    }

    #[test]
    fn last_phase_completion_completes_the_whole_campaign() {
        let mut campaign = Campaign::new(Uuid::new_v4(), "test", Uuid::new_v4(), now());
        campaign.current_phase = Phase::Analysis;
        campaign.phase_status = PhaseStatus::Ready;
        let mut progress = CampaignPhaseProgress::new(campaign.id, Phase::Analysis);

        configure_phase(&mut campaign, &mut progress, 1, now()).unwrap();
        start_phase(&mut campaign, &mut progress, now()).unwrap();
        progress.progress.record(true);

        let outcome = try_complete_phase(&mut campaign, &mut progress, true, now()).unwrap();
        assert!(matches!(outcome, CompletionOutcome::PhaseCompleted { advanced_to: None }));
        assert_eq!(campaign.phase_status, PhaseStatus::Completed);
        assert!(campaign.completed_at.is_some());
    }

    #[test]
    fn failure_threshold_respects_minimum_total() {
        let mut progress = CampaignPhaseProgress::new(Uuid::new_v4(), Phase::DnsValidation);
        progress.progress.total_items = 10;
        progress.progress.failed_items = 9;
        // total_items below min_total(100): threshold never trips.
        assert!(!exceeds_failure_threshold(&progress, 0.5, 100));

        progress.progress.total_items = 200;
        progress.progress.failed_items = 150;
        assert!(exceeds_failure_threshold(&progress, 0.5, 100));
    }
}
