// [libs/domain/campaign-state/src/errors.rs]
use campaign_domain_models::PhaseStatus;
use thiserror::Error;

/// Every transition rejection in spec.md §4.H / §8.7 funnels through
/// this one variant: the caller always learns the status it expected
/// and the status it actually found. No state is mutated on `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("expected phase_status in {expected:?}, found {actual:?}")]
    WrongStatus { expected: Vec<PhaseStatus>, actual: PhaseStatus },

    #[error("campaign is already in a terminal state: {0:?}")]
    AlreadyTerminal(PhaseStatus),

    #[error("cannot configure a phase that is not the campaign's current phase")]
    NotCurrentPhase,
}
