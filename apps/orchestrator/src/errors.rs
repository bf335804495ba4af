// [apps/orchestrator/src/errors.rs]
/*!
 * Public error type for the orchestrator's operations (spec.md §4.I,
 * §7). Carries the shared `ErrorKind` taxonomy so an (out-of-scope)
 * HTTP adapter can map it to status codes without re-deriving intent
 * from a string message.
 */

use campaign_domain_models::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("{kind:?}: {message}")]
    Domain { kind: ErrorKind, message: String },

    #[error("operation timed out")]
    Timeout,

    #[error(transparent)]
    Persistence(#[from] campaign_infra_db::DbError),

    #[error(transparent)]
    Queue(#[from] campaign_infra_queue::QueueError),

    #[error(transparent)]
    ProxyPool(#[from] campaign_infra_proxy_pool::PoolError),

    #[error(transparent)]
    PersonaStore(#[from] campaign_infra_persona_store::PersonaStoreError),

    #[error(transparent)]
    Transition(#[from] campaign_domain_state::TransitionError),

    #[error(transparent)]
    Generator(#[from] campaign_core_generator::GeneratorError),
}

impl OrchestratorError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::InvalidInput, message: message.into() }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::InvalidPayload, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::NotFound, message: message.into() }
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::QuotaExceeded, message: message.into() }
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::InvalidPattern, message: message.into() }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::Domain { kind: ErrorKind::InvalidState, message: message.into() }
    }

    /// Classifies this error for adapters that need the §7 taxonomy
    /// rather than the Rust type itself.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Domain { kind, .. } => *kind,
            OrchestratorError::Timeout => ErrorKind::Timeout,
            OrchestratorError::Persistence(campaign_infra_db::DbError::NotFound) => ErrorKind::NotFound,
            OrchestratorError::Persistence(campaign_infra_db::DbError::Conflict) => ErrorKind::Conflict,
            OrchestratorError::Persistence(_) => ErrorKind::PersistenceError,
            OrchestratorError::Queue(_) => ErrorKind::QueueUnavailable,
            OrchestratorError::ProxyPool(_) => ErrorKind::NoProxyAvailable,
            OrchestratorError::PersonaStore(campaign_infra_persona_store::PersonaStoreError::NotFound) => ErrorKind::NotFound,
            OrchestratorError::PersonaStore(_) => ErrorKind::PersonaUnavailable,
            OrchestratorError::Transition(_) => ErrorKind::InvalidState,
            OrchestratorError::Generator(_) => ErrorKind::InvalidPattern,
        }
    }
}
