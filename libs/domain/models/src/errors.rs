// [libs/domain/models/src/errors.rs]
/*!
 * Shared error taxonomy (spec.md §7). This is not a single error type —
 * it's the `kind` vocabulary every crate's own `thiserror` enum maps
 * into at its boundary, so the orchestrator's public contract and the
 * (out-of-scope) HTTP adapter can classify failures uniformly.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // Input
    InvalidInput,
    InvalidPayload,
    InvalidPattern,
    ValidationFailed,
    QuotaExceeded,
    // State
    NotFound,
    Conflict,
    InvalidState,
    Cancelled,
    // Resource
    NoProxyAvailable,
    PersonaUnavailable,
    QueueUnavailable,
    RateLimited,
    Timeout,
    // Upstream
    DnsError,
    HttpError,
    NetworkError,
    TruncatedResponse,
    // Internal
    PersistenceError,
    InvariantViolated,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidPayload => "invalid_payload",
            ErrorKind::InvalidPattern => "invalid_pattern",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::NoProxyAvailable => "no_proxy_available",
            ErrorKind::PersonaUnavailable => "persona_unavailable",
            ErrorKind::QueueUnavailable => "queue_unavailable",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::DnsError => "dns_error",
            ErrorKind::HttpError => "http_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::TruncatedResponse => "truncated_response",
            ErrorKind::PersistenceError => "persistence_error",
            ErrorKind::InvariantViolated => "invariant_violated",
            ErrorKind::InternalError => "internal_error",
        }
    }
}
