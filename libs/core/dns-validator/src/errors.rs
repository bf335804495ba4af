// [libs/core/dns-validator/src/errors.rs]
use thiserror::Error;

/// Per spec.md §4.D: "errors raised only on persona mis-configuration or
/// cancellation; network failures become verdicts." This enum is
/// deliberately narrow.
#[derive(Error, Debug)]
pub enum DnsValidatorError {
    #[error("dns persona has no resolvers configured")]
    NoResolversConfigured,

    #[error("resolver entry '{0}' is not a valid host:port or DoH URL")]
    InvalidResolverEntry(String),

    #[error("dns validation cancelled")]
    Cancelled,
}
