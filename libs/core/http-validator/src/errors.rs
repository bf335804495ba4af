// [libs/core/http-validator/src/errors.rs]
use thiserror::Error;

/// Per spec.md §4.E: network failures become part of the returned
/// `Result`, not an `Err` here. This type is reserved for client
/// mis-configuration that prevents a request from ever being attempted.
#[derive(Error, Debug)]
pub enum HttpValidatorError {
    #[error("failed to build http client: {0}")]
    ClientBuildFailed(String),

    #[error("proxy address '{0}' is not a valid proxy url")]
    InvalidProxyAddress(String),
}
