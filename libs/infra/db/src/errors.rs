// [libs/infra/db/src/errors.rs]
/*!
 * Error catalog for the persistence layer. Every repository method maps
 * its libsql failure into one of these before it reaches the
 * orchestrator, which further maps `NotFound`/`Conflict` into
 * `campaign-domain-models::ErrorKind`.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection unavailable: {0}")]
    ConnectionError(String),

    #[error("query rejected by the database: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("row did not map cleanly onto the domain type: {0}")]
    MappingError(String),

    #[error("transaction could not be committed: {0}")]
    TransactionError(String),

    #[error("entity not found")]
    NotFound,

    #[error("optimistic concurrency conflict")]
    Conflict,
}
