// [libs/infra/persona-store/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonaStoreError {
    #[error("persona configuration is invalid: {0}")]
    InvalidConfig(String),

    #[error("a persona with this (name, kind) already exists")]
    Duplicate,

    #[error("persona not found")]
    NotFound,

    #[error(transparent)]
    Persistence(campaign_infra_db::DbError),
}

impl From<campaign_infra_db::DbError> for PersonaStoreError {
    fn from(err: campaign_infra_db::DbError) -> Self {
        match err {
            campaign_infra_db::DbError::NotFound => PersonaStoreError::NotFound,
            campaign_infra_db::DbError::Conflict => PersonaStoreError::Duplicate,
            other => PersonaStoreError::Persistence(other),
        }
    }
}
