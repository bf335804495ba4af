// [libs/infra/proxy-pool/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("no proxy available matching the acquisition policy")]
    NoProxyAvailable,

    #[error(transparent)]
    Persistence(campaign_infra_db::DbError),
}

impl From<campaign_infra_db::DbError> for PoolError {
    fn from(err: campaign_infra_db::DbError) -> Self {
        PoolError::Persistence(err)
    }
}
