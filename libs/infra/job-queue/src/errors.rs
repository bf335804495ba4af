// [libs/infra/job-queue/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("job not found")]
    NotFound,

    #[error("job is not leased by the calling worker")]
    OwnershipConflict,

    #[error(transparent)]
    Persistence(campaign_infra_db::DbError),
}

impl From<campaign_infra_db::DbError> for QueueError {
    fn from(err: campaign_infra_db::DbError) -> Self {
        match err {
            campaign_infra_db::DbError::NotFound => QueueError::NotFound,
            campaign_infra_db::DbError::Conflict => QueueError::OwnershipConflict,
            other => QueueError::Persistence(other),
        }
    }
}
