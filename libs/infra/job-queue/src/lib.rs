// [libs/infra/job-queue/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DURABLE JOB QUEUE (ESTRATO L3)
 * RESPONSABILIDAD: CONTRATO PÚBLICO DE ENCOLADO Y ARRENDAMIENTO
 *
 * Implementa spec.md §4.F como una fachada delgada sobre
 * `campaign-infra-db::JobRepository`: añade la política de backoff y
 * traduce errores de persistencia al vocabulario de la cola.
 * =================================================================
 */

pub mod backoff;
pub mod errors;

pub use backoff::BackoffPolicy;
pub use errors::QueueError;

use campaign_domain_models::{Job, JobPayload, JobStatus, Phase};
use campaign_infra_db::JobRepository;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

pub struct JobQueue {
    repository: JobRepository,
    backoff: BackoffPolicy,
    lease_ttl_seconds: i64,
}

impl JobQueue {
    pub fn new(repository: JobRepository, backoff: BackoffPolicy, lease_ttl_seconds: i64) -> Self {
        Self { repository, backoff, lease_ttl_seconds }
    }

    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        campaign_id: Uuid,
        phase: Phase,
        payload: JobPayload,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<Uuid, QueueError> {
        Ok(self.repository.enqueue(campaign_id, phase, &payload, max_attempts, now).await?)
    }

    #[instrument(skip(self))]
    pub async fn lease(&self, worker_id: &str, phase_filter: Option<Phase>, max: u32, now: DateTime<Utc>) -> Result<Vec<Job>, QueueError> {
        Ok(self.repository.lease(worker_id, phase_filter, max, self.lease_ttl_seconds, now).await?)
    }

    #[instrument(skip(self))]
    pub async fn ack_success(&self, job_id: Uuid, worker_id: &str) -> Result<(), QueueError> {
        Ok(self.repository.ack_success(job_id, worker_id).await?)
    }

    /// `ack_failure` computes the retry delay from the job's prior
    /// attempt count via `BackoffPolicy`, then delegates the actual
    /// transition to the repository.
    #[instrument(skip(self, error))]
    pub async fn ack_failure(
        &self,
        job_id: Uuid,
        worker_id: &str,
        prior_attempts: u32,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<JobStatus, QueueError> {
        let retry_after = self.backoff.delay_seconds(prior_attempts);
        Ok(self.repository.ack_failure(job_id, worker_id, error, retry_after, now).await?)
    }

    #[instrument(skip(self))]
    pub async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<u64, QueueError> {
        Ok(self.repository.reclaim_expired(now).await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_queued_dead_for_campaign(&self, campaign_id: Uuid, now: DateTime<Utc>) -> Result<u64, QueueError> {
        Ok(self.repository.mark_queued_dead_for_campaign(campaign_id, now).await?)
    }

    #[instrument(skip(self))]
    pub async fn count_outstanding(&self, campaign_id: Uuid, phase: Phase) -> Result<u64, QueueError> {
        Ok(self.repository.count_outstanding(campaign_id, phase).await?)
    }
}
