// [libs/infra/db/src/repositories/job.rs]
/*!
 * =================================================================
 * APARATO: JOB REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: CICLO DE VIDA TRANSACCIONAL DE LA COLA DE TRABAJOS
 *
 * Implementa spec.md §4.F. Cada operación pública es una unidad
 * transaccional; `lease` reclama filas bajo una transacción exclusiva
 * de SQLite, que sirve aquí el mismo papel que `SELECT ... FOR UPDATE
 * SKIP LOCKED` en un motor con bloqueo de fila.
 * =================================================================
 */

use campaign_domain_models::{Job, JobPayload, JobStatus, Phase};
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Connection};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::DbError;

pub struct JobRepository {
    conn: Connection,
}

impl JobRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        campaign_id: Uuid,
        phase: Phase,
        payload: &JobPayload,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let payload_json = serde_json::to_string(payload).map_err(|err| DbError::MappingError(err.to_string()))?;

        self.conn
            .execute(
                r#"INSERT INTO jobs (
                    id, campaign_id, phase, payload_json, status, attempts, max_attempts,
                    scheduled_at, leased_by, lease_deadline, last_error, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 'queued', 0, ?5, ?6, NULL, NULL, NULL, ?7, ?7)"#,
                params![
                    id.to_string(),
                    campaign_id.to_string(),
                    phase.as_str(),
                    payload_json,
                    max_attempts as i64,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .await?;

        Ok(id)
    }

    /// Atomically selects up to `max` queued, due jobs and marks them
    /// `leased`. The guard clause `AND status = 'queued'` on the update
    /// is what makes this safe under concurrent leasers even though
    /// SQLite lacks `SKIP LOCKED`: only one transaction at a time can
    /// hold the write lock, and each update re-checks the predicate.
    ///
    /// Joins `campaigns` and requires `current_phase = jobs.phase` and
    /// `phase_status = 'in_progress'`: a paused or cancelled campaign's
    /// queued jobs sit untouched until `ResumePhase` flips the campaign
    /// back to `in_progress` (spec.md §4.H, §8.9).
    #[instrument(skip(self))]
    pub async fn lease(
        &self,
        worker_id: &str,
        phase_filter: Option<Phase>,
        max: u32,
        lease_ttl_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, DbError> {
        let tx = self.conn.transaction().await.map_err(|err| DbError::TransactionError(err.to_string()))?;

        let mut candidate_ids: Vec<String> = Vec::new();
        let mut rows = match phase_filter {
            Some(phase) => {
                tx.query(
                    "SELECT j.id FROM jobs j
                     JOIN campaigns c ON c.id = j.campaign_id
                     WHERE j.status = 'queued' AND j.scheduled_at <= ?1 AND j.phase = ?2
                       AND c.current_phase = j.phase AND c.phase_status = 'in_progress'
                     ORDER BY j.scheduled_at ASC LIMIT ?3",
                    params![now.to_rfc3339(), phase.as_str(), max as i64],
                )
                .await?
            }
            None => {
                tx.query(
                    "SELECT j.id FROM jobs j
                     JOIN campaigns c ON c.id = j.campaign_id
                     WHERE j.status = 'queued' AND j.scheduled_at <= ?1
                       AND c.current_phase = j.phase AND c.phase_status = 'in_progress'
                     ORDER BY j.scheduled_at ASC LIMIT ?2",
                    params![now.to_rfc3339(), max as i64],
                )
                .await?
            }
        };
        while let Some(row) = rows.next().await? {
            candidate_ids.push(row.get(0)?);
        }

        let lease_deadline = now + Duration::seconds(lease_ttl_seconds);
        let mut leased = Vec::new();

        for id in candidate_ids {
            let affected = tx
                .execute(
                    "UPDATE jobs SET status = 'leased', leased_by = ?1, lease_deadline = ?2, updated_at = ?3 WHERE id = ?4 AND status = 'queued'",
                    params![worker_id, lease_deadline.to_rfc3339(), now.to_rfc3339(), id.clone()],
                )
                .await?;

            if affected == 1 {
                let mut job_rows = tx.query("SELECT * FROM jobs WHERE id = ?1", params![id.clone()]).await?;
                if let Some(row) = job_rows.next().await? {
                    leased.push(map_job_row(&row)?);
                }
            }
        }

        tx.commit().await.map_err(|err| DbError::TransactionError(err.to_string()))?;

        if !leased.is_empty() {
            info!(count = leased.len(), worker_id, "📦 jobs leased");
        }

        Ok(leased)
    }

    #[instrument(skip(self))]
    pub async fn ack_success(&self, job_id: Uuid, worker_id: &str) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'succeeded', updated_at = ?3 WHERE id = ?1 AND leased_by = ?2 AND status = 'leased'",
                params![job_id.to_string(), worker_id, Utc::now().to_rfc3339()],
            )
            .await?;

        if affected == 0 {
            warn!(job_id = %job_id, worker_id, "⚠️ ack_success rejected: job not leased by this worker");
            return Err(DbError::Conflict);
        }
        Ok(())
    }

    /// `ack_failure`: increments `attempts`; re-queues with a backoff
    /// delay while `attempts < max_attempts`, otherwise dead-letters.
    #[instrument(skip(self, error))]
    pub async fn ack_failure(
        &self,
        job_id: Uuid,
        worker_id: &str,
        error: &str,
        retry_after_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<JobStatus, DbError> {
        let tx = self.conn.transaction().await.map_err(|err| DbError::TransactionError(err.to_string()))?;

        let mut rows = tx
            .query(
                "SELECT attempts, max_attempts, leased_by FROM jobs WHERE id = ?1",
                params![job_id.to_string()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DbError::NotFound)?;
        let attempts: i64 = row.get(0)?;
        let max_attempts: i64 = row.get(1)?;
        let leased_by: Option<String> = row.get(2)?;

        if leased_by.as_deref() != Some(worker_id) {
            return Err(DbError::Conflict);
        }

        let new_attempts = attempts + 1;
        let next_status = if new_attempts < max_attempts { JobStatus::Queued } else { JobStatus::Dead };

        match next_status {
            JobStatus::Queued => {
                let scheduled_at = now + Duration::seconds(retry_after_seconds);
                tx.execute(
                    "UPDATE jobs SET status = 'queued', attempts = ?2, scheduled_at = ?3, leased_by = NULL, lease_deadline = NULL, last_error = ?4, updated_at = ?5 WHERE id = ?1",
                    params![job_id.to_string(), new_attempts, scheduled_at.to_rfc3339(), error, now.to_rfc3339()],
                )
                .await?;
            }
            _ => {
                tx.execute(
                    "UPDATE jobs SET status = 'dead', attempts = ?2, leased_by = NULL, lease_deadline = NULL, last_error = ?3, updated_at = ?4 WHERE id = ?1",
                    params![job_id.to_string(), new_attempts, error, now.to_rfc3339()],
                )
                .await?;
            }
        }

        tx.commit().await.map_err(|err| DbError::TransactionError(err.to_string()))?;
        Ok(next_status)
    }

    /// Returns expired leases to `queued`, incrementing `attempts`.
    /// Returns the number of jobs reclaimed.
    #[instrument(skip(self))]
    pub async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let affected = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'queued', attempts = attempts + 1, leased_by = NULL, lease_deadline = NULL, updated_at = ?1
                 WHERE status = 'leased' AND lease_deadline < ?1",
                params![now.to_rfc3339()],
            )
            .await?;

        if affected > 0 {
            info!(count = affected, "♻️ reclaimed expired leases");
        }
        Ok(affected)
    }

    /// Marks every still-`queued` job for a campaign as `dead`
    /// (`CancelCampaign`, spec.md §4.H).
    #[instrument(skip(self))]
    pub async fn mark_queued_dead_for_campaign(&self, campaign_id: Uuid, now: DateTime<Utc>) -> Result<u64, DbError> {
        let affected = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'dead', updated_at = ?2 WHERE campaign_id = ?1 AND status = 'queued'",
                params![campaign_id.to_string(), now.to_rfc3339()],
            )
            .await?;
        Ok(affected)
    }

    /// Count of jobs still `queued` or `leased` for a campaign×phase —
    /// used by the state machine's phase-completion check (spec.md
    /// §4.H: "no jobs remain queued or leased").
    #[instrument(skip(self))]
    pub async fn count_outstanding(&self, campaign_id: Uuid, phase: Phase) -> Result<u64, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM jobs WHERE campaign_id = ?1 AND phase = ?2 AND status IN ('queued', 'leased')",
                params![campaign_id.to_string(), phase.as_str()],
            )
            .await?;
        let count: i64 = rows.next().await?.ok_or(DbError::NotFound)?.get(0)?;
        Ok(count as u64)
    }
}

fn map_job_row(row: &libsql::Row) -> Result<Job, DbError> {
    let id: String = row.get(0)?;
    let campaign_id: String = row.get(1)?;
    let phase: String = row.get(2)?;
    let payload_json: String = row.get(3)?;
    let status: String = row.get(4)?;
    let attempts: i64 = row.get(5)?;
    let max_attempts: i64 = row.get(6)?;
    let scheduled_at: String = row.get(7)?;
    let leased_by: Option<String> = row.get(8)?;
    let lease_deadline: Option<String> = row.get(9)?;
    let last_error: Option<String> = row.get(10)?;

    Ok(Job {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        campaign_id: Uuid::parse_str(&campaign_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        phase_type: Phase::parse(&phase).ok_or_else(|| DbError::MappingError(format!("unknown phase '{phase}'")))?,
        status: JobStatus::parse(&status).ok_or_else(|| DbError::MappingError(format!("unknown status '{status}'")))?,
        scheduled_at: parse_timestamp(&scheduled_at)?,
        leased_by,
        lease_deadline: lease_deadline.as_deref().map(parse_timestamp).transpose()?,
        attempts: attempts as u32,
        max_attempts: max_attempts as u32,
        last_error,
        payload: serde_json::from_str(&payload_json).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| DbError::MappingError(err.to_string()))
}
