// [libs/infra/db/src/repositories/campaign.rs]
/*!
 * Campaign aggregate + per-phase progress + phase config persistence
 * (spec.md §3 "Campaign", "Phase configuration", §4.I).
 */

use campaign_domain_models::{Campaign, CampaignPhaseProgress, Phase, PhaseConfig, PhaseStatus, ProgressCounters};
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

pub struct CampaignRepository {
    conn: Connection,
}

impl CampaignRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, campaign))]
    pub async fn insert(&self, campaign: &Campaign) -> Result<(), DbError> {
        self.conn
            .execute(
                r#"INSERT INTO campaigns (
                    id, name, owner_id, current_phase, phase_status,
                    total_items, processed_items, successful_items, failed_items,
                    created_at, updated_at, started_at, completed_at, error_message
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
                params![
                    campaign.id.to_string(),
                    campaign.name.clone(),
                    campaign.owner_id.to_string(),
                    campaign.current_phase.as_str(),
                    campaign.phase_status.as_str(),
                    campaign.progress.total_items as i64,
                    campaign.progress.processed_items as i64,
                    campaign.progress.successful_items as i64,
                    campaign.progress.failed_items as i64,
                    campaign.created_at.to_rfc3339(),
                    campaign.updated_at.to_rfc3339(),
                    campaign.started_at.map(|t| t.to_rfc3339()),
                    campaign.completed_at.map(|t| t.to_rfc3339()),
                    campaign.error_message.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, campaign_id: Uuid) -> Result<Campaign, DbError> {
        let mut rows = self
            .conn
            .query("SELECT * FROM campaigns WHERE id = ?1", params![campaign_id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => map_campaign_row(&row),
            None => Err(DbError::NotFound),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: Option<Uuid>, limit: u32, offset: u32) -> Result<(Vec<Campaign>, u64), DbError> {
        let (query, count_query) = match owner_id {
            Some(_) => (
                "SELECT * FROM campaigns WHERE owner_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                "SELECT COUNT(*) FROM campaigns WHERE owner_id = ?1",
            ),
            None => (
                "SELECT * FROM campaigns ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                "SELECT COUNT(*) FROM campaigns",
            ),
        };

        let mut rows = match owner_id {
            Some(owner) => {
                self.conn
                    .query(query, params![owner.to_string(), limit as i64, offset as i64])
                    .await?
            }
            None => self.conn.query(query, params![limit as i64, offset as i64]).await?,
        };

        let mut campaigns = Vec::new();
        while let Some(row) = rows.next().await? {
            campaigns.push(map_campaign_row(&row)?);
        }

        let total: i64 = match owner_id {
            Some(owner) => {
                let mut count_rows = self.conn.query(count_query, params![owner.to_string()]).await?;
                count_rows.next().await?.ok_or(DbError::NotFound)?.get(0)?
            }
            None => {
                let mut count_rows = self.conn.query(count_query, ()).await?;
                count_rows.next().await?.ok_or(DbError::NotFound)?.get(0)?
            }
        };

        Ok((campaigns, total as u64))
    }

    /// Persists the full campaign row. Used after every state-machine
    /// transition (`configure`, `start`, `pause`, `resume`, `complete`,
    /// `fail`, `cancel`) within the same campaign-scoped transaction
    /// that produced the new in-memory state.
    #[instrument(skip(self, campaign))]
    pub async fn save(&self, campaign: &Campaign) -> Result<(), DbError> {
        let updated = self
            .conn
            .execute(
                r#"UPDATE campaigns SET
                    name = ?2, current_phase = ?3, phase_status = ?4,
                    total_items = ?5, processed_items = ?6, successful_items = ?7, failed_items = ?8,
                    updated_at = ?9, started_at = ?10, completed_at = ?11, error_message = ?12
                WHERE id = ?1"#,
                params![
                    campaign.id.to_string(),
                    campaign.name.clone(),
                    campaign.current_phase.as_str(),
                    campaign.phase_status.as_str(),
                    campaign.progress.total_items as i64,
                    campaign.progress.processed_items as i64,
                    campaign.progress.successful_items as i64,
                    campaign.progress.failed_items as i64,
                    campaign.updated_at.to_rfc3339(),
                    campaign.started_at.map(|t| t.to_rfc3339()),
                    campaign.completed_at.map(|t| t.to_rfc3339()),
                    campaign.error_message.clone(),
                ],
            )
            .await?;

        if updated == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, progress))]
    pub async fn upsert_phase_progress(&self, progress: &CampaignPhaseProgress) -> Result<(), DbError> {
        self.conn
            .execute(
                r#"INSERT INTO campaign_phase_progress (
                    campaign_id, phase, total_items, processed_items, successful_items, failed_items,
                    started_at, completed_at, error_message
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(campaign_id, phase) DO UPDATE SET
                    total_items = excluded.total_items,
                    processed_items = excluded.processed_items,
                    successful_items = excluded.successful_items,
                    failed_items = excluded.failed_items,
                    started_at = excluded.started_at,
                    completed_at = excluded.completed_at,
                    error_message = excluded.error_message"#,
                params![
                    progress.campaign_id.to_string(),
                    progress.phase.as_str(),
                    progress.progress.total_items as i64,
                    progress.progress.processed_items as i64,
                    progress.progress.successful_items as i64,
                    progress.progress.failed_items as i64,
                    progress.started_at.map(|t| t.to_rfc3339()),
                    progress.completed_at.map(|t| t.to_rfc3339()),
                    progress.error_message.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Atomically bumps the three counters in place (a single `UPDATE`,
    /// not a read-modify-write from Rust) so concurrent workers acking
    /// different jobs for the same campaign×phase never clobber each
    /// other's deltas.
    #[instrument(skip(self))]
    pub async fn record_phase_progress_delta(
        &self,
        campaign_id: Uuid,
        phase: Phase,
        processed_delta: u64,
        successful_delta: u64,
        failed_delta: u64,
    ) -> Result<CampaignPhaseProgress, DbError> {
        self.conn
            .execute(
                r#"UPDATE campaign_phase_progress SET
                    processed_items = processed_items + ?3,
                    successful_items = successful_items + ?4,
                    failed_items = failed_items + ?5
                WHERE campaign_id = ?1 AND phase = ?2"#,
                params![
                    campaign_id.to_string(),
                    phase.as_str(),
                    processed_delta as i64,
                    successful_delta as i64,
                    failed_delta as i64,
                ],
            )
            .await?;

        self.get_phase_progress(campaign_id, phase).await
    }

    /// Mirror of `record_phase_progress_delta` for the campaign row's own
    /// `progress` (spec.md §3: it tracks the current phase's counters).
    #[instrument(skip(self))]
    pub async fn record_campaign_progress_delta(
        &self,
        campaign_id: Uuid,
        processed_delta: u64,
        successful_delta: u64,
        failed_delta: u64,
    ) -> Result<(), DbError> {
        self.conn
            .execute(
                r#"UPDATE campaigns SET
                    processed_items = processed_items + ?2,
                    successful_items = successful_items + ?3,
                    failed_items = failed_items + ?4
                WHERE id = ?1"#,
                params![campaign_id.to_string(), processed_delta as i64, successful_delta as i64, failed_delta as i64],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_phase_progress(&self, campaign_id: Uuid, phase: Phase) -> Result<CampaignPhaseProgress, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT campaign_id, phase, total_items, processed_items, successful_items, failed_items, started_at, completed_at, error_message
                 FROM campaign_phase_progress WHERE campaign_id = ?1 AND phase = ?2",
                params![campaign_id.to_string(), phase.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => map_phase_progress_row(&row),
            None => Err(DbError::NotFound),
        }
    }

    #[instrument(skip(self, config))]
    pub async fn upsert_phase_config(&self, campaign_id: Uuid, config: &PhaseConfig, now: DateTime<Utc>) -> Result<u32, DbError> {
        let phase = config.phase();
        let payload = serde_json::to_string(config).map_err(|err| DbError::MappingError(err.to_string()))?;

        self.conn
            .execute(
                r#"INSERT INTO phase_configs (campaign_id, phase, version, payload_json, updated_at)
                VALUES (?1, ?2, 1, ?3, ?4)
                ON CONFLICT(campaign_id, phase) DO UPDATE SET
                    version = phase_configs.version + 1,
                    payload_json = excluded.payload_json,
                    updated_at = excluded.updated_at"#,
                params![campaign_id.to_string(), phase.as_str(), payload, now.to_rfc3339()],
            )
            .await?;

        let mut rows = self
            .conn
            .query(
                "SELECT version FROM phase_configs WHERE campaign_id = ?1 AND phase = ?2",
                params![campaign_id.to_string(), phase.as_str()],
            )
            .await?;
        let version: i64 = rows.next().await?.ok_or(DbError::NotFound)?.get(0)?;
        Ok(version as u32)
    }

    #[instrument(skip(self))]
    pub async fn get_phase_config(&self, campaign_id: Uuid, phase: Phase) -> Result<PhaseConfig, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload_json FROM phase_configs WHERE campaign_id = ?1 AND phase = ?2",
                params![campaign_id.to_string(), phase.as_str()],
            )
            .await?;

        let row = rows.next().await?.ok_or(DbError::NotFound)?;
        let payload: String = row.get(0)?;
        serde_json::from_str(&payload).map_err(|err| DbError::MappingError(err.to_string()))
    }
}

fn map_campaign_row(row: &libsql::Row) -> Result<Campaign, DbError> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let owner_id: String = row.get(2)?;
    let current_phase: String = row.get(3)?;
    let phase_status: String = row.get(4)?;
    let total_items: i64 = row.get(5)?;
    let processed_items: i64 = row.get(6)?;
    let successful_items: i64 = row.get(7)?;
    let failed_items: i64 = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    let started_at: Option<String> = row.get(11)?;
    let completed_at: Option<String> = row.get(12)?;
    let error_message: Option<String> = row.get(13)?;

    Ok(Campaign {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        name,
        owner_id: Uuid::parse_str(&owner_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        current_phase: Phase::parse(&current_phase).ok_or_else(|| DbError::MappingError(format!("unknown phase '{current_phase}'")))?,
        phase_status: PhaseStatus::parse(&phase_status).ok_or_else(|| DbError::MappingError(format!("unknown phase_status '{phase_status}'")))?,
        progress: ProgressCounters {
            total_items: total_items as u64,
            processed_items: processed_items as u64,
            successful_items: successful_items as u64,
            failed_items: failed_items as u64,
        },
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        started_at: started_at.as_deref().map(parse_timestamp).transpose()?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        error_message,
    })
}

fn map_phase_progress_row(row: &libsql::Row) -> Result<CampaignPhaseProgress, DbError> {
    let campaign_id: String = row.get(0)?;
    let phase: String = row.get(1)?;
    let total_items: i64 = row.get(2)?;
    let processed_items: i64 = row.get(3)?;
    let successful_items: i64 = row.get(4)?;
    let failed_items: i64 = row.get(5)?;
    let started_at: Option<String> = row.get(6)?;
    let completed_at: Option<String> = row.get(7)?;
    let error_message: Option<String> = row.get(8)?;

    Ok(CampaignPhaseProgress {
        campaign_id: Uuid::parse_str(&campaign_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        phase: Phase::parse(&phase).ok_or_else(|| DbError::MappingError(format!("unknown phase '{phase}'")))?,
        progress: ProgressCounters {
            total_items: total_items as u64,
            processed_items: processed_items as u64,
            successful_items: successful_items as u64,
            failed_items: failed_items as u64,
        },
        started_at: started_at.as_deref().map(parse_timestamp).transpose()?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        error_message,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| DbError::MappingError(err.to_string()))
}
