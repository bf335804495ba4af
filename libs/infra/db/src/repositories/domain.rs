// [libs/infra/db/src/repositories/domain.rs]
/*!
 * Generated domains and the DNS/HTTP results and leads chained off
 * them (spec.md §3, §4.G phase executors). Writes are upserts keyed on
 * natural identifiers per Design Note §9, so a crashed-and-replayed
 * batch never double-counts.
 */

use campaign_domain_models::{DnsResult, DnsVerdict, GeneratedDomain, HttpResult, Lead};
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

pub struct DomainRepository {
    conn: Connection,
}

impl DomainRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts a batch of generated domains inside one transaction,
    /// ignoring rows that already exist for `(campaign_id, offset)` —
    /// the idempotent replay path after a crashed generation job.
    #[instrument(skip(self, domains))]
    pub async fn insert_batch(&self, domains: &[GeneratedDomain]) -> Result<u64, DbError> {
        let tx = self.conn.transaction().await.map_err(|err| DbError::TransactionError(err.to_string()))?;
        let mut inserted = 0u64;

        for domain in domains {
            let affected = tx
                .execute(
                    r#"INSERT OR IGNORE INTO generated_domains (id, campaign_id, offset_value, value, tld, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        domain.id.to_string(),
                        domain.campaign_id.to_string(),
                        domain.offset as i64,
                        domain.value.clone(),
                        domain.tld.clone(),
                        domain.created_at.to_rfc3339(),
                    ],
                )
                .await?;
            inserted += affected;
        }

        tx.commit().await.map_err(|err| DbError::TransactionError(err.to_string()))?;
        Ok(inserted)
    }

    /// Fetches a specific set of generated domains by id, scoped to
    /// `campaign_id`. Used by the worker pool to resolve a validation
    /// job's `domain_ids` back into the domain values DNS/HTTP need.
    #[instrument(skip(self, ids))]
    pub async fn list_by_ids(&self, campaign_id: Uuid, ids: &[Uuid]) -> Result<Vec<GeneratedDomain>, DbError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let mut rows = self
                .conn
                .query(
                    "SELECT id, campaign_id, offset_value, value, tld, created_at FROM generated_domains
                     WHERE campaign_id = ?1 AND id = ?2",
                    params![campaign_id.to_string(), id.to_string()],
                )
                .await?;
            if let Some(row) = rows.next().await? {
                out.push(map_generated_domain_row(&row)?);
            }
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn list_by_campaign(&self, campaign_id: Uuid, limit: u32, offset: u32) -> Result<Vec<GeneratedDomain>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, campaign_id, offset_value, value, tld, created_at FROM generated_domains
                 WHERE campaign_id = ?1 ORDER BY offset_value ASC LIMIT ?2 OFFSET ?3",
                params![campaign_id.to_string(), limit as i64, offset as i64],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_generated_domain_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, result))]
    pub async fn upsert_dns_result(&self, result: &DnsResult) -> Result<(), DbError> {
        let records_json = serde_json::to_string(&result.records).map_err(|err| DbError::MappingError(err.to_string()))?;
        self.conn
            .execute(
                r#"INSERT INTO dns_results (id, generated_domain_id, campaign_id, verdict, records_json, persona_used, attempt_count, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(generated_domain_id) DO UPDATE SET
                    verdict = excluded.verdict,
                    records_json = excluded.records_json,
                    persona_used = excluded.persona_used,
                    attempt_count = excluded.attempt_count,
                    completed_at = excluded.completed_at"#,
                params![
                    result.id.to_string(),
                    result.generated_domain_id.to_string(),
                    result.campaign_id.to_string(),
                    result.verdict.as_str(),
                    records_json,
                    result.persona_used.to_string(),
                    result.attempt_count as i64,
                    result.completed_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, result))]
    pub async fn upsert_http_result(&self, result: &HttpResult) -> Result<(), DbError> {
        let matches_json = serde_json::to_string(&result.matches).map_err(|err| DbError::MappingError(err.to_string()))?;
        self.conn
            .execute(
                r#"INSERT INTO http_results (
                    id, generated_domain_id, campaign_id, status_code, final_url, body_size,
                    truncated, matches_json, persona_used, proxy_used, error_kind, completed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(generated_domain_id) DO UPDATE SET
                    status_code = excluded.status_code,
                    final_url = excluded.final_url,
                    body_size = excluded.body_size,
                    truncated = excluded.truncated,
                    matches_json = excluded.matches_json,
                    persona_used = excluded.persona_used,
                    proxy_used = excluded.proxy_used,
                    error_kind = excluded.error_kind,
                    completed_at = excluded.completed_at"#,
                params![
                    result.id.to_string(),
                    result.generated_domain_id.to_string(),
                    result.campaign_id.to_string(),
                    result.status_code.map(|s| s as i64),
                    result.final_url.clone(),
                    result.body_size.map(|s| s as i64),
                    result.truncated as i64,
                    matches_json,
                    result.persona_used.to_string(),
                    result.proxy_used.map(|p| p.to_string()),
                    result.error_kind.clone(),
                    result.completed_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, lead))]
    pub async fn insert_lead(&self, lead: &Lead) -> Result<(), DbError> {
        self.conn
            .execute(
                r#"INSERT INTO leads (id, campaign_id, generated_domain_id, http_result_id, attributes_json, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                params![
                    lead.id.to_string(),
                    lead.campaign_id.to_string(),
                    lead.generated_domain_id.to_string(),
                    lead.http_result_id.to_string(),
                    lead.attributes.to_string(),
                    lead.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_leads(&self, campaign_id: Uuid, limit: u32, offset: u32) -> Result<Vec<Lead>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, campaign_id, generated_domain_id, http_result_id, attributes_json, created_at
                 FROM leads WHERE campaign_id = ?1 ORDER BY created_at ASC LIMIT ?2 OFFSET ?3",
                params![campaign_id.to_string(), limit as i64, offset as i64],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let campaign_id: String = row.get(1)?;
            let generated_domain_id: String = row.get(2)?;
            let http_result_id: String = row.get(3)?;
            let attributes_json: String = row.get(4)?;
            let created_at: String = row.get(5)?;

            out.push(Lead {
                id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
                campaign_id: Uuid::parse_str(&campaign_id).map_err(|e| DbError::MappingError(e.to_string()))?,
                generated_domain_id: Uuid::parse_str(&generated_domain_id).map_err(|e| DbError::MappingError(e.to_string()))?,
                http_result_id: Uuid::parse_str(&http_result_id).map_err(|e| DbError::MappingError(e.to_string()))?,
                attributes: serde_json::from_str(&attributes_json).map_err(|e| DbError::MappingError(e.to_string()))?,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(out)
    }
}

fn map_generated_domain_row(row: &libsql::Row) -> Result<GeneratedDomain, DbError> {
    let id: String = row.get(0)?;
    let campaign_id: String = row.get(1)?;
    let offset_value: i64 = row.get(2)?;
    let value: String = row.get(3)?;
    let tld: String = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(GeneratedDomain {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        campaign_id: Uuid::parse_str(&campaign_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        offset: offset_value as u64,
        value,
        tld,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| DbError::MappingError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_round_trips_through_its_str_form() {
        for verdict in [DnsVerdict::Resolved, DnsVerdict::NxDomain, DnsVerdict::ServFail, DnsVerdict::Timeout, DnsVerdict::Other] {
            assert_eq!(DnsVerdict::parse(verdict.as_str()), Some(verdict));
        }
    }
}
