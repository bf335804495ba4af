// [libs/infra/db/src/repositories/proxy.rs]
/*!
 * Proxy pool persistence (spec.md §4.B). Quarantine state lives on the
 * row itself; the proxy-pool crate decides acquisition strategy and
 * quarantine windows, this layer only stores and filters.
 */

use campaign_domain_models::{Proxy, ProxyProtocol};
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

pub struct ProxyRepository {
    conn: Connection,
}

impl ProxyRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, proxy))]
    pub async fn insert(&self, proxy: &Proxy) -> Result<(), DbError> {
        self.conn
            .execute(
                r#"INSERT INTO proxies (id, address, credentials, protocol, consecutive_errors, last_success_at, last_checked_at, last_error, quarantine_until, geo)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                params![
                    proxy.id.to_string(),
                    proxy.address.clone(),
                    proxy.credentials.clone(),
                    protocol_str(proxy.protocol),
                    proxy.consecutive_errors as i64,
                    proxy.last_success_at.map(|t| t.to_rfc3339()),
                    proxy.last_checked_at.map(|t| t.to_rfc3339()),
                    proxy.last_error.clone(),
                    proxy.quarantine_until.map(|t| t.to_rfc3339()),
                    proxy.geo.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Assigns a proxy to a named pool (spec.md §4.B, §6 `proxy_pool_members`).
    /// Idempotent: re-adding an existing membership is a no-op.
    #[instrument(skip(self))]
    pub async fn add_pool_member(&self, pool_id: Uuid, proxy_id: Uuid) -> Result<(), DbError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO proxy_pool_members (pool_id, proxy_id) VALUES (?1, ?2)",
                params![pool_id.to_string(), proxy_id.to_string()],
            )
            .await?;
        Ok(())
    }

    /// Removes a proxy from a named pool.
    #[instrument(skip(self))]
    pub async fn remove_pool_member(&self, pool_id: Uuid, proxy_id: Uuid) -> Result<(), DbError> {
        self.conn
            .execute(
                "DELETE FROM proxy_pool_members WHERE pool_id = ?1 AND proxy_id = ?2",
                params![pool_id.to_string(), proxy_id.to_string()],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Proxy, DbError> {
        let mut rows = self.conn.query("SELECT * FROM proxies WHERE id = ?1", params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => map_proxy_row(&row),
            None => Err(DbError::NotFound),
        }
    }

    /// Candidates available for acquisition right now: not quarantined
    /// as of `now`, optionally narrowed to a pool (joins
    /// `proxy_pool_members`) and/or a geo. `pool_id`/`geo` absent means
    /// unscoped on that axis, matching `AcquisitionPolicy`'s optional
    /// fields (spec.md §4.B).
    #[instrument(skip(self))]
    pub async fn list_available(&self, now: DateTime<Utc>, pool_id: Option<Uuid>, geo: Option<&str>) -> Result<Vec<Proxy>, DbError> {
        let mut rows = match (pool_id, geo) {
            (Some(pool_id), Some(geo)) => {
                self.conn
                    .query(
                        "SELECT p.* FROM proxies p
                         JOIN proxy_pool_members m ON m.proxy_id = p.id
                         WHERE (p.quarantine_until IS NULL OR p.quarantine_until <= ?1)
                           AND m.pool_id = ?2 AND p.geo = ?3",
                        params![now.to_rfc3339(), pool_id.to_string(), geo.to_string()],
                    )
                    .await?
            }
            (Some(pool_id), None) => {
                self.conn
                    .query(
                        "SELECT p.* FROM proxies p
                         JOIN proxy_pool_members m ON m.proxy_id = p.id
                         WHERE (p.quarantine_until IS NULL OR p.quarantine_until <= ?1)
                           AND m.pool_id = ?2",
                        params![now.to_rfc3339(), pool_id.to_string()],
                    )
                    .await?
            }
            (None, Some(geo)) => {
                self.conn
                    .query(
                        "SELECT * FROM proxies WHERE (quarantine_until IS NULL OR quarantine_until <= ?1) AND geo = ?2",
                        params![now.to_rfc3339(), geo.to_string()],
                    )
                    .await?
            }
            (None, None) => {
                self.conn
                    .query(
                        "SELECT * FROM proxies WHERE quarantine_until IS NULL OR quarantine_until <= ?1",
                        params![now.to_rfc3339()],
                    )
                    .await?
            }
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_proxy_row(&row)?);
        }
        Ok(out)
    }

    /// The inverse of `list_available`: proxies currently excluded from
    /// acquisition. Feeds the periodic quarantine-probe task (spec.md §4.B).
    #[instrument(skip(self))]
    pub async fn list_quarantined(&self, now: DateTime<Utc>) -> Result<Vec<Proxy>, DbError> {
        let mut rows = self
            .conn
            .query("SELECT * FROM proxies WHERE quarantine_until > ?1", params![now.to_rfc3339()])
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_proxy_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, proxy))]
    pub async fn save(&self, proxy: &Proxy) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                r#"UPDATE proxies SET
                    consecutive_errors = ?2, last_success_at = ?3, last_checked_at = ?4,
                    last_error = ?5, quarantine_until = ?6
                WHERE id = ?1"#,
                params![
                    proxy.id.to_string(),
                    proxy.consecutive_errors as i64,
                    proxy.last_success_at.map(|t| t.to_rfc3339()),
                    proxy.last_checked_at.map(|t| t.to_rfc3339()),
                    proxy.last_error.clone(),
                    proxy.quarantine_until.map(|t| t.to_rfc3339()),
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

fn protocol_str(protocol: ProxyProtocol) -> &'static str {
    match protocol {
        ProxyProtocol::Http => "http",
        ProxyProtocol::Https => "https",
        ProxyProtocol::Socks5 => "socks5",
    }
}

fn parse_protocol(value: &str) -> Result<ProxyProtocol, DbError> {
    match value {
        "http" => Ok(ProxyProtocol::Http),
        "https" => Ok(ProxyProtocol::Https),
        "socks5" => Ok(ProxyProtocol::Socks5),
        other => Err(DbError::MappingError(format!("unknown proxy protocol '{other}'"))),
    }
}

fn map_proxy_row(row: &libsql::Row) -> Result<Proxy, DbError> {
    let id: String = row.get(0)?;
    let address: String = row.get(1)?;
    let credentials: Option<String> = row.get(2)?;
    let protocol: String = row.get(3)?;
    let consecutive_errors: i64 = row.get(4)?;
    let last_success_at: Option<String> = row.get(5)?;
    let last_checked_at: Option<String> = row.get(6)?;
    let last_error: Option<String> = row.get(7)?;
    let quarantine_until: Option<String> = row.get(8)?;
    let geo: Option<String> = row.get(9)?;

    Ok(Proxy {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        address,
        credentials,
        protocol: parse_protocol(&protocol)?,
        consecutive_errors: consecutive_errors as u32,
        last_success_at: last_success_at.as_deref().map(parse_timestamp).transpose()?,
        last_checked_at: last_checked_at.as_deref().map(parse_timestamp).transpose()?,
        last_error,
        quarantine_until: quarantine_until.as_deref().map(parse_timestamp).transpose()?,
        geo,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| DbError::MappingError(err.to_string()))
}
