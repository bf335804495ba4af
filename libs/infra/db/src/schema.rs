// [libs/infra/db/src/schema.rs]
/*!
 * Idempotent schema application (spec.md §3 "Data Model"). Every
 * statement is `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT
 * EXISTS` so boot-time application is safe to run on every process
 * start, including against a database another replica already
 * migrated.
 */

use libsql::Connection;
use tracing::{debug, instrument};

use crate::errors::DbError;

const TABLES: &[(&str, &str)] = &[
    ("campaigns", r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            current_phase TEXT NOT NULL,
            phase_status TEXT NOT NULL,
            total_items INTEGER NOT NULL DEFAULT 0,
            processed_items INTEGER NOT NULL DEFAULT 0,
            successful_items INTEGER NOT NULL DEFAULT 0,
            failed_items INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT,
            error_message TEXT
        );
    "#),
    ("campaign_phase_progress", r#"
        CREATE TABLE IF NOT EXISTS campaign_phase_progress (
            campaign_id TEXT NOT NULL,
            phase TEXT NOT NULL,
            total_items INTEGER NOT NULL DEFAULT 0,
            processed_items INTEGER NOT NULL DEFAULT 0,
            successful_items INTEGER NOT NULL DEFAULT 0,
            failed_items INTEGER NOT NULL DEFAULT 0,
            started_at TEXT,
            completed_at TEXT,
            error_message TEXT,
            PRIMARY KEY (campaign_id, phase)
        );
    "#),
    ("phase_configs", r#"
        CREATE TABLE IF NOT EXISTS phase_configs (
            campaign_id TEXT NOT NULL,
            phase TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            payload_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (campaign_id, phase)
        );
    "#),
    ("generated_domains", r#"
        CREATE TABLE IF NOT EXISTS generated_domains (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            offset_value INTEGER NOT NULL,
            value TEXT NOT NULL,
            tld TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(campaign_id, offset_value)
        );
    "#),
    ("dns_results", r#"
        CREATE TABLE IF NOT EXISTS dns_results (
            id TEXT PRIMARY KEY,
            generated_domain_id TEXT NOT NULL,
            campaign_id TEXT NOT NULL,
            verdict TEXT NOT NULL,
            records_json TEXT NOT NULL,
            persona_used TEXT NOT NULL,
            attempt_count INTEGER NOT NULL,
            completed_at TEXT NOT NULL,
            UNIQUE(generated_domain_id)
        );
    "#),
    ("http_results", r#"
        CREATE TABLE IF NOT EXISTS http_results (
            id TEXT PRIMARY KEY,
            generated_domain_id TEXT NOT NULL,
            campaign_id TEXT NOT NULL,
            status_code INTEGER,
            final_url TEXT,
            body_size INTEGER,
            truncated INTEGER NOT NULL DEFAULT 0,
            matches_json TEXT NOT NULL,
            persona_used TEXT NOT NULL,
            proxy_used TEXT,
            error_kind TEXT,
            completed_at TEXT NOT NULL,
            UNIQUE(generated_domain_id)
        );
    "#),
    ("leads", r#"
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            generated_domain_id TEXT NOT NULL,
            http_result_id TEXT NOT NULL,
            attributes_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    "#),
    ("jobs", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            phase TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            attempts INTEGER NOT NULL DEFAULT 0,
            max_attempts INTEGER NOT NULL DEFAULT 5,
            scheduled_at TEXT NOT NULL,
            leased_by TEXT,
            lease_deadline TEXT,
            last_error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("personas", r#"
        CREATE TABLE IF NOT EXISTS personas (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            config_json TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name, kind)
        );
    "#),
    ("proxies", r#"
        CREATE TABLE IF NOT EXISTS proxies (
            id TEXT PRIMARY KEY,
            address TEXT NOT NULL,
            credentials TEXT,
            protocol TEXT NOT NULL,
            consecutive_errors INTEGER NOT NULL DEFAULT 0,
            last_success_at TEXT,
            last_checked_at TEXT,
            last_error TEXT,
            quarantine_until TEXT,
            geo TEXT
        );
    "#),
    ("proxy_pool_members", r#"
        CREATE TABLE IF NOT EXISTS proxy_pool_members (
            pool_id TEXT NOT NULL,
            proxy_id TEXT NOT NULL,
            PRIMARY KEY (pool_id, proxy_id)
        );
    "#),
];

const INDEXES: &[(&str, &str)] = &[
    ("idx_jobs_campaign_phase_status", "CREATE INDEX IF NOT EXISTS idx_jobs_campaign_phase_status ON jobs(campaign_id, phase, status);"),
    ("idx_jobs_scheduled_at", "CREATE INDEX IF NOT EXISTS idx_jobs_scheduled_at ON jobs(scheduled_at);"),
    ("idx_generated_domains_campaign", "CREATE INDEX IF NOT EXISTS idx_generated_domains_campaign ON generated_domains(campaign_id);"),
    ("idx_leads_campaign", "CREATE INDEX IF NOT EXISTS idx_leads_campaign ON leads(campaign_id);"),
    ("idx_proxies_quarantine", "CREATE INDEX IF NOT EXISTS idx_proxies_quarantine ON proxies(quarantine_until);"),
];

#[instrument(skip(conn))]
pub async fn apply_schema(conn: &Connection) -> Result<(), DbError> {
    for (name, statement) in TABLES {
        conn.execute(statement, ()).await.map_err(|err| {
            DbError::ConnectionError(format!("schema step '{name}' failed: {err}"))
        })?;
        debug!(step = name, "📐 schema table applied");
    }

    for (name, statement) in INDEXES {
        conn.execute(statement, ()).await.map_err(|err| {
            DbError::ConnectionError(format!("schema step '{name}' failed: {err}"))
        })?;
        debug!(step = name, "📐 schema index applied");
    }

    Ok(())
}
