// [libs/infra/db/src/repositories/persona.rs]
/*!
 * Persona store persistence (spec.md §4.A). Uniqueness on
 * `(name, kind)` is enforced by the schema; violating it surfaces as
 * `DbError::Conflict` to the persona-store crate.
 */

use campaign_domain_models::{Persona, PersonaConfig, PersonaKind};
use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

pub struct PersonaRepository {
    conn: Connection,
}

impl PersonaRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, persona))]
    pub async fn insert(&self, persona: &Persona) -> Result<(), DbError> {
        let config_json = serde_json::to_string(&persona.config).map_err(|err| DbError::MappingError(err.to_string()))?;
        let result = self
            .conn
            .execute(
                r#"INSERT INTO personas (id, name, kind, config_json, enabled, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                params![
                    persona.id.to_string(),
                    persona.name.clone(),
                    persona.config.kind().as_str(),
                    config_json,
                    persona.enabled as i64,
                    persona.created_at.to_rfc3339(),
                    persona.updated_at.to_rfc3339(),
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(libsql::Error::SqliteFailure(code, _)) if code == 2067 || code == 1555 => Err(DbError::Conflict),
            Err(err) => Err(DbError::QueryError(err)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Persona, DbError> {
        let mut rows = self.conn.query("SELECT * FROM personas WHERE id = ?1", params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => map_persona_row(&row),
            None => Err(DbError::NotFound),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, kind: Option<PersonaKind>) -> Result<Vec<Persona>, DbError> {
        let mut rows = match kind {
            Some(kind) => self.conn.query("SELECT * FROM personas WHERE kind = ?1 ORDER BY name ASC", params![kind.as_str()]).await?,
            None => self.conn.query("SELECT * FROM personas ORDER BY name ASC", ()).await?,
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_persona_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, config))]
    pub async fn update(&self, id: Uuid, name: &str, config: &PersonaConfig, enabled: bool, now: DateTime<Utc>) -> Result<(), DbError> {
        let config_json = serde_json::to_string(config).map_err(|err| DbError::MappingError(err.to_string()))?;
        let affected = self
            .conn
            .execute(
                r#"UPDATE personas SET name = ?2, kind = ?3, config_json = ?4, enabled = ?5, updated_at = ?6 WHERE id = ?1"#,
                params![id.to_string(), name, config.kind().as_str(), config_json, enabled as i64, now.to_rfc3339()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let affected = self.conn.execute("DELETE FROM personas WHERE id = ?1", params![id.to_string()]).await?;
        if affected == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

fn map_persona_row(row: &libsql::Row) -> Result<Persona, DbError> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let _kind: String = row.get(2)?;
    let config_json: String = row.get(3)?;
    let enabled: i64 = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(Persona {
        id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        name,
        config: serde_json::from_str(&config_json).map_err(|e| DbError::MappingError(e.to_string()))?,
        enabled: enabled != 0,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| DbError::MappingError(err.to_string()))
}
