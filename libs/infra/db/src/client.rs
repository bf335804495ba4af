// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 * =================================================================
 */

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::DbError;
use crate::schema::apply_schema;

#[derive(Clone)]
pub struct DbClient {
    driver: Arc<Database>,
    /// Keeps an in-memory database alive across connections; dropped
    /// for disk/remote targets where the file or remote host persists.
    _memory_anchor: Option<Arc<Connection>>,
}

impl DbClient {
    #[instrument(skip(access_token))]
    pub async fn connect(database_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if database_url.is_empty() {
            return Err(DbError::ConnectionError("CAMPAIGN_DATABASE_URL is unset".into()));
        }

        let is_remote = database_url.starts_with("libsql://") || database_url.starts_with("https://");
        let is_memory = database_url.contains(":memory:");

        info!(url = %database_url, "🔌 opening database link");

        let driver = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::ConnectionError("remote database requires an access token".into()))?;
            Builder::new_remote(database_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_url).build().await
        }
        .map_err(|err| DbError::ConnectionError(err.to_string()))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = driver.connect().map_err(|err| DbError::ConnectionError(err.to_string()))?;
            apply_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
        } else {
            let bootstrap_conn = driver.connect().map_err(|err| DbError::ConnectionError(err.to_string()))?;
            apply_schema(&bootstrap_conn).await?;
        }

        Ok(Self { driver, _memory_anchor: anchor })
    }

    pub fn connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|err| DbError::ConnectionError(err.to_string()))
    }
}
