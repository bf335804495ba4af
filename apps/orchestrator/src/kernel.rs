// [apps/orchestrator/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR KERNEL (ESTRATO L0-APP)
 * RESPONSABILIDAD: IGNICIÓN Y ARRANQUE DE DAEMONS EN SEGUNDO PLANO
 *
 * Grounded on the teacher's `OrchestratorKernel::ignite` /
 * `launch_sovereign_operations` split in `kernel.rs`: `ignite` opens
 * the database link and assembles `AppState`; the launch step spawns
 * every background daemon and then blocks. The teacher's launch step
 * ends in `axum::serve(...)` — no HTTP façade exists here (spec.md §1
 * Non-goals), so it ends in a signal wait instead.
 * =================================================================
 */

use std::sync::Arc;

use campaign_infra_db::DbClient;
use tracing::info;

use crate::config::Config;
use crate::security::{NullSecurityContextProvider, SecurityContextProvider};
use crate::services::{proxy_prober, reaper, worker_pool};
use crate::state::AppState;

pub struct OrchestratorKernel {
    pub state: AppState,
}

impl OrchestratorKernel {
    /// Opens the database link (applying the schema as a side effect
    /// of `DbClient::connect`) and assembles the shared `AppState`.
    pub async fn ignite(config: Config) -> anyhow::Result<Self> {
        info!("igniting orchestrator kernel");

        let db = DbClient::connect(&config.database_url, config.database_auth_token.clone()).await?;
        let security: Arc<dyn SecurityContextProvider> = Arc::new(NullSecurityContextProvider);
        let state = AppState::new(db, config, security)?;

        Ok(Self { state })
    }

    /// Spawns every background daemon (worker pool, lease reaper, proxy
    /// prober) and then waits for a shutdown signal. Each daemon owns
    /// its own loop and its own clone of `AppState`; this function
    /// never touches them again once spawned.
    pub async fn launch_sovereign_operations(self) -> anyhow::Result<()> {
        let worker_count = self.state.config.current().worker_count;
        worker_pool::spawn_worker_pool(self.state.clone(), worker_count);
        reaper::spawn_reaper(self.state.clone());
        proxy_prober::spawn_proxy_prober(self.state.clone());

        info!(worker_count, "background operations launched, awaiting shutdown signal");
        tokio::signal::ctrl_c().await?;
        info!("shutdown signal received, kernel exiting");

        Ok(())
    }
}
