// [apps/orchestrator/src/services/reaper.rs]
/*!
 * =================================================================
 * APARATO: LEASE REAPER (ESTRATO L1-APP)
 * RESPONSABILIDAD: RECUPERACIÓN DE JOBS CON ARRENDAMIENTO EXPIRADO
 *
 * Implementa spec.md §4.F "reclaim": un worker que muere a mitad de un
 * job deja su lease expirar; este daemon periódicamente lo vuelve a
 * `queued` para que otro worker lo recoja. Grounded on the teacher's
 * `spawn_reaper` daemon shape in `services/reaper.rs`.
 * =================================================================
 */

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::state::AppState;

pub fn spawn_reaper(state: AppState) {
    tokio::spawn(async move {
        let interval_seconds = state.config.current().queue_reclaim_interval_seconds;
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));

        loop {
            ticker.tick().await;
            match state.job_queue.reclaim_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(reclaimed) => info!(reclaimed, "reaper requeued expired leases"),
                Err(err) => warn!(error = %err, "reaper failed to reclaim expired leases"),
            }
        }
    });
}
