// [apps/orchestrator/src/routes.rs]
/*!
 * An HTTP façade over this state is explicitly out of scope (spec.md
 * §1 Non-goals: "no HTTP/gRPC transport layer, no authentication").
 * What remains of the teacher's `routes.rs` is the one shape every
 * transport adapter would need first: a liveness/readiness check over
 * `AppState`, kept here so a future adapter has a single obvious place
 * to mount it instead of re-deriving what "healthy" means.
 * =================================================================
 */

use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub database_reachable: bool,
    pub queue_reachable: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database_reachable && self.queue_reachable
    }
}

/// Probes the two hard dependencies a transport adapter would want to
/// know about before accepting traffic: the database connection and
/// the job queue sitting on top of it.
pub async fn health_check(state: &AppState) -> HealthReport {
    let database_reachable = state.db.connection().is_ok();
    let queue_reachable = state.job_queue.count_outstanding(uuid::Uuid::nil(), campaign_domain_models::Phase::DomainGeneration).await.is_ok();

    HealthReport { database_reachable, queue_reachable }
}
