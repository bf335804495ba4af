// [apps/orchestrator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: APPLICATION STATE (ESTRATO L0-APP)
 * RESPONSABILIDAD: RAÍZ DE COMPOSICIÓN COMPARTIDA ENTRE SERVICIOS
 *
 * Every background service and every orchestrator operation is built
 * from this single, cheaply-`Clone`-able handle (teacher's `AppState`
 * pattern in `state/mod.rs`: an `Arc`-wrapped bundle, never a god
 * object with its own logic).
 * =================================================================
 */

use std::sync::Arc;

use campaign_infra_db::DbClient;
use campaign_infra_persona_store::PersonaStore;
use campaign_infra_proxy_pool::ProxyPool;
use campaign_infra_queue::{BackoffPolicy, JobQueue};

use crate::config::{Config, ConfigReloader};
use crate::security::SecurityContextProvider;
use crate::services::event_bus::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub db: DbClient,
    pub config: ConfigReloader,
    pub event_bus: Arc<EventBus>,
    pub job_queue: Arc<JobQueue>,
    pub proxy_pool: Arc<ProxyPool>,
    pub persona_store: Arc<PersonaStore>,
    pub security: Arc<dyn SecurityContextProvider>,
}

impl AppState {
    pub fn new(
        db: DbClient,
        config: Config,
        security: Arc<dyn SecurityContextProvider>,
    ) -> Result<Self, campaign_infra_db::DbError> {
        let event_bus = Arc::new(EventBus::new(config.event_subscription_buffer_size, config.event_slow_subscriber_policy));

        let job_queue_conn = db.connection()?;
        let job_queue = Arc::new(JobQueue::new(
            campaign_infra_db::JobRepository::new(job_queue_conn),
            BackoffPolicy::default(),
            config.queue_lease_ttl_seconds,
        ));

        let proxy_pool_conn = db.connection()?;
        let proxy_pool = Arc::new(ProxyPool::new(campaign_infra_db::ProxyRepository::new(proxy_pool_conn)));

        let persona_store_conn = db.connection()?;
        let persona_store = Arc::new(PersonaStore::new(campaign_infra_db::PersonaRepository::new(persona_store_conn)));

        Ok(Self {
            db,
            config: ConfigReloader::new(config),
            event_bus,
            job_queue,
            proxy_pool,
            persona_store,
            security,
        })
    }
}
