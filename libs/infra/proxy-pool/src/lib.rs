// [libs/infra/proxy-pool/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PROXY POOL (ESTRATO L3)
 * RESPONSABILIDAD: ACQUIRE/RELEASE CON CUARENTENA Y ROTACIÓN
 *
 * Implementa spec.md §4.B. Selección entre los proxies disponibles
 * (no en cuarentena) según la `AcquisitionPolicy` del llamador.
 * =================================================================
 */

pub mod errors;
pub mod quarantine;

pub use errors::PoolError;

use std::sync::atomic::{AtomicUsize, Ordering};

use campaign_domain_models::{AcquisitionPolicy, AcquisitionStrategy, Proxy, ProxyOutcome};
use campaign_infra_db::ProxyRepository;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::instrument;
use uuid::Uuid;

pub struct ProxyPool {
    repository: ProxyRepository,
    round_robin_cursor: AtomicUsize,
}

impl ProxyPool {
    pub fn new(repository: ProxyRepository) -> Self {
        Self { repository, round_robin_cursor: AtomicUsize::new(0) }
    }

    #[instrument(skip(self, policy))]
    pub async fn acquire(&self, policy: &AcquisitionPolicy, now: DateTime<Utc>) -> Result<Proxy, PoolError> {
        let available = self.repository.list_available(now, policy.pool_id, policy.geo.as_deref()).await?;
        if available.is_empty() {
            return Err(PoolError::NoProxyAvailable);
        }

        let strategy = policy.strategy.unwrap_or(AcquisitionStrategy::RoundRobin);
        let chosen = match strategy {
            AcquisitionStrategy::RoundRobin => {
                let index = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed) % available.len();
                available[index].clone()
            }
            AcquisitionStrategy::Random => {
                available.choose(&mut rand::thread_rng()).expect("non-empty").clone()
            }
            AcquisitionStrategy::WeightedRandom => pick_weighted(&available),
            AcquisitionStrategy::LeastRecentlyUsed => pick_least_recently_used(&available),
        };

        Ok(chosen)
    }

    /// Proxies currently quarantined, for the periodic probe task to
    /// re-check (spec.md §4.B).
    #[instrument(skip(self))]
    pub async fn list_quarantined(&self, now: DateTime<Utc>) -> Result<Vec<Proxy>, PoolError> {
        Ok(self.repository.list_quarantined(now).await?)
    }

    /// Reports the outcome of using a proxy. Success clears its error
    /// streak; failure bumps `consecutive_errors` and re-quarantines it
    /// for a window that grows with the streak (spec.md §4.B).
    #[instrument(skip(self))]
    pub async fn release(&self, proxy_id: Uuid, outcome: ProxyOutcome, error: Option<String>, now: DateTime<Utc>) -> Result<(), PoolError> {
        let mut proxy = self.repository.get(proxy_id).await?;

        match outcome {
            ProxyOutcome::Success => {
                proxy.consecutive_errors = 0;
                proxy.last_success_at = Some(now);
                proxy.last_checked_at = Some(now);
                proxy.last_error = None;
                proxy.quarantine_until = None;
            }
            ProxyOutcome::Failure => {
                proxy.consecutive_errors += 1;
                proxy.last_checked_at = Some(now);
                proxy.last_error = error;
                let window = quarantine::quarantine_duration_seconds(proxy.consecutive_errors);
                proxy.quarantine_until = Some(now + Duration::seconds(window));
            }
        }

        self.repository.save(&proxy).await?;
        Ok(())
    }
}

fn pick_weighted(candidates: &[Proxy]) -> Proxy {
    let weights: Vec<f64> = candidates.iter().map(|p| 1.0 / (p.consecutive_errors as f64 + 1.0)).collect();
    let total: f64 = weights.iter().sum();
    let mut roll = rand::thread_rng().gen_range(0.0..total);

    for (proxy, weight) in candidates.iter().zip(weights.iter()) {
        if roll < *weight {
            return proxy.clone();
        }
        roll -= weight;
    }

    candidates.last().expect("non-empty").clone()
}

fn pick_least_recently_used(candidates: &[Proxy]) -> Proxy {
    candidates
        .iter()
        .min_by_key(|p| p.last_success_at.map(|t| t.timestamp()).unwrap_or(i64::MIN))
        .expect("non-empty")
        .clone()
}
