// [apps/orchestrator/src/services/proxy_prober.rs]
/*!
 * =================================================================
 * APARATO: PROXY QUARANTINE PROBE (ESTRATO L1-APP)
 * RESPONSABILIDAD: RE-CHEQUEO PERIÓDICO DE PROXIES EN CUARENTENA
 *
 * Implementa spec.md §4.B: "A periodic task probes quarantined
 * proxies; a successful probe resets counters." The probe itself is a
 * bare TCP connect against the proxy's address — cheap, and enough to
 * tell a dead relay from a transiently-errored one without routing a
 * real request through it.
 * =================================================================
 */

use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::state::AppState;

pub fn spawn_proxy_prober(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(state.config.current().proxy_probe_interval_seconds.max(1)));

        loop {
            ticker.tick().await;
            probe_quarantined(&state).await;
        }
    });
}

async fn probe_quarantined(state: &AppState) {
    let now = Utc::now();
    let quarantined = match state.proxy_pool.list_quarantined(now).await {
        Ok(proxies) => proxies,
        Err(err) => {
            warn!(error = %err, "proxy prober failed to list quarantined proxies");
            return;
        }
    };

    let probe_timeout = Duration::from_millis(state.config.current().proxy_probe_timeout_ms);

    for proxy in quarantined {
        let reachable = probe_one(&proxy.address, probe_timeout).await;
        let outcome = if reachable { campaign_domain_models::ProxyOutcome::Success } else { campaign_domain_models::ProxyOutcome::Failure };
        let error = if reachable { None } else { Some("probe connect failed".to_string()) };

        match state.proxy_pool.release(proxy.id, outcome, error, Utc::now()).await {
            Ok(()) if reachable => info!(proxy_id = %proxy.id, "quarantine probe succeeded, counters reset"),
            Ok(()) => debug!(proxy_id = %proxy.id, "quarantine probe failed, proxy remains quarantined"),
            Err(err) => warn!(proxy_id = %proxy.id, error = %err, "failed to record probe outcome"),
        }
    }
}

async fn probe_one(address: &str, timeout: Duration) -> bool {
    matches!(tokio::time::timeout(timeout, TcpStream::connect(address)).await, Ok(Ok(_)))
}
