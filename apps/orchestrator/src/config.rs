// [apps/orchestrator/src/config.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONFIGURATION (ESTRATO L0-APP)
 * RESPONSABILIDAD: CARGA DESDE ENTORNO Y RECARGA ATÓMICA
 *
 * Covers every item spec.md §6 enumerates under "Environment /
 * configuration". Loaded once at startup via `Config::from_env`; the
 * `ConfigReloader` wraps it in an `ArcSwap` so a future admin-triggered
 * reload (out of scope per spec.md §1) only needs to swap the pointer,
 * never touch a mutex-guarded struct.
 * =================================================================
 */

use std::env;
use std::sync::Arc;

use arc_swap::ArcSwap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowSubscriberPolicy {
    DropOldest,
    Disconnect,
}

impl SlowSubscriberPolicy {
    fn parse(value: &str) -> Self {
        match value {
            "disconnect" => SlowSubscriberPolicy::Disconnect,
            _ => SlowSubscriberPolicy::DropOldest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_auth_token: Option<String>,

    pub worker_count: usize,
    pub queue_lease_ttl_seconds: i64,
    pub queue_reclaim_interval_seconds: u64,

    pub campaign_transaction_timeout_seconds: u64,
    pub orchestrator_op_timeout_seconds: u64,
    pub contention_retry_limit: u32,

    pub max_domains_per_phase: u64,
    pub max_campaigns_per_user: u64,

    pub proxy_health_threshold: u32,
    pub proxy_quarantine_base_seconds: i64,
    pub proxy_quarantine_max_seconds: i64,
    pub proxy_probe_interval_seconds: u64,
    pub proxy_probe_timeout_ms: u64,

    pub event_subscription_buffer_size: usize,
    pub event_slow_subscriber_policy: SlowSubscriberPolicy,
    pub allowed_event_stream_origins: Vec<String>,

    /// SPEC_FULL.md §C: phase auto-failure threshold, resolving the §9
    /// Open Question. A phase fails once `failed_items / total_items`
    /// exceeds this fraction, provided `total_items >= failed_fraction_min_total`.
    pub failed_fraction_threshold: f64,
    pub failed_fraction_min_total: u64,

    pub generation_batch_size: u64,

    /// Upper bound on bytes read from an HTTP response body before the
    /// keyword scan gives up and marks the fetch `truncated` (spec.md §4.E).
    pub max_body_read_bytes: u64,
}

impl Config {
    /// Reads every field from the process environment, via `dotenvy`'s
    /// hydrated namespace (teacher's `main.rs` pattern: `dotenv().ok()`
    /// runs before this is called). Falls back to conservative defaults
    /// for anything not required to be present for local/test use.
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("CAMPAIGN_DATABASE_URL").unwrap_or_else(|_| ":memory:".to_string()),
            database_auth_token: env::var("CAMPAIGN_DATABASE_AUTH_TOKEN").ok(),

            worker_count: env_parse("WORKER_COUNT", 4),
            queue_lease_ttl_seconds: env_parse("QUEUE_LEASE_TTL_SECONDS", 30),
            queue_reclaim_interval_seconds: env_parse("QUEUE_RECLAIM_INTERVAL_SECONDS", 15),

            campaign_transaction_timeout_seconds: env_parse("CAMPAIGN_TRANSACTION_TIMEOUT_SECONDS", 30),
            orchestrator_op_timeout_seconds: env_parse("ORCHESTRATOR_OP_TIMEOUT_SECONDS", 10),
            contention_retry_limit: env_parse("CONTENTION_RETRY_LIMIT", 3),

            max_domains_per_phase: env_parse("MAX_DOMAINS_PER_PHASE", 100_000),
            max_campaigns_per_user: env_parse("MAX_CAMPAIGNS_PER_USER", 50),

            proxy_health_threshold: env_parse("PROXY_HEALTH_THRESHOLD", 5),
            proxy_quarantine_base_seconds: env_parse("PROXY_QUARANTINE_BASE_SECONDS", 30),
            proxy_quarantine_max_seconds: env_parse("PROXY_QUARANTINE_MAX_SECONDS", 6 * 3600),
            proxy_probe_interval_seconds: env_parse("PROXY_PROBE_INTERVAL_SECONDS", 60),
            proxy_probe_timeout_ms: env_parse("PROXY_PROBE_TIMEOUT_MS", 2_000),

            event_subscription_buffer_size: env_parse("EVENT_SUBSCRIPTION_BUFFER_SIZE", 256),
            event_slow_subscriber_policy: env::var("EVENT_SLOW_SUBSCRIBER_POLICY")
                .map(|v| SlowSubscriberPolicy::parse(&v))
                .unwrap_or(SlowSubscriberPolicy::DropOldest),
            allowed_event_stream_origins: env::var("ALLOWED_EVENT_STREAM_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default(),

            failed_fraction_threshold: env_parse("FAILED_FRACTION_THRESHOLD", 0.5),
            failed_fraction_min_total: env_parse("FAILED_FRACTION_MIN_TOTAL", 100),

            generation_batch_size: env_parse("GENERATION_BATCH_SIZE", 500),

            max_body_read_bytes: env_parse("HTTP_MAX_BODY_READ_BYTES", 1_048_576),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Atomic-swap capability for `Config` (SPEC_FULL.md §B, Design Note
/// §9). Readers clone the `Arc<Config>` behind the swap; a reload
/// simply stores a fresh `Arc` without blocking any in-flight reader.
#[derive(Clone)]
pub struct ConfigReloader {
    inner: Arc<ArcSwap<Config>>,
}

impl ConfigReloader {
    pub fn new(config: Config) -> Self {
        Self { inner: Arc::new(ArcSwap::from_pointee(config)) }
    }

    pub fn current(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    pub fn reload(&self, config: Config) {
        self.inner.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reloader_swaps_without_mutating_prior_snapshot() {
        let reloader = ConfigReloader::new(Config { worker_count: 4, ..Config::from_env() });
        let before = reloader.current();
        reloader.reload(Config { worker_count: 8, ..Config::from_env() });
        let after = reloader.current();

        assert_eq!(before.worker_count, 4);
        assert_eq!(after.worker_count, 8);
    }

    #[test]
    fn slow_subscriber_policy_defaults_to_drop_oldest() {
        assert_eq!(SlowSubscriberPolicy::parse("bogus"), SlowSubscriberPolicy::DropOldest);
        assert_eq!(SlowSubscriberPolicy::parse("disconnect"), SlowSubscriberPolicy::Disconnect);
    }
}
