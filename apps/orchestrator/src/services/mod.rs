// [apps/orchestrator/src/services/mod.rs]
/*!
 * Background services composed from `AppState` (teacher's `services/mod.rs`
 * shape): the event broadcaster, the worker pool, the lease reaper, and
 * the proxy health prober. `kernel.rs` spawns each of these once at
 * startup; none of them know about the others.
 */

pub mod event_bus;
pub mod proxy_prober;
pub mod reaper;
pub mod worker_pool;
