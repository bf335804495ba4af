// [apps/orchestrator/src/main.rs]
/*!
 * =================================================================
 * APARATO: ENTRY POINT
 * RESPONSABILIDAD: CONSTRUCCIÓN DEL RUNTIME Y ARRANQUE DEL KERNEL
 *
 * Grounded on the teacher's `main.rs`: `dotenv().ok()` before anything
 * else reads the environment, a manually-built multi-thread runtime
 * with an enlarged stack (the worker pool's DNS/HTTP executors recurse
 * through a few layers of async combinators), then hand off to
 * `OrchestratorKernel`.
 * =================================================================
 */

use campaign_orchestrator::config::Config;
use campaign_orchestrator::kernel::OrchestratorKernel;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    campaign_shared_telemetry::init_tracing("campaign-orchestrator");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let config = Config::from_env();
        let kernel = OrchestratorKernel::ignite(config).await?;
        kernel.launch_sovereign_operations().await
    })
}
