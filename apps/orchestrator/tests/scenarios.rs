// [apps/orchestrator/tests/scenarios.rs]
/*!
 * =================================================================
 * APARATO: SUITE DE ESCENARIOS DE EXTREMO A EXTREMO (ESTRATO L1-APP)
 * RESPONSABILIDAD: VALIDAR LOS ESCENARIOS SEMILLA DE spec.md §8 SOBRE
 * UNA BASE DE DATOS REAL EN MEMORIA
 *
 * Each test boots a full `AppState` against an in-memory `DbClient`
 * (schema applied automatically by `DbClient::connect`), drives the
 * public `Orchestrator` API exactly as a caller would, and lets the
 * real worker pool drain the queue. Network-dependent phases (DNS,
 * HTTP) are exercised at the unit level inside their own crates; this
 * suite covers the phases and transitions that do not require live
 * network I/O: generation, pause/resume, and cancellation.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use campaign_domain_models::{
    DomainGenerationConfig, PatternDescriptor, PatternKind, Phase, PhaseConfig, PhaseStatus,
};
use campaign_infra_db::{CampaignRepository, DbClient, DomainRepository};
use campaign_orchestrator::config::Config;
use campaign_orchestrator::orchestrator::Orchestrator;
use campaign_orchestrator::security::NullSecurityContextProvider;
use campaign_orchestrator::services::worker_pool::spawn_worker_pool;
use campaign_orchestrator::state::AppState;
use uuid::Uuid;

fn tiny_pattern() -> PatternDescriptor {
    PatternDescriptor {
        kind: PatternKind::Prefix,
        variable_length: 2,
        character_set: "ab".to_string(),
        constant: "x".to_string(),
        tld: "test".to_string(),
    }
}

async fn test_state(worker_count: usize) -> AppState {
    let config = Config { worker_count, ..Config::from_env() };
    let db = DbClient::connect(&config.database_url, config.database_auth_token.clone())
        .await
        .expect("in-memory database should connect and apply its schema");
    let security = Arc::new(NullSecurityContextProvider);
    AppState::new(db, config, security).expect("app state should assemble from a fresh connection")
}

/// Polls `get_campaign` until `phase_status` leaves `in_progress`, or
/// panics after `timeout` — the worker pool runs on its own tasks, so
/// the test has no other signal to wait on.
async fn await_phase_settled(orchestrator: &Orchestrator, campaign_id: Uuid, timeout: Duration) -> campaign_domain_models::Campaign {
    tokio::time::timeout(timeout, async {
        loop {
            let campaign = orchestrator.get_campaign(campaign_id).await.expect("campaign should exist");
            if campaign.phase_status != PhaseStatus::InProgress {
                return campaign;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("phase did not settle before the test timeout")
}

/// spec.md §8 scenario 1 ("Tiny generation"): pattern `ab` x `ab` with a
/// constant `x` suffix over tld `test`, `max_domains = 4` from offset 0,
/// produces exactly `aax.test, abx.test, bax.test, bbx.test` in offset
/// order and advances the campaign to `dns_validation`.
#[tokio::test]
async fn tiny_generation_produces_expected_domains_and_advances_phase() {
    let state = test_state(2);
    let orchestrator = Orchestrator::new(state.clone());

    let campaign = orchestrator.create_campaign("tiny-generation", Uuid::new_v4()).await.unwrap();
    orchestrator
        .configure_phase(
            campaign.id,
            PhaseConfig::DomainGeneration(DomainGenerationConfig { pattern: tiny_pattern(), max_domains: 4, start_offset: 0 }),
        )
        .await
        .unwrap();
    orchestrator.start_phase(campaign.id, Phase::DomainGeneration).await.unwrap();

    spawn_worker_pool(state.clone(), 2);
    let settled = await_phase_settled(&orchestrator, campaign.id, Duration::from_secs(5)).await;

    assert_eq!(settled.current_phase, Phase::DnsValidation);
    assert_eq!(settled.phase_status, PhaseStatus::Ready);

    let conn = state.db.connection().unwrap();
    let domains = DomainRepository::new(conn).list_by_campaign(campaign.id, 100, 0).await.unwrap();
    let values: Vec<&str> = domains.iter().map(|d| d.value.as_str()).collect();
    assert_eq!(values, vec!["aax.test", "abx.test", "bax.test", "bbx.test"]);
}

/// spec.md §8 scenario 2 ("Resume generation"): a second generation
/// batch starting at the offset the first left off produces the
/// remainder of the address space without repeating any domain.
#[tokio::test]
async fn resume_generation_continues_from_prior_offset() {
    let state = test_state(2);
    let orchestrator = Orchestrator::new(state.clone());

    let campaign = orchestrator.create_campaign("resume-generation", Uuid::new_v4()).await.unwrap();
    orchestrator
        .configure_phase(
            campaign.id,
            PhaseConfig::DomainGeneration(DomainGenerationConfig { pattern: tiny_pattern(), max_domains: 2, start_offset: 2 }),
        )
        .await
        .unwrap();
    orchestrator.start_phase(campaign.id, Phase::DomainGeneration).await.unwrap();

    spawn_worker_pool(state.clone(), 2);
    await_phase_settled(&orchestrator, campaign.id, Duration::from_secs(5)).await;

    let conn = state.db.connection().unwrap();
    let domains = DomainRepository::new(conn).list_by_campaign(campaign.id, 100, 0).await.unwrap();
    let values: Vec<&str> = domains.iter().map(|d| d.value.as_str()).collect();
    assert_eq!(values, vec!["bax.test", "bbx.test"]);
}

/// spec.md §8 scenario 5 ("Pause mid-phase"): pausing a campaign stops
/// further leasing for its jobs even while workers keep polling; the
/// queued batch is untouched until `resume_phase`.
#[tokio::test]
async fn pause_mid_phase_halts_progress_until_resumed() {
    let state = test_state(1);
    let orchestrator = Orchestrator::new(state.clone());

    let campaign = orchestrator.create_campaign("pause-mid-phase", Uuid::new_v4()).await.unwrap();
    orchestrator
        .configure_phase(
            campaign.id,
            PhaseConfig::DomainGeneration(DomainGenerationConfig { pattern: tiny_pattern(), max_domains: 4, start_offset: 0 }),
        )
        .await
        .unwrap();
    orchestrator.start_phase(campaign.id, Phase::DomainGeneration).await.unwrap();
    let paused = orchestrator.pause_phase(campaign.id).await.unwrap();
    assert_eq!(paused.phase_status, PhaseStatus::Paused);

    spawn_worker_pool(state.clone(), 1);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let conn = state.db.connection().unwrap();
    let domains = DomainRepository::new(conn).list_by_campaign(campaign.id, 100, 0).await.unwrap();
    assert!(domains.is_empty(), "a paused phase must not let jobs drain while workers are still leasing without a phase filter");

    let outstanding = state.job_queue.count_outstanding(campaign.id, Phase::DomainGeneration).await.unwrap();
    assert_eq!(outstanding, 1, "the single generation batch should remain queued, untouched by pause");

    let resumed = orchestrator.resume_phase(campaign.id).await.unwrap();
    assert_eq!(resumed.phase_status, PhaseStatus::InProgress);

    let settled = await_phase_settled(&orchestrator, campaign.id, Duration::from_secs(5)).await;
    assert_eq!(settled.current_phase, Phase::DnsValidation);
}

/// spec.md §8 scenario 6 ("Cancel"): cancelling an in-progress phase
/// dead-letters every job still queued for that campaign so no worker
/// picks it up after the fact.
#[tokio::test]
async fn cancel_campaign_dead_letters_queued_jobs() {
    let state = test_state(0);
    let orchestrator = Orchestrator::new(state.clone());

    let campaign = orchestrator.create_campaign("cancel-mid-phase", Uuid::new_v4()).await.unwrap();
    orchestrator
        .configure_phase(
            campaign.id,
            PhaseConfig::DomainGeneration(DomainGenerationConfig { pattern: tiny_pattern(), max_domains: 4, start_offset: 0 }),
        )
        .await
        .unwrap();
    orchestrator.start_phase(campaign.id, Phase::DomainGeneration).await.unwrap();

    let outstanding_before = state.job_queue.count_outstanding(campaign.id, Phase::DomainGeneration).await.unwrap();
    assert_eq!(outstanding_before, 1);

    let cancelled = orchestrator.cancel_campaign(campaign.id).await.unwrap();
    assert_eq!(cancelled.phase_status, PhaseStatus::Cancelled);

    let outstanding_after = state.job_queue.count_outstanding(campaign.id, Phase::DomainGeneration).await.unwrap();
    assert_eq!(outstanding_after, 0, "cancel must dead-letter every job still queued for the campaign");
}

/// The fatality check in `reconcile_phase` only ever fires once per
/// completion race (spec.md §4.H); re-reading the campaign after the
/// phase settles must show consistent, monotonically-complete counters.
#[tokio::test]
async fn settled_phase_progress_is_internally_consistent() {
    let state = test_state(3);
    let orchestrator = Orchestrator::new(state.clone());

    let campaign = orchestrator.create_campaign("progress-consistency", Uuid::new_v4()).await.unwrap();
    orchestrator
        .configure_phase(
            campaign.id,
            PhaseConfig::DomainGeneration(DomainGenerationConfig { pattern: tiny_pattern(), max_domains: 4, start_offset: 0 }),
        )
        .await
        .unwrap();
    orchestrator.start_phase(campaign.id, Phase::DomainGeneration).await.unwrap();

    spawn_worker_pool(state.clone(), 3);
    await_phase_settled(&orchestrator, campaign.id, Duration::from_secs(5)).await;

    let conn = state.db.connection().unwrap();
    let progress = CampaignRepository::new(conn).get_phase_progress(campaign.id, Phase::DomainGeneration).await.unwrap();
    assert!(progress.progress.is_consistent());
    assert!(progress.progress.is_complete());
    assert_eq!(progress.progress.failed_items, 0);
}
