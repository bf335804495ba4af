// [apps/orchestrator/src/services/worker_pool.rs]
/*!
 * =================================================================
 * APARATO: WORKER POOL (ESTRATO L1-APP)
 * RESPONSABILIDAD: ARRENDAMIENTO Y EJECUCIÓN DE JOBS POR FASE
 *
 * Implementa spec.md §4.G: un conjunto fijo de `worker_count` tareas
 * de Tokio, cada una en su propio bucle lease→execute→ack. El
 * despacho por `Phase` delega en un ejecutor puro por fase; ninguno
 * de los tres conoce al otro ni al bucle que los invoca.
 * =================================================================
 */

use std::time::Duration;

use campaign_domain_models::{
    DnsResult, DnsVerdict, GeneratedDomain, HttpResult, Job, JobPayload, Lead, Phase, PhaseConfig, PhaseStatus, Proxy, ProxyOutcome,
};
use campaign_infra_db::{CampaignRepository, DbError, DomainRepository};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Net effect of processing one job on its campaign×phase counters.
struct ProgressDelta {
    processed: u64,
    successful: u64,
    failed: u64,
}

/// Spawns `worker_count` independent lease/execute/ack loops. Each
/// worker leases without a phase filter — any of the three executors
/// may run on any worker, since at most one phase is ever `in_progress`
/// for a given campaign at a time (spec.md §4.H).
pub fn spawn_worker_pool(state: AppState, worker_count: usize) {
    for index in 0..worker_count.max(1) {
        let state = state.clone();
        let worker_id = format!("worker-{index}");
        tokio::spawn(async move {
            info!(worker_id = %worker_id, "worker online");
            worker_loop(state, worker_id).await;
        });
    }
}

async fn worker_loop(state: AppState, worker_id: String) {
    let idle_poll_interval = Duration::from_millis(250);

    loop {
        let now = Utc::now();
        let leased = match state.job_queue.lease(&worker_id, None, 1, now).await {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(worker_id = %worker_id, error = %err, "lease attempt failed");
                tokio::time::sleep(idle_poll_interval).await;
                continue;
            }
        };

        let Some(job) = leased.into_iter().next() else {
            tokio::time::sleep(idle_poll_interval).await;
            continue;
        };

        run_job(&state, &worker_id, job).await;
    }
}

#[instrument(skip(state, job), fields(job_id = %job.id, campaign_id = %job.campaign_id, phase = job.phase_type.as_str()))]
async fn run_job(state: &AppState, worker_id: &str, job: Job) {
    let outcome = match job.phase_type {
        Phase::DomainGeneration => execute_generation(state, &job).await,
        Phase::DnsValidation => execute_dns_validation(state, &job).await,
        Phase::HttpKeywordValidation => execute_http_validation(state, &job).await,
        Phase::Analysis => Err(anyhow::anyhow!("analysis jobs are never enqueued; the orchestrator completes it synchronously")),
    };

    let now = Utc::now();
    match outcome {
        Ok(delta) => {
            if let Err(err) = state.job_queue.ack_success(job.id, worker_id).await {
                error!(job_id = %job.id, error = %err, "failed to ack job success");
            }
            apply_progress(state, &job, delta).await;
        }
        Err(err) => {
            warn!(job_id = %job.id, error = %err, "job execution failed");
            match state.job_queue.ack_failure(job.id, worker_id, job.attempts, &err.to_string(), now).await {
                Ok(campaign_domain_models::JobStatus::Dead) => {
                    let batch_size = job_item_count(&job);
                    apply_progress(state, &job, ProgressDelta { processed: batch_size, successful: 0, failed: batch_size }).await;
                }
                Ok(_) => {}
                Err(ack_err) => error!(job_id = %job.id, error = %ack_err, "failed to ack job failure"),
            }
        }
    }

    reconcile_phase(state, job.campaign_id, job.phase_type).await;
}

fn job_item_count(job: &Job) -> u64 {
    match &job.payload {
        JobPayload::GenerateRange { count, .. } => *count,
        JobPayload::ValidateDomains { domain_ids } => domain_ids.len() as u64,
    }
}

/// Counters freeze while a campaign is paused because `lease` stops
/// handing out jobs for it (spec.md §4.H); this only ever runs for a
/// job the queue already let a worker lease.
async fn apply_progress(state: &AppState, job: &Job, delta: ProgressDelta) {
    if delta.processed == 0 {
        return;
    }

    let conn = match state.db.connection() {
        Ok(conn) => conn,
        Err(err) => {
            error!(error = %err, "could not open a connection to record progress");
            return;
        }
    };
    let repo = CampaignRepository::new(conn);

    if let Err(err) = repo
        .record_phase_progress_delta(job.campaign_id, job.phase_type, delta.processed, delta.successful, delta.failed)
        .await
    {
        error!(error = %err, "failed to record phase progress delta");
    }
    if let Err(err) = repo.record_campaign_progress_delta(job.campaign_id, delta.processed, delta.successful, delta.failed).await {
        error!(error = %err, "failed to record campaign progress delta");
    }
}

/// After every ack, check whether the phase just finished (success or
/// threshold failure). Multiple workers may race into here for the same
/// campaign×phase; only the first to see `in_progress` actually flips
/// it, the rest see the new status and no-op.
async fn reconcile_phase(state: &AppState, campaign_id: Uuid, phase: Phase) {
    let conn = match state.db.connection() {
        Ok(conn) => conn,
        Err(err) => {
            error!(error = %err, "could not open a connection to reconcile phase");
            return;
        }
    };
    let repo = CampaignRepository::new(conn);

    let (mut campaign, mut progress) = match (repo.get(campaign_id).await, repo.get_phase_progress(campaign_id, phase).await) {
        (Ok(c), Ok(p)) => (c, p),
        _ => return,
    };

    if campaign.phase_status != PhaseStatus::InProgress {
        return;
    }

    let config = state.config.current();
    let now = Utc::now();

    if campaign_domain_state::exceeds_failure_threshold(&progress, config.failed_fraction_threshold, config.failed_fraction_min_total) {
        let reason = format!(
            "{} of {} items failed, exceeding the {:.0}% threshold",
            progress.progress.failed_items,
            progress.progress.total_items,
            config.failed_fraction_threshold * 100.0
        );
        if campaign_domain_state::fail_phase(&mut campaign, &mut progress, reason.clone(), now).is_ok() {
            let _ = repo.save(&campaign).await;
            let _ = repo.upsert_phase_progress(&progress).await;
            let _ = state.job_queue.mark_queued_dead_for_campaign(campaign_id, now).await;
            state.event_bus.publish(campaign_domain_models::EventKind::PhaseFailed { campaign_id, phase: phase.as_str().to_string(), reason });
        }
        return;
    }

    let outstanding = state.job_queue.count_outstanding(campaign_id, phase).await.unwrap_or(u64::MAX);
    if outstanding != 0 {
        state.event_bus.publish(campaign_domain_models::EventKind::PhaseProgress {
            campaign_id,
            phase: phase.as_str().to_string(),
            processed: progress.progress.processed_items,
            total: progress.progress.total_items,
        });
        return;
    }

    match campaign_domain_state::try_complete_phase(&mut campaign, &mut progress, true, now) {
        Ok(campaign_domain_state::CompletionOutcome::PhaseCompleted { advanced_to }) => {
            let _ = repo.save(&campaign).await;
            let _ = repo.upsert_phase_progress(&progress).await;
            state.event_bus.publish(campaign_domain_models::EventKind::PhaseCompleted { campaign_id, phase: phase.as_str().to_string() });
            if advanced_to.is_none() {
                state.event_bus.publish(campaign_domain_models::EventKind::CampaignCompleted { campaign_id });
            }
        }
        Ok(campaign_domain_state::CompletionOutcome::StillInProgress) => {}
        Err(err) => debug!(error = %err, "phase completion check lost a race, ignoring"),
    }
}

async fn execute_generation(state: &AppState, job: &Job) -> anyhow::Result<ProgressDelta> {
    let (start_offset, count) = match job.payload {
        JobPayload::GenerateRange { start_offset, count } => (start_offset, count),
        _ => anyhow::bail!("generation worker received a non-generation payload"),
    };

    let conn = state.db.connection()?;
    let campaign_repo = CampaignRepository::new(conn);
    let PhaseConfig::DomainGeneration(config) = campaign_repo.get_phase_config(job.campaign_id, Phase::DomainGeneration).await? else {
        anyhow::bail!("phase config for domain_generation was not a DomainGenerationConfig");
    };

    let now = Utc::now();
    let domains: Vec<GeneratedDomain> = campaign_core_generator::generate(&config.pattern, start_offset, count)?
        .map(|(offset, value)| GeneratedDomain {
            id: Uuid::new_v4(),
            campaign_id: job.campaign_id,
            offset,
            value,
            tld: config.pattern.tld.clone(),
            created_at: now,
        })
        .collect();

    let conn = state.db.connection()?;
    let domain_repo = DomainRepository::new(conn);
    domain_repo.insert_batch(&domains).await?;

    Ok(ProgressDelta { processed: count, successful: count, failed: 0 })
}

async fn execute_dns_validation(state: &AppState, job: &Job) -> anyhow::Result<ProgressDelta> {
    let domain_ids = match &job.payload {
        JobPayload::ValidateDomains { domain_ids } => domain_ids.clone(),
        _ => anyhow::bail!("dns worker received a non-validation payload"),
    };

    let conn = state.db.connection()?;
    let campaign_repo = CampaignRepository::new(conn);
    let PhaseConfig::DnsValidation(config) = campaign_repo.get_phase_config(job.campaign_id, Phase::DnsValidation).await? else {
        anyhow::bail!("phase config for dns_validation was not a DnsValidationConfig");
    };
    if config.persona_ids.is_empty() {
        anyhow::bail!("dns validation config carries no personas to rotate across");
    }

    let conn = state.db.connection()?;
    let domain_repo = DomainRepository::new(conn);
    let domains = domain_repo.list_by_ids(job.campaign_id, &domain_ids).await?;

    let mut successful = 0u64;
    let mut failed = 0u64;

    for (index, domain) in domains.iter().enumerate() {
        let persona_id = config.persona_ids[index % config.persona_ids.len()];
        let persona = state.persona_store.get(persona_id).await?;
        let campaign_domain_models::PersonaConfig::Dns(dns_config) = &persona.config else {
            anyhow::bail!("persona {persona_id} is not a dns persona");
        };

        let now = Utc::now();
        let outcome = campaign_core_dns::validate(&domain.value, dns_config, config.retry_count).await?;
        let resolved = outcome.verdict == DnsVerdict::Resolved;
        if resolved {
            successful += 1;
        } else {
            failed += 1;
        }

        let conn = state.db.connection()?;
        let result_repo = DomainRepository::new(conn);
        result_repo
            .upsert_dns_result(&DnsResult {
                id: Uuid::new_v4(),
                generated_domain_id: domain.id,
                campaign_id: job.campaign_id,
                verdict: outcome.verdict,
                records: outcome.records,
                persona_used: persona_id,
                attempt_count: outcome.attempt_count,
                completed_at: now,
            })
            .await?;
    }

    Ok(ProgressDelta { processed: domains.len() as u64, successful, failed })
}

async fn execute_http_validation(state: &AppState, job: &Job) -> anyhow::Result<ProgressDelta> {
    let domain_ids = match &job.payload {
        JobPayload::ValidateDomains { domain_ids } => domain_ids.clone(),
        _ => anyhow::bail!("http worker received a non-validation payload"),
    };

    let conn = state.db.connection()?;
    let campaign_repo = CampaignRepository::new(conn);
    let PhaseConfig::HttpKeywordValidation(config) = campaign_repo.get_phase_config(job.campaign_id, Phase::HttpKeywordValidation).await? else {
        anyhow::bail!("phase config for http_keyword_validation was not a HttpKeywordValidationConfig");
    };
    if config.persona_ids.is_empty() {
        anyhow::bail!("http validation config carries no personas to rotate across");
    }

    // `keyword_set_ids` would resolve against a keyword-set repository
    // this workspace does not persist; only ad-hoc keywords are scanned
    // for until that store exists (see DESIGN.md).
    let keyword_universe: Vec<campaign_core_http::KeywordEntry> = config
        .ad_hoc_keywords
        .iter()
        .map(|keyword| campaign_core_http::KeywordEntry { set_id: None, keyword: keyword.clone() })
        .collect();

    let conn = state.db.connection()?;
    let domain_repo = DomainRepository::new(conn);
    let domains = domain_repo.list_by_ids(job.campaign_id, &domain_ids).await?;

    let mut successful = 0u64;
    let mut failed = 0u64;

    for (index, domain) in domains.iter().enumerate() {
        let persona_id = config.persona_ids[index % config.persona_ids.len()];
        let persona = state.persona_store.get(persona_id).await?;
        let campaign_domain_models::PersonaConfig::Http(http_config) = &persona.config else {
            anyhow::bail!("persona {persona_id} is not an http persona");
        };

        let now = Utc::now();
        let proxy = acquire_proxy_best_effort(state, now).await;
        let url = format!("http://{}", domain.value);

        let max_body_read_bytes = state.config.current().max_body_read_bytes;
        let outcome = campaign_core_http::fetch_and_scan(&url, http_config, proxy.as_ref(), &keyword_universe, max_body_read_bytes).await?;

        if let Some(proxy) = &proxy {
            let release_outcome = if outcome.error_kind.is_some() { ProxyOutcome::Failure } else { ProxyOutcome::Success };
            let _ = state.proxy_pool.release(proxy.id, release_outcome, outcome.error_kind.clone(), now).await;
        }

        if outcome.error_kind.is_some() {
            failed += 1;
        } else {
            successful += 1;
        }

        let http_result_id = Uuid::new_v4();
        let conn = state.db.connection()?;
        let result_repo = DomainRepository::new(conn);
        result_repo
            .upsert_http_result(&HttpResult {
                id: http_result_id,
                generated_domain_id: domain.id,
                campaign_id: job.campaign_id,
                status_code: outcome.status_code,
                final_url: outcome.final_url.clone(),
                body_size: outcome.body_size,
                truncated: outcome.truncated,
                matches: outcome.matches.clone(),
                persona_used: persona_id,
                proxy_used: proxy.as_ref().map(|p| p.id),
                error_kind: outcome.error_kind.clone(),
                completed_at: now,
            })
            .await?;

        if !outcome.matches.is_empty() {
            let conn = state.db.connection()?;
            let lead_repo = DomainRepository::new(conn);
            lead_repo
                .insert_lead(&Lead {
                    id: Uuid::new_v4(),
                    campaign_id: job.campaign_id,
                    generated_domain_id: domain.id,
                    http_result_id,
                    attributes: serde_json::json!({
                        "status_code": outcome.status_code,
                        "match_count": outcome.matches.len(),
                    }),
                    created_at: now,
                })
                .await?;
        }
    }

    Ok(ProgressDelta { processed: domains.len() as u64, successful, failed })
}

async fn acquire_proxy_best_effort(state: &AppState, now: chrono::DateTime<Utc>) -> Option<Proxy> {
    let policy = campaign_domain_models::AcquisitionPolicy::default();
    match state.proxy_pool.acquire(&policy, now).await {
        Ok(proxy) => Some(proxy),
        Err(_) => None,
    }
}

