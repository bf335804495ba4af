// [apps/orchestrator/src/orchestrator.rs]
/*!
 * =================================================================
 * APARATO: CAMPAIGN ORCHESTRATOR (ESTRATO L1-APP)
 * RESPONSABILIDAD: OPERACIONES PÚBLICAS SOBRE EL CICLO DE VIDA DE
 * UNA CAMPAÑA (spec.md §4.I)
 *
 * Composes the pure transition functions in `campaign-domain-state`
 * with the repositories and the job queue. Every operation here reads
 * the campaign fresh, applies one transition, and writes it back —
 * the "campaign-scoped transaction" of Design Note §9. `CampaignRepository`
 * carries no row-versioning column to detect a concurrent writer, so
 * the retry loop below only ever fires for the one conflict the
 * persistence layer can actually report (`DbError::Conflict`); see
 * DESIGN.md for why this is an honest simplification rather than full
 * optimistic concurrency.
 * =================================================================
 */

use std::time::Duration;

use campaign_domain_models::{
    pattern_total, Campaign, CampaignPhaseProgress, EventKind, JobPayload, PatternDescriptor, Phase, PhaseConfig,
};
use campaign_domain_state::{self as transitions, CompletionOutcome};
use campaign_infra_db::{CampaignRepository, DbError, DomainRepository};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::OrchestratorError;
use crate::state::AppState;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DOMAIN_PAGE_SIZE: u32 = 500;

pub struct Orchestrator {
    state: AppState,
}

impl Orchestrator {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    #[instrument(skip(self))]
    pub async fn create_campaign(&self, name: &str, owner_id: Uuid) -> Result<Campaign, OrchestratorError> {
        if name.trim().is_empty() {
            return Err(OrchestratorError::invalid_input("campaign name must not be empty"));
        }

        let config = self.state.config.current();
        let conn = self.state.db.connection()?;
        let repo = CampaignRepository::new(conn);

        let (_, owned_total) = repo.list(Some(owner_id), 1, 0).await?;
        if owned_total >= config.max_campaigns_per_user {
            return Err(OrchestratorError::quota_exceeded(format!(
                "owner already has {owned_total} campaigns (limit {})",
                config.max_campaigns_per_user
            )));
        }

        let now = Utc::now();
        let campaign = Campaign::new(Uuid::new_v4(), name, owner_id, now);
        repo.insert(&campaign).await?;
        repo.upsert_phase_progress(&CampaignPhaseProgress::new(campaign.id, campaign.current_phase)).await?;

        info!(campaign_id = %campaign.id, "campaign created");
        Ok(campaign)
    }

    #[instrument(skip(self, payload))]
    pub async fn configure_phase(&self, campaign_id: Uuid, payload: PhaseConfig) -> Result<Campaign, OrchestratorError> {
        self.run_with_timeout(campaign_id, async {
            let mut attempt = 0u32;
            loop {
                match self.try_configure_phase(campaign_id, &payload).await {
                    Ok(campaign) => return Ok(campaign),
                    Err(err) => match self.should_retry(&err, attempt) {
                        true => {
                            attempt += 1;
                            tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                        }
                        false => return Err(err),
                    },
                }
            }
        })
        .await
    }

    async fn try_configure_phase(&self, campaign_id: Uuid, payload: &PhaseConfig) -> Result<Campaign, OrchestratorError> {
        let config = self.state.config.current();
        let conn = self.state.db.connection()?;
        let repo = CampaignRepository::new(conn);

        let mut campaign = repo.get(campaign_id).await?;
        if campaign.current_phase != payload.phase() {
            return Err(OrchestratorError::invalid_state("phase payload targets a phase the campaign is not currently on"));
        }

        let mut progress = match repo.get_phase_progress(campaign_id, payload.phase()).await {
            Ok(progress) => progress,
            Err(DbError::NotFound) => CampaignPhaseProgress::new(campaign_id, payload.phase()),
            Err(other) => return Err(other.into()),
        };

        let total_items = self.resolve_total_items(&repo, campaign_id, payload, config.max_domains_per_phase).await?;

        let now = Utc::now();
        transitions::configure_phase(&mut campaign, &mut progress, total_items, now)?;

        repo.save(&campaign).await?;
        repo.upsert_phase_progress(&progress).await?;
        repo.upsert_phase_config(campaign_id, payload, now).await?;

        Ok(campaign)
    }

    /// `DomainGeneration`'s `total_items` comes from its own config
    /// (spec.md §3); every later phase consumes the prior phase's
    /// successful output (spec.md §1), read from its persisted progress
    /// row rather than re-derived from a verdict-filtering query the
    /// domain repository does not expose.
    async fn resolve_total_items(
        &self,
        repo: &CampaignRepository,
        campaign_id: Uuid,
        payload: &PhaseConfig,
        max_domains_per_phase: u64,
    ) -> Result<u64, OrchestratorError> {
        match payload {
            PhaseConfig::DomainGeneration(cfg) => {
                if cfg.max_domains > max_domains_per_phase {
                    return Err(OrchestratorError::quota_exceeded(format!(
                        "max_domains {} exceeds the per-phase limit of {}",
                        cfg.max_domains, max_domains_per_phase
                    )));
                }
                let total_space = pattern_total(&cfg.pattern);
                let end = u128::from(cfg.start_offset) + u128::from(cfg.max_domains);
                if end > total_space {
                    return Err(OrchestratorError::invalid_pattern(format!(
                        "start_offset + max_domains ({end}) exceeds the pattern space ({total_space})"
                    )));
                }
                Ok(cfg.max_domains)
            }
            PhaseConfig::DnsValidation(cfg) => {
                if cfg.persona_ids.is_empty() {
                    return Err(OrchestratorError::invalid_payload("dns validation requires at least one persona"));
                }
                let prior = repo.get_phase_progress(campaign_id, Phase::DomainGeneration).await?;
                Ok(prior.progress.successful_items)
            }
            PhaseConfig::HttpKeywordValidation(cfg) => {
                if cfg.persona_ids.is_empty() {
                    return Err(OrchestratorError::invalid_payload("http validation requires at least one persona"));
                }
                let prior = repo.get_phase_progress(campaign_id, Phase::DnsValidation).await?;
                Ok(prior.progress.successful_items)
            }
            PhaseConfig::Analysis(_) => {
                let prior = repo.get_phase_progress(campaign_id, Phase::HttpKeywordValidation).await?;
                Ok(prior.progress.successful_items)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn start_phase(&self, campaign_id: Uuid, phase: Phase) -> Result<Campaign, OrchestratorError> {
        self.run_with_timeout(campaign_id, async {
            let mut attempt = 0u32;
            loop {
                match self.try_start_phase(campaign_id, phase).await {
                    Ok(campaign) => return Ok(campaign),
                    Err(err) => match self.should_retry(&err, attempt) {
                        true => {
                            attempt += 1;
                            tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                        }
                        false => return Err(err),
                    },
                }
            }
        })
        .await
    }

    async fn try_start_phase(&self, campaign_id: Uuid, phase: Phase) -> Result<Campaign, OrchestratorError> {
        let conn = self.state.db.connection()?;
        let repo = CampaignRepository::new(conn);

        let mut campaign = repo.get(campaign_id).await?;
        if campaign.current_phase != phase {
            return Err(OrchestratorError::invalid_state("phase is not the campaign's current phase"));
        }

        let mut progress = repo.get_phase_progress(campaign_id, phase).await?;
        let payload = repo.get_phase_config(campaign_id, phase).await?;

        let now = Utc::now();
        transitions::start_phase(&mut campaign, &mut progress, now)?;

        repo.save(&campaign).await?;
        repo.upsert_phase_progress(&progress).await?;

        self.state.event_bus.publish(EventKind::PhaseStarted { campaign_id, phase: phase.as_str().to_string() });

        if phase == Phase::Analysis {
            return self.complete_analysis_synchronously(&repo, campaign_id, campaign, progress, now).await;
        }

        self.enqueue_initial_jobs(campaign_id, phase, &payload, now).await?;
        Ok(campaign)
    }

    /// spec.md §4.G names worker-pool executors only for generation, DNS
    /// and HTTP validation — analysis, the terminal phase, has nothing
    /// left to dispatch. It completes in the same request that starts
    /// it: every item counted by its `total_items` is, by construction,
    /// already persisted by the prior phase.
    async fn complete_analysis_synchronously(
        &self,
        repo: &CampaignRepository,
        campaign_id: Uuid,
        mut campaign: Campaign,
        mut progress: CampaignPhaseProgress,
        now: DateTime<Utc>,
    ) -> Result<Campaign, OrchestratorError> {
        for _ in 0..progress.progress.total_items {
            progress.progress.record(true);
            campaign.progress.record(true);
        }

        let outcome = transitions::try_complete_phase(&mut campaign, &mut progress, true, now)?;

        repo.save(&campaign).await?;
        repo.upsert_phase_progress(&progress).await?;

        self.state.event_bus.publish(EventKind::PhaseCompleted { campaign_id, phase: Phase::Analysis.as_str().to_string() });
        if matches!(outcome, CompletionOutcome::PhaseCompleted { advanced_to: None }) {
            self.state.event_bus.publish(EventKind::CampaignCompleted { campaign_id });
        }

        Ok(campaign)
    }

    async fn enqueue_initial_jobs(&self, campaign_id: Uuid, phase: Phase, payload: &PhaseConfig, now: DateTime<Utc>) -> Result<(), OrchestratorError> {
        match (phase, payload) {
            (Phase::DomainGeneration, PhaseConfig::DomainGeneration(cfg)) => {
                let batch_size = self.state.config.current().generation_batch_size.max(1);
                let end = cfg.start_offset + cfg.max_domains;
                let mut offset = cfg.start_offset;
                while offset < end {
                    let count = batch_size.min(end - offset);
                    self.state
                        .job_queue
                        .enqueue(campaign_id, phase, JobPayload::GenerateRange { start_offset: offset, count }, DEFAULT_MAX_ATTEMPTS, now)
                        .await?;
                    offset += count;
                }
            }
            (Phase::DnsValidation, PhaseConfig::DnsValidation(cfg)) => {
                self.enqueue_validation_jobs(campaign_id, phase, u64::from(cfg.batch_size.max(1)), now).await?;
            }
            (Phase::HttpKeywordValidation, PhaseConfig::HttpKeywordValidation(cfg)) => {
                self.enqueue_validation_jobs(campaign_id, phase, u64::from(cfg.batch_size.max(1)), now).await?;
            }
            _ => return Err(OrchestratorError::invalid_payload("phase config does not match the phase being started")),
        }
        Ok(())
    }

    /// `DomainRepository` has no query over `dns_results`/`http_results`
    /// to list only previously-resolved or previously-matched domains,
    /// so both validation phases currently batch over the campaign's
    /// full generated-domain list; see DESIGN.md.
    async fn enqueue_validation_jobs(&self, campaign_id: Uuid, phase: Phase, batch_size: u64, now: DateTime<Utc>) -> Result<(), OrchestratorError> {
        let conn = self.state.db.connection()?;
        let domain_repo = DomainRepository::new(conn);

        let mut page_offset = 0u32;
        let mut batch = Vec::new();

        loop {
            let page = domain_repo.list_by_campaign(campaign_id, DOMAIN_PAGE_SIZE, page_offset).await?;
            let page_len = page.len() as u32;
            if page.is_empty() {
                break;
            }

            for domain in page {
                batch.push(domain.id);
                if batch.len() as u64 >= batch_size {
                    self.state
                        .job_queue
                        .enqueue(campaign_id, phase, JobPayload::ValidateDomains { domain_ids: std::mem::take(&mut batch) }, DEFAULT_MAX_ATTEMPTS, now)
                        .await?;
                }
            }

            page_offset += page_len;
            if page_len < DOMAIN_PAGE_SIZE {
                break;
            }
        }

        if !batch.is_empty() {
            self.state
                .job_queue
                .enqueue(campaign_id, phase, JobPayload::ValidateDomains { domain_ids: batch }, DEFAULT_MAX_ATTEMPTS, now)
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn pause_phase(&self, campaign_id: Uuid) -> Result<Campaign, OrchestratorError> {
        self.run_with_timeout(campaign_id, async {
            let mut attempt = 0u32;
            loop {
                match self.apply_simple_transition(campaign_id, transitions::pause_phase).await {
                    Ok(campaign) => return Ok(campaign),
                    Err(err) => match self.should_retry(&err, attempt) {
                        true => {
                            attempt += 1;
                            tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                        }
                        false => return Err(err),
                    },
                }
            }
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn resume_phase(&self, campaign_id: Uuid) -> Result<Campaign, OrchestratorError> {
        self.run_with_timeout(campaign_id, async {
            let mut attempt = 0u32;
            loop {
                match self.apply_simple_transition(campaign_id, transitions::resume_phase).await {
                    Ok(campaign) => return Ok(campaign),
                    Err(err) => match self.should_retry(&err, attempt) {
                        true => {
                            attempt += 1;
                            tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                        }
                        false => return Err(err),
                    },
                }
            }
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_campaign(&self, campaign_id: Uuid) -> Result<Campaign, OrchestratorError> {
        let campaign = self
            .run_with_timeout(campaign_id, async {
                let mut attempt = 0u32;
                loop {
                    match self.apply_simple_transition(campaign_id, transitions::cancel_campaign).await {
                        Ok(campaign) => return Ok(campaign),
                        Err(err) => match self.should_retry(&err, attempt) {
                            true => {
                                attempt += 1;
                                tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                            }
                            false => return Err(err),
                        },
                    }
                }
            })
            .await?;

        self.state.job_queue.mark_queued_dead_for_campaign(campaign_id, Utc::now()).await?;
        self.state.event_bus.publish(EventKind::CampaignCancelled { campaign_id });
        Ok(campaign)
    }

    async fn apply_simple_transition(
        &self,
        campaign_id: Uuid,
        transition: fn(&mut Campaign, DateTime<Utc>) -> Result<(), campaign_domain_state::TransitionError>,
    ) -> Result<Campaign, OrchestratorError> {
        let conn = self.state.db.connection()?;
        let repo = CampaignRepository::new(conn);

        let mut campaign = repo.get(campaign_id).await?;
        transition(&mut campaign, Utc::now())?;
        repo.save(&campaign).await?;
        Ok(campaign)
    }

    #[instrument(skip(self))]
    pub async fn get_campaign(&self, campaign_id: Uuid) -> Result<Campaign, OrchestratorError> {
        let conn = self.state.db.connection()?;
        Ok(CampaignRepository::new(conn).get(campaign_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_campaigns(&self, owner_id: Option<Uuid>, limit: u32, offset: u32) -> Result<(Vec<Campaign>, u64), OrchestratorError> {
        let limit = limit.clamp(1, 10_000);
        let conn = self.state.db.connection()?;
        Ok(CampaignRepository::new(conn).list(owner_id, limit, offset).await?)
    }

    /// `GetPatternOffset` (spec.md §6): returns the offset the campaign's
    /// generation config has already allocated up to, plus the pattern's
    /// total address space `N`, so a caller can decide where a follow-up
    /// generation batch should pick up.
    #[instrument(skip(self, pattern))]
    pub async fn get_pattern_offset(&self, campaign_id: Uuid, pattern: &PatternDescriptor) -> Result<(u64, u128), OrchestratorError> {
        if pattern.character_set.is_empty() {
            return Err(OrchestratorError::invalid_pattern("pattern character_set must not be empty"));
        }
        let total = pattern_total(pattern);

        let conn = self.state.db.connection()?;
        let repo = CampaignRepository::new(conn);
        let allocated = match repo.get_phase_config(campaign_id, Phase::DomainGeneration).await {
            Ok(PhaseConfig::DomainGeneration(cfg)) => cfg.start_offset + cfg.max_domains,
            Ok(_) => 0,
            Err(DbError::NotFound) => 0,
            Err(err) => return Err(err.into()),
        };

        Ok((allocated, total))
    }

    fn should_retry(&self, err: &OrchestratorError, attempt: u32) -> bool {
        matches!(err, OrchestratorError::Persistence(DbError::Conflict)) && attempt < self.state.config.current().contention_retry_limit
    }

    async fn run_with_timeout<F>(&self, campaign_id: Uuid, fut: F) -> Result<Campaign, OrchestratorError>
    where
        F: std::future::Future<Output = Result<Campaign, OrchestratorError>>,
    {
        let op_timeout = Duration::from_secs(self.state.config.current().orchestrator_op_timeout_seconds);
        match tokio::time::timeout(op_timeout, fut).await {
            Ok(result) => {
                if result.is_ok() {
                    info!(campaign_id = %campaign_id, "campaign-scoped transaction committed");
                }
                result
            }
            Err(_) => Err(OrchestratorError::Timeout),
        }
    }
}
