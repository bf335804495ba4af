// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CAMPAIGN DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: TIPOS DE DOMINIO COMPARTIDOS ENTRE TODOS LOS ESTRATOS
 *
 * Ningún tipo aquí depende de la capa de persistencia ni de transporte.
 * Es el vocabulario común sobre el que operan el generador, los
 * validadores, la máquina de estados y el orquestador.
 * =================================================================
 */

pub mod campaign;
pub mod domain;
pub mod errors;
pub mod events;
pub mod job;
pub mod persona;
pub mod phase;
pub mod proxy;
pub mod security;

pub use campaign::{Campaign, CampaignPhaseProgress, Phase, PhaseStatus, ProgressCounters};
pub use domain::{DnsResult, DnsVerdict, GeneratedDomain, HttpResult, KeywordMatch, Lead};
pub use errors::ErrorKind;
pub use events::{EventEnvelope, EventKind};
pub use job::{Job, JobPayload, JobStatus};
pub use persona::{Persona, PersonaConfig, PersonaKind};
pub use phase::{
    AnalysisConfig, AnalysisKind, DnsValidationConfig, DomainGenerationConfig,
    HttpKeywordValidationConfig, PatternDescriptor, PatternKind, PhaseConfig, pattern_total,
};
pub use proxy::{AcquisitionPolicy, AcquisitionStrategy, Proxy, ProxyOutcome, ProxyProtocol};
pub use security::{fingerprint_user_agent, SecurityContext, SubscriptionDescriptor};
