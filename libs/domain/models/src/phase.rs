// [libs/domain/models/src/phase.rs]
/*!
 * Typed phase configuration blobs (spec.md §3 "Phase configuration").
 * One variant per `Phase`; the orchestrator always works on this typed
 * enum, never on raw JSON, per Design Note §9 ("Polymorphic persona
 * config blobs" applies equally here — parse once at the boundary).
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Drives deterministic domain enumeration. See `campaign-core-generator`
/// for the pure function that consumes this descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Prefix,
    Suffix,
    PrefixSuffix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDescriptor {
    pub kind: PatternKind,
    pub variable_length: u32,
    pub character_set: String,
    pub constant: String,
    pub tld: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainGenerationConfig {
    pub pattern: PatternDescriptor,
    pub max_domains: u64,
    pub start_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsValidationConfig {
    pub persona_ids: Vec<Uuid>,
    pub rotation_interval_seconds: u64,
    pub batch_size: u32,
    pub retry_count: u32,
    pub only_invalid_previously: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpKeywordValidationConfig {
    pub persona_ids: Vec<Uuid>,
    pub keyword_set_ids: Vec<Uuid>,
    pub ad_hoc_keywords: Vec<String>,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    LeadSummary,
    KeywordFrequency,
    DnsHealthReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub kind: AnalysisKind,
    pub emit_csv_artifact: bool,
    pub emit_json_artifact: bool,
}

/// The tagged variant consumed by the orchestrator and persisted (as
/// its JSON serialization) in `phase_configs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseConfig {
    DomainGeneration(DomainGenerationConfig),
    DnsValidation(DnsValidationConfig),
    HttpKeywordValidation(HttpKeywordValidationConfig),
    Analysis(AnalysisConfig),
}

impl PhaseConfig {
    pub fn phase(&self) -> super::campaign::Phase {
        use super::campaign::Phase;
        match self {
            PhaseConfig::DomainGeneration(_) => Phase::DomainGeneration,
            PhaseConfig::DnsValidation(_) => Phase::DnsValidation,
            PhaseConfig::HttpKeywordValidation(_) => Phase::HttpKeywordValidation,
            PhaseConfig::Analysis(_) => Phase::Analysis,
        }
    }
}

/// Pattern space size `N`, precomputed from a descriptor (spec.md §4.C).
/// `prefix`/`suffix` contribute a single multiplier of the base space;
/// `prefix_suffix` doubles it (the low bit of an offset picks the side).
pub fn pattern_total(pattern: &PatternDescriptor) -> u128 {
    let base = (pattern.character_set.chars().count() as u128)
        .saturating_pow(pattern.variable_length);
    match pattern.kind {
        PatternKind::Prefix | PatternKind::Suffix => base,
        PatternKind::PrefixSuffix => base.saturating_mul(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_total_doubles_for_prefix_suffix() {
        let base = PatternDescriptor {
            kind: PatternKind::Prefix,
            variable_length: 2,
            character_set: "ab".into(),
            constant: "x".into(),
            tld: "test".into(),
        };
        assert_eq!(pattern_total(&base), 4);

        let both = PatternDescriptor { kind: PatternKind::PrefixSuffix, ..base };
        assert_eq!(pattern_total(&both), 8);
    }
}
