// [libs/core/dns-validator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DNS VALIDATOR (ESTRATO L2)
 * RESPONSABILIDAD: VEREDICTO DE RESOLUCIÓN PARA UN DOMINIO CANDIDATO
 *
 * Implementa spec.md §4.D. Red de resolvers provista por la persona,
 * rotación round-robin sobre fallos, tie-break determinista cuando
 * múltiples intentos producen veredictos distintos.
 * =================================================================
 */

pub mod errors;
mod resolver_pool;

pub use errors::DnsValidatorError;

use campaign_domain_models::{DnsPersonaConfig, DnsQueryStrategy, DnsVerdict};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use resolver_pool::ResolverPool;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub verdict: DnsVerdict,
    pub records: Vec<String>,
    pub attempt_count: u32,
}

/// Resolves `domain` against `persona`'s resolver list, retrying up to
/// `retries` times. Returns the strongest verdict seen across attempts
/// (spec.md §4.D tie-break: `resolved > nxdomain > servfail > timeout >
/// other`). Only persona mis-configuration surfaces as an `Err`; every
/// network outcome becomes a verdict.
#[instrument(skip(persona), fields(domain = %domain))]
pub async fn validate(
    domain: &str,
    persona: &DnsPersonaConfig,
    retries: u32,
) -> Result<ValidationOutcome, DnsValidatorError> {
    let pool = ResolverPool::build(&persona.resolvers, persona.timeout_ms)?;
    let attempts = retries.max(1);

    let mut best: Option<(DnsVerdict, Vec<String>)> = None;
    let mut attempt_count = 0u32;

    for _ in 0..attempts {
        attempt_count += 1;

        let resolver = match persona.query_strategy {
            DnsQueryStrategy::RoundRobin => pool.next(),
            DnsQueryStrategy::Sequential => pool.first(),
        };

        let (verdict, records) = resolve_once(resolver, domain).await;
        tracing::debug!(attempt = attempt_count, verdict = verdict.as_str(), "🔌 dns attempt completed");

        let is_stronger = match &best {
            Some((current, _)) => verdict.rank() > current.rank(),
            None => true,
        };
        if is_stronger {
            best = Some((verdict, records));
        }

        if verdict == DnsVerdict::Resolved {
            break;
        }
    }

    let (verdict, records) = best.expect("attempts is always >= 1");
    Ok(ValidationOutcome { verdict, records, attempt_count })
}

async fn resolve_once(resolver: &TokioAsyncResolver, domain: &str) -> (DnsVerdict, Vec<String>) {
    match resolver.lookup_ip(domain).await {
        Ok(lookup) => {
            let records: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
            if records.is_empty() {
                (DnsVerdict::NxDomain, records)
            } else {
                (DnsVerdict::Resolved, records)
            }
        }
        Err(err) => (classify_error(err.kind()), Vec::new()),
    }
}

fn classify_error(kind: &ResolveErrorKind) -> DnsVerdict {
    match kind {
        ResolveErrorKind::NoRecordsFound { .. } => DnsVerdict::NxDomain,
        ResolveErrorKind::Timeout => DnsVerdict::Timeout,
        ResolveErrorKind::Io(_) => DnsVerdict::ServFail,
        _ => DnsVerdict::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_domain_models::DnsQueryStrategy;

    #[tokio::test]
    async fn rejects_persona_with_no_resolvers() {
        let persona = DnsPersonaConfig {
            resolvers: vec![],
            query_strategy: DnsQueryStrategy::RoundRobin,
            timeout_ms: 500,
        };
        let result = validate("example.test", &persona, 2).await;
        assert!(matches!(result, Err(DnsValidatorError::NoResolversConfigured)));
    }

    #[tokio::test]
    async fn rejects_persona_with_garbage_resolver_entry() {
        let persona = DnsPersonaConfig {
            resolvers: vec!["not-a-resolver".into()],
            query_strategy: DnsQueryStrategy::Sequential,
            timeout_ms: 500,
        };
        let result = validate("example.test", &persona, 1).await;
        assert!(matches!(result, Err(DnsValidatorError::InvalidResolverEntry(_))));
    }
}
