// [libs/infra/persona-store/src/validation.rs]
/*!
 * Write-time validation (spec.md §4.A): DNS resolver entries must
 * parse as `host:port` or an absolute URL; HTTP payloads need positive
 * timeouts.
 */

use campaign_domain_models::{validate_dns_resolver, PersonaConfig};

use crate::errors::PersonaStoreError;

pub fn validate_config(config: &PersonaConfig) -> Result<(), PersonaStoreError> {
    match config {
        PersonaConfig::Dns(dns) => {
            if dns.resolvers.is_empty() {
                return Err(PersonaStoreError::InvalidConfig("dns persona must list at least one resolver".into()));
            }
            for entry in &dns.resolvers {
                if !validate_dns_resolver(entry) {
                    return Err(PersonaStoreError::InvalidConfig(format!("invalid resolver entry '{entry}'")));
                }
            }
            if dns.timeout_ms == 0 {
                return Err(PersonaStoreError::InvalidConfig("dns persona timeout_ms must be positive".into()));
            }
        }
        PersonaConfig::Http(http) => {
            if http.timeout_ms == 0 {
                return Err(PersonaStoreError::InvalidConfig("http persona timeout_ms must be positive".into()));
            }
            if http.user_agent.trim().is_empty() {
                return Err(PersonaStoreError::InvalidConfig("http persona user_agent must not be empty".into()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_domain_models::{CookiePolicy, DnsPersonaConfig, DnsQueryStrategy, HttpPersonaConfig};

    #[test]
    fn rejects_dns_persona_with_no_resolvers() {
        let config = PersonaConfig::Dns(DnsPersonaConfig {
            resolvers: vec![],
            query_strategy: DnsQueryStrategy::RoundRobin,
            timeout_ms: 500,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_http_persona_with_zero_timeout() {
        let config = PersonaConfig::Http(HttpPersonaConfig {
            user_agent: "test-agent".into(),
            header_order: vec![],
            tls_profile: "default".into(),
            cookie_policy: CookiePolicy::Ignore,
            follow_redirects: true,
            timeout_ms: 0,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn accepts_well_formed_dns_persona() {
        let config = PersonaConfig::Dns(DnsPersonaConfig {
            resolvers: vec!["1.1.1.1:53".into()],
            query_strategy: DnsQueryStrategy::Sequential,
            timeout_ms: 1000,
        });
        assert!(validate_config(&config).is_ok());
    }
}
