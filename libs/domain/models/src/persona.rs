// [libs/domain/models/src/persona.rs]
/*!
 * Persona configs (spec.md §3 "Persona", §4.A). Modeled as a tagged
 * variant rather than an opaque blob, per Design Note §9 — the loader
 * parses once at the boundary and every downstream consumer works on
 * `PersonaConfig` directly.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    Dns,
    Http,
}

impl PersonaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonaKind::Dns => "dns",
            PersonaKind::Http => "http",
        }
    }

    pub fn parse(value: &str) -> Option<PersonaKind> {
        match value {
            "dns" => Some(PersonaKind::Dns),
            "http" => Some(PersonaKind::Http),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsQueryStrategy {
    RoundRobin,
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsPersonaConfig {
    /// `host:port` or DoH/DoT absolute URLs. Validated on write per
    /// spec.md §4.A.
    pub resolvers: Vec<String>,
    pub query_strategy: DnsQueryStrategy,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookiePolicy {
    Ignore,
    Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpPersonaConfig {
    pub user_agent: String,
    pub header_order: Vec<String>,
    pub tls_profile: String,
    pub cookie_policy: CookiePolicy,
    pub follow_redirects: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersonaConfig {
    Dns(DnsPersonaConfig),
    Http(HttpPersonaConfig),
}

impl PersonaConfig {
    pub fn kind(&self) -> PersonaKind {
        match self {
            PersonaConfig::Dns(_) => PersonaKind::Dns,
            PersonaConfig::Http(_) => PersonaKind::Http,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub config: PersonaConfig,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validates a DNS resolver entry: either `host:port` with a numeric
/// port, or an absolute URL with a non-empty scheme and host
/// (spec.md §4.A).
pub fn validate_dns_resolver(entry: &str) -> bool {
    if let Ok(url) = url::Url::parse(entry) {
        return !url.scheme().is_empty() && url.host().is_some();
    }
    match entry.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_accepts_host_port() {
        assert!(validate_dns_resolver("1.1.1.1:53"));
    }

    #[test]
    fn resolver_accepts_doh_url() {
        assert!(validate_dns_resolver("https://dns.example.com/dns-query"));
    }

    #[test]
    fn resolver_rejects_garbage() {
        assert!(!validate_dns_resolver("not-a-resolver"));
        assert!(!validate_dns_resolver("host:notaport"));
    }
}
