// [libs/core/dns-validator/src/resolver_pool.rs]
/*!
 * Builds one single-nameserver `TokioAsyncResolver` per entry in a
 * persona's resolver list, so round-robin can simply advance an index
 * into this vec on failure (spec.md §4.D).
 */

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::errors::DnsValidatorError;

pub struct ResolverPool {
    resolvers: Vec<TokioAsyncResolver>,
    cursor: AtomicUsize,
}

impl ResolverPool {
    pub fn build(entries: &[String], timeout_ms: u64) -> Result<Self, DnsValidatorError> {
        if entries.is_empty() {
            return Err(DnsValidatorError::NoResolversConfigured);
        }

        let mut resolvers = Vec::with_capacity(entries.len());
        for entry in entries {
            resolvers.push(build_single(entry, timeout_ms)?);
        }

        Ok(Self { resolvers, cursor: AtomicUsize::new(0) })
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn first(&self) -> &TokioAsyncResolver {
        &self.resolvers[0]
    }

    /// Round-robin: each call advances the shared cursor, so repeated
    /// failures against one resolver rotate through the rest before
    /// looping back.
    pub fn next(&self) -> &TokioAsyncResolver {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.resolvers.len();
        &self.resolvers[index]
    }
}

fn build_single(entry: &str, timeout_ms: u64) -> Result<TokioAsyncResolver, DnsValidatorError> {
    let mut opts = ResolverOpts::default();
    opts.timeout = std::time::Duration::from_millis(timeout_ms);
    opts.attempts = 1;

    let server = if let Ok(url) = url::Url::parse(entry) {
        let host = url
            .host_str()
            .ok_or_else(|| DnsValidatorError::InvalidResolverEntry(entry.to_string()))?
            .to_string();
        let port = url.port().unwrap_or(443);
        let socket_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));
        NameServerConfig {
            socket_addr,
            protocol: Protocol::Https,
            tls_dns_name: Some(host),
            trust_negative_responses: true,
            bind_addr: None,
        }
    } else {
        let socket_addr: SocketAddr = entry
            .parse()
            .map_err(|_| DnsValidatorError::InvalidResolverEntry(entry.to_string()))?;
        NameServerConfig {
            socket_addr,
            protocol: Protocol::Udp,
            tls_dns_name: None,
            trust_negative_responses: true,
            bind_addr: None,
        }
    };

    let mut config = ResolverConfig::new();
    config.add_name_server(server);

    Ok(TokioAsyncResolver::tokio(config, opts))
}
