// [libs/core/http-validator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HTTP/KEYWORD VALIDATOR (ESTRATO L2)
 * RESPONSABILIDAD: FETCH + ESCANEO DE PALABRAS CLAVE PARA UN DOMINIO
 *
 * Implementa spec.md §4.E. Cliente construido desde la persona HTTP,
 * enrutado opcionalmente a través de un proxy de B. Fallos de red se
 * representan como parte del `Result`, nunca como `Err`.
 * =================================================================
 */

pub mod errors;

pub use errors::HttpValidatorError;

use campaign_domain_models::{CookiePolicy, HttpPersonaConfig, KeywordMatch, Proxy};
use futures_util::StreamExt;
use tracing::instrument;
use uuid::Uuid;

/// One entry in the keyword universe to scan for. `set_id` is `None`
/// for ad-hoc keywords supplied directly on the phase config.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub set_id: Option<Uuid>,
    pub keyword: String,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status_code: Option<u16>,
    pub final_url: Option<String>,
    pub body_size: Option<u64>,
    pub truncated: bool,
    pub matches: Vec<KeywordMatch>,
    pub error_kind: Option<String>,
}

fn build_client(persona: &HttpPersonaConfig, proxy: Option<&Proxy>) -> Result<reqwest::Client, HttpValidatorError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(persona.user_agent.clone())
        .timeout(std::time::Duration::from_millis(persona.timeout_ms))
        .cookie_store(matches!(persona.cookie_policy, CookiePolicy::Session))
        .redirect(if persona.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if let Some(proxy) = proxy {
        let scheme = match proxy.protocol {
            campaign_domain_models::ProxyProtocol::Http => "http",
            campaign_domain_models::ProxyProtocol::Https => "https",
            campaign_domain_models::ProxyProtocol::Socks5 => "socks5",
        };
        let proxy_url = format!("{scheme}://{}", proxy.address);
        let mut reqwest_proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|_| HttpValidatorError::InvalidProxyAddress(proxy.address.clone()))?;
        if let Some(credentials) = &proxy.credentials {
            if let Some((user, pass)) = credentials.split_once(':') {
                reqwest_proxy = reqwest_proxy.basic_auth(user, pass);
            }
        }
        builder = builder.proxy(reqwest_proxy);
    }

    builder
        .build()
        .map_err(|err| HttpValidatorError::ClientBuildFailed(err.to_string()))
}

/// Fetches `url` with the given persona/proxy, reads up to
/// `max_body_read_bytes`, then scans the read portion for every entry
/// in `keyword_universe` (case-insensitive substring, byte offsets in
/// the lowercased read buffer).
#[instrument(skip(persona, proxy, keyword_universe), fields(url = %url))]
pub async fn fetch_and_scan(
    url: &str,
    persona: &HttpPersonaConfig,
    proxy: Option<&Proxy>,
    keyword_universe: &[KeywordEntry],
    max_body_read_bytes: u64,
) -> Result<FetchOutcome, HttpValidatorError> {
    let client = build_client(persona, proxy)?;

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "❌ http fetch failed");
            return Ok(FetchOutcome {
                status_code: None,
                final_url: None,
                body_size: None,
                truncated: false,
                matches: Vec::new(),
                error_kind: Some(classify_reqwest_error(&err)),
            });
        }
    };

    let status_code = Some(response.status().as_u16());
    let final_url = Some(response.url().to_string());

    let mut buffer: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                tracing::warn!(error = %err, "❌ http body read failed mid-stream");
                return Ok(FetchOutcome {
                    status_code,
                    final_url,
                    body_size: Some(buffer.len() as u64),
                    truncated,
                    matches: Vec::new(),
                    error_kind: Some(classify_reqwest_error(&err)),
                });
            }
        };

        if (buffer.len() as u64) + (chunk.len() as u64) > max_body_read_bytes {
            let remaining = max_body_read_bytes.saturating_sub(buffer.len() as u64) as usize;
            buffer.extend_from_slice(&chunk[..remaining.min(chunk.len())]);
            truncated = true;
            break;
        }
        buffer.extend_from_slice(&chunk);
    }

    let body_size = Some(buffer.len() as u64);
    let matches = scan_keywords(&buffer, keyword_universe);

    Ok(FetchOutcome { status_code, final_url, body_size, truncated, matches, error_kind: None })
}

fn scan_keywords(body: &[u8], keyword_universe: &[KeywordEntry]) -> Vec<KeywordMatch> {
    let haystack = String::from_utf8_lossy(body).to_lowercase();
    let mut matches = Vec::new();

    for entry in keyword_universe {
        let needle = entry.keyword.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        let mut search_from = 0;
        while let Some(found) = haystack[search_from..].find(&needle) {
            let offset = search_from + found;
            matches.push(KeywordMatch { set_id: entry.set_id, keyword: entry.keyword.clone(), offset });
            search_from = offset + needle.len();
        }
    }

    matches
}

fn classify_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        "connect_error".to_string()
    } else if err.is_redirect() {
        "redirect_error".to_string()
    } else {
        "network_error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_all_case_insensitive_occurrences_with_offsets() {
        let body = b"Buy NOW at Now.example, now!";
        let universe = vec![KeywordEntry { set_id: None, keyword: "now".into() }];
        let matches = scan_keywords(body, &universe);
        let offsets: Vec<usize> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![4, 11, 24]);
    }

    #[test]
    fn scan_ignores_empty_keywords() {
        let body = b"anything goes here";
        let universe = vec![KeywordEntry { set_id: None, keyword: String::new() }];
        assert!(scan_keywords(body, &universe).is_empty());
    }

    #[test]
    fn scan_handles_overlapping_candidate_without_double_counting_consumed_bytes() {
        let body = b"aaaa";
        let universe = vec![KeywordEntry { set_id: None, keyword: "aa".into() }];
        let matches = scan_keywords(body, &universe);
        let offsets: Vec<usize> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 2]);
    }
}
