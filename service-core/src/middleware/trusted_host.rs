use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Host allowlist. `*` allows everything; `*.example.com` matches any
/// subdomain of `example.com`.
#[derive(Debug, Clone)]
pub struct TrustedHosts {
    allow_any: bool,
    patterns: Arc<Vec<String>>,
}

impl TrustedHosts {
    pub fn new(hosts: &[String]) -> Self {
        let allow_any = hosts.is_empty() || hosts.iter().any(|h| h == "*");
        let patterns = hosts.iter().map(|h| h.to_ascii_lowercase()).collect();

        Self {
            allow_any,
            patterns: Arc::new(patterns),
        }
    }

    pub fn allow_any(&self) -> bool {
        self.allow_any
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        if self.allow_any {
            return true;
        }

        let host = strip_port(host).to_ascii_lowercase();

        self.patterns.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(suffix) => host.ends_with(&format!(".{}", suffix)),
            None => *pattern == host,
        })
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, e.g. `[::1]:8000`
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }

    host.rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map(|(name, _)| name)
        .unwrap_or(host)
}

pub async fn trusted_host_middleware(
    State(trusted): State<TrustedHosts>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if trusted.allow_any() {
        return Ok(next.run(request).await);
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or("")
        .to_string();

    if !trusted.is_allowed(&host) {
        warn!(host = %host, path = %request.uri().path(), "Rejecting request for untrusted host");
        return Err(AppError::Forbidden(anyhow::anyhow!("Invalid host header")));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> TrustedHosts {
        TrustedHosts::new(&list.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn wildcard_allows_everything() {
        let trusted = hosts(&["*"]);
        assert!(trusted.is_allowed("anything.test"));
        assert!(trusted.is_allowed(""));
    }

    #[test]
    fn exact_match_ignores_port_and_case() {
        let trusted = hosts(&["api.snaktox.org", "localhost"]);
        assert!(trusted.is_allowed("API.snaktox.org"));
        assert!(trusted.is_allowed("localhost:8000"));
        assert!(!trusted.is_allowed("evil.org"));
    }

    #[test]
    fn subdomain_pattern() {
        let trusted = hosts(&["*.snaktox.org"]);
        assert!(trusted.is_allowed("ai.snaktox.org"));
        assert!(!trusted.is_allowed("snaktox.org"));
        assert!(!trusted.is_allowed("notsnaktox.org"));
    }

    #[test]
    fn ipv6_literal() {
        let trusted = hosts(&["::1"]);
        assert!(trusted.is_allowed("[::1]:8000"));
    }
}
