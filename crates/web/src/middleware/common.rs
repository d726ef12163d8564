//! Host header validation.

use axum::{extract::Request, http::header};
use once_cell::sync::Lazy;
use regex::Regex;

use ::common::{AppError, AppResult, Settings};

use super::Middleware;

static HOST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9.-]+|\[[a-f0-9]*:[a-f0-9.:]+\])(:[0-9]+)?$").expect("static regex")
});

/// Hosts accepted while debugging with an empty allow list.
const DEBUG_HOSTS: &[&str] = &[".localhost", "127.0.0.1", "[::1]"];

/// Compiled `ALLOWED_HOSTS` patterns.
///
/// `*` accepts anything, a leading dot accepts the domain and every
/// subdomain, anything else must match exactly. Comparison ignores case,
/// the port and a trailing dot.
#[derive(Debug, Clone, Default)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if settings.allowed_hosts.is_empty() && settings.debug {
            Self::new(DEBUG_HOSTS)
        } else {
            Self::new(&settings.allowed_hosts)
        }
    }

    /// Whether a raw `Host` value (possibly with a port) is accepted.
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        if !HOST_PATTERN.is_match(&host) {
            return false;
        }

        let domain = strip_port(&host).trim_end_matches('.');
        if domain.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| matches_pattern(domain, pattern))
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((domain, _)) => domain,
        None => host,
    }
}

fn matches_pattern(domain: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_prefix('.') {
        Some(suffix) => domain == suffix || domain.ends_with(pattern),
        None => domain == pattern,
    }
}

/// Rejects requests whose host is not in the allow list.
#[derive(Debug, Clone)]
pub struct CommonMiddleware {
    allowed_hosts: AllowedHosts,
}

impl CommonMiddleware {
    pub fn new(allowed_hosts: AllowedHosts) -> Self {
        Self { allowed_hosts }
    }
}

impl Middleware for CommonMiddleware {
    fn name(&self) -> &'static str {
        "common"
    }

    fn process_request(&self, request: &Request) -> AppResult<()> {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| {
                let uri = request.uri();
                uri.host().map(|host| match uri.port_u16() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
            })
            .unwrap_or_default();

        if self.allowed_hosts.is_allowed(&host) {
            Ok(())
        } else {
            Err(AppError::DisallowedHost(host))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_host(host: &str) -> Request {
        Request::builder()
            .uri("/health")
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn exact_match_ignores_port_case_and_trailing_dot() {
        let hosts = AllowedHosts::new(["plataforma.com.br"]);
        assert!(hosts.is_allowed("plataforma.com.br"));
        assert!(hosts.is_allowed("Plataforma.COM.br:8000"));
        assert!(hosts.is_allowed("plataforma.com.br."));
        assert!(!hosts.is_allowed("api.plataforma.com.br"));
        assert!(!hosts.is_allowed("evil.com"));
    }

    #[test]
    fn leading_dot_matches_subdomains() {
        let hosts = AllowedHosts::new([".plataforma.com.br"]);
        assert!(hosts.is_allowed("plataforma.com.br"));
        assert!(hosts.is_allowed("api.plataforma.com.br"));
        assert!(!hosts.is_allowed("notplataforma.com.br"));
    }

    #[test]
    fn wildcard_accepts_any_well_formed_host() {
        let hosts = AllowedHosts::new(["*"]);
        assert!(hosts.is_allowed("anything.example"));
        assert!(!hosts.is_allowed("bad host"));
        assert!(!hosts.is_allowed(""));
    }

    #[test]
    fn ipv6_literals() {
        let hosts = AllowedHosts::new(["[::1]"]);
        assert!(hosts.is_allowed("[::1]"));
        assert!(hosts.is_allowed("[::1]:8000"));
        assert!(!hosts.is_allowed("[::2]"));
    }

    #[test]
    fn empty_list_in_debug_allows_local_hosts() {
        let mut settings = Settings::for_tests();
        settings.allowed_hosts.clear();
        settings.debug = true;
        let hosts = AllowedHosts::from_settings(&settings);
        assert!(hosts.is_allowed("localhost:8000"));
        assert!(hosts.is_allowed("app.localhost"));
        assert!(hosts.is_allowed("127.0.0.1"));
        assert!(!hosts.is_allowed("example.com"));

        settings.debug = false;
        let hosts = AllowedHosts::from_settings(&settings);
        assert!(!hosts.is_allowed("localhost"));
    }

    #[test]
    fn middleware_rejects_unknown_host() {
        let middleware = CommonMiddleware::new(AllowedHosts::new(["127.0.0.1"]));
        assert!(middleware.process_request(&request_with_host("127.0.0.1:8000")).is_ok());

        let err = middleware
            .process_request(&request_with_host("evil.com"))
            .unwrap_err();
        assert!(matches!(err, AppError::DisallowedHost(ref host) if host == "evil.com"));
    }
}
