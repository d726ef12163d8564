//! Baseline security headers.

use axum::{
    http::{header, HeaderName, HeaderValue},
    response::Response,
};

use super::Middleware;

const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");

/// Adds `X-Content-Type-Options`, `Referrer-Policy` and
/// `Cross-Origin-Opener-Policy` unless the handler already set them.
#[derive(Debug, Clone)]
pub struct SecurityMiddleware {
    pub content_type_nosniff: bool,
    pub referrer_policy: Option<HeaderValue>,
    pub cross_origin_opener_policy: Option<HeaderValue>,
}

impl Default for SecurityMiddleware {
    fn default() -> Self {
        Self {
            content_type_nosniff: true,
            referrer_policy: Some(HeaderValue::from_static("same-origin")),
            cross_origin_opener_policy: Some(HeaderValue::from_static("same-origin")),
        }
    }
}

impl Middleware for SecurityMiddleware {
    fn name(&self) -> &'static str {
        "security"
    }

    fn process_response(&self, response: &mut Response) {
        let headers = response.headers_mut();

        if self.content_type_nosniff {
            headers
                .entry(header::X_CONTENT_TYPE_OPTIONS)
                .or_insert(HeaderValue::from_static("nosniff"));
        }
        if let Some(policy) = &self.referrer_policy {
            headers
                .entry(header::REFERRER_POLICY)
                .or_insert_with(|| policy.clone());
        }
        if let Some(policy) = &self.cross_origin_opener_policy {
            headers
                .entry(CROSS_ORIGIN_OPENER_POLICY)
                .or_insert_with(|| policy.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn adds_default_headers() {
        let mut response = "ok".into_response();
        SecurityMiddleware::default().process_response(&mut response);

        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::REFERRER_POLICY], "same-origin");
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
    }

    #[test]
    fn keeps_handler_values() {
        let mut response = ([(header::REFERRER_POLICY, "no-referrer")], "ok").into_response();
        SecurityMiddleware::default().process_response(&mut response);
        assert_eq!(response.headers()[header::REFERRER_POLICY], "no-referrer");
    }
}
