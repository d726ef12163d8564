//! Frame embedding protection.

use axum::{
    http::{header, HeaderValue},
    response::Response,
};

use super::Middleware;

/// Sets `X-Frame-Options` (DENY by default) unless already present.
#[derive(Debug, Clone)]
pub struct XFrameOptionsMiddleware {
    value: HeaderValue,
}

impl XFrameOptionsMiddleware {
    pub fn same_origin() -> Self {
        Self {
            value: HeaderValue::from_static("SAMEORIGIN"),
        }
    }
}

impl Default for XFrameOptionsMiddleware {
    fn default() -> Self {
        Self {
            value: HeaderValue::from_static("DENY"),
        }
    }
}

impl Middleware for XFrameOptionsMiddleware {
    fn name(&self) -> &'static str {
        "clickjacking"
    }

    fn process_response(&self, response: &mut Response) {
        response
            .headers_mut()
            .entry(header::X_FRAME_OPTIONS)
            .or_insert_with(|| self.value.clone());
    }
}
