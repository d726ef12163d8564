//! Development static file serving over every configured directory.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tower::{service_fn, ServiceExt};
use tower_http::services::ServeDir;

use common::{AppError, StaticSettings};

/// Looks a path up in each directory in order; the first hit wins.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    dirs: Arc<Vec<PathBuf>>,
}

impl StaticFiles {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs: Arc::new(dirs),
        }
    }

    pub fn from_settings(settings: &StaticSettings) -> Self {
        Self::new(settings.dirs.clone())
    }

    /// Mount under `url`, or as the fallback when the prefix is `/`.
    pub fn mount(self, router: Router, url: &str) -> Router {
        let service = service_fn(move |request: Request| {
            let files = self.clone();
            async move { Ok::<_, Infallible>(files.serve(request).await) }
        });

        match url.trim_end_matches('/') {
            "" => router.fallback_service(service),
            prefix => router.nest_service(prefix, service),
        }
    }

    pub async fn serve(&self, request: Request) -> Response {
        let (parts, _) = request.into_parts();

        for dir in self.dirs.iter() {
            let mut attempt = Request::new(Body::empty());
            *attempt.method_mut() = parts.method.clone();
            *attempt.uri_mut() = parts.uri.clone();
            *attempt.headers_mut() = parts.headers.clone();

            let response = match ServeDir::new(dir).oneshot(attempt).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            if response.status() != StatusCode::NOT_FOUND {
                return response.map(Body::new);
            }
        }

        tracing::debug!(path = %parts.uri.path(), "Static file not found");
        AppError::not_found("Static file").into_response()
    }
}
