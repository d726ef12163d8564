//! Request/response policy chain.
//!
//! Each policy sees the request on the way in (in configured order) and the
//! response on the way out (in reverse order). A policy that rejects the
//! request short-circuits the chain; the policies before it still get to
//! process the error response.

mod clickjacking;
mod common;
mod security;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use ::common::{AppResult, MiddlewareKind, Settings};

use crate::state::AppState;

pub use self::clickjacking::XFrameOptionsMiddleware;
pub use self::common::{AllowedHosts, CommonMiddleware};
pub use self::security::SecurityMiddleware;

/// One step of the chain.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect the incoming request; an error stops the chain.
    fn process_request(&self, _request: &Request) -> AppResult<()> {
        Ok(())
    }

    /// Adjust the outgoing response.
    fn process_response(&self, _response: &mut Response) {}
}

/// Ordered list of policies built from the settings.
#[derive(Default)]
pub struct MiddlewareChain {
    layers: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new(layers: Vec<Box<dyn Middleware>>) -> Self {
        Self { layers }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let layers = settings
            .middleware
            .iter()
            .map(|kind| -> Box<dyn Middleware> {
                match kind {
                    MiddlewareKind::Security => Box::new(SecurityMiddleware::default()),
                    MiddlewareKind::Common => {
                        Box::new(CommonMiddleware::new(AllowedHosts::from_settings(settings)))
                    }
                    MiddlewareKind::Clickjacking => Box::new(XFrameOptionsMiddleware::default()),
                }
            })
            .collect();
        Self::new(layers)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run the request phases, the inner service, then the response phases.
    pub async fn run(&self, request: Request, next: Next) -> Response {
        for (index, layer) in self.layers.iter().enumerate() {
            if let Err(err) = layer.process_request(&request) {
                tracing::debug!(middleware = layer.name(), "Request rejected");
                let mut response = err.into_response();
                respond(&self.layers[..index], &mut response);
                return response;
            }
        }

        let mut response = next.run(request).await;
        respond(&self.layers, &mut response);
        response
    }
}

fn respond(layers: &[Box<dyn Middleware>], response: &mut Response) {
    for layer in layers.iter().rev() {
        layer.process_response(response);
    }
}

/// Axum adapter for [`MiddlewareChain::run`].
pub async fn middleware_chain(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.middleware.run(request, next).await
}
