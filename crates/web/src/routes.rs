//! Route configuration.

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use common::InstalledApp;

use crate::handlers::{health_routes, user_routes, StaticFiles};
use crate::middleware::middleware_chain;
use crate::state::AppState;

/// Create the main router with all routes.
///
/// Account endpoints exist only when the users app is installed; static
/// files are served only while debugging with the staticfiles app.
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let mut api = Router::new().nest("/health", health_routes());
    if settings.is_installed(InstalledApp::Users) {
        api = api.nest("/api/users", user_routes());
    }
    let mut router = api.with_state(state.clone());

    if settings.debug && settings.is_installed(InstalledApp::StaticFiles) {
        router = StaticFiles::from_settings(&settings.static_files)
            .mount(router, &settings.static_files.url);
    }

    router
        .layer(middleware::from_fn_with_state(state, middleware_chain))
        .layer(TraceLayer::new_for_http())
}
