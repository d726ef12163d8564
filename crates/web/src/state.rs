//! Application state for dependency injection.

use std::sync::Arc;

use common::Settings;
use user_service_lib::infra::Database;
use user_service_lib::service::UserService;

use crate::middleware::MiddlewareChain;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: Database,
    pub users: Arc<dyn UserService>,
    pub middleware: Arc<MiddlewareChain>,
}

impl AppState {
    /// Create new app state; the middleware chain follows `settings.middleware`.
    pub fn new(settings: Settings, db: Database, users: Arc<dyn UserService>) -> Self {
        let middleware = Arc::new(MiddlewareChain::from_settings(&settings));
        Self {
            settings: Arc::new(settings),
            db,
            users,
            middleware,
        }
    }
}
