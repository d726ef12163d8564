//! Serve command - Starts the HTTP server.

use common::{AppError, AppResult, Settings};

use crate::cli::ServeArgs;
use crate::routes::create_router;
use crate::state::AppState;

/// Execute the serve command
pub async fn execute(args: ServeArgs, settings: Settings) -> AppResult<()> {
    tracing::info!("Starting server...");

    let (db, users) = user_service_lib::build(&settings)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let addr = format!(
        "{}:{}",
        args.host.as_deref().unwrap_or(&settings.server_host),
        args.port.unwrap_or(settings.server_port)
    );

    let state = AppState::new(settings, db, users);
    tracing::debug!(middleware = ?state.middleware.names(), "Middleware chain ready");
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
