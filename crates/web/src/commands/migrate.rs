//! Migrate command - Database migration management.

use common::{AppError, AppResult, Settings};

use crate::cli::MigrateArgs;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, settings: Settings) -> AppResult<()> {
    tracing::info!(
        action = ?args.action,
        database = %settings.database.display_url(),
        "Running migration command..."
    );

    let status = user_service_lib::run_migrations(&settings.database, args.action.into())
        .await
        .map_err(|e| AppError::internal(format!("Migration failed: {}", e)))?;

    for (name, applied) in status {
        println!("{}: {}", name, if applied { "applied" } else { "pending" });
    }

    Ok(())
}
