//! User Service Library
//!
//! Account storage and use cases: the `usuario` table, its migrations, the
//! repository over it and the service applying the password policy.

pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use sea_orm::DbErr;
use tracing::info;

use common::{DatabaseSettings, Settings};

use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::{UserManager, UserService};

/// Connect (applying migrations) and assemble the account service.
pub async fn build(settings: &Settings) -> Result<(Database, Arc<dyn UserService>), DbErr> {
    let db = Database::connect(&settings.database).await?;
    let repo = Arc::new(UserStore::new(db.get_connection()));
    let service: Arc<dyn UserService> =
        Arc::new(UserManager::new(repo, settings.password_policy()));
    Ok((db, service))
}

/// Run a migration action and report every migration's state afterwards.
pub async fn run_migrations(
    settings: &DatabaseSettings,
    action: MigrateAction,
) -> Result<Vec<(String, bool)>, DbErr> {
    let db = Database::connect_without_migrations(settings).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {}
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    db.migration_status().await
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
