//! Database connection and initialization.

use sea_orm::sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sea_orm::sqlx::Executor;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    RuntimeErr, SqlxMySqlConnector, Statement,
};
use sea_orm_migration::{MigrationStatus, MigratorTrait};

use common::{DatabaseEngine, DatabaseSettings};

use super::migrations::Migrator;

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect and apply pending migrations.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(settings).await?;

        Migrator::up(&db.connection, None).await?;
        tracing::info!(url = %settings.display_url(), "Database connected and migrations applied");

        Ok(db)
    }

    /// Connect without running migrations (for CLI commands).
    pub async fn connect_without_migrations(settings: &DatabaseSettings) -> Result<Self, DbErr> {
        let connection = match settings.engine {
            DatabaseEngine::Mysql => connect_mysql(settings).await?,
            DatabaseEngine::Sqlite => connect_sqlite(settings).await?,
        };
        Ok(Self { connection })
    }

    /// Get a reference to the database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Run pending migrations.
    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    /// Rollback the last migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// Every known migration with whether it has been applied.
    ///
    /// Creates the tracking table first, so a never-migrated database
    /// reports everything as pending.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        Ok(Migrator::get_migration_with_status(&self.connection)
            .await?
            .iter()
            .map(|m| {
                let applied = matches!(m.status(), MigrationStatus::Applied);
                (m.name().to_string(), applied)
            })
            .collect())
    }

    /// Drop every table and run all migrations again.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }

    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

/// MySQL pool whose connections all run the configured session command
/// (strict mode by default) before first use.
async fn connect_mysql(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let options = match settings.url_override() {
        Some(url) => url.parse::<MySqlConnectOptions>().map_err(sqlx_err)?,
        None => MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(settings.password())
            .database(&settings.name),
    };

    let init_command = settings.init_command.clone();
    let pool = MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .after_connect(move |conn, _meta| {
            let init_command = init_command.clone();
            Box::pin(async move {
                if let Some(command) = init_command {
                    conn.execute(command.as_str()).await?;
                }
                Ok(())
            })
        })
        .connect_with(options)
        .await
        .map_err(sqlx_err)?;

    Ok(SqlxMySqlConnector::from_sqlx_mysql_pool(pool))
}

async fn connect_sqlite(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let url = settings.sqlite_url();
    // Every connection to `:memory:` opens its own empty database.
    let max_connections = if url.contains(":memory:") {
        1
    } else {
        settings.max_connections
    };

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    SeaDatabase::connect(options).await
}

fn sqlx_err(err: sea_orm::sqlx::Error) -> DbErr {
    DbErr::Conn(RuntimeErr::SqlxError(err))
}
