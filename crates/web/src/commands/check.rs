//! Check command - prints the effective settings with secrets redacted.

use common::{AppError, AppResult, Settings};
use user_service_lib::infra::Database;

use crate::cli::CheckArgs;

/// Human-readable settings summary.
pub fn summary(settings: &Settings) -> Vec<String> {
    let join = |items: Vec<&str>| items.join(", ");
    let paths = |dirs: &[std::path::PathBuf]| {
        dirs.iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    vec![
        format!("debug: {}", settings.debug),
        format!(
            "secret_key: {}",
            if settings.uses_insecure_secret_key() {
                "insecure default"
            } else {
                "set"
            }
        ),
        format!("allowed_hosts: {}", settings.allowed_hosts.join(", ")),
        format!(
            "installed_apps: {}",
            join(settings.installed_apps.iter().map(|a| a.as_str()).collect())
        ),
        format!(
            "middleware: {}",
            join(settings.middleware.iter().map(|m| m.as_str()).collect())
        ),
        format!("database: {}", settings.database.display_url()),
        format!(
            "password_validators: {}",
            join(settings.password_validators.iter().map(|v| v.as_str()).collect())
        ),
        format!("password_min_length: {}", settings.password_min_length),
        format!(
            "password_rules: {}",
            settings.password_policy().help_texts().join(" ")
        ),
        format!("template_dirs: {}", paths(&settings.templates.dirs)),
        format!("static_url: {}", settings.static_files.url),
        format!("staticfiles_dirs: {}", paths(&settings.static_files.dirs)),
        format!(
            "locale: {} {} (i18n: {}, tz: {})",
            settings.locale.language_code,
            settings.locale.time_zone,
            settings.locale.use_i18n,
            settings.locale.use_tz
        ),
        format!("server: {}", settings.server_addr()),
    ]
}

/// Execute the check command
pub async fn execute(args: CheckArgs, settings: Settings) -> AppResult<()> {
    for line in summary(&settings) {
        println!("{}", line);
    }

    if args.database {
        let db = Database::connect_without_migrations(&settings.database)
            .await
            .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
        db.ping()
            .await
            .map_err(|e| AppError::internal(format!("Database ping failed: {}", e)))?;
        println!("database connection: ok");
    }

    Ok(())
}
