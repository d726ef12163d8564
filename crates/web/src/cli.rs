//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use user_service_lib::MigrateAction as StoreMigrateAction;

/// Services marketplace host
#[derive(Parser, Debug)]
#[command(name = "plataforma")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Print the effective settings
    Check(CheckArgs),
}

/// Arguments for the serve command; unset values come from the settings
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[arg(value_enum, default_value_t = MigrateAction::Up)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Drop everything and re-run all migrations
    Fresh,
}

impl From<MigrateAction> for StoreMigrateAction {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => StoreMigrateAction::Up,
            MigrateAction::Down => StoreMigrateAction::Down,
            MigrateAction::Status => StoreMigrateAction::Status,
            MigrateAction::Fresh => StoreMigrateAction::Fresh,
        }
    }
}

#[derive(Parser, Debug, Default)]
pub struct CheckArgs {
    /// Also connect to the database
    #[arg(long)]
    pub database: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["plataforma", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn migrate_defaults_to_up() {
        let cli = Cli::try_parse_from(["plataforma", "-v", "migrate"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Up
            })
        ));

        let cli = Cli::try_parse_from(["plataforma", "migrate", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Status
            })
        ));
    }

    #[test]
    fn rejects_unknown_migrate_action() {
        assert!(Cli::try_parse_from(["plataforma", "migrate", "sideways"]).is_err());
    }
}
