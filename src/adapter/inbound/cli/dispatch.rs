//! Routes a parsed [`Cli`] to its handler.

use crate::adapter::inbound::cli::command::{
    Cli, ColorChoice, Commands, ConfigCommand, PurgeCommand, SessionsCommand,
};
use crate::adapter::inbound::cli::output::{self, OutputConfig};
use crate::adapter::inbound::cli::{
    config, init, performance, purge, sessions, timeline,
};
use crate::adapter::outbound::sqlite::Database;
use crate::error::Result;

/// Apply global flags, load configuration, and run the selected command.
pub async fn execute(cli: Cli) -> Result<()> {
    let output_config = OutputConfig::new(cli.json, cli.quiet, cli.verbose);
    output::configure(output_config);
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }

    // Validation reports on the file itself and must not fail while loading it.
    if let Commands::Config(ConfigCommand::Validate) = cli.command {
        return config::execute_validate(&cli.config);
    }

    let settings = config::load(&cli.config, cli.db.as_deref())?;
    match output_config.log_level() {
        Some(level) => settings.logging.clone().with_level(level).init(),
        None => settings.init_logging(),
    }

    match &cli.command {
        Commands::Config(ConfigCommand::Show) => config::execute_show(&settings, &cli.config),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
        Commands::Init(args) => init::execute(&settings, &cli.config, args),
        command => {
            let db = Database::open(&settings.database)?;
            match command {
                Commands::Sessions(SessionsCommand::List(args)) => {
                    sessions::execute_list(&db, args).await
                }
                Commands::Sessions(SessionsCommand::Show { session_id }) => {
                    sessions::execute_show(&db, session_id)
                }
                Commands::Sessions(SessionsCommand::Crashed(args)) => {
                    sessions::execute_crashed(&db, args)
                }
                Commands::Timeline(args) => timeline::execute(&db, args),
                Commands::Performance(args) => performance::execute(&db, args),
                Commands::Purge(PurgeCommand::Before(args)) => {
                    purge::execute_before(&db, args).await
                }
                Commands::Purge(PurgeCommand::KeepLast(args)) => {
                    purge::execute_keep_last(&db, args).await
                }
                Commands::Purge(PurgeCommand::Session(args)) => {
                    purge::execute_session(&db, args).await
                }
                Commands::Purge(PurgeCommand::Truncate(confirm)) => {
                    purge::execute_truncate(&db, confirm).await
                }
                Commands::Purge(PurgeCommand::Auto(confirm)) => {
                    purge::execute_auto(&db, &settings.retention, confirm).await
                }
                Commands::Init(_) | Commands::Config(_) => Ok(()),
            }
        }
    }
}
