use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nat_cli::commands::{daily, dates, run, sessions, status, summary, util};
use nat_cli::{Cli, Commands, Config, ScopeArgs};
use nat_core::Scope;
use nat_db::SessionStore;

/// Load config and open the session store, ensuring the parent directory exists.
fn open_store(config_path: Option<&Path>) -> Result<(SessionStore, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let store = SessionStore::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((store, config))
}

fn resolve_scope(args: &ScopeArgs) -> Result<Scope> {
    args.resolve(util::today()).context("invalid date scope")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Run) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            run::run(store, &config)?;
        }
        Some(Commands::Sessions {
            scope,
            input_type,
            json,
        }) => {
            let scope = resolve_scope(scope)?;
            let (store, _config) = open_store(cli.config.as_deref())?;
            sessions::run(&store, &scope, *input_type, *json)?;
        }
        Some(Commands::Summary { scope, json }) => {
            let scope = resolve_scope(scope)?;
            let (store, _config) = open_store(cli.config.as_deref())?;
            summary::run(&store, &scope, *json)?;
        }
        Some(Commands::Daily { scope, json }) => {
            let scope = resolve_scope(scope)?;
            let (store, _config) = open_store(cli.config.as_deref())?;
            daily::run(&store, &scope, *json)?;
        }
        Some(Commands::Dates { json }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            dates::run(&store, *json)?;
        }
        Some(Commands::Status) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            status::run(&mut std::io::stdout().lock(), &store, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
