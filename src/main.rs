//! Task board server
//!
//! HTTP API for a team task board with topic-scoped visibility and
//! role-based permissions.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use task_board::board::Board;
use task_board::cli::{Cli, Command, admin};
use task_board::config::{Config, ConfigLoader, ConfigPaths};
use task_board::db::Database;
use task_board::error::set_expose_internal_errors;
use task_board::logging::{self, LogTarget};
use task_board::server;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_file(PathBuf::from(config_path));
    }
    let loader = ConfigLoader::load_with_paths(paths)?;
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Using config file");
    }
    let mut config = loader.into_config();

    // CLI overrides
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    set_expose_internal_errors(config.server.expose_internal_errors);

    let db = Database::open(&config.server.db_path, config.server.busy_timeout_ms)?;

    match cli.command {
        Some(Command::Migrate) => admin::run_migrate(&db)?,
        Some(Command::SeedDomains) => admin::run_seed_domains(&db, &config)?,
        Some(Command::SetRole(args)) => admin::run_set_role(&db, &args)?,
        Some(Command::Serve) | None => run_server(db, config).await?,
    }

    Ok(())
}

async fn run_server(db: Database, config: Config) -> Result<()> {
    let purged = db.purge_expired_sessions()?;
    if purged > 0 {
        info!(purged, "Removed expired sessions");
    }
    let seeded = db.seed_domains(&config.domains.seed)?;
    if seeded > 0 {
        info!(seeded, "Seeded domains");
    }

    info!(
        db_path = %config.server.db_path.display(),
        "Starting task board v{}",
        env!("CARGO_PKG_VERSION")
    );

    let addr = config.server.socket_addr();
    let board = Board::new(db, &config)?;
    server::serve(board, addr, server::shutdown_signal()).await
}
