//! CLI command definitions for task-board.
//!
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod admin;

use admin::SetRoleArgs;
use clap::{Parser, Subcommand};

/// Team task board HTTP server and admin tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Port for the HTTP API (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,

    /// Apply pending schema migrations and exit
    Migrate,

    /// Insert the configured seed domains that do not exist yet
    SeedDomains,

    /// Change a registered user's role
    SetRole(SetRoleArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["task-board", "--port", "8080"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn set_role_parses_arguments() {
        let cli = Cli::parse_from([
            "task-board",
            "set-role",
            "--email",
            "ada@example.com",
            "--role",
            "manager",
        ]);
        match cli.command {
            Some(Command::SetRole(args)) => {
                assert_eq!(args.email, "ada@example.com");
                assert_eq!(args.role, "manager");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
