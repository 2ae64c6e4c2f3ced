//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

/// alertd - in-process alert provider and remote-service CLI
#[derive(Parser)]
#[command(
    name = "ad",
    about = "Alert provider daemon and alerting-service CLI",
    version
)]
pub struct Cli {
    /// Path to config file; -c stays reserved for the comment flag
    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// View the remote service's running config
    Config {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        output: OutputFormat,
    },

    /// Manage silences on the remote service
    Silence {
        #[command(subcommand)]
        command: SilenceCommand,
    },
}

/// Silence subcommands
#[derive(Subcommand)]
pub enum SilenceCommand {
    /// Extend or update existing silences
    Update {
        /// Silence IDs to update
        #[arg(value_name = "ID", required = true)]
        ids: Vec<Uuid>,

        /// Duration to extend the silence by (e.g. "2h30m")
        #[arg(short, long)]
        duration: Option<String>,

        /// Set when the silence should start (RFC3339)
        #[arg(long)]
        start: Option<String>,

        /// Set when the silence should end, overrides duration (RFC3339)
        #[arg(long)]
        end: Option<String>,

        /// A comment to help describe the silence
        #[arg(short, long)]
        comment: Option<String>,
    },
}

/// How much of the remote status to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Just the running config
    Simple,
    /// Config plus uptime and version info
    Extended,
    /// The entire status object as JSON
    Json,
}
