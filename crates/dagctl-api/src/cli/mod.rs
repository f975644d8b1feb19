//! CLI command definitions for the `dagctl` binary.
//!
//! Uses clap derive macros for argument parsing. Subcommands follow a
//! noun-verb pattern (e.g., `dagctl users add`, `dagctl dags list`).

pub mod dags;
pub mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Control API for a workflow orchestrator.
#[derive(Parser)]
#[command(name = "dagctl", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to dagctl.toml in the data directory).
    #[arg(long, global = true, env = "DAGCTL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST control API.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage API users for the password auth backend.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Inspect DAG definitions.
    Dags {
        #[command(subcommand)]
        action: DagsAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Add an API user.
    Add {
        username: String,

        /// Password (prompted for when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// List API users.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum DagsAction {
    /// List the DAGs loaded from the DAG folder.
    #[command(alias = "ls")]
    List,
}
