//! CLI module - command-line definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// Sprintboard - sales sprint board and customer lifecycle analytics
#[derive(Parser, Debug)]
#[command(name = "sprintboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ./sprintboard.toml, then ~/.config/sprintboard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the REST API
    Serve(commands::serve::ServeArgs),

    /// Create the database, optionally loading demo data
    Init(commands::init::InitArgs),

    /// Print the sprint board
    Board,

    /// Inspect or move a deal
    Deal(commands::deal::DealArgs),

    /// Run the analysis agent for a deal
    Insight(commands::insight::InsightArgs),

    /// Print pipeline metrics
    Dashboard,

    /// List deals whose contract paperwork is overdue
    Reminders(commands::reminders::RemindersArgs),

    /// Import or export lifecycle customers
    Customers(commands::customers::CustomersArgs),

    /// Train the lifecycle models
    Train,

    /// Print the effective configuration
    Config,

    /// Print a shell completion script
    Completions(commands::completions::CompletionsArgs),
}
