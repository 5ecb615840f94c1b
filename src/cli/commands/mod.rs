//! Command handlers

pub mod board;
pub mod completions;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod deal;
pub mod init;
pub mod insight;
pub mod reminders;
pub mod serve;
pub mod train;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Serve(args) => serve::run(ctx, args),
        Commands::Init(args) => init::run(ctx, args),
        Commands::Board => board::run(ctx),
        Commands::Deal(args) => deal::run(ctx, args),
        Commands::Insight(args) => insight::run(ctx, args),
        Commands::Dashboard => dashboard::run(ctx),
        Commands::Reminders(args) => reminders::run(ctx, args),
        Commands::Customers(args) => customers::run(ctx, args),
        Commands::Train => train::run(ctx),
        Commands::Config => config::run(ctx),
        Commands::Completions(args) => completions::run_without_context(args),
    }
}
