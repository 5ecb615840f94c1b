//! sprintboard customers - lifecycle import and export

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output;
use crate::error::Result;
use crate::lifecycle::{self, Export, ExportFormat};

#[derive(Args, Debug)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    /// Import customers from a JSON array file
    Import { file: PathBuf },

    /// Write every customer to stdout
    Export {
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}

pub fn run(ctx: &AppContext, args: &CustomersArgs) -> Result<()> {
    let db = ctx.open_database()?;
    match &args.command {
        CustomersCommand::Import { file } => {
            let text = std::fs::read_to_string(file)?;
            let records = lifecycle::parse_import(&text)?;
            let report = lifecycle::import_customers(&db, records, Utc::now())?;
            if ctx.robot_mode {
                return output::emit_json(&report);
            }
            println!("{} {}", "✓".green(), report.message);
            if report.skipped > 0 {
                println!("  skipped {} duplicate email(s)", report.skipped);
            }
            for error in &report.errors {
                println!("  {} {error}", "!".yellow());
            }
        }
        CustomersCommand::Export { format } => {
            match lifecycle::export_customers(&db, (*format).into(), Utc::now())? {
                Export::Csv(body) => print!("{body}"),
                Export::Json(body) => output::emit_json(&body)?,
            }
        }
    }
    Ok(())
}
