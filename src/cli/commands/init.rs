//! sprintboard init - create the database, optionally with demo data

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output;
use crate::error::Result;
use crate::seed::{self, SeedReport};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Load the deterministic demo dataset
    #[arg(long)]
    pub seed: bool,
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    let path = &ctx.config.database.path;
    let db = ctx.open_database()?;

    let report = if args.seed {
        Some(seed::seed_demo(&db, ctx.config.analytics.seed, Utc::now())?)
    } else {
        None
    };

    if ctx.robot_mode {
        return output::emit_json(&json!({
            "status": "ok",
            "database": path.display().to_string(),
            "schema_version": db.schema_version(),
            "seed": report,
        }));
    }

    println!(
        "{} Database ready at {} (schema v{})",
        "✓".green(),
        path.display(),
        db.schema_version()
    );
    if let Some(report) = report {
        print_seed(&report);
    }
    Ok(())
}

fn print_seed(report: &SeedReport) {
    if report.skipped {
        println!("{} Database already has data; demo seed skipped", "!".yellow());
        return;
    }
    println!("{} Demo data loaded", "✓".green());
    println!("  persons:      {}", report.persons);
    println!("  deals:        {}", report.deals);
    println!("  comments:     {}", report.comments);
    println!("  contacts:     {}", report.contacts);
    println!("  satisfaction: {}", report.satisfaction_records);
    println!("  customers:    {}", report.customers);
}
