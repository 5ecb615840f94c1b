//! sprintboard deal - inspect or move a deal

use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout, dollars};
use crate::error::Result;
use crate::sprint::{self, DealDetail, StatusUpdate};

#[derive(Args, Debug)]
pub struct DealArgs {
    #[command(subcommand)]
    pub command: DealCommand,
}

#[derive(Subcommand, Debug)]
pub enum DealCommand {
    /// Show a deal with its history and comments
    Show { id: i64 },

    /// Move a deal to another column
    Move {
        id: i64,
        /// Target status (`lead`, `qualified_solution`, ... or a column title)
        status: String,
        /// Reason recorded in the status history
        #[arg(long)]
        reason: Option<String>,
    },
}

pub fn run(ctx: &AppContext, args: &DealArgs) -> Result<()> {
    let db = ctx.open_database()?;
    match &args.command {
        DealCommand::Show { id } => {
            let detail = sprint::deal_detail(&db, *id, Utc::now())?;
            if ctx.robot_mode {
                return output::emit_json(&detail);
            }
            output::emit_human(&render(&detail));
        }
        DealCommand::Move { id, status, reason } => {
            let update = StatusUpdate {
                new_status: status.clone(),
                change_reason: reason.clone(),
                ..StatusUpdate::default()
            };
            let outcome = sprint::move_deal(&db, *id, &update, Utc::now())?;
            if ctx.robot_mode {
                return output::emit_json(&outcome);
            }
            println!(
                "{} {} -> {}",
                "✓".green(),
                outcome.deal.title,
                outcome.deal.status.title()
            );
        }
    }
    Ok(())
}

fn render(detail: &DealDetail) -> HumanLayout {
    let deal = &detail.deal;
    let mut layout = HumanLayout::new();
    layout.title(&format!("#{} {}", deal.id, deal.title));
    layout
        .kv("Status", &deal.status.title())
        .kv("Priority", deal.priority.as_str())
        .kv("Customer", deal.customer_name.as_deref().unwrap_or("-"))
        .kv("Value", &dollars(deal.value()))
        .kv("Assigned", &detail.activity_summary.assigned)
        .kv(
            "Age (days)",
            &detail.activity_summary.days_since_creation.to_string(),
        )
        .kv("AI insights", &detail.ai_insights.len().to_string());

    if !detail.timeline.is_empty() {
        layout.blank().section("Timeline");
        for entry in &detail.timeline {
            layout.bullet(&format!("{} {}", entry.date.format("%Y-%m-%d"), entry.title));
        }
    }
    if !detail.comments.is_empty() {
        layout.blank().section("Comments");
        for comment in &detail.comments {
            layout.bullet(&format!("{}: {}", comment.commenter_name, comment.comment_text));
        }
    }
    layout
}
