//! sprintboard reminders - overdue contract paperwork

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::sprint;

#[derive(Args, Debug)]
pub struct RemindersArgs {
    /// Mark every due reminder as sent
    #[arg(long)]
    pub mark: bool,
}

pub fn run(ctx: &AppContext, args: &RemindersArgs) -> Result<()> {
    let db = ctx.open_database()?;
    let now = Utc::now();
    let due = sprint::due_reminders(&db, now, ctx.config.contract)?;

    if args.mark {
        let mut marked = Vec::with_capacity(due.len());
        for reminder in &due {
            marked.push(sprint::mark_reminder_sent(&db, reminder.deal.id, now)?.id);
        }
        if ctx.robot_mode {
            return output::emit_json(&json!({ "marked": marked }));
        }
        println!("{} Marked {} reminder(s) as sent", "✓".green(), marked.len());
        return Ok(());
    }

    if ctx.robot_mode {
        return output::emit_json(&due);
    }
    if due.is_empty() {
        println!("No reminders due");
        return Ok(());
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("{} reminder(s) due", due.len()));
    for reminder in &due {
        let status = &reminder.contract_status;
        layout.bullet(&format!(
            "#{} {} - {} days since close, missing: {}",
            reminder.deal.id,
            reminder.deal.title,
            status.days_since_close,
            status.missing_tasks.join(", ")
        ));
    }
    output::emit_human(&layout);
    Ok(())
}
