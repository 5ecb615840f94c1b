//! sprintboard board - print the sprint board

use chrono::Utc;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout, dollars};
use crate::error::Result;
use crate::sprint::{self, Board};

pub fn run(ctx: &AppContext) -> Result<()> {
    let db = ctx.open_database()?;
    let board = sprint::board(&db, Utc::now(), ctx.config.contract)?;

    if ctx.robot_mode {
        return output::emit_json(&board);
    }
    output::emit_human(&render(&board));
    Ok(())
}

fn render(board: &Board) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&format!(
        "Sprint board: {} deals, {} pipeline",
        board.total_deals,
        dollars(board.total_value)
    ));
    for column in &board.columns {
        layout.section(&format!("{} ({})", column.title, column.count));
        for entry in &column.deals {
            let deal = &entry.deal;
            let mut line = format!(
                "#{} {} [{}] {}",
                deal.id,
                deal.title,
                deal.priority.as_str(),
                dollars(deal.value())
            );
            if entry.contract_status.is_overdue {
                line.push_str(&format!(" {}", "contract overdue".red()));
            }
            layout.bullet(&line);
        }
        layout.blank();
    }
    layout
}
