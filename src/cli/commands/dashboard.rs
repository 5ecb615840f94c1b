//! sprintboard dashboard - pipeline metrics

use chrono::Utc;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout, dollars};
use crate::dashboard::{self, Dashboard};
use crate::error::Result;

pub fn run(ctx: &AppContext) -> Result<()> {
    let db = ctx.open_database()?;
    let dashboard = dashboard::dashboard(&db, Utc::now())?;

    if ctx.robot_mode {
        return output::emit_json(&dashboard);
    }
    output::emit_human(&render(&dashboard));
    Ok(())
}

fn render(dashboard: &Dashboard) -> HumanLayout {
    let metrics = &dashboard.metrics;
    let mut layout = HumanLayout::new();
    layout.title("Pipeline dashboard");
    layout
        .kv("Total deals", &metrics.total_deals.to_string())
        .kv("Pipeline value", &dollars(metrics.total_pipeline_value))
        .kv("Average deal size", &dollars(metrics.average_deal_size))
        .kv("Conversion rate", &format!("{:.1}%", metrics.conversion_rate * 100.0))
        .kv("Active deals", &metrics.active_deals.to_string())
        .kv("Closed deals", &metrics.closed_deals.to_string())
        .kv("Overdue deals", &metrics.overdue_deals.to_string())
        .kv("Active persons", &metrics.active_persons.to_string());

    layout.blank().section("Deals by status");
    for (status, count) in &metrics.deals_by_status {
        layout.kv(status, &count.to_string());
    }
    layout
}
