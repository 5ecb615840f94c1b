//! sprintboard train - fit the lifecycle models

use colored::Colorize;
use parking_lot::RwLock;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::lifecycle::{self, ModelSet};

pub fn run(ctx: &AppContext) -> Result<()> {
    let db = ctx.open_database()?;
    let models = RwLock::new(ModelSet::new(&ctx.config.analytics));
    let report = lifecycle::train_models(&db, &models, &ctx.config.analytics)?;

    if ctx.robot_mode {
        return output::emit_json(&report);
    }

    let mark = |trained: bool| {
        if trained {
            "trained".green().to_string()
        } else {
            "not enough data".yellow().to_string()
        }
    };
    let status = &report.models_status;
    let mut layout = HumanLayout::new();
    layout.title(&format!("{} ({} rows)", report.message, report.rows));
    layout
        .kv("Churn predictor", &mark(status.churn_predictor))
        .kv("Revenue forecaster", &mark(status.revenue_forecaster))
        .kv("Lead scorer", &mark(status.lead_scorer))
        .kv("CLV calculator", &mark(status.clv_calculator));
    if let Some(accuracy) = report.churn_accuracy {
        layout.kv("Churn accuracy", &format!("{:.1}%", accuracy * 100.0));
    }
    output::emit_human(&layout);
    Ok(())
}
