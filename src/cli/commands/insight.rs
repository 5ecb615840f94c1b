//! sprintboard insight - run the analysis agent for a deal

use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::insights::{self, InsightOutcome};
use crate::model::DealStatus;

#[derive(Args, Debug)]
pub struct InsightArgs {
    pub deal_id: i64,

    /// Run the agent for this column instead of the deal's current one
    #[arg(long)]
    pub status: Option<String>,
}

pub fn run(ctx: &AppContext, args: &InsightArgs) -> Result<()> {
    let db = ctx.open_database()?;
    let agents = ctx.agents()?;
    let status = args.status.as_deref().map(DealStatus::parse).transpose()?;
    let outcome = insights::generate_insight(&db, &agents, args.deal_id, status, Utc::now())?;

    if ctx.robot_mode {
        return output::emit_json(&outcome);
    }
    output::emit_human(&render(&outcome));
    Ok(())
}

fn render(outcome: &InsightOutcome) -> HumanLayout {
    let mut layout = HumanLayout::new();
    match outcome {
        InsightOutcome::Qualification(q) => {
            layout.title(&format!("Lead qualification for deal #{}", q.deal_id));
            layout
                .kv("Score", &format!("{:.0}", q.qualification_score))
                .kv("Level", q.qualification_level.as_str())
                .kv("Confidence", &format!("{:.0}%", q.confidence));
            if !q.missing_information.is_empty() {
                layout.blank().section("Missing information");
                for item in &q.missing_information {
                    layout.bullet(item);
                }
            }
            if !q.next_steps.is_empty() {
                layout.blank().section("Next steps");
                for step in &q.next_steps {
                    layout.bullet(step);
                }
            }
        }
        InsightOutcome::Solution(s) => {
            layout.title(&format!("Solution design for deal #{}", s.deal_id));
            layout
                .kv("Score", &format!("{:.0}", s.solution_score))
                .kv("Type", &s.solution_type)
                .kv("Architecture", &s.architecture)
                .kv("Timeline", &s.timeline)
                .kv("Confidence", &format!("{:.0}%", s.confidence));
        }
        InsightOutcome::Delivery(d) => {
            layout.title(&format!("Delivery plan for deal #{}", d.deal_id));
            layout
                .kv("Score", &format!("{:.0}", d.delivery_score))
                .kv("Approach", &d.delivery_approach)
                .kv("Timeline", &d.timeline)
                .kv("Budget", &d.budget_estimate.total_estimate)
                .kv("Confidence", &format!("{:.0}%", d.confidence));
            if !d.team_composition.is_empty() {
                layout.blank().section("Team");
                for member in &d.team_composition {
                    layout.bullet(&member.role);
                }
            }
        }
        InsightOutcome::Proposal(p) => {
            layout.title(&format!("Proposal for deal #{}", p.deal_id));
            layout
                .kv("Score", &format!("{:.0}", p.proposal_score))
                .kv("Pricing model", &p.pricing_model)
                .kv("Confidence", &format!("{:.0}%", p.confidence));
            if !p.value_proposition.is_empty() {
                layout.blank().section("Value proposition");
                for point in &p.value_proposition {
                    layout.bullet(point);
                }
            }
        }
        InsightOutcome::Unavailable(message) => {
            layout.title(&message.message);
        }
    }
    layout
}
