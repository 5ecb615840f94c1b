//! Run the stage agent for a deal and persist what it produced.
//!
//! Each qualified column has one agent. Its output is stored twice: as the
//! per-deal artifact the next stage reads (technical solution, resource
//! allocation, proposal) and as an [`AiInsight`](crate::model::AiInsight) row
//! for the deal's history.
//!
//! Stages take any [`DbAccess`] and lock only to load the agent input and to
//! persist the result; the agent call itself runs unlocked.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::agents::json::{as_list, as_records};
use crate::agents::proposal::dollars;
use crate::agents::solution::{TechStack, ensure_stack_keys};
use crate::agents::{
    AgentInput, Agents, BudgetEstimate, ConversationProfile, CustomerProfile, DeliveryPlan,
    ProposalAnalysis, QualificationLevel, SolutionDesign, TeamMember, defaults,
};
use crate::agents::delivery::TO_BE_DETERMINED;
use crate::error::Result;
use crate::model::{
    ConversationData, Deal, DealStatus, NewInsight, Proposal, ProposalStatus, ResourceAllocation,
    TechnicalSolution,
};
use crate::sprint::{Message, parse_budget};
use crate::storage::{Database, DbAccess};

#[derive(Debug, Clone, Serialize)]
pub struct QualificationInsight {
    pub deal_id: i64,
    pub qualification_score: f64,
    pub qualification_level: QualificationLevel,
    pub missing_information: Vec<String>,
    pub suggested_questions: Vec<String>,
    pub next_steps: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionInsight {
    pub deal_id: i64,
    pub message: String,
    pub solution_score: f64,
    pub solution_type: String,
    pub architecture: String,
    pub technology_stack: TechStack,
    pub timeline: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryInsight {
    pub deal_id: i64,
    pub message: String,
    pub delivery_score: f64,
    pub delivery_approach: String,
    pub team_composition: Vec<TeamMember>,
    pub timeline: String,
    pub budget_estimate: BudgetEstimate,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalInsight {
    pub deal_id: i64,
    pub message: String,
    pub proposal_score: f64,
    pub pricing_model: String,
    pub commercial_terms: crate::agents::CommercialTerms,
    pub value_proposition: Vec<String>,
    pub confidence: f64,
}

/// Response body of an insight request; the shape depends on the stage.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InsightOutcome {
    Qualification(QualificationInsight),
    Solution(SolutionInsight),
    Delivery(DeliveryInsight),
    Proposal(ProposalInsight),
    Unavailable(Message),
}

/// Run the agent for `status`, or for the deal's current column when omitted.
pub fn generate_insight<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal_id: i64,
    status: Option<DealStatus>,
    now: DateTime<Utc>,
) -> Result<InsightOutcome> {
    let deal = db.with_db(|db| db.require_deal(deal_id))?;
    let status = status.unwrap_or(deal.status);
    tracing::info!(deal_id, %status, "generating insight");

    Ok(match status {
        DealStatus::Lead => InsightOutcome::Qualification(run_qualification(db, agents, &deal, now)?),
        DealStatus::QualifiedSolution => {
            InsightOutcome::Solution(run_solution(db, agents, &deal, now)?)
        }
        DealStatus::QualifiedDelivery => {
            InsightOutcome::Delivery(run_delivery(db, agents, &deal, now)?)
        }
        DealStatus::QualifiedCso => InsightOutcome::Proposal(run_proposal(db, agents, &deal, now)?),
        DealStatus::Deal | DealStatus::Project => InsightOutcome::Unavailable(Message::new(
            format!("No AI insights available for status: {status}"),
        )),
    })
}

/// Lead qualification regardless of the deal's column.
pub fn qualify<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal_id: i64,
    now: DateTime<Utc>,
) -> Result<QualificationInsight> {
    let deal = db.with_db(|db| db.require_deal(deal_id))?;
    run_qualification(db, agents, &deal, now)
}

fn agent_input(db: &Database, deal: &Deal) -> Result<AgentInput> {
    let conversation = db.get_conversation(deal.id)?;
    let conversation = conversation.as_ref();
    Ok(AgentInput {
        customer: CustomerProfile {
            id: deal.id,
            industry: deal.customer_name.clone(),
            budget_min: deal.budget_range_min,
            budget_max: deal.budget_range_max,
            estimated_value: deal.estimated_value,
            decision_maker_role: conversation.and_then(|c| c.decision_makers.clone()),
        },
        conversation: conversation.map(profile).unwrap_or_default(),
        solution: None,
        delivery: None,
    })
}

fn profile(data: &ConversationData) -> ConversationProfile {
    ConversationProfile {
        requirements: data.customer_requirements.clone(),
        goals: data.business_goals.clone(),
        pain_points: data.pain_points.clone(),
        tech_preferences: data.tech_preferences.clone(),
        integration_needs: data.integration_needs.clone(),
        timeline: data.project_timeline.clone(),
        urgency: data.urgency_level.clone(),
        decision_makers: data.decision_makers.clone(),
        team_size: data.team_size.clone(),
        sales_notes: data.sales_notes.clone(),
    }
}

/// The stored solution as the delivery and proposal agents see it.
fn stored_solution(solution: &TechnicalSolution) -> SolutionDesign {
    let mut technology_stack: TechStack =
        serde_json::from_value(solution.recommended_tech_stack.clone()).unwrap_or_default();
    ensure_stack_keys(&mut technology_stack);
    SolutionDesign {
        solution_score: solution.complexity_score.unwrap_or(0.0),
        solution_type: solution
            .solution_summary
            .clone()
            .unwrap_or_else(|| "Custom Software".to_string()),
        recommended_architecture: solution.architecture_overview.clone().unwrap_or_default(),
        technology_stack,
        integration_requirements: as_list(&solution.integration_approach),
        implementation_phases: as_list(&solution.development_phases),
        estimated_timeline: String::new(),
        complexity_factors: Vec::new(),
        risk_factors: Vec::new(),
        recommendations: Vec::new(),
        confidence: solution.ai_confidence_score.unwrap_or(0.0),
    }
}

/// The stored allocation as the proposal agent sees it. The approach and
/// score aren't stored, so the plan reads as an unscored Agile plan.
fn stored_delivery(allocation: &ResourceAllocation) -> DeliveryPlan {
    let amount = |cost: Option<f64>| {
        cost.filter(|v| *v > 0.0)
            .map_or_else(|| TO_BE_DETERMINED.to_string(), dollars)
    };
    DeliveryPlan {
        delivery_score: 0.0,
        delivery_approach: "Agile".to_string(),
        team_composition: as_records(&allocation.team_composition),
        project_phases: as_records(&allocation.milestone_breakdown),
        resource_timeline: allocation.resource_timeline.clone().unwrap_or_default(),
        budget_estimate: BudgetEstimate {
            development_cost: amount(allocation.development_cost),
            total_estimate: amount(allocation.total_estimated_cost),
            ..BudgetEstimate::default()
        },
        risk_mitigation: as_list(&allocation.skill_gaps),
        quality_assurance: Vec::new(),
        recommendations: Vec::new(),
        confidence: allocation.ai_confidence_score.unwrap_or(0.0),
    }
}

fn insight(
    deal_id: i64,
    kind: &str,
    title: &str,
    description: String,
    status: DealStatus,
) -> NewInsight {
    let mut insight = NewInsight::new(deal_id, kind, title);
    insight.description = Some(description);
    insight.triggered_by_status = Some(status.to_string());
    insight.ai_model_version = Some(format!("{kind}_v1.0"));
    insight
}

fn run_qualification<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal: &Deal,
    now: DateTime<Utc>,
) -> Result<QualificationInsight> {
    let input = db.with_db(|db| agent_input(db, deal))?;
    let analysis = agents.qualify_lead(&input).unwrap_or_else(|err| {
        tracing::warn!(deal_id = deal.id, error = %err, "lead qualification failed, using defaults");
        defaults::qualification()
    });

    let mut row = insight(
        deal.id,
        "lead_qualification",
        "Lead Qualification Analysis",
        format!(
            "Qualification Score: {:.1}% - {}",
            analysis.qualification_score, analysis.qualification_level
        ),
        DealStatus::Lead,
    );
    row.recommendations = json!(analysis.recommendations);
    row.confidence_score = Some(analysis.confidence);
    row.relevant_data_points = json!(analysis.missing_information);
    row.suggested_actions = json!(analysis.next_steps);
    db.with_db(|db| db.insert_insight(&row, now))?;

    let mut suggested_questions = analysis.suggested_questions;
    suggested_questions.truncate(5);
    Ok(QualificationInsight {
        deal_id: deal.id,
        qualification_score: analysis.qualification_score,
        qualification_level: analysis.qualification_level,
        missing_information: analysis.missing_information,
        suggested_questions,
        next_steps: analysis.next_steps,
        confidence: analysis.confidence,
    })
}

fn run_solution<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal: &Deal,
    now: DateTime<Utc>,
) -> Result<SolutionInsight> {
    let input = db.with_db(|db| agent_input(db, deal))?;
    let analysis = agents.design_solution(&input).unwrap_or_else(|err| {
        tracing::warn!(deal_id = deal.id, error = %err, "solution design failed, using defaults");
        defaults::solution()
    });

    let solution = TechnicalSolution {
        deal_id: deal.id,
        solution_summary: Some(analysis.solution_type.clone()),
        architecture_overview: Some(analysis.recommended_architecture.clone()),
        recommended_tech_stack: serde_json::to_value(&analysis.technology_stack)?,
        integration_approach: json!(analysis.integration_requirements),
        development_phases: json!(analysis.implementation_phases),
        complexity_score: Some(analysis.solution_score),
        ai_confidence_score: Some(analysis.confidence),
        generated_by: "solution_design".to_string(),
        generated_at: now,
        reviewed_by_human: false,
    };

    let mut row = insight(
        deal.id,
        "solution_design",
        "Technical Solution Design",
        format!(
            "Solution Score: {:.1}% - {}",
            analysis.solution_score, analysis.solution_type
        ),
        DealStatus::QualifiedSolution,
    );
    row.recommendations = json!(analysis.recommendations);
    row.confidence_score = Some(analysis.confidence);
    row.relevant_data_points = json!(analysis.complexity_factors);
    row.suggested_actions = json!(analysis.implementation_phases);
    db.with_db(|db| {
        let tx = db.transaction()?;
        db.upsert_technical_solution(&solution)?;
        db.insert_insight(&row, now)?;
        tx.commit()?;
        Ok(())
    })?;

    Ok(SolutionInsight {
        deal_id: deal.id,
        message: "Solution design analysis completed".to_string(),
        solution_score: analysis.solution_score,
        solution_type: analysis.solution_type,
        architecture: analysis.recommended_architecture,
        technology_stack: analysis.technology_stack,
        timeline: analysis.estimated_timeline,
        confidence: analysis.confidence,
    })
}

fn run_delivery<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal: &Deal,
    now: DateTime<Utc>,
) -> Result<DeliveryInsight> {
    let input = db.with_db(|db| {
        let mut input = agent_input(db, deal)?;
        input.solution = db.get_technical_solution(deal.id)?.as_ref().map(stored_solution);
        Ok(input)
    })?;
    let analysis = agents.plan_delivery(&input).unwrap_or_else(|err| {
        tracing::warn!(deal_id = deal.id, error = %err, "delivery planning failed, using defaults");
        defaults::delivery()
    });

    let allocation = ResourceAllocation {
        deal_id: deal.id,
        team_composition: serde_json::to_value(&analysis.team_composition)?,
        resource_timeline: Some(analysis.resource_timeline.clone()),
        milestone_breakdown: serde_json::to_value(&analysis.project_phases)?,
        development_cost: Some(parse_budget(&analysis.budget_estimate.development_cost)),
        total_estimated_cost: Some(parse_budget(&analysis.budget_estimate.total_estimate)),
        skill_gaps: json!(analysis.risk_mitigation),
        ai_confidence_score: Some(analysis.confidence),
        generated_by: "delivery_planning".to_string(),
        generated_at: now,
    };

    let mut row = insight(
        deal.id,
        "delivery_planning",
        "Delivery Planning Analysis",
        format!(
            "Delivery Score: {:.1}% - {}",
            analysis.delivery_score, analysis.delivery_approach
        ),
        DealStatus::QualifiedDelivery,
    );
    row.recommendations = json!(analysis.recommendations);
    row.confidence_score = Some(analysis.confidence);
    row.relevant_data_points = json!(analysis.risk_mitigation);
    row.suggested_actions = json!(analysis.quality_assurance);
    db.with_db(|db| {
        let tx = db.transaction()?;
        db.upsert_resource_allocation(&allocation)?;
        db.insert_insight(&row, now)?;
        tx.commit()?;
        Ok(())
    })?;

    Ok(DeliveryInsight {
        deal_id: deal.id,
        message: "Delivery planning analysis completed".to_string(),
        delivery_score: analysis.delivery_score,
        delivery_approach: analysis.delivery_approach,
        team_composition: analysis.team_composition,
        timeline: analysis.resource_timeline,
        budget_estimate: analysis.budget_estimate,
        confidence: analysis.confidence,
    })
}

fn run_proposal<D: DbAccess>(
    db: &D,
    agents: &Agents,
    deal: &Deal,
    now: DateTime<Utc>,
) -> Result<ProposalInsight> {
    let input = db.with_db(|db| {
        let mut input = agent_input(db, deal)?;
        input.solution = db.get_technical_solution(deal.id)?.as_ref().map(stored_solution);
        input.delivery = db.get_resource_allocation(deal.id)?.as_ref().map(stored_delivery);
        Ok(input)
    })?;
    let analysis: ProposalAnalysis = agents.generate_proposal(&input).unwrap_or_else(|err| {
        tracing::warn!(deal_id = deal.id, error = %err, "proposal generation failed, using defaults");
        defaults::proposal()
    });

    let encode = |value: Value| value.to_string();
    let mut proposal = Proposal {
        deal_id: deal.id,
        executive_summary: Some(format!(
            "Proposal Score: {:.1}% - {}",
            analysis.proposal_score, analysis.pricing_model
        )),
        solution_overview: Some(encode(json!(analysis.value_proposition))),
        business_value: Some(encode(json!(analysis.competitive_advantages))),
        cost_breakdown: Some(encode(serde_json::to_value(&analysis.commercial_terms)?)),
        risk_mitigation: Some(encode(serde_json::to_value(&analysis.risk_assessment)?)),
        proposal_status: ProposalStatus::Draft,
        generated_at: now,
    };

    let mut row = insight(
        deal.id,
        "proposal_generation",
        "Commercial Proposal Analysis",
        format!(
            "Proposal Score: {:.1}% - {}",
            analysis.proposal_score, analysis.pricing_model
        ),
        DealStatus::QualifiedCso,
    );
    row.recommendations = json!(analysis.recommendations);
    row.confidence_score = Some(analysis.confidence);
    row.relevant_data_points = json!(analysis.negotiation_strategy);
    row.suggested_actions = json!(analysis.success_metrics);
    db.with_db(|db| {
        let tx = db.transaction()?;
        if let Some(existing) = db.get_proposal(deal.id)? {
            proposal.proposal_status = existing.proposal_status;
        }
        db.upsert_proposal(&proposal)?;
        db.insert_insight(&row, now)?;
        tx.commit()?;
        Ok(())
    })?;

    Ok(ProposalInsight {
        deal_id: deal.id,
        message: "Commercial proposal analysis completed".to_string(),
        proposal_score: analysis.proposal_score,
        pricing_model: analysis.pricing_model,
        commercial_terms: analysis.commercial_terms,
        value_proposition: analysis.value_proposition,
        confidence: analysis.confidence,
    })
}
