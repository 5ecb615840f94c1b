//! Per-deal records produced by sales conversations and the AI agents.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SbError;

/// What the sales team learned talking to the customer. At most one per deal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationData {
    pub deal_id: i64,
    pub customer_requirements: Option<String>,
    pub business_goals: Option<String>,
    pub pain_points: Option<String>,
    pub current_solutions: Option<String>,
    pub tech_preferences: Option<String>,
    pub integration_needs: Option<String>,
    pub compliance_requirements: Option<String>,
    pub project_timeline: Option<String>,
    pub urgency_level: Option<String>,
    pub team_size: Option<String>,
    pub decision_makers: Option<String>,
    pub sales_notes: Option<String>,
    pub communication_channel: Option<String>,
    pub last_conversation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSolution {
    pub deal_id: i64,
    pub solution_summary: Option<String>,
    pub architecture_overview: Option<String>,
    pub recommended_tech_stack: Value,
    pub integration_approach: Value,
    pub development_phases: Value,
    pub complexity_score: Option<f64>,
    pub ai_confidence_score: Option<f64>,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub reviewed_by_human: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub deal_id: i64,
    pub team_composition: Value,
    pub resource_timeline: Option<String>,
    pub milestone_breakdown: Value,
    pub development_cost: Option<f64>,
    pub total_estimated_cost: Option<f64>,
    pub skill_gaps: Value,
    pub ai_confidence_score: Option<f64>,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Sent,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "review" => Ok(Self::Review),
            "approved" => Ok(Self::Approved),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(SbError::ValidationFailed(format!("invalid proposal status {other}"))),
        }
    }
}

sql_text_enum!(ProposalStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub deal_id: i64,
    pub executive_summary: Option<String>,
    pub solution_overview: Option<String>,
    pub business_value: Option<String>,
    pub cost_breakdown: Option<String>,
    pub risk_mitigation: Option<String>,
    pub proposal_status: ProposalStatus,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInsight {
    pub id: i64,
    pub deal_id: i64,
    pub insight_type: String,
    pub title: String,
    pub description: Option<String>,
    pub recommendations: Value,
    pub confidence_score: Option<f64>,
    pub triggered_by_status: Option<String>,
    pub relevant_data_points: Value,
    pub suggested_actions: Value,
    pub generated_at: DateTime<Utc>,
    pub ai_model_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
    pub deal_id: i64,
    pub insight_type: String,
    pub title: String,
    pub description: Option<String>,
    pub recommendations: Value,
    pub confidence_score: Option<f64>,
    pub triggered_by_status: Option<String>,
    pub relevant_data_points: Value,
    pub suggested_actions: Value,
    pub ai_model_version: Option<String>,
}

impl NewInsight {
    /// Insight with empty JSON payloads; callers fill what they have.
    #[must_use]
    pub fn new(deal_id: i64, insight_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            deal_id,
            insight_type: insight_type.into(),
            title: title.into(),
            description: None,
            recommendations: Value::Array(Vec::new()),
            confidence_score: None,
            triggered_by_status: None,
            relevant_data_points: Value::Object(serde_json::Map::new()),
            suggested_actions: Value::Array(Vec::new()),
            ai_model_version: None,
        }
    }
}
