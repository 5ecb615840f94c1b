//! Deal analyses backed by a chat model, with rule-based fallbacks.
//!
//! Each stage of the pipeline has one agent:
//! - [`LeadQualificationAgent`] for `lead`
//! - [`SolutionDesignAgent`] for `qualified_solution`
//! - [`DeliveryPlanningAgent`] for `qualified_delivery`
//! - [`ProposalAgent`] for `qualified_cso`
//!
//! [`Agents`] runs any of them: prompt the model, pull the JSON object out of
//! the reply, standardize it. When the model is unavailable or replies with
//! something unusable, the agent's rule table answers instead.

pub mod defaults;
pub mod delivery;
pub mod json;
pub mod llm;
pub mod proposal;
pub mod qualification;
pub mod solution;

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Result, SbError};

pub use delivery::{BudgetEstimate, DeliveryPlan, DeliveryPlanningAgent, ProjectPhase, TeamMember};
pub use json::extract_json;
pub use llm::{ChatClient, OpenAiClient};
pub use proposal::{CommercialTerms, ProposalAgent, ProposalAnalysis, ProposalSection, RiskAssessment};
pub use qualification::{LeadQualification, LeadQualificationAgent, QualificationLevel};
pub use solution::{SolutionDesign, SolutionDesignAgent};

/// Confidence reported by every rule-based fallback.
pub const FALLBACK_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    LeadQualification,
    SolutionDesign,
    DeliveryPlanning,
    ProposalGeneration,
}

impl AgentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeadQualification => "lead_qualification",
            Self::SolutionDesign => "solution_design",
            Self::DeliveryPlanning => "delivery_planning",
            Self::ProposalGeneration => "proposal_generation",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the CRM knows about the customer behind a deal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    pub id: i64,
    pub industry: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub estimated_value: Option<f64>,
    pub decision_maker_role: Option<String>,
}

/// Conversation notes, flattened for the agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationProfile {
    pub requirements: Option<String>,
    pub goals: Option<String>,
    pub pain_points: Option<String>,
    pub tech_preferences: Option<String>,
    pub integration_needs: Option<String>,
    pub timeline: Option<String>,
    pub urgency: Option<String>,
    pub decision_makers: Option<String>,
    pub team_size: Option<String>,
    pub sales_notes: Option<String>,
}

impl ConversationProfile {
    /// Lowercased field text; missing fields are empty.
    pub(crate) fn lower(field: Option<&String>) -> String {
        field.map(|value| value.to_lowercase()).unwrap_or_default()
    }

    pub(crate) fn urgency_lower(&self) -> String {
        Self::lower(self.urgency.as_ref())
    }
}

/// Everything an agent may look at. Later stages also see earlier outputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentInput {
    pub customer: CustomerProfile,
    pub conversation: ConversationProfile,
    pub solution: Option<SolutionDesign>,
    pub delivery: Option<DeliveryPlan>,
}

/// True when the field holds non-blank text.
pub(crate) fn present(field: Option<&String>) -> bool {
    field.is_some_and(|value| !value.trim().is_empty())
}

/// True when the amount is set and non-zero.
pub(crate) fn positive(amount: Option<f64>) -> bool {
    amount.is_some_and(|value| value > 0.0)
}

impl AgentInput {
    /// "KEY DATA:" block listing every populated field.
    #[must_use]
    pub fn key_data(&self) -> String {
        let mut out = String::from("KEY DATA:\n");
        let mut line = |label: &str, value: &dyn std::fmt::Display| {
            let _ = writeln!(out, "- {label}: {value}");
        };

        let customer = &self.customer;
        line("Deal ID", &customer.id);
        let texts = [
            ("Industry", customer.industry.as_ref()),
            ("Decision Maker Role", customer.decision_maker_role.as_ref()),
        ];
        for (label, value) in texts {
            if let Some(value) = value.filter(|v| present(Some(*v))) {
                line(label, value);
            }
        }
        let amounts = [
            ("Budget Min", customer.budget_min),
            ("Budget Max", customer.budget_max),
            ("Estimated Value", customer.estimated_value),
        ];
        for (label, value) in amounts {
            if let Some(value) = value.filter(|v| *v > 0.0) {
                line(label, &value);
            }
        }

        let conv = &self.conversation;
        let fields = [
            ("Requirements", conv.requirements.as_ref()),
            ("Business Goals", conv.goals.as_ref()),
            ("Pain Points", conv.pain_points.as_ref()),
            ("Tech Preferences", conv.tech_preferences.as_ref()),
            ("Integration Needs", conv.integration_needs.as_ref()),
            ("Timeline", conv.timeline.as_ref()),
            ("Urgency", conv.urgency.as_ref()),
            ("Decision Makers", conv.decision_makers.as_ref()),
            ("Team Size", conv.team_size.as_ref()),
            ("Sales Notes", conv.sales_notes.as_ref()),
        ];
        for (label, value) in fields {
            if let Some(value) = value.filter(|v| present(Some(*v))) {
                line(label, value);
            }
        }

        if let Some(solution) = &self.solution {
            line("Solution Type", &solution.solution_type);
            line("Solution Score", &solution.solution_score);
            if !solution.implementation_phases.is_empty() {
                line("Implementation Phases", &solution.implementation_phases.join(", "));
            }
        }
        if let Some(delivery) = &self.delivery {
            line("Delivery Approach", &delivery.delivery_approach);
            line("Resource Timeline", &delivery.resource_timeline);
            line("Total Estimate", &delivery.budget_estimate.total_estimate);
        }
        out
    }
}

/// One analysis stage: how to prompt for it, and how to answer without a model.
pub trait Agent {
    type Output: Clone + Serialize;

    fn kind(&self) -> AgentKind;
    fn system_prompt(&self) -> &'static str;
    fn build_prompt(&self, input: &AgentInput) -> String;
    fn temperature(&self) -> f32;
    fn max_tokens(&self) -> u32;

    /// Coerce a parsed model reply into the output, filling defaults and clamping scores.
    fn standardize(&self, raw: &Value) -> Self::Output;

    /// Rule-table answer used when the model can't be.
    fn fallback(&self, input: &AgentInput) -> Self::Output;
}

/// Agent runner shared by the REST layer and the CLI.
#[derive(Clone)]
pub struct Agents {
    client: Option<Arc<dyn ChatClient>>,
    fallback_enabled: bool,
}

impl std::fmt::Debug for Agents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agents")
            .field("has_client", &self.client.is_some())
            .field("fallback_enabled", &self.fallback_enabled)
            .finish()
    }
}

impl Agents {
    #[must_use]
    pub fn new(client: Option<Arc<dyn ChatClient>>, fallback_enabled: bool) -> Self {
        Self {
            client,
            fallback_enabled,
        }
    }

    /// Rule tables only; never touches the network.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(None, true)
    }

    /// Build from config. The chat client is only created when `llm.enabled` is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Option<Arc<dyn ChatClient>> = if config.llm.enabled {
            Some(Arc::new(OpenAiClient::from_config(&config.llm)?))
        } else {
            None
        };
        Ok(Self::new(client, config.agents.fallback_enabled))
    }

    #[must_use]
    pub const fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    #[must_use]
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn run<A: Agent>(&self, agent: &A, input: &AgentInput) -> Result<A::Output> {
        let kind = agent.kind();
        let Some(client) = &self.client else {
            if self.fallback_enabled {
                tracing::debug!(agent = %kind, "no chat client configured, using rule-based analysis");
                return Ok(agent.fallback(input));
            }
            return Err(SbError::MissingConfig("llm.api_key".to_string()));
        };

        let prompt = agent.build_prompt(input);
        let attempt = client
            .complete(
                agent.system_prompt(),
                &prompt,
                agent.temperature(),
                agent.max_tokens(),
            )
            .and_then(|reply| extract_json(&reply))
            .map(|raw| agent.standardize(&raw));

        match attempt {
            Ok(output) => {
                tracing::debug!(agent = %kind, deal_id = input.customer.id, "model analysis parsed");
                Ok(output)
            }
            Err(err) if self.fallback_enabled => {
                tracing::warn!(
                    agent = %kind,
                    deal_id = input.customer.id,
                    error = %err,
                    "model analysis failed, using rule-based analysis"
                );
                Ok(agent.fallback(input))
            }
            Err(err) => Err(err),
        }
    }

    pub fn qualify_lead(&self, input: &AgentInput) -> Result<LeadQualification> {
        self.run(&LeadQualificationAgent, input)
    }

    pub fn design_solution(&self, input: &AgentInput) -> Result<SolutionDesign> {
        self.run(&SolutionDesignAgent, input)
    }

    pub fn plan_delivery(&self, input: &AgentInput) -> Result<DeliveryPlan> {
        self.run(&DeliveryPlanningAgent, input)
    }

    pub fn generate_proposal(&self, input: &AgentInput) -> Result<ProposalAnalysis> {
        self.run(&ProposalAgent, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<Vec<Result<String>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Arc<dyn ChatClient> {
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    impl ChatClient for Scripted {
        fn complete(&self, _: &str, _: &str, _: f32, _: u32) -> Result<String> {
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn input() -> AgentInput {
        AgentInput {
            customer: CustomerProfile {
                id: 7,
                budget_min: Some(50_000.0),
                budget_max: Some(80_000.0),
                ..CustomerProfile::default()
            },
            conversation: ConversationProfile {
                goals: Some("Grow online sales".into()),
                ..ConversationProfile::default()
            },
            ..AgentInput::default()
        }
    }

    #[test]
    fn no_client_uses_fallback() {
        let result = Agents::offline().qualify_lead(&input()).unwrap();
        assert!((result.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn no_client_without_fallback_is_missing_config() {
        let agents = Agents::new(None, false);
        assert!(matches!(
            agents.qualify_lead(&input()),
            Err(SbError::MissingConfig(_))
        ));
    }

    #[test]
    fn model_reply_is_standardized() {
        let client = Scripted::new(vec![Ok(
            "Analysis follows {\"qualification_score\": 130, \"qualification_level\": \"Lukewarm\", \"confidence\": 88}".into(),
        )]);
        let result = Agents::new(Some(client), false).qualify_lead(&input()).unwrap();
        assert!((result.qualification_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.qualification_level, QualificationLevel::Qualified);
        assert!((result.confidence - 88.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_reply_falls_back_or_errors() {
        let reply = || Ok::<_, SbError>("I cannot help with that".to_string());
        let with_fallback = Agents::new(Some(Scripted::new(vec![reply()])), true);
        let result = with_fallback.design_solution(&input()).unwrap();
        assert!((result.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);

        let strict = Agents::new(Some(Scripted::new(vec![reply()])), false);
        assert!(matches!(
            strict.design_solution(&input()),
            Err(SbError::AgentParse(_))
        ));
    }

    #[test]
    fn client_error_falls_back() {
        let client = Scripted::new(vec![Err(SbError::Llm("HTTP 500".into()))]);
        let plan = Agents::new(Some(client), true).plan_delivery(&input()).unwrap();
        assert!(!plan.team_composition.is_empty());
    }

    #[test]
    fn key_data_lists_only_populated_fields() {
        let text = input().key_data();
        assert!(text.starts_with("KEY DATA:\n"));
        assert!(text.contains("- Budget Min: 50000"));
        assert!(text.contains("- Business Goals: Grow online sales"));
        assert!(!text.contains("Pain Points"));
        assert!(!text.contains("Industry"));
    }
}
