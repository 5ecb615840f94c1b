//! BANT-style lead qualification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::json::{list, score, text};
use crate::agents::{Agent, AgentInput, AgentKind, FALLBACK_CONFIDENCE, positive, present};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualificationLevel {
    Cold,
    Warm,
    Hot,
    Qualified,
}

impl QualificationLevel {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 76.0 {
            Self::Qualified
        } else if score >= 51.0 {
            Self::Hot
        } else if score >= 26.0 {
            Self::Warm
        } else {
            Self::Cold
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Warm => "Warm",
            Self::Hot => "Hot",
            Self::Qualified => "Qualified",
        }
    }

    fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Cold" => Some(Self::Cold),
            "Warm" => Some(Self::Warm),
            "Hot" => Some(Self::Hot),
            "Qualified" => Some(Self::Qualified),
            _ => None,
        }
    }
}

impl std::fmt::Display for QualificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadQualification {
    pub qualification_score: f64,
    pub qualification_level: QualificationLevel,
    pub missing_information: Vec<String>,
    pub suggested_questions: Vec<String>,
    pub next_steps: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

/// Qualification criteria, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Criterion {
    Budget,
    Authority,
    Need,
    Timeline,
    Fit,
}

impl Criterion {
    const fn label(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Authority => "authority",
            Self::Need => "need",
            Self::Timeline => "timeline",
            Self::Fit => "fit",
        }
    }

    const fn question(self) -> &'static str {
        match self {
            Self::Budget => "What budget range have you allocated for this project?",
            Self::Authority => "Who has the authority to approve this investment?",
            Self::Need => "What specific challenges are you trying to solve?",
            Self::Timeline => "When do you need this solution implemented?",
            Self::Fit => "Do you have any specific technology preferences?",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LeadQualificationAgent;

impl LeadQualificationAgent {
    fn has_budget(input: &AgentInput) -> bool {
        let customer = &input.customer;
        (positive(customer.budget_min) && positive(customer.budget_max))
            || positive(customer.estimated_value)
    }

    fn has_authority(input: &AgentInput) -> bool {
        present(input.conversation.decision_makers.as_ref())
            || present(input.customer.decision_maker_role.as_ref())
    }

    fn has_stated_need(input: &AgentInput) -> bool {
        let conv = &input.conversation;
        present(conv.goals.as_ref()) || present(conv.pain_points.as_ref())
    }

    fn has_timeline(input: &AgentInput) -> bool {
        let conv = &input.conversation;
        present(conv.timeline.as_ref()) || present(conv.urgency.as_ref())
    }

    fn has_fit(input: &AgentInput) -> bool {
        let conv = &input.conversation;
        present(conv.tech_preferences.as_ref()) || present(conv.team_size.as_ref())
    }

    fn score(input: &AgentInput) -> f64 {
        let mut score = 0.0;
        if Self::has_budget(input) {
            score += 25.0;
        }
        if Self::has_authority(input) {
            score += 20.0;
        }
        // Requirements count towards need, but alone don't clear the "missing" flag.
        if Self::has_stated_need(input) || present(input.conversation.requirements.as_ref()) {
            score += 25.0;
        }
        if Self::has_timeline(input) {
            score += 15.0;
        }
        if Self::has_fit(input) {
            score += 15.0;
        }
        score
    }

    fn missing(input: &AgentInput) -> Vec<Criterion> {
        [
            (Criterion::Budget, Self::has_budget(input)),
            (Criterion::Authority, Self::has_authority(input)),
            (Criterion::Need, Self::has_stated_need(input)),
            (Criterion::Timeline, Self::has_timeline(input)),
            (Criterion::Fit, Self::has_fit(input)),
        ]
        .into_iter()
        .filter_map(|(criterion, met)| (!met).then_some(criterion))
        .collect()
    }

    fn next_steps(score: f64, missing: &[Criterion]) -> Vec<String> {
        let mut steps = Vec::new();
        if missing.contains(&Criterion::Budget) {
            steps.push("Budget Discussion");
        }
        if missing.contains(&Criterion::Authority) {
            steps.push("Stakeholder Meeting");
        }
        if score >= 50.0 {
            steps.push("Technical Demo");
        }
        if score >= 75.0 {
            steps.push("Proposal Preparation");
        }
        steps.into_iter().take(3).map(String::from).collect()
    }

    fn recommendations(score: f64, missing: &[Criterion]) -> Vec<String> {
        let mut recs = if score < 40.0 {
            vec![
                "Focus on discovery and qualification before moving forward",
                "Schedule comprehensive discovery call",
            ]
        } else if score >= 60.0 {
            vec![
                "Well-qualified lead - move to solution presentation",
                "Prepare customized demo",
            ]
        } else {
            vec![
                "Continue qualification process",
                "Address missing information areas",
            ]
        };
        if missing.contains(&Criterion::Budget) {
            recs.push("Priority: Establish budget and financial authority");
        }
        if missing.contains(&Criterion::Authority) {
            recs.push("Priority: Identify key decision-makers");
        }
        if missing.contains(&Criterion::Need) {
            recs.push("Priority: Understand business requirements");
        }
        recs.into_iter().take(4).map(String::from).collect()
    }
}

impl Agent for LeadQualificationAgent {
    type Output = LeadQualification;

    fn kind(&self) -> AgentKind {
        AgentKind::LeadQualification
    }

    fn system_prompt(&self) -> &'static str {
        "You are a senior B2B sales analyst qualifying leads with the BANT framework \
         (budget, authority, need, timeline) plus technical fit. Respond with a single JSON \
         object with the fields: qualification_score (0-100), qualification_level \
         (Cold, Warm, Hot or Qualified), missing_information (array of strings), \
         suggested_questions (array), next_steps (array), recommendations (array), \
         confidence (0-100)."
    }

    fn build_prompt(&self, input: &AgentInput) -> String {
        format!(
            "Qualify this sales lead.\n\n{}\nScore each BANT area, list what is still unknown, \
             and suggest up to five discovery questions.",
            input.key_data()
        )
    }

    fn temperature(&self) -> f32 {
        0.3
    }

    fn max_tokens(&self) -> u32 {
        2000
    }

    fn standardize(&self, raw: &Value) -> LeadQualification {
        let qualification_score = score(raw, "qualification_score", 0.0);
        let qualification_level = QualificationLevel::parse(&text(raw, "qualification_level", ""))
            .unwrap_or_else(|| QualificationLevel::from_score(qualification_score));
        LeadQualification {
            qualification_score,
            qualification_level,
            missing_information: list(raw, "missing_information"),
            suggested_questions: list(raw, "suggested_questions"),
            next_steps: list(raw, "next_steps"),
            recommendations: list(raw, "recommendations"),
            confidence: score(raw, "confidence", 50.0),
        }
    }

    fn fallback(&self, input: &AgentInput) -> LeadQualification {
        let qualification_score = Self::score(input);
        let missing = Self::missing(input);
        LeadQualification {
            qualification_score,
            qualification_level: QualificationLevel::from_score(qualification_score),
            missing_information: missing.iter().map(|c| c.label().to_string()).collect(),
            suggested_questions: missing
                .iter()
                .take(3)
                .map(|c| c.question().to_string())
                .collect(),
            next_steps: Self::next_steps(qualification_score, &missing),
            recommendations: Self::recommendations(qualification_score, &missing),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}
