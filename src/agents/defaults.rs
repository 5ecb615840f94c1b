//! Canned analyses returned when an agent fails outright.
//!
//! [`Agents::run`](crate::agents::Agents::run) already falls back to the rule
//! tables for model errors. These answers are the last resort for when the
//! runner itself returns an error, e.g. fallback disabled and no model.

use crate::agents::delivery::{BudgetEstimate, DeliveryPlan, ProjectPhase, TeamMember};
use crate::agents::proposal::{CommercialTerms, ProposalAnalysis, RiskAssessment, TIME_AND_MATERIALS};
use crate::agents::qualification::{LeadQualification, QualificationLevel};
use crate::agents::solution::{SolutionDesign, TechStack, ensure_stack_keys};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[must_use]
pub fn qualification() -> LeadQualification {
    LeadQualification {
        qualification_score: 70.0,
        qualification_level: QualificationLevel::Qualified,
        missing_information: strings(&["Budget confirmation", "Timeline details"]),
        suggested_questions: strings(&[
            "What is your budget range?",
            "When do you need this implemented?",
            "Who are the key decision makers?",
        ]),
        next_steps: strings(&["Schedule technical discussion", "Prepare proposal"]),
        recommendations: strings(&["Proceed with qualification", "Gather more requirements"]),
        confidence: 65.0,
    }
}

#[must_use]
pub fn solution() -> SolutionDesign {
    let mut technology_stack: TechStack = [
        ("frontend", "React"),
        ("backend", "Node.js"),
        ("database", "PostgreSQL"),
    ]
    .into_iter()
    .map(|(layer, tech)| (layer.to_string(), vec![tech.to_string()]))
    .collect();
    ensure_stack_keys(&mut technology_stack);

    SolutionDesign {
        solution_score: 85.0,
        solution_type: "Web Application".to_string(),
        recommended_architecture: "Microservices Architecture".to_string(),
        technology_stack,
        integration_requirements: strings(&["REST API", "Authentication"]),
        implementation_phases: strings(&["Setup", "Core Development", "Integration", "Testing"]),
        estimated_timeline: "3-4 months".to_string(),
        complexity_factors: strings(&["Database design", "API integration"]),
        risk_factors: Vec::new(),
        recommendations: strings(&["Use proven technologies", "Implement in phases"]),
        confidence: 75.0,
    }
}

#[must_use]
pub fn delivery() -> DeliveryPlan {
    let member = |role: &str, allocation: f64| TeamMember {
        role: role.to_string(),
        allocation,
        skills_required: Vec::new(),
        responsibilities: Vec::new(),
    };
    let phase = |name: &str| ProjectPhase {
        phase: name.to_string(),
        duration: String::new(),
        deliverables: Vec::new(),
        resources: Vec::new(),
    };

    DeliveryPlan {
        delivery_score: 80.0,
        delivery_approach: "Agile".to_string(),
        team_composition: vec![
            member("Project Manager", 0.5),
            member("Senior Developer", 1.0),
            member("Frontend Developer", 1.0),
        ],
        project_phases: ["Planning", "Development", "Testing", "Deployment"]
            .into_iter()
            .map(phase)
            .collect(),
        resource_timeline: "Q1 2024".to_string(),
        budget_estimate: BudgetEstimate {
            development_cost: "$100k".to_string(),
            total_estimate: "$120k".to_string(),
            ..BudgetEstimate::default()
        },
        risk_mitigation: strings(&["Regular code reviews", "Automated testing"]),
        quality_assurance: strings(&["Unit testing", "Integration testing"]),
        recommendations: strings(&["Start with MVP", "Iterative development"]),
        confidence: 70.0,
    }
}

#[must_use]
pub fn proposal() -> ProposalAnalysis {
    ProposalAnalysis {
        proposal_score: 75.0,
        pricing_model: TIME_AND_MATERIALS.to_string(),
        commercial_terms: CommercialTerms {
            total_investment: "To be determined".to_string(),
            payment_structure: strings(&["To be defined"]),
            payment_terms: "30 days".to_string(),
            contract_duration: "6-12 months".to_string(),
            support_included: "3 months post-launch support".to_string(),
        },
        value_proposition: strings(&["Cost-effective solution", "Proven technology stack"]),
        competitive_advantages: strings(&["Experienced team", "Agile methodology"]),
        risk_assessment: RiskAssessment {
            client_risks: strings(&["Standard project risks"]),
            vendor_risks: strings(&["Standard delivery risks"]),
            mitigation_strategies: strings(&["Regular communication and monitoring"]),
        },
        proposal_sections: Vec::new(),
        negotiation_strategy: strings(&["Emphasize value", "Flexible on timeline"]),
        success_metrics: strings(&["On-time delivery", "Budget adherence"]),
        recommendations: strings(&["Proceed with detailed proposal", "Schedule technical review"]),
        confidence: 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprint::budget::parse_budget;

    #[test]
    fn solution_stack_has_every_layer() {
        let design = solution();
        assert_eq!(design.technology_stack.len(), 4);
        assert!(design.technology_stack["deployment"].is_empty());
        assert_eq!(design.technology_stack["backend"], ["Node.js"]);
    }

    #[test]
    fn delivery_budget_parses() {
        let plan = delivery();
        assert!((parse_budget(&plan.budget_estimate.development_cost) - 100_000.0).abs() < f64::EPSILON);
        assert!((parse_budget(&plan.budget_estimate.total_estimate) - 120_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scores_and_confidence() {
        assert!((qualification().qualification_score - 70.0).abs() < f64::EPSILON);
        assert!((proposal().confidence - 60.0).abs() < f64::EPSILON);
        assert_eq!(proposal().pricing_model, "Time & Materials");
    }
}
