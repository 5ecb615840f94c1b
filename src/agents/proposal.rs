//! Commercial proposal generation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::json::{list, records, score, text};
use crate::agents::{
    Agent, AgentInput, AgentKind, ConversationProfile, FALLBACK_CONFIDENCE, present,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialTerms {
    pub total_investment: String,
    pub payment_structure: Vec<String>,
    pub payment_terms: String,
    pub contract_duration: String,
    pub support_included: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub client_risks: Vec<String>,
    pub vendor_risks: Vec<String>,
    pub mitigation_strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSection {
    pub section: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalAnalysis {
    pub proposal_score: f64,
    pub pricing_model: String,
    pub commercial_terms: CommercialTerms,
    pub value_proposition: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub risk_assessment: RiskAssessment,
    pub proposal_sections: Vec<ProposalSection>,
    pub negotiation_strategy: Vec<String>,
    pub success_metrics: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

pub const FIXED_PRICE: &str = "Fixed Price";
pub const TIME_AND_MATERIALS: &str = "Time & Materials";
pub const MILESTONE_BASED: &str = "Milestone-based";
pub const RETAINER: &str = "Retainer";

/// Whole dollars with thousand separators: `$1,250,000`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn dollars(amount: f64) -> String {
    let whole = amount.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalAgent;

impl ProposalAgent {
    fn score(input: &AgentInput) -> f64 {
        let conv = &input.conversation;
        let budget_min = input.customer.budget_min.unwrap_or(0.0);
        let mut score = if budget_min > 100_000.0 {
            20.0
        } else if budget_min > 50_000.0 {
            15.0
        } else if budget_min > 10_000.0 {
            10.0
        } else {
            5.0
        };

        score += match conv.urgency_lower().as_str() {
            "high" => 15.0,
            "medium" => 10.0,
            _ => 5.0,
        };
        if present(conv.decision_makers.as_ref()) {
            score += 5.0;
        }

        if present(conv.requirements.as_ref()) {
            let detailed = conv
                .requirements
                .as_ref()
                .is_some_and(|req| req.chars().count() > 100);
            score += if detailed { 10.0 } else { 5.0 };
        }

        let solution_score = input.solution.as_ref().map_or(0.0, |s| s.solution_score);
        score += if solution_score > 70.0 {
            15.0
        } else if solution_score > 50.0 {
            10.0
        } else {
            5.0
        };

        if let Some(delivery) = &input.delivery {
            score += if delivery.delivery_score > 70.0 { 10.0 } else { 5.0 };
        }

        let industry = ConversationProfile::lower(input.customer.industry.as_ref());
        score += if ["tech", "software", "saas"]
            .iter()
            .any(|keyword| industry.contains(keyword))
        {
            10.0
        } else {
            5.0
        };

        if present(conv.goals.as_ref()) {
            score += 5.0;
        }

        let timeline = ConversationProfile::lower(conv.timeline.as_ref());
        score += if ["month", "quarter", "year"]
            .iter()
            .any(|word| timeline.contains(word))
        {
            10.0
        } else {
            5.0
        };

        f64::min(score, 100.0)
    }

    fn pricing_model(input: &AgentInput) -> &'static str {
        let requirements = input.conversation.requirements.as_deref().unwrap_or_default();
        let lower = requirements.to_lowercase();
        let budget_min = input.customer.budget_min.unwrap_or(0.0);

        if requirements.chars().count() > 200 && budget_min > 50_000.0 {
            FIXED_PRICE
        } else if input.conversation.urgency_lower() == "high" || lower.contains("asap") {
            TIME_AND_MATERIALS
        } else if input
            .delivery
            .as_ref()
            .is_some_and(|delivery| delivery.project_phases.len() > 3)
        {
            MILESTONE_BASED
        } else if lower.contains("ongoing") || lower.contains("maintenance") {
            RETAINER
        } else {
            FIXED_PRICE
        }
    }

    fn commercial_terms(input: &AgentInput, pricing_model: &str) -> CommercialTerms {
        let customer = &input.customer;
        let budget_min = customer.budget_min.filter(|v| *v > 0.0);
        let budget_max = customer.budget_max.filter(|v| *v > 0.0);

        let total_investment = match (&input.delivery, budget_min, budget_max) {
            (Some(delivery), _, _) => delivery.budget_estimate.total_estimate.clone(),
            (None, Some(min), Some(max)) => format!("{} - {}", dollars(min), dollars(max)),
            (None, Some(min), None) => format!("{} - {}", dollars(min), dollars(min * 1.5)),
            _ => "To be determined based on final scope".to_string(),
        };

        let payment_structure = match pricing_model {
            MILESTONE_BASED => strings(&[
                "25% upon contract signing",
                "50% upon completion of development milestones",
                "25% upon project completion and acceptance",
            ]),
            TIME_AND_MATERIALS => strings(&[
                "Monthly billing based on actual hours worked",
                "2-week payment terms",
                "Monthly expense reimbursement",
            ]),
            RETAINER => strings(&[
                "Monthly retainer fee in advance",
                "Quarterly true-up based on usage",
                "Annual contract with monthly billing",
            ]),
            _ => strings(&[
                "30% upon contract signing",
                "40% at project milestone completion",
                "30% upon final delivery and acceptance",
            ]),
        };

        CommercialTerms {
            total_investment,
            payment_structure,
            payment_terms: "30 days".to_string(),
            contract_duration: input
                .delivery
                .as_ref()
                .map_or_else(|| "3-6 months".to_string(), |d| d.resource_timeline.clone()),
            support_included: "3 months post-launch support included".to_string(),
        }
    }

    fn value_proposition(input: &AgentInput) -> Vec<String> {
        let mut props = strings(&[
            "Experienced team with proven track record in similar projects",
            "Comprehensive solution addressing all identified business needs",
        ]);
        if let Some(solution) = &input.solution {
            props.push(format!(
                "Specialized expertise in {} development",
                solution.solution_type.to_lowercase()
            ));
            if !solution.technology_stack.is_empty() {
                props.push("Modern, scalable technology stack ensuring long-term viability".into());
            }
        }
        if let Some(delivery) = &input.delivery {
            props.push(format!(
                "{} methodology ensuring transparency and flexibility",
                delivery.delivery_approach
            ));
            if !delivery.quality_assurance.is_empty() {
                props.push("Comprehensive quality assurance and testing procedures".into());
            }
        }
        props.extend(strings(&[
            "Fixed timeline and budget with clear milestones",
            "Post-launch support and maintenance included",
            "Ongoing partnership for future enhancements and scaling",
        ]));
        props.truncate(6);
        props
    }

    fn competitive_advantages(input: &AgentInput) -> Vec<String> {
        let mut advantages = vec![
            "Deep technical expertise and industry experience",
            "Proven delivery methodology with risk mitigation",
            "Competitive pricing with transparent cost structure",
        ];
        if let Some(solution) = &input.solution {
            if solution.solution_score > 70.0 {
                advantages.push("Comprehensive solution addressing all technical requirements");
            }
            if !solution.technology_stack.is_empty() {
                advantages.push("Modern technology stack with future-proofing considerations");
            }
        }
        advantages.extend([
            "Flexible engagement model with scalable team",
            "Local team with direct communication and collaboration",
            "Long-term partnership approach beyond project completion",
        ]);
        advantages.truncate(5);
        strings(&advantages)
    }

    fn risk_assessment(input: &AgentInput) -> RiskAssessment {
        let conv = &input.conversation;
        let mut client = vec!["Standard project execution risks"];
        let mut vendor = vec!["Scope creep and requirement changes"];
        let mut mitigation = vec!["Regular communication and progress reviews"];

        if input.customer.budget_min.unwrap_or(0.0) < 25_000.0 {
            client.push("Limited budget may impact scope or quality");
            mitigation.push("Phased delivery approach to manage costs");
        }
        if conv.urgency_lower() == "high" {
            client.push("Tight timeline may increase project risk");
            vendor.push("Compressed schedule may impact resource allocation");
            mitigation.push("Dedicated team assignment and clear priorities");
        }
        let requirements_len = conv.requirements.as_ref().map_or(0, |r| r.chars().count());
        if requirements_len < 100 {
            client.push("Unclear requirements may lead to scope changes");
            vendor.push("Requirement clarification may impact timeline");
            mitigation.push("Detailed requirements workshop before development");
        }
        if input
            .delivery
            .as_ref()
            .is_some_and(|delivery| delivery.delivery_score < 60.0)
        {
            vendor.push("Complex delivery requirements increase execution risk");
            mitigation.push("Proof of concept phase to validate approach");
        }

        RiskAssessment {
            client_risks: strings(&client),
            vendor_risks: strings(&vendor),
            mitigation_strategies: strings(&mitigation),
        }
    }

    fn sections(score: f64) -> Vec<ProposalSection> {
        let mut table = vec![
            ("Executive Summary", "High-level overview of solution and value proposition", "High"),
            (
                "Understanding & Approach",
                "Demonstration of requirements understanding and solution approach",
                "High",
            ),
            ("Technical Solution", "Detailed technical architecture and implementation plan", "High"),
            ("Team & Experience", "Team composition and relevant project experience", "Medium"),
            (
                "Timeline & Deliverables",
                "Project timeline with key milestones and deliverables",
                "High",
            ),
            ("Investment & Terms", "Commercial proposal with pricing and contract terms", "High"),
        ];
        if score > 70.0 {
            table.extend([
                ("Case Studies", "Relevant project examples and client testimonials", "Medium"),
                ("Risk Management", "Risk assessment and mitigation strategies", "Medium"),
            ]);
        }
        table
            .into_iter()
            .map(|(section, content, priority)| ProposalSection {
                section: section.to_string(),
                content: content.to_string(),
                priority: priority.to_string(),
            })
            .collect()
    }

    fn negotiation_strategy(score: f64) -> Vec<String> {
        let mut strategy = vec![
            "Lead with value proposition and business impact",
            "Be flexible on payment terms while maintaining total value",
        ];
        if score > 80.0 {
            strategy.extend([
                "Confident pricing with minimal discounting",
                "Focus on long-term partnership opportunities",
                "Upsell additional services and future phases",
            ]);
        } else if score > 60.0 {
            strategy.extend([
                "Moderate flexibility on pricing (up to 10% discount)",
                "Emphasize competitive advantages and unique value",
                "Consider milestone-based pricing for risk mitigation",
            ]);
        } else {
            strategy.extend([
                "Competitive pricing with value justification",
                "Consider phased approach to reduce initial investment",
                "Focus on building relationship for future opportunities",
            ]);
        }
        strings(&strategy)
    }

    fn success_metrics(conv: &ConversationProfile) -> Vec<String> {
        let goals = ConversationProfile::lower(conv.goals.as_ref());
        let mut metrics = vec![
            "On-time delivery within agreed timeline",
            "Budget adherence with no cost overruns",
            "Quality delivery meeting all acceptance criteria",
        ];
        if goals.contains("efficiency") {
            metrics.push("Process efficiency improvements measured");
        }
        if goals.contains("revenue") || goals.contains("sales") {
            metrics.push("Revenue impact tracking and measurement");
        }
        if goals.contains("cost") {
            metrics.push("Cost reduction achievements quantified");
        }
        if goals.contains("customer") {
            metrics.push("Customer satisfaction and user adoption metrics");
        }
        metrics.push("Post-launch support and stability metrics");
        metrics.truncate(6);
        strings(&metrics)
    }

    fn recommendations(score: f64, pricing_model: &str) -> Vec<String> {
        let mut recs = if score > 80.0 {
            vec![
                "High-confidence deal - pursue aggressively with premium positioning",
                "Focus on long-term relationship and future expansion opportunities",
            ]
        } else if score > 60.0 {
            vec![
                "Solid opportunity - balance competitive pricing with value demonstration",
                "Consider flexible terms to improve win probability",
            ]
        } else {
            vec![
                "Cautious approach - ensure clear requirements and manageable scope",
                "Consider pilot project or phased delivery to reduce risk",
            ]
        };
        match pricing_model {
            TIME_AND_MATERIALS => {
                recs.push("Establish clear effort estimates and regular review cycles");
            }
            FIXED_PRICE => {
                recs.push("Ensure comprehensive scope definition and change control process");
            }
            _ => {}
        }
        recs.push("Plan for post-project relationship and ongoing support opportunities");
        recs.truncate(5);
        strings(&recs)
    }
}

impl Agent for ProposalAgent {
    type Output = ProposalAnalysis;

    fn kind(&self) -> AgentKind {
        AgentKind::ProposalGeneration
    }

    fn system_prompt(&self) -> &'static str {
        "You are a commercial director preparing a winning, profitable proposal. Respond with a \
         single JSON object with the fields: proposal_score (0-100), pricing_model, \
         commercial_terms ({total_investment, payment_structure, payment_terms, \
         contract_duration, support_included}), value_proposition, competitive_advantages, \
         risk_assessment ({client_risks, vendor_risks, mitigation_strategies}), \
         proposal_sections (array of {section, content, priority}), negotiation_strategy, \
         success_metrics, recommendations, confidence (0-100)."
    }

    fn build_prompt(&self, input: &AgentInput) -> String {
        format!(
            "Prepare the commercial proposal for this deal.\n\n{}\nChoose a pricing model that \
             fits the budget, urgency and delivery plan.",
            input.key_data()
        )
    }

    fn temperature(&self) -> f32 {
        0.2
    }

    fn max_tokens(&self) -> u32 {
        3500
    }

    fn standardize(&self, raw: &Value) -> ProposalAnalysis {
        let terms = raw.get("commercial_terms").unwrap_or(&Value::Null);
        let payment_structure = match list(terms, "payment_structure") {
            items if items.is_empty() => vec!["To be defined".to_string()],
            items => items,
        };
        let risks = raw.get("risk_assessment").unwrap_or(&Value::Null);
        let risk_list = |key: &str, default: &str| match list(risks, key) {
            items if items.is_empty() && risks.get(key).is_none() => vec![default.to_string()],
            items => items,
        };

        ProposalAnalysis {
            proposal_score: score(raw, "proposal_score", 0.0),
            pricing_model: text(raw, "pricing_model", FIXED_PRICE),
            commercial_terms: CommercialTerms {
                total_investment: text(terms, "total_investment", "To be determined"),
                payment_structure,
                payment_terms: text(terms, "payment_terms", "30 days"),
                contract_duration: text(terms, "contract_duration", "6-12 months"),
                support_included: text(terms, "support_included", "3 months post-launch support"),
            },
            value_proposition: list(raw, "value_proposition"),
            competitive_advantages: list(raw, "competitive_advantages"),
            risk_assessment: RiskAssessment {
                client_risks: risk_list("client_risks", "Standard project risks"),
                vendor_risks: risk_list("vendor_risks", "Standard delivery risks"),
                mitigation_strategies: risk_list(
                    "mitigation_strategies",
                    "Regular communication and monitoring",
                ),
            },
            proposal_sections: records(raw, "proposal_sections"),
            negotiation_strategy: list(raw, "negotiation_strategy"),
            success_metrics: list(raw, "success_metrics"),
            recommendations: list(raw, "recommendations"),
            confidence: score(raw, "confidence", 50.0),
        }
    }

    fn fallback(&self, input: &AgentInput) -> ProposalAnalysis {
        let proposal_score = Self::score(input);
        let pricing_model = Self::pricing_model(input);
        ProposalAnalysis {
            proposal_score,
            pricing_model: pricing_model.to_string(),
            commercial_terms: Self::commercial_terms(input, pricing_model),
            value_proposition: Self::value_proposition(input),
            competitive_advantages: Self::competitive_advantages(input),
            risk_assessment: Self::risk_assessment(input),
            proposal_sections: Self::sections(proposal_score),
            negotiation_strategy: Self::negotiation_strategy(proposal_score),
            success_metrics: Self::success_metrics(&input.conversation),
            recommendations: Self::recommendations(proposal_score, pricing_model),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::delivery::DeliveryPlanningAgent;
    use crate::agents::solution::SolutionDesignAgent;
    use crate::agents::CustomerProfile;
    use serde_json::json;

    #[test]
    fn dollars_groups_thousands() {
        assert_eq!(dollars(0.0), "$0");
        assert_eq!(dollars(950.0), "$950");
        assert_eq!(dollars(50_000.0), "$50,000");
        assert_eq!(dollars(1_250_000.75), "$1,250,000");
    }

    #[test]
    fn bare_input_is_cautious_fixed_price() {
        let analysis = ProposalAgent.fallback(&AgentInput::default());
        // budget 5, urgency 5, solution 5, industry 5, timeline 5
        assert!((analysis.proposal_score - 25.0).abs() < f64::EPSILON);
        assert_eq!(analysis.pricing_model, FIXED_PRICE);
        assert_eq!(
            analysis.commercial_terms.total_investment,
            "To be determined based on final scope"
        );
        assert_eq!(analysis.commercial_terms.payment_structure[0], "30% upon contract signing");
        assert_eq!(analysis.commercial_terms.contract_duration, "3-6 months");
        assert_eq!(analysis.proposal_sections.len(), 6);
        assert_eq!(analysis.value_proposition.len(), 5);
        assert_eq!(analysis.competitive_advantages.len(), 5);
        assert_eq!(
            analysis.recommendations,
            [
                "Cautious approach - ensure clear requirements and manageable scope",
                "Consider pilot project or phased delivery to reduce risk",
                "Ensure comprehensive scope definition and change control process",
                "Plan for post-project relationship and ongoing support opportunities"
            ]
        );
        assert_eq!(analysis.risk_assessment.client_risks.len(), 3);
        assert_eq!(analysis.success_metrics.len(), 4);
    }

    #[test]
    fn urgent_deal_is_time_and_materials() {
        let input = AgentInput {
            conversation: ConversationProfile {
                urgency: Some("High".into()),
                ..ConversationProfile::default()
            },
            ..AgentInput::default()
        };
        let analysis = ProposalAgent.fallback(&input);
        assert_eq!(analysis.pricing_model, TIME_AND_MATERIALS);
        assert_eq!(
            analysis.commercial_terms.payment_structure[0],
            "Monthly billing based on actual hours worked"
        );
        assert!(
            analysis
                .risk_assessment
                .vendor_risks
                .contains(&"Compressed schedule may impact resource allocation".to_string())
        );
    }

    #[test]
    fn multi_phase_delivery_prices_by_milestone_and_quotes_its_estimate() {
        let mut input = AgentInput {
            customer: CustomerProfile {
                budget_min: Some(60_000.0),
                budget_max: Some(90_000.0),
                industry: Some("Acme SaaS".into()),
                ..CustomerProfile::default()
            },
            conversation: ConversationProfile {
                goals: Some("Reduce cost and improve customer retention".into()),
                timeline: Some("Next quarter".into()),
                ..ConversationProfile::default()
            },
            ..AgentInput::default()
        };
        input.solution = Some(SolutionDesignAgent.fallback(&input));
        input.delivery = Some(DeliveryPlanningAgent.fallback(&input));

        let analysis = ProposalAgent.fallback(&input);
        assert_eq!(analysis.pricing_model, MILESTONE_BASED);
        let delivery = input.delivery.as_ref().unwrap();
        assert_eq!(
            analysis.commercial_terms.total_investment,
            delivery.budget_estimate.total_estimate
        );
        assert_eq!(analysis.commercial_terms.contract_duration, delivery.resource_timeline);
        assert!(
            analysis
                .success_metrics
                .contains(&"Cost reduction achievements quantified".to_string())
        );
        assert!(
            analysis
                .success_metrics
                .contains(&"Customer satisfaction and user adoption metrics".to_string())
        );
        assert_eq!(analysis.value_proposition.len(), 6);
    }

    #[test]
    fn budget_range_formats_investment() {
        let input = AgentInput {
            customer: CustomerProfile {
                budget_min: Some(40_000.0),
                ..CustomerProfile::default()
            },
            ..AgentInput::default()
        };
        let terms = ProposalAgent::commercial_terms(&input, FIXED_PRICE);
        assert_eq!(terms.total_investment, "$40,000 - $60,000");
    }

    #[test]
    fn high_score_adds_sections_and_confident_negotiation() {
        assert_eq!(ProposalAgent::sections(71.0).len(), 8);
        assert_eq!(
            ProposalAgent::negotiation_strategy(81.0)[2],
            "Confident pricing with minimal discounting"
        );
        assert_eq!(
            ProposalAgent::negotiation_strategy(65.0)[2],
            "Moderate flexibility on pricing (up to 10% discount)"
        );
    }

    #[test]
    fn standardize_fills_terms_and_risks() {
        let analysis = ProposalAgent.standardize(&json!({
            "proposal_score": 77,
            "pricing_model": "Retainer",
            "commercial_terms": {"payment_terms": "45 days"},
            "risk_assessment": {"client_risks": ["Budget freeze"]}
        }));
        assert_eq!(analysis.commercial_terms.payment_terms, "45 days");
        assert_eq!(analysis.commercial_terms.payment_structure, ["To be defined"]);
        assert_eq!(analysis.commercial_terms.total_investment, "To be determined");
        assert_eq!(analysis.risk_assessment.client_risks, ["Budget freeze"]);
        assert_eq!(analysis.risk_assessment.vendor_risks, ["Standard delivery risks"]);
        assert!((analysis.confidence - 50.0).abs() < f64::EPSILON);
    }
}
