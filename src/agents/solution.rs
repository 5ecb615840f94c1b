//! Technical solution design.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::json::{as_list, list, score, text};
use crate::agents::{
    Agent, AgentInput, AgentKind, ConversationProfile, FALLBACK_CONFIDENCE, positive, present,
};

/// Stack categories every design reports, even when empty.
pub const REQUIRED_STACK_KEYS: [&str; 4] = ["frontend", "backend", "database", "deployment"];

pub type TechStack = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionDesign {
    pub solution_score: f64,
    pub solution_type: String,
    pub recommended_architecture: String,
    pub technology_stack: TechStack,
    pub integration_requirements: Vec<String>,
    pub implementation_phases: Vec<String>,
    pub estimated_timeline: String,
    pub complexity_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

pub(crate) fn ensure_stack_keys(stack: &mut TechStack) {
    for key in REQUIRED_STACK_KEYS {
        stack.entry(key.to_string()).or_default();
    }
}

const TYPE_KEYWORDS: [(&[&str], &str); 6] = [
    (&["mobile", "app", "android", "ios"], "Mobile Application"),
    (&["web", "portal", "website", "dashboard"], "Web Application"),
    (&["crm", "customer", "sales", "lead"], "CRM/ERP"),
    (&["analytics", "reporting", "dashboard", "bi"], "Data Analytics"),
    (&["ecommerce", "shop", "marketplace", "selling"], "E-commerce"),
    (&["integration", "api", "connect", "sync"], "Integration Platform"),
];

/// First matching keyword group over requirements and pain points.
#[must_use]
pub fn classify_solution_type(conversation: &ConversationProfile) -> &'static str {
    let haystack = format!(
        "{}{}",
        ConversationProfile::lower(conversation.requirements.as_ref()),
        ConversationProfile::lower(conversation.pain_points.as_ref())
    );
    TYPE_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|word| haystack.contains(word)))
        .map_or("Custom Software", |(_, kind)| *kind)
}

fn base_stack(solution_type: &str) -> TechStack {
    let table: &[(&str, &[&str])] = match solution_type {
        "Mobile Application" => &[
            ("native", &["Swift/iOS", "Kotlin/Android"]),
            ("cross_platform", &["React Native", "Flutter", "Xamarin"]),
            ("backend", &["Node.js", "Python/FastAPI", "Firebase"]),
            ("database", &["Firebase", "PostgreSQL", "MongoDB"]),
        ],
        "Data Analytics" => &[
            ("processing", &["Python/Pandas", "Apache Spark", "Airflow"]),
            ("visualization", &["Tableau", "Power BI", "D3.js", "Plotly"]),
            ("database", &["PostgreSQL", "BigQuery", "Snowflake", "Redshift"]),
            ("ml_platform", &["TensorFlow", "PyTorch", "Scikit-learn"]),
        ],
        "CRM/ERP" => &[
            ("platform", &["Salesforce", "Microsoft Dynamics", "Custom Build"]),
            ("integration", &["REST APIs", "GraphQL", "Webhooks"]),
            ("database", &["PostgreSQL", "SQL Server", "Oracle"]),
            ("reporting", &["Power BI", "Tableau", "Custom Dashboards"]),
        ],
        _ => &[
            ("frontend", &["React", "Vue.js", "Angular", "Next.js"]),
            (
                "backend",
                &["Node.js", "Python/Django", "Python/FastAPI", ".NET Core", "Java/Spring"],
            ),
            ("database", &["PostgreSQL", "MySQL", "MongoDB", "Redis"]),
            ("deployment", &["AWS", "Azure", "GCP", "Docker", "Kubernetes"]),
        ],
    };
    table
        .iter()
        .map(|(key, values)| {
            (
                (*key).to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

/// Type stack with the customer's stated preferences swapped in.
#[must_use]
pub fn recommend_stack(solution_type: &str, conversation: &ConversationProfile) -> TechStack {
    let mut stack = base_stack(solution_type);
    let prefs = ConversationProfile::lower(conversation.tech_preferences.as_ref());
    let mut replace = |key: &str, values: &[&str]| {
        if let Some(slot) = stack.get_mut(key) {
            *slot = values.iter().map(|v| (*v).to_string()).collect();
        }
    };

    if prefs.contains("react") {
        replace("frontend", &["React", "Next.js"]);
    } else if prefs.contains("vue") {
        replace("frontend", &["Vue.js", "Nuxt.js"]);
    }
    if prefs.contains("python") {
        replace("backend", &["Python/FastAPI", "Python/Django"]);
    } else if prefs.contains("node") {
        replace("backend", &["Node.js", "Express.js"]);
    }
    if prefs.contains("aws") {
        replace("deployment", &["AWS", "Docker", "Kubernetes"]);
    } else if prefs.contains("azure") {
        replace("deployment", &["Azure", "Docker", "Azure DevOps"]);
    }
    stack
}

fn base_timeline(solution_type: &str) -> &'static str {
    match solution_type {
        "Web Application" => "3-6 months",
        "Mobile Application" | "E-commerce" => "4-8 months",
        "Data Analytics" => "2-4 months",
        "CRM/ERP" => "6-12 months",
        "Integration Platform" => "2-6 months",
        "Custom Software" => "4-10 months",
        _ => "4-8 months",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionDesignAgent;

impl SolutionDesignAgent {
    fn score(input: &AgentInput) -> f64 {
        let conv = &input.conversation;
        let mut score = 0.0;
        if present(conv.requirements.as_ref()) {
            score += 20.0;
        }
        if present(conv.goals.as_ref()) {
            score += 10.0;
        }
        if present(conv.tech_preferences.as_ref()) {
            score += 10.0;
        }
        if positive(input.customer.budget_min) {
            score += 15.0;
        }
        if present(conv.timeline.as_ref()) {
            score += 15.0;
        }
        match conv.urgency_lower().as_str() {
            "low" | "medium" => score += 15.0,
            "high" => score += 10.0,
            _ => {}
        }
        score += if present(conv.integration_needs.as_ref()) { 15.0 } else { 5.0 };
        f64::min(score, 100.0)
    }

    fn phases(score: f64) -> Vec<String> {
        let mut phases = vec![
            "Discovery & Requirements Analysis",
            "Architecture Design & Planning",
        ];
        if score >= 60.0 {
            phases.extend([
                "Core Development Sprint 1",
                "Core Development Sprint 2",
                "Integration & Testing",
                "Deployment & Launch",
            ]);
        } else {
            phases.extend([
                "Proof of Concept Development",
                "Core Development Phase 1",
                "Core Development Phase 2",
                "Integration & Testing Phase",
                "User Acceptance Testing",
                "Production Deployment",
            ]);
        }
        phases.into_iter().map(String::from).collect()
    }

    fn timeline(solution_type: &str, score: f64) -> String {
        let base = base_timeline(solution_type);
        if score < 40.0 {
            format!("{base} (extended due to complexity)")
        } else if score > 80.0 {
            format!("{base} (optimized timeline)")
        } else {
            base.to_string()
        }
    }

    fn complexity_factors(conv: &ConversationProfile) -> Vec<String> {
        let req = ConversationProfile::lower(conv.requirements.as_ref());
        let mut factors = Vec::new();
        if req.contains("integration") || req.contains("api") {
            factors.push("Third-party system integrations");
        }
        if req.contains("real-time") || req.contains("live") {
            factors.push("Real-time data processing requirements");
        }
        if req.contains("mobile") && req.contains("web") {
            factors.push("Multi-platform development");
        }
        if req.contains("security") || req.contains("compliance") {
            factors.push("Security and compliance requirements");
        }
        if req.contains("scale") || req.contains("growth") {
            factors.push("Scalability and performance optimization");
        }
        or_default_entry(factors, "Standard business application complexity")
    }

    fn risk_factors(solution_type: &str, conv: &ConversationProfile) -> Vec<String> {
        let req = ConversationProfile::lower(conv.requirements.as_ref());
        let mut risks = Vec::new();
        if conv.urgency_lower() == "high" {
            risks.push("Tight timeline may impact quality");
        }
        if !present(conv.requirements.as_ref()) || req.chars().count() < 50 {
            risks.push("Requirements may need further clarification");
        }
        if req.contains("integration") {
            risks.push("Third-party integration dependencies");
        }
        if matches!(solution_type, "CRM/ERP" | "Data Analytics") {
            risks.push("Data migration and integrity challenges");
        }
        if !present(conv.tech_preferences.as_ref()) {
            risks.push("Technology stack assumptions need validation");
        }
        or_default_entry(risks, "Standard implementation risks")
    }

    fn integrations(conv: &ConversationProfile) -> Vec<String> {
        let req = ConversationProfile::lower(conv.requirements.as_ref());
        let table = [
            ("crm", "CRM system integration"),
            ("email", "Email service integration"),
            ("payment", "Payment gateway integration"),
            ("api", "REST API integrations"),
            ("database", "Database connectivity"),
        ];
        let found = table
            .iter()
            .filter(|(keyword, _)| req.contains(keyword))
            .map(|(_, label)| *label)
            .collect();
        or_default_entry(found, "Standard system integrations")
    }

    fn recommendations(solution_type: &str, score: f64) -> Vec<String> {
        let mut recs: Vec<String> = if score < 50.0 {
            vec![
                "Conduct detailed requirements workshop before development".into(),
                "Consider phased delivery approach to manage complexity".into(),
            ]
        } else {
            vec![
                "Well-defined requirements enable efficient development".into(),
                "Implement agile development methodology".into(),
            ]
        };
        recs.push(format!(
            "Focus on {} best practices and patterns",
            solution_type.to_lowercase()
        ));
        recs.push("Plan for scalability from the initial architecture".into());
        recs.push("Implement comprehensive testing strategy".into());
        recs.truncate(5);
        recs
    }
}

fn or_default_entry(found: Vec<&str>, default: &str) -> Vec<String> {
    if found.is_empty() {
        vec![default.to_string()]
    } else {
        found.into_iter().map(String::from).collect()
    }
}

impl Agent for SolutionDesignAgent {
    type Output = SolutionDesign;

    fn kind(&self) -> AgentKind {
        AgentKind::SolutionDesign
    }

    fn system_prompt(&self) -> &'static str {
        "You are a solution architect turning business requirements into a concrete technical \
         design. Respond with a single JSON object with the fields: solution_score (0-100), \
         solution_type, recommended_architecture, technology_stack (object with frontend, \
         backend, database and deployment arrays), integration_requirements, \
         implementation_phases, estimated_timeline, complexity_factors, risk_factors, \
         recommendations, confidence (0-100)."
    }

    fn build_prompt(&self, input: &AgentInput) -> String {
        format!(
            "Design a technical solution for this opportunity.\n\n{}\nPrefer proven technology \
             and call out integration and delivery risks explicitly.",
            input.key_data()
        )
    }

    fn temperature(&self) -> f32 {
        0.4
    }

    fn max_tokens(&self) -> u32 {
        3000
    }

    fn standardize(&self, raw: &Value) -> SolutionDesign {
        let mut technology_stack: TechStack = raw
            .get("technology_stack")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (key.clone(), as_list(value)))
                    .collect()
            })
            .unwrap_or_default();
        ensure_stack_keys(&mut technology_stack);

        SolutionDesign {
            solution_score: score(raw, "solution_score", 0.0),
            solution_type: text(raw, "solution_type", "Custom Software"),
            recommended_architecture: text(
                raw,
                "recommended_architecture",
                "Monolithic architecture",
            ),
            technology_stack,
            integration_requirements: list(raw, "integration_requirements"),
            implementation_phases: list(raw, "implementation_phases"),
            estimated_timeline: text(raw, "estimated_timeline", "3-6 months"),
            complexity_factors: list(raw, "complexity_factors"),
            risk_factors: list(raw, "risk_factors"),
            recommendations: list(raw, "recommendations"),
            confidence: score(raw, "confidence", 50.0),
        }
    }

    fn fallback(&self, input: &AgentInput) -> SolutionDesign {
        let conv = &input.conversation;
        let solution_type = classify_solution_type(conv);
        let solution_score = Self::score(input);
        SolutionDesign {
            solution_score,
            solution_type: solution_type.to_string(),
            recommended_architecture: format!("{solution_type} with modular design"),
            technology_stack: recommend_stack(solution_type, conv),
            integration_requirements: Self::integrations(conv),
            implementation_phases: Self::phases(solution_score),
            estimated_timeline: Self::timeline(solution_type, solution_score),
            complexity_factors: Self::complexity_factors(conv),
            risk_factors: Self::risk_factors(solution_type, conv),
            recommendations: Self::recommendations(solution_type, solution_score),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}
