//! Point-based lead scoring.

use serde::{Deserialize, Serialize};

use crate::model::Customer;

const HIGH_VALUE_INDUSTRIES: [&str; 4] = ["Technology", "Tech", "Finance", "Manufacturing"];
const HIGH_VALUE_REGIONS: [&str; 2] = ["US", "DACH"];
const EXECUTIVE_ROLES: [&str; 2] = ["CEO", "CTO"];
const UNTRAINED_SCORE: f64 = 50.0;

/// Lead attributes submitted for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadProfile {
    #[serde(alias = "Company_Size")]
    pub company_size: Option<f64>,
    #[serde(alias = "Industry")]
    pub industry: Option<String>,
    #[serde(alias = "Region")]
    pub region: Option<String>,
    #[serde(alias = "Decision_Maker_Role")]
    pub decision_maker_role: Option<String>,
}

impl From<&Customer> for LeadProfile {
    fn from(customer: &Customer) -> Self {
        Self {
            company_size: customer.company_size,
            industry: customer.industry.clone(),
            region: customer.region.clone(),
            decision_maker_role: customer.decision_maker_role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadScore {
    pub lead_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeadScorer {
    trained: bool,
}

fn one_of(value: Option<&str>, options: &[&str]) -> bool {
    value.is_some_and(|v| options.contains(&v.trim()))
}

impl LeadScorer {
    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.trained
    }

    /// Trained once `min_rows` customers carry a historical lead score.
    pub fn train(&mut self, customers: &[Customer], min_rows: usize) {
        let scored = customers.iter().filter(|c| c.lead_score.is_some()).count();
        self.trained = scored >= min_rows.max(1);
        tracing::debug!(scored, trained = self.trained, "lead scorer");
    }

    #[must_use]
    pub fn score(&self, lead: &LeadProfile) -> f64 {
        if !self.trained {
            return UNTRAINED_SCORE;
        }
        let size = lead.company_size.unwrap_or(0.0);
        let mut score: f64 = if size > 1000.0 {
            30.0
        } else if size > 100.0 {
            20.0
        } else {
            10.0
        };
        if one_of(lead.industry.as_deref(), &HIGH_VALUE_INDUSTRIES) {
            score += 25.0;
        }
        if one_of(lead.region.as_deref(), &HIGH_VALUE_REGIONS) {
            score += 20.0;
        }
        if one_of(lead.decision_maker_role.as_deref(), &EXECUTIVE_ROLES) {
            score += 25.0;
        }
        score.min(100.0)
    }

    #[must_use]
    pub fn evaluate(&self, lead: &LeadProfile) -> LeadScore {
        let lead_score = self.score(lead);
        let recommendations: &[&str] = if lead_score >= 80.0 {
            &[
                "High-priority lead - immediate sales follow-up",
                "Schedule demo with decision maker",
            ]
        } else if lead_score >= 60.0 {
            &[
                "Medium-priority lead - nurture with targeted content",
                "Send industry-specific case studies",
            ]
        } else {
            &[
                "Long-term nurturing required",
                "Add to marketing automation sequence",
            ]
        };
        LeadScore {
            lead_score,
            recommendations: recommendations.iter().map(|r| (*r).to_string()).collect(),
        }
    }
}
