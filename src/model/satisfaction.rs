use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SbError;

/// Traffic-light account health for won customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

impl HealthStatus {
    pub const ALL: [Self; 3] = [Self::Green, Self::Yellow, Self::Red];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
        }
    }
}

impl FromStr for HealthStatus {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            _ => Err(SbError::ValidationFailed(format!("invalid health status {s}"))),
        }
    }
}

sql_text_enum!(HealthStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSatisfaction {
    #[serde(default)]
    pub deal_id: i64,
    pub overall_satisfaction_score: Option<f64>,
    pub nps_score: Option<f64>,
    pub customer_health_status: Option<HealthStatus>,
    #[serde(default)]
    pub implementation_status: Option<String>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub latest_feedback: Option<String>,
    #[serde(default)]
    pub testimonial: Option<String>,
    #[serde(default)]
    pub last_contact_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub support_tickets_count: i64,
    #[serde(default)]
    pub support_tickets_resolved: i64,
    #[serde(default)]
    pub usage_score: Option<f64>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CustomerSatisfaction {
    pub fn validate(&self) -> Result<(), SbError> {
        if let Some(pct) = self.completion_percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(SbError::ValidationFailed(format!(
                    "completion_percentage {pct} must be between 0 and 100"
                )));
            }
        }
        if self.support_tickets_resolved > self.support_tickets_count {
            return Err(SbError::ValidationFailed(
                "support_tickets_resolved exceeds support_tickets_count".to_string(),
            ));
        }
        Ok(())
    }
}
