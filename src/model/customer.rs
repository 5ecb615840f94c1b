//! Lifecycle analytics records: one row per lead/customer plus activity log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Lead,
    Mql,
    Sql,
    Customer,
    Churned,
}

impl LifecycleStage {
    pub const ALL: [Self; 5] = [Self::Lead, Self::Mql, Self::Sql, Self::Customer, Self::Churned];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Mql => "mql",
            Self::Sql => "sql",
            Self::Customer => "customer",
            Self::Churned => "churned",
        }
    }

    /// Journey label ("MQL", "Customer").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Mql => "MQL",
            Self::Sql => "SQL",
            Self::Customer => "Customer",
            Self::Churned => "Churned",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| {
                SbError::ValidationFailed(format!(
                    "invalid stage {s} (expected lead|mql|sql|customer|churned)"
                ))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub id: i64,
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub industry: Option<String>,
    pub region: Option<String>,
    pub lead_source: Option<String>,
    pub decision_maker_role: Option<String>,
    /// Headcount.
    pub company_size: Option<f64>,
    pub lead_score: Option<f64>,

    pub mql: bool,
    pub mql_date: Option<NaiveDate>,
    pub sql: bool,
    pub sql_date: Option<NaiveDate>,
    pub is_customer: bool,
    pub conversion_date: Option<NaiveDate>,
    pub churned: bool,
    pub churn_date: Option<NaiveDate>,
    pub lead_creation_date: Option<NaiveDate>,
    pub expected_close_date: Option<NaiveDate>,

    pub acv: Option<f64>,
    pub ltv: Option<f64>,
    pub cac: Option<f64>,
    pub sales_cycle_days: Option<f64>,

    pub tenure_months: Option<f64>,
    pub renewals_count: Option<f64>,
    pub logins_per_month: Option<f64>,
    pub active_features_used: Option<f64>,
    pub product_usage_hours: Option<f64>,
    pub tickets_raised: Option<f64>,
    pub avg_support_response_hours: Option<f64>,
    pub nps_score: Option<f64>,
    pub expansion: bool,

    pub stage_probability: Option<f64>,
    pub forecasted_revenue: Option<f64>,
}

impl Customer {
    /// Furthest stage reached; churn overrides everything.
    #[must_use]
    pub const fn stage(&self) -> LifecycleStage {
        if self.churned {
            LifecycleStage::Churned
        } else if self.is_customer {
            LifecycleStage::Customer
        } else if self.sql {
            LifecycleStage::Sql
        } else if self.mql {
            LifecycleStage::Mql
        } else {
            LifecycleStage::Lead
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }

    /// Still in the open pipeline: not converted and not churned.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.is_customer && !self.churned
    }

    pub fn validate(&self) -> Result<(), SbError> {
        if !self.email.contains('@') {
            return Err(SbError::ValidationFailed(format!("invalid email {:?}", self.email)));
        }
        Ok(())
    }

    /// Move to `stage`, setting the flag and stamping the date.
    pub fn advance_to(&mut self, stage: LifecycleStage, today: NaiveDate) {
        match stage {
            LifecycleStage::Lead => {}
            LifecycleStage::Mql => {
                self.mql = true;
                self.mql_date = Some(today);
            }
            LifecycleStage::Sql => {
                self.sql = true;
                self.sql_date = Some(today);
            }
            LifecycleStage::Customer => {
                self.is_customer = true;
                self.conversion_date = Some(today);
            }
            LifecycleStage::Churned => {
                self.churned = true;
                self.churn_date = Some(today);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerActivity {
    pub id: i64,
    pub customer_id: i64,
    pub activity_type: String,
    pub activity_data: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPredictionRecord {
    pub customer_id: i64,
    pub churn_probability: f64,
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}
