//! Customer-lifecycle analytics: funnel records, journeys, activity events
//! and the models scored over them.

pub mod health;
pub mod io;
pub mod metrics;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::model::{ChurnPredictionRecord, Customer, CustomerActivity, LifecycleStage};
use crate::sprint::Message;
use crate::storage::Database;

pub use health::{Health, health};
pub use io::{Export, ExportFormat, ImportReport, export_customers, import_customers, parse_import};
pub use metrics::{
    ConversionReport, LifecycleAnalytics, RevenueMetrics, conversion_rates, lifecycle_analytics,
    revenue_metrics,
};
pub use models::{ModelSet, ModelsStatus, TrainingReport};
pub use pipeline::{
    AtRiskCustomer, ChurnRiskCustomer, HighRiskCustomer, PipelineForecast, PipelineHealth,
    churn_risk_customers, high_risk_customers, pipeline_forecast, pipeline_health,
};

/// Trained models shared between request handlers.
pub type SharedModels = Arc<RwLock<ModelSet>>;

/// Activity types that trigger a fresh churn score.
pub const RESCORING_ACTIVITIES: [&str; 3] = ["login", "feature_usage", "support_ticket"];
pub const MODEL_VERSION: &str = "1.0";

pub fn list_customers(
    db: &Database,
    skip: u32,
    limit: u32,
    stage: Option<LifecycleStage>,
) -> Result<Vec<Customer>> {
    db.list_customers(skip, limit, stage)
}

pub fn get_customer(db: &Database, id: i64) -> Result<Customer> {
    db.require_customer(id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyStage {
    pub stage: String,
    pub date: NaiveDate,
    /// Days since the previous recorded stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_from_previous: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_cycle_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure_months: Option<f64>,
}

impl JourneyStage {
    fn at(stage: LifecycleStage, date: NaiveDate) -> Self {
        Self {
            stage: stage.label().to_string(),
            date,
            days_from_previous: None,
            score: None,
            source: None,
            acv: None,
            sales_cycle_days: None,
            tenure_months: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerJourney {
    pub customer_id: i64,
    pub stages: Vec<JourneyStage>,
    pub total_journey_days: i64,
    pub current_stage: String,
    pub key_milestones: Vec<Milestone>,
    pub engagement_score: f64,
}

#[must_use]
pub fn build_journey(customer: &Customer) -> CustomerJourney {
    let mut stages: Vec<JourneyStage> = Vec::new();

    if let Some(date) = customer.lead_creation_date {
        stages.push(JourneyStage {
            score: customer.lead_score,
            source: customer.lead_source.clone(),
            ..JourneyStage::at(LifecycleStage::Lead, date)
        });
    }
    let reached = [
        (LifecycleStage::Mql, customer.mql, customer.mql_date),
        (LifecycleStage::Sql, customer.sql, customer.sql_date),
        (LifecycleStage::Customer, customer.is_customer, customer.conversion_date),
        (LifecycleStage::Churned, customer.churned, customer.churn_date),
    ];
    for (stage, flag, date) in reached {
        let (true, Some(date)) = (flag, date) else {
            continue;
        };
        let mut entry = JourneyStage::at(stage, date);
        entry.days_from_previous = Some(
            stages
                .last()
                .map_or(0, |previous| (date - previous.date).num_days()),
        );
        match stage {
            LifecycleStage::Customer => {
                entry.acv = customer.acv;
                entry.sales_cycle_days = customer.sales_cycle_days;
            }
            LifecycleStage::Churned => entry.tenure_months = customer.tenure_months,
            _ => {}
        }
        stages.push(entry);
    }

    let total_journey_days = match (customer.lead_creation_date, customer.conversion_date) {
        (Some(lead), Some(converted)) => (converted - lead).num_days(),
        _ => 0,
    };
    let engagement = customer.nps_score.unwrap_or(0.0) + customer.logins_per_month.unwrap_or(0.0) * 2.0;

    CustomerJourney {
        customer_id: customer.id,
        stages,
        total_journey_days,
        current_stage: customer.stage().label().to_string(),
        key_milestones: vec![
            Milestone {
                kind: "First Contact".to_string(),
                date: customer.lead_creation_date,
            },
            Milestone {
                kind: "Became Customer".to_string(),
                date: customer.conversion_date,
            },
        ],
        engagement_score: engagement.min(100.0),
    }
}

pub fn customer_journey(db: &Database, id: i64) -> Result<CustomerJourney> {
    Ok(build_journey(&db.require_customer(id)?))
}

/// Move a customer to `stage`, stamping every earlier stage not yet reached.
pub fn update_stage(
    db: &Database,
    id: i64,
    stage: LifecycleStage,
    now: DateTime<Utc>,
) -> Result<Message> {
    let mut customer = db.require_customer(id)?;
    let today = now.date_naive();
    for earlier in LifecycleStage::ALL.into_iter().take_while(|s| *s != stage) {
        let reached = match earlier {
            LifecycleStage::Mql => customer.mql,
            LifecycleStage::Sql => customer.sql,
            LifecycleStage::Customer => customer.is_customer,
            LifecycleStage::Lead | LifecycleStage::Churned => true,
        };
        if !reached {
            customer.advance_to(earlier, today);
        }
    }
    customer.advance_to(stage, today);
    db.save_customer_stage(&customer, now)?;
    tracing::info!(customer_id = id, stage = %stage, "customer stage updated");
    Ok(Message::new("Customer stage updated successfully"))
}

/// Log an activity event; usage and support events also rescore churn.
pub fn record_activity(
    db: &Database,
    models: &ModelSet,
    customer_id: i64,
    activity_type: &str,
    activity_data: &Value,
    now: DateTime<Utc>,
) -> Result<Message> {
    let customer = db.require_customer(customer_id)?;
    let activity: CustomerActivity = db.insert_activity(customer_id, activity_type, activity_data, now)?;
    tracing::debug!(customer_id, activity = %activity.activity_type, "activity logged");

    if RESCORING_ACTIVITIES.contains(&activity_type) {
        let prediction = models.churn.predict(&customer);
        db.insert_churn_prediction(&ChurnPredictionRecord {
            customer_id,
            churn_probability: prediction.churn_probability,
            risk_level: prediction.risk_level,
            risk_factors: prediction.risk_factors,
            recommendations: prediction.recommendations,
            confidence: prediction.prediction_confidence,
            model_version: MODEL_VERSION.to_string(),
            predicted_at: now,
        })?;
    }
    Ok(Message::new("Activity logged successfully"))
}

/// Retrain `models` from every stored customer.
pub fn train_models(
    db: &Database,
    models: &RwLock<ModelSet>,
    config: &crate::config::AnalyticsConfig,
) -> Result<TrainingReport> {
    let customers = db.all_customers()?;
    Ok(models.write().train_all(&customers, config))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};

    use crate::model::Customer;
    use crate::storage::Database;

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn insert(db: &Database, customer: Customer) -> Customer {
        db.insert_customer(&customer, Utc::now()).unwrap().unwrap()
    }

    pub fn lead(email: &str) -> Customer {
        Customer {
            email: email.to_string(),
            first_name: Some("Test".into()),
            last_name: Some(email.split('@').next().unwrap_or_default().to_string()),
            lead_creation_date: Some(day(2024, 1, 1)),
            ..Customer::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::test_support::{day, insert, lead};
    use super::*;

    #[test]
    fn journey_durations_and_engagement() {
        let customer = Customer {
            id: 7,
            lead_creation_date: Some(day(2024, 1, 1)),
            lead_score: Some(72.0),
            lead_source: Some("Webinar".into()),
            mql: true,
            mql_date: Some(day(2024, 1, 11)),
            sql: true,
            sql_date: Some(day(2024, 2, 1)),
            is_customer: true,
            conversion_date: Some(day(2024, 3, 1)),
            acv: Some(24_000.0),
            nps_score: Some(60.0),
            logins_per_month: Some(30.0),
            ..Customer::default()
        };
        let journey = build_journey(&customer);
        let labels: Vec<&str> = journey.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(labels, ["Lead", "MQL", "SQL", "Customer"]);
        assert_eq!(journey.stages[1].days_from_previous, Some(10));
        assert_eq!(journey.stages[2].days_from_previous, Some(21));
        assert_eq!(journey.total_journey_days, 60);
        assert_eq!(journey.current_stage, "Customer");
        assert!((journey.engagement_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(journey.key_milestones[1].date, Some(day(2024, 3, 1)));
    }

    #[test]
    fn journey_of_bare_lead() {
        let journey = build_journey(&Customer::default());
        assert!(journey.stages.is_empty());
        assert_eq!(journey.current_stage, "Lead");
        assert_eq!(journey.total_journey_days, 0);
    }

    #[test]
    fn stage_update_is_cumulative() {
        let db = Database::open_in_memory().unwrap();
        let id = insert(&db, lead("ana@example.com")).id;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        let message = update_stage(&db, id, LifecycleStage::Customer, now).unwrap();
        assert_eq!(message.message, "Customer stage updated successfully");
        let customer = get_customer(&db, id).unwrap();
        assert!(customer.mql && customer.sql && customer.is_customer);
        assert_eq!(customer.conversion_date, Some(day(2024, 6, 1)));
        assert_eq!(customer.stage(), LifecycleStage::Customer);

        let err = update_stage(&db, 999, LifecycleStage::Mql, now).unwrap_err();
        assert_eq!(err.to_string(), "Customer not found");
    }

    #[test]
    fn usage_activity_rescores_churn() {
        let db = Database::open_in_memory().unwrap();
        let id = insert(&db, lead("ben@example.com")).id;
        let models = ModelSet::default();
        let now = Utc::now();

        record_activity(&db, &models, id, "email_open", &serde_json::json!({}), now).unwrap();
        assert!(db.latest_churn_prediction(id).unwrap().is_none());

        let message =
            record_activity(&db, &models, id, "login", &serde_json::json!({"ip": "10.0.0.1"}), now)
                .unwrap();
        assert_eq!(message.message, "Activity logged successfully");
        let stored = db.latest_churn_prediction(id).unwrap().unwrap();
        assert_eq!(stored.risk_level, "Unknown");
        assert_eq!(stored.model_version, MODEL_VERSION);
        assert_eq!(db.list_activity(id).unwrap().len(), 2);
    }
}
