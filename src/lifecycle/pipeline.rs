//! Open-pipeline value, near-term closes and at-risk accounts.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::lifecycle::models::ModelSet;
use crate::model::Customer;
use crate::storage::Database;

const PIPELINE_WEIGHT: f64 = 0.3;
const PIPELINE_VELOCITY_DAYS: u32 = 45;
const PIPELINE_WIN_RATE: f64 = 0.25;
const FORECAST_WINDOW_DAYS: i64 = 90;
const DEFAULT_STAGE_PROBABILITY: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineByStage {
    pub leads: f64,
    pub mqls: f64,
    pub sqls: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineHealth {
    pub total_pipeline_value: f64,
    pub pipeline_by_stage: PipelineByStage,
    pub weighted_pipeline: f64,
    pub pipeline_velocity: u32,
    pub win_rate: f64,
}

fn revenue_where(customers: &[Customer], keep: impl Fn(&Customer) -> bool) -> f64 {
    customers
        .iter()
        .filter(|c| keep(c))
        .filter_map(|c| c.forecasted_revenue)
        .sum()
}

pub fn pipeline_health(db: &Database) -> Result<PipelineHealth> {
    let customers = db.all_customers()?;
    let total = revenue_where(&customers, Customer::is_open);
    Ok(PipelineHealth {
        total_pipeline_value: total,
        pipeline_by_stage: PipelineByStage {
            leads: revenue_where(&customers, |c| c.is_open() && !c.mql),
            mqls: revenue_where(&customers, |c| c.is_open() && c.mql && !c.sql),
            sqls: revenue_where(&customers, |c| c.is_open() && c.sql),
        },
        weighted_pipeline: total * PIPELINE_WEIGHT,
        pipeline_velocity: PIPELINE_VELOCITY_DAYS,
        win_rate: PIPELINE_WIN_RATE,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOpportunity {
    pub customer_id: i64,
    pub customer_name: String,
    pub expected_close_date: NaiveDate,
    pub forecasted_revenue: f64,
    pub probability: f64,
    pub weighted_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineForecast {
    pub forecast_period: String,
    pub total_weighted_forecast: f64,
    pub opportunity_count: usize,
    pub opportunities: Vec<ForecastOpportunity>,
}

/// Open opportunities expected to close within the next 90 days.
///
/// Overdue close dates still count.
pub fn pipeline_forecast(db: &Database, now: DateTime<Utc>) -> Result<PipelineForecast> {
    let horizon = (now + Duration::days(FORECAST_WINDOW_DAYS)).date_naive();
    let opportunities: Vec<ForecastOpportunity> = db
        .all_customers()?
        .into_iter()
        .filter(Customer::is_open)
        .filter_map(|c| {
            let close = c.expected_close_date.filter(|d| *d <= horizon)?;
            let revenue = c.forecasted_revenue.filter(|r| *r > 0.0)?;
            let probability = c.stage_probability.unwrap_or(DEFAULT_STAGE_PROBABILITY);
            Some(ForecastOpportunity {
                customer_id: c.id,
                customer_name: c.display_name(),
                expected_close_date: close,
                forecasted_revenue: revenue,
                probability,
                weighted_revenue: revenue * probability / 100.0,
            })
        })
        .collect();

    Ok(PipelineForecast {
        forecast_period: format!("Next {FORECAST_WINDOW_DAYS} days"),
        total_weighted_forecast: opportunities.iter().map(|o| o.weighted_revenue).sum(),
        opportunity_count: opportunities.len(),
        opportunities,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnRiskCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    pub churn_probability: f64,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskCustomer {
    pub at_risk_customers: Vec<ChurnRiskCustomer>,
}

/// Active customers the churn model scores at or above `threshold`.
///
/// Scoring runs on the rayon pool; ties keep storage order.
pub fn churn_risk_customers(
    db: &Database,
    models: &ModelSet,
    threshold: f64,
) -> Result<AtRiskCustomer> {
    let mut at_risk: Vec<ChurnRiskCustomer> = db
        .all_customers()?
        .par_iter()
        .filter(|c| !c.churned)
        .filter_map(|c| {
            let prediction = models.churn.predict(c);
            (prediction.churn_probability >= threshold).then(|| ChurnRiskCustomer {
                customer_id: c.id,
                customer_name: c.display_name(),
                churn_probability: prediction.churn_probability,
                risk_factors: prediction.risk_factors,
            })
        })
        .collect();
    at_risk.sort_by(|a, b| b.churn_probability.total_cmp(&a.churn_probability));
    Ok(AtRiskCustomer {
        at_risk_customers: at_risk,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskCustomer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub risk_score: f64,
    pub risk_factors: Vec<String>,
    pub acv: Option<f64>,
    pub customer_since: Option<NaiveDate>,
}

/// Heuristic risk score without the trained model.
#[must_use]
pub fn heuristic_risk(customer: &Customer, today: NaiveDate) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut factors = Vec::new();
    if customer.acv.unwrap_or(0.0) < 1_000.0 {
        score += 0.3;
        factors.push("Low ACV".to_string());
    }
    if customer
        .mql_date
        .is_some_and(|date| (today - date).num_days() > 365)
    {
        score += 0.4;
        factors.push("Long time since MQL".to_string());
    }
    let missing = [
        customer.industry.is_none(),
        customer.decision_maker_role.is_none(),
        customer.region.is_none(),
    ]
    .into_iter()
    .filter(|m| *m)
    .count();
    if missing > 1 {
        score += 0.3;
        factors.push("Incomplete profile".to_string());
    }
    (score, factors)
}

/// Active customers showing heuristic risk signals, riskiest first.
pub fn high_risk_customers(db: &Database, now: DateTime<Utc>) -> Result<Vec<HighRiskCustomer>> {
    let today = now.date_naive();
    let mut rows: Vec<HighRiskCustomer> = db
        .all_customers()?
        .into_iter()
        .filter(|c| c.is_customer && !c.churned)
        .filter_map(|c| {
            let (score, risk_factors) = heuristic_risk(&c, today);
            (score > 0.0).then(|| HighRiskCustomer {
                id: c.id,
                name: c.display_name(),
                risk_score: (score * 100.0).round() / 100.0,
                risk_factors,
                acv: c.acv,
                customer_since: c.conversion_date,
                company: c.industry,
                email: c.email,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::lifecycle::models::fixtures::training_customers;
    use crate::lifecycle::test_support::{day, insert, lead};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn health_splits_open_pipeline() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, Customer { forecasted_revenue: Some(100.0), ..lead("a@x.io") });
        insert(&db, Customer { mql: true, forecasted_revenue: Some(200.0), ..lead("b@x.io") });
        insert(&db, Customer { mql: true, sql: true, forecasted_revenue: Some(300.0), ..lead("c@x.io") });
        insert(&db, Customer { is_customer: true, forecasted_revenue: Some(1_000.0), ..lead("d@x.io") });

        let health = pipeline_health(&db).unwrap();
        assert!((health.total_pipeline_value - 600.0).abs() < 1e-9);
        assert!((health.pipeline_by_stage.mqls - 200.0).abs() < 1e-9);
        assert!((health.weighted_pipeline - 180.0).abs() < 1e-9);
        assert_eq!(health.pipeline_velocity, 45);
    }

    #[test]
    fn forecast_weights_by_probability() {
        let db = Database::open_in_memory().unwrap();
        insert(
            &db,
            Customer {
                expected_close_date: Some(day(2025, 2, 1)),
                forecasted_revenue: Some(10_000.0),
                stage_probability: Some(40.0),
                ..lead("a@x.io")
            },
        );
        insert(
            &db,
            Customer {
                expected_close_date: Some(day(2025, 3, 1)),
                forecasted_revenue: Some(2_000.0),
                ..lead("b@x.io")
            },
        );
        insert(
            &db,
            Customer {
                expected_close_date: Some(day(2025, 9, 1)),
                forecasted_revenue: Some(50_000.0),
                ..lead("c@x.io")
            },
        );

        let forecast = pipeline_forecast(&db, now()).unwrap();
        assert_eq!(forecast.forecast_period, "Next 90 days");
        assert_eq!(forecast.opportunity_count, 2);
        assert!((forecast.total_weighted_forecast - 5_000.0).abs() < 1e-9);
        assert!((forecast.opportunities[1].probability - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn heuristic_flags_sorted_desc() {
        let db = Database::open_in_memory().unwrap();
        insert(
            &db,
            Customer {
                is_customer: true,
                acv: Some(500.0),
                mql_date: Some(day(2023, 6, 1)),
                ..lead("stale@x.io")
            },
        );
        insert(
            &db,
            Customer {
                is_customer: true,
                acv: Some(50_000.0),
                industry: Some("Finance".into()),
                region: Some("US".into()),
                ..lead("fine@x.io")
            },
        );
        insert(
            &db,
            Customer {
                is_customer: true,
                acv: Some(20_000.0),
                ..lead("thin@x.io")
            },
        );
        insert(&db, Customer { acv: Some(10.0), ..lead("prospect@x.io") });

        let rows = high_risk_customers(&db, now()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].email, "stale@x.io");
        assert!((rows[0].risk_score - 1.0).abs() < 1e-9);
        assert_eq!(rows[0].risk_factors.len(), 3);
        assert_eq!(rows[1].risk_factors, ["Incomplete profile"]);
    }

    #[test]
    fn churn_risk_uses_threshold() {
        let db = Database::open_in_memory().unwrap();
        let customers = training_customers(30);
        for customer in &customers {
            insert(&db, customer.clone());
        }
        let config = AnalyticsConfig::default();
        let mut models = ModelSet::new(&config);
        models.train_all(&db.all_customers().unwrap(), &config);

        let report = churn_risk_customers(&db, &models, 0.0).unwrap();
        // Churned rows are excluded outright.
        assert_eq!(report.at_risk_customers.len(), 20);
        let probabilities: Vec<f64> =
            report.at_risk_customers.iter().map(|c| c.churn_probability).collect();
        assert!(probabilities.windows(2).all(|w| w[0] >= w[1]));

        let untrained = churn_risk_customers(&db, &ModelSet::default(), 0.7).unwrap();
        assert!(untrained.at_risk_customers.is_empty());
    }
}
