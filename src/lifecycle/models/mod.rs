//! Tabular models over the customers table.
//!
//! Every model is trained in-process from [`Customer`] rows and keeps its
//! `is_trained` flag so the API can answer with neutral defaults before the
//! first training run.

pub mod churn;
pub mod clv;
pub mod forecast;
pub mod lead_score;

use serde::Serialize;

use crate::config::AnalyticsConfig;
use crate::model::Customer;

pub use churn::{ChurnPrediction, ChurnPredictor};
pub use clv::{ClvCalculator, ClvEstimate};
pub use forecast::{MonthlyForecast, RevenueForecast, RevenueForecaster};
pub use lead_score::{LeadProfile, LeadScore, LeadScorer};

/// Number of columns produced by [`features`].
pub const FEATURE_COUNT: usize = 12;

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Usage, support, satisfaction and account-size columns of one customer.
#[must_use]
pub fn features(customer: &Customer) -> FeatureRow {
    let value = |field: Option<f64>| field.unwrap_or(0.0);
    [
        value(customer.tenure_months),
        value(customer.logins_per_month),
        value(customer.active_features_used),
        value(customer.product_usage_hours),
        value(customer.tickets_raised),
        value(customer.avg_support_response_hours),
        value(customer.nps_score),
        value(customer.renewals_count),
        if customer.expansion { 1.0 } else { 0.0 },
        value(customer.acv),
        value(customer.ltv),
        value(customer.company_size),
    ]
}

/// Per-column z-score scaling fitted on a training set.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    mean: FeatureRow,
    scale: FeatureRow,
}

impl Default for Standardizer {
    fn default() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }
}

impl Standardizer {
    #[must_use]
    pub fn fit(rows: &[FeatureRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = count_f64(rows.len());
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (acc, x) in mean.iter_mut().zip(row) {
                *acc += x / n;
            }
        }
        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for ((acc, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *acc += (x - m).powi(2) / n;
            }
        }
        // Constant columns keep unit scale.
        for s in &mut scale {
            *s = if *s > f64::EPSILON { s.sqrt() } else { 1.0 };
        }
        Self { mean, scale }
    }

    #[must_use]
    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) const fn count_f64(n: usize) -> f64 {
    n as f64
}

pub(crate) fn dot(weights: &FeatureRow, row: &FeatureRow) -> f64 {
    weights.iter().zip(row).map(|(w, x)| w * x).sum()
}

/// Trained flag of every model, as reported by health and training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelsStatus {
    pub churn_predictor: bool,
    pub revenue_forecaster: bool,
    pub lead_scorer: bool,
    pub clv_calculator: bool,
}

/// Outcome of [`ModelSet::train_all`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub message: String,
    pub rows: usize,
    pub models_status: ModelsStatus,
    /// Held-out accuracy of the churn classifier, when it trained.
    pub churn_accuracy: Option<f64>,
}

/// The four lifecycle models, trained together.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    pub churn: ChurnPredictor,
    pub forecaster: RevenueForecaster,
    pub lead_scorer: LeadScorer,
    pub clv: ClvCalculator,
}

impl ModelSet {
    #[must_use]
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            churn: ChurnPredictor::default(),
            forecaster: RevenueForecaster::new(
                config.forecast_base_revenue,
                config.forecast_growth_rate,
            ),
            lead_scorer: LeadScorer::default(),
            clv: ClvCalculator::default(),
        }
    }

    /// Retrain every model from `customers`.
    ///
    /// Models without enough rows stay (or become) untrained.
    pub fn train_all(&mut self, customers: &[Customer], config: &AnalyticsConfig) -> TrainingReport {
        let min_rows = config.min_training_rows;
        let churn_accuracy = self.churn.train(customers, min_rows, config.seed);
        self.forecaster.train(customers, min_rows);
        self.lead_scorer.train(customers, min_rows);
        self.clv.train(customers, min_rows);

        let models_status = self.status();
        tracing::info!(
            rows = customers.len(),
            churn = models_status.churn_predictor,
            forecast = models_status.revenue_forecaster,
            lead = models_status.lead_scorer,
            clv = models_status.clv_calculator,
            "lifecycle models trained"
        );
        TrainingReport {
            message: "Models trained successfully".to_string(),
            rows: customers.len(),
            models_status,
            churn_accuracy,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ModelsStatus {
        ModelsStatus {
            churn_predictor: self.churn.is_trained(),
            revenue_forecaster: self.forecaster.is_trained(),
            lead_scorer: self.lead_scorer.is_trained(),
            clv_calculator: self.clv.is_trained(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::model::Customer;

    /// A deterministic mix of healthy and churned accounts.
    pub fn training_customers(count: usize) -> Vec<Customer> {
        (0..count)
            .map(|i| {
                let churned = i % 3 == 0;
                let step = super::count_f64(i);
                Customer {
                    id: i64::try_from(i).unwrap() + 1,
                    email: format!("c{i}@example.com"),
                    industry: Some("Technology".into()),
                    is_customer: true,
                    churned,
                    conversion_date: NaiveDate::from_ymd_opt(2024, 1 + u32::try_from(i % 12).unwrap(), 1),
                    tenure_months: Some(if churned { 3.0 } else { 18.0 + step }),
                    logins_per_month: Some(if churned { 2.0 } else { 25.0 }),
                    active_features_used: Some(if churned { 1.0 } else { 8.0 }),
                    product_usage_hours: Some(if churned { 4.0 } else { 60.0 }),
                    tickets_raised: Some(if churned { 14.0 } else { 2.0 }),
                    avg_support_response_hours: Some(if churned { 30.0 } else { 6.0 }),
                    nps_score: Some(if churned { 10.0 } else { 75.0 }),
                    renewals_count: Some(if churned { 0.0 } else { 3.0 }),
                    expansion: !churned && i % 2 == 0,
                    acv: Some(10_000.0 + 1_000.0 * step),
                    ltv: Some(if churned { 5_000.0 } else { 40_000.0 + 2_000.0 * step }),
                    company_size: Some(50.0 + 10.0 * step),
                    forecasted_revenue: Some(12_000.0 + 500.0 * step),
                    lead_score: Some(40.0 + step),
                    ..Customer::default()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizer_centres_columns() {
        let mut a = [0.0; FEATURE_COUNT];
        let mut b = [0.0; FEATURE_COUNT];
        a[0] = 1.0;
        b[0] = 3.0;
        let scaler = Standardizer::fit(&[a, b]);
        let t = scaler.transform(&a);
        assert!((t[0] + 1.0).abs() < 1e-9);
        // Constant column passes through unscaled.
        assert!(t[5].abs() < 1e-9);
    }

    #[test]
    fn train_all_needs_enough_rows() {
        let config = AnalyticsConfig::default();
        let mut models = ModelSet::new(&config);
        let report = models.train_all(&fixtures::training_customers(3), &config);
        assert_eq!(report.models_status, ModelsStatus::default());

        let report = models.train_all(&fixtures::training_customers(30), &config);
        assert!(report.models_status.churn_predictor);
        assert!(report.models_status.revenue_forecaster);
        assert!(report.models_status.lead_scorer);
        assert!(report.models_status.clv_calculator);
        assert!(report.churn_accuracy.is_some());
    }
}
