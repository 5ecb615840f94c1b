//! Churn classifier: logistic regression trained by batch gradient descent.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::{FEATURE_COUNT, FeatureRow, Standardizer, count_f64, dot, features};
use crate::model::Customer;

const EPOCHS: usize = 400;
const LEARNING_RATE: f64 = 0.1;
const L2: f64 = 1e-3;
const HOLDOUT_SHARE: f64 = 0.2;

/// Rule-based factors, checked in order, each with its recommended action.
const RULES: [(fn(&Customer) -> bool, &str, &str); 6] = [
    (
        |c| c.nps_score.unwrap_or(0.0) < 30.0,
        "Low NPS Score",
        "Schedule customer success call to address satisfaction",
    ),
    (
        |c| c.logins_per_month.unwrap_or(0.0) < 5.0,
        "Low Login Frequency",
        "Implement user engagement campaign",
    ),
    (
        |c| c.active_features_used.unwrap_or(0.0) < 3.0,
        "Limited Feature Usage",
        "Provide feature training and onboarding",
    ),
    (
        |c| c.tickets_raised.is_some_and(|v| v > 10.0),
        "High Support Ticket Volume",
        "Proactive account review and technical optimization",
    ),
    (
        |c| c.avg_support_response_hours.is_some_and(|v| v > 24.0),
        "Slow Support Response",
        "Prioritize support response for this customer",
    ),
    (
        |c| !c.expansion && c.tenure_months.is_some_and(|v| v > 12.0),
        "No Account Expansion",
        "Present upselling and expansion opportunities",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnPrediction {
    pub customer_id: i64,
    pub churn_probability: f64,
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub prediction_confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ChurnPredictor {
    scaler: Standardizer,
    weights: FeatureRow,
    bias: f64,
    trained: bool,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[must_use]
pub fn risk_level(probability: f64) -> &'static str {
    if probability < 0.3 {
        "Low"
    } else if probability < 0.7 {
        "Medium"
    } else {
        "High"
    }
}

impl ChurnPredictor {
    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.trained
    }

    /// Fit on `customers`, returning held-out accuracy.
    ///
    /// Leaves the model untrained (and returns `None`) with fewer than
    /// `min_rows` rows or when only one class is present.
    pub fn train(&mut self, customers: &[Customer], min_rows: usize, seed: u64) -> Option<f64> {
        self.trained = false;
        let churned = customers.iter().filter(|c| c.churned).count();
        if customers.len() < min_rows.max(2) || churned == 0 || churned == customers.len() {
            tracing::debug!(rows = customers.len(), churned, "churn model not trained");
            return None;
        }

        let rows: Vec<FeatureRow> = customers.iter().map(features).collect();
        let labels: Vec<f64> = customers
            .iter()
            .map(|c| if c.churned { 1.0 } else { 0.0 })
            .collect();

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        let holdout = holdout_len(rows.len());
        let (test, train) = order.split_at(holdout);

        let train_rows: Vec<FeatureRow> = train.iter().map(|&i| rows[i]).collect();
        self.scaler = Standardizer::fit(&train_rows);
        let scaled: Vec<FeatureRow> = train_rows.iter().map(|r| self.scaler.transform(r)).collect();
        let targets: Vec<f64> = train.iter().map(|&i| labels[i]).collect();
        self.fit(&scaled, &targets);
        self.trained = true;

        let correct = test
            .iter()
            .filter(|&&i| {
                let p = self.probability(&rows[i]);
                (p >= 0.5) == (labels[i] > 0.5)
            })
            .count();
        let accuracy = if test.is_empty() {
            1.0
        } else {
            count_f64(correct) / count_f64(test.len())
        };
        tracing::info!(accuracy, "churn model trained");
        Some(accuracy)
    }

    fn fit(&mut self, rows: &[FeatureRow], targets: &[f64]) {
        let n = count_f64(rows.len());
        self.weights = [0.0; FEATURE_COUNT];
        self.bias = 0.0;
        for _ in 0..EPOCHS {
            let mut grad = [0.0; FEATURE_COUNT];
            let mut grad_bias = 0.0;
            for (row, y) in rows.iter().zip(targets) {
                let err = sigmoid(dot(&self.weights, row) + self.bias) - y;
                for (g, x) in grad.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_bias += err;
            }
            for (w, g) in self.weights.iter_mut().zip(&grad) {
                *w -= LEARNING_RATE * (g / n + L2 * *w);
            }
            self.bias -= LEARNING_RATE * grad_bias / n;
        }
    }

    fn probability(&self, row: &FeatureRow) -> f64 {
        sigmoid(dot(&self.weights, &self.scaler.transform(row)) + self.bias)
    }

    #[must_use]
    pub fn predict(&self, customer: &Customer) -> ChurnPrediction {
        if !self.trained {
            return ChurnPrediction {
                customer_id: customer.id,
                churn_probability: 0.5,
                risk_level: "Unknown".to_string(),
                risk_factors: vec!["Model not trained".to_string()],
                recommendations: vec!["Train the model with sufficient data".to_string()],
                prediction_confidence: 0.0,
            };
        }

        let probability = self.probability(&features(customer));
        let (risk_factors, recommendations) = RULES
            .iter()
            .filter(|(applies, _, _)| applies(customer))
            .map(|(_, factor, action)| ((*factor).to_string(), (*action).to_string()))
            .unzip();
        ChurnPrediction {
            customer_id: customer.id,
            churn_probability: probability,
            risk_level: risk_level(probability).to_string(),
            risk_factors,
            recommendations,
            prediction_confidence: probability.max(1.0 - probability),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn holdout_len(rows: usize) -> usize {
    ((count_f64(rows) * HOLDOUT_SHARE).round() as usize).min(rows - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::models::fixtures::training_customers;

    #[test]
    fn untrained_prediction_is_neutral() {
        let prediction = ChurnPredictor::default().predict(&Customer::default());
        assert!((prediction.churn_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(prediction.risk_level, "Unknown");
        assert_eq!(prediction.risk_factors, ["Model not trained"]);
        assert!(prediction.prediction_confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn single_class_does_not_train() {
        let healthy: Vec<Customer> = training_customers(30)
            .into_iter()
            .filter(|c| !c.churned)
            .collect();
        let mut model = ChurnPredictor::default();
        assert!(model.train(&healthy, 10, 42).is_none());
        assert!(!model.is_trained());
    }

    #[test]
    fn separates_churned_accounts() {
        let customers = training_customers(30);
        let mut model = ChurnPredictor::default();
        let accuracy = model.train(&customers, 10, 42).unwrap();
        assert!(accuracy >= 0.8, "accuracy {accuracy}");

        let at_risk = model.predict(&customers[0]);
        assert!(at_risk.churn_probability > 0.5);
        assert!(at_risk.risk_factors.contains(&"Low NPS Score".to_string()));
        assert_eq!(at_risk.risk_factors.len(), at_risk.recommendations.len());

        let healthy = model.predict(&customers[1]);
        assert!(healthy.churn_probability < 0.5);
        assert!(healthy.prediction_confidence >= 0.5);
    }

    #[test]
    fn missing_engagement_data_counts_as_zero() {
        let mut customers = training_customers(30);
        let mut model = ChurnPredictor::default();
        model.train(&customers, 10, 42).unwrap();

        let customer = &mut customers[1];
        customer.nps_score = None;
        customer.logins_per_month = None;
        customer.active_features_used = None;
        let prediction = model.predict(customer);
        for factor in ["Low NPS Score", "Low Login Frequency", "Limited Feature Usage"] {
            assert!(
                prediction.risk_factors.contains(&factor.to_string()),
                "{:?}",
                prediction.risk_factors
            );
        }
        // absent ticket and response data never flag
        customer.tickets_raised = None;
        customer.avg_support_response_hours = None;
        let prediction = model.predict(customer);
        assert!(!prediction.risk_factors.contains(&"High Support Ticket Volume".to_string()));
        assert!(!prediction.risk_factors.contains(&"Slow Support Response".to_string()));
    }

    #[test]
    fn risk_levels() {
        assert_eq!(risk_level(0.1), "Low");
        assert_eq!(risk_level(0.3), "Medium");
        assert_eq!(risk_level(0.7), "High");
    }
}
