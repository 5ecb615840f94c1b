//! Customer lifetime value: ridge least squares over the customer features.

use serde::Serialize;

use super::{FEATURE_COUNT, FeatureRow, Standardizer, count_f64, dot, features};
use crate::model::Customer;

/// Column of [`features`] holding the LTV target itself.
const LTV_COLUMN: usize = 10;
const RIDGE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClvEstimate {
    pub customer_id: i64,
    pub estimated_clv: f64,
    pub confidence_score: f64,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClvCalculator {
    scaler: Standardizer,
    weights: FeatureRow,
    intercept: f64,
    trained: bool,
}

fn clv_features(customer: &Customer) -> FeatureRow {
    let mut row = features(customer);
    row[LTV_COLUMN] = 0.0;
    row
}

impl ClvCalculator {
    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.trained
    }

    /// Fit on converted customers with a known LTV.
    pub fn train(&mut self, customers: &[Customer], min_rows: usize) {
        self.trained = false;
        let (rows, targets): (Vec<FeatureRow>, Vec<f64>) = customers
            .iter()
            .filter(|c| c.is_customer)
            .filter_map(|c| c.ltv.filter(|ltv| *ltv > 0.0).map(|ltv| (clv_features(c), ltv)))
            .unzip();
        if rows.len() < min_rows.max(2) {
            tracing::debug!(rows = rows.len(), "clv model not trained");
            return;
        }

        self.scaler = Standardizer::fit(&rows);
        let scaled: Vec<FeatureRow> = rows.iter().map(|r| self.scaler.transform(r)).collect();
        let n = count_f64(targets.len());
        self.intercept = targets.iter().sum::<f64>() / n;

        // Normal equations (XᵀX + λnI) w = Xᵀ(y - ȳ) on centred columns.
        let mut gram = [[0.0; FEATURE_COUNT]; FEATURE_COUNT];
        let mut rhs = [0.0; FEATURE_COUNT];
        for (row, y) in scaled.iter().zip(&targets) {
            for i in 0..FEATURE_COUNT {
                rhs[i] += row[i] * (y - self.intercept);
                for j in 0..FEATURE_COUNT {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, line) in gram.iter_mut().enumerate() {
            line[i] += RIDGE * n;
        }
        let Some(weights) = solve(gram, rhs) else {
            tracing::warn!("clv normal equations are singular");
            return;
        };
        self.weights = weights;
        self.trained = true;
        tracing::info!(rows = scaled.len(), "clv model trained");
    }

    #[must_use]
    pub fn calculate(&self, customer: &Customer) -> ClvEstimate {
        if !self.trained || !customer.is_customer {
            let acv = customer.acv.unwrap_or(0.0);
            let tenure = customer.tenure_months.unwrap_or(12.0);
            return ClvEstimate {
                customer_id: customer.id,
                estimated_clv: acv * (tenure / 12.0) * 1.2,
                confidence_score: 0.5,
                factors: vec!["Basic calculation - insufficient training data".to_string()],
            };
        }

        let scaled = self.scaler.transform(&clv_features(customer));
        let estimated_clv = (self.intercept + dot(&self.weights, &scaled)).max(0.0);
        let confidence_score = if customer.tenure_months.unwrap_or(0.0) > 6.0 {
            0.8
        } else {
            0.6
        };

        let mut factors = Vec::new();
        if customer.expansion {
            factors.push("Account expansion potential".to_string());
        }
        if customer.nps_score.unwrap_or(0.0) > 70.0 {
            factors.push("High customer satisfaction".to_string());
        }
        if customer.renewals_count.unwrap_or(0.0) > 2.0 {
            factors.push("Strong renewal history".to_string());
        }
        if customer.logins_per_month.unwrap_or(0.0) > 20.0 {
            factors.push("High product engagement".to_string());
        }

        ClvEstimate {
            customer_id: customer.id,
            estimated_clv,
            confidence_score,
            factors,
        }
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(
    mut a: [[f64; FEATURE_COUNT]; FEATURE_COUNT],
    mut b: FeatureRow,
) -> Option<FeatureRow> {
    for col in 0..FEATURE_COUNT {
        let pivot = (col..FEATURE_COUNT).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..FEATURE_COUNT {
            let factor = a[row][col] / a[col][col];
            for k in col..FEATURE_COUNT {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0; FEATURE_COUNT];
    for row in (0..FEATURE_COUNT).rev() {
        let tail: f64 = (row + 1..FEATURE_COUNT).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
