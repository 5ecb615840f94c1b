//! Monthly revenue projection with quarterly seasonality.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use super::count_f64;
use crate::model::Customer;

const SEASONALITY: [(&str, f64); 4] = [("Q1", 0.9), ("Q2", 1.1), ("Q3", 0.95), ("Q4", 1.15)];
const INTERVAL: f64 = 0.15;
/// Fewest distinct conversion months for a fitted trend.
const MIN_TREND_MONTHS: usize = 3;
const MAX_GROWTH: f64 = 0.5;
/// Longest horizon [`RevenueForecaster::forecast`] will project.
pub const MAX_FORECAST_MONTHS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyForecast {
    pub month: u32,
    pub predicted_revenue: f64,
    /// `YYYY-MM`.
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueForecast {
    pub forecast_period: String,
    pub predicted_revenue: f64,
    pub confidence_interval_lower: f64,
    pub confidence_interval_upper: f64,
    pub monthly_forecast: Vec<MonthlyForecast>,
    pub growth_rate: f64,
    pub seasonality_factors: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct RevenueForecaster {
    default_base: f64,
    default_growth: f64,
    base: f64,
    growth: f64,
    trained: bool,
}

impl Default for RevenueForecaster {
    fn default() -> Self {
        Self::new(100_000.0, 0.05)
    }
}

/// Seasonality multiplier for a calendar month (1-12).
#[must_use]
pub fn seasonality(month: u32) -> f64 {
    let quarter = usize::try_from((month.clamp(1, 12) - 1) / 3).unwrap_or(0);
    SEASONALITY[quarter].1
}

impl RevenueForecaster {
    #[must_use]
    pub const fn new(base: f64, growth: f64) -> Self {
        Self {
            default_base: base,
            default_growth: growth,
            base,
            growth,
            trained: false,
        }
    }

    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.trained
    }

    #[must_use]
    pub const fn growth_rate(&self) -> f64 {
        self.growth
    }

    /// Needs `min_rows` rows carrying both forecasted revenue and ACV.
    ///
    /// The base and growth come from a least-squares line through monthly
    /// ACV by conversion month, or the configured values when that history
    /// is too short or not increasing sensibly.
    pub fn train(&mut self, customers: &[Customer], min_rows: usize) {
        let usable = customers
            .iter()
            .filter(|c| c.forecasted_revenue.is_some_and(|v| v > 0.0) && c.acv.is_some_and(|v| v > 0.0))
            .count();
        self.trained = usable >= min_rows.max(1);
        self.base = self.default_base;
        self.growth = self.default_growth;
        if !self.trained {
            tracing::debug!(usable, "revenue forecaster not trained");
            return;
        }

        if let Some((base, growth)) = fit_trend(&monthly_acv(customers)) {
            self.base = base;
            self.growth = growth;
        }
        tracing::info!(base = self.base, growth = self.growth, "revenue forecaster trained");
    }

    /// Horizons past [`MAX_FORECAST_MONTHS`] are truncated to it.
    #[must_use]
    pub fn forecast(&self, months_ahead: u32, now: DateTime<Utc>) -> RevenueForecast {
        let months_ahead = months_ahead.min(MAX_FORECAST_MONTHS);
        let forecast_period = format!("{months_ahead} months");
        if !self.trained {
            return RevenueForecast {
                forecast_period,
                predicted_revenue: 0.0,
                confidence_interval_lower: 0.0,
                confidence_interval_upper: 0.0,
                monthly_forecast: Vec::new(),
                growth_rate: 0.0,
                seasonality_factors: BTreeMap::new(),
            };
        }

        let monthly_forecast: Vec<MonthlyForecast> = (1..=months_ahead)
            .map_while(|month| {
                let date = now.checked_add_signed(Duration::days(30 * i64::from(month)))?;
                let compounded = (1.0 + self.growth).powi(i32::try_from(month).unwrap_or(i32::MAX));
                Some(MonthlyForecast {
                    month,
                    predicted_revenue: self.base * compounded * seasonality(date.month()),
                    period: date.format("%Y-%m").to_string(),
                })
            })
            .collect();
        let total: f64 = monthly_forecast.iter().map(|m| m.predicted_revenue).sum();

        RevenueForecast {
            forecast_period,
            predicted_revenue: total,
            confidence_interval_lower: total * (1.0 - INTERVAL),
            confidence_interval_upper: total * (1.0 + INTERVAL),
            monthly_forecast,
            growth_rate: self.growth,
            seasonality_factors: SEASONALITY
                .iter()
                .map(|(quarter, factor)| ((*quarter).to_string(), *factor))
                .collect(),
        }
    }
}

/// ACV summed per calendar month from the first conversion to the last,
/// with months that had no conversions filled as zero.
fn monthly_acv(customers: &[Customer]) -> Vec<f64> {
    let mut monthly: BTreeMap<i32, f64> = BTreeMap::new();
    for customer in customers {
        if let (Some(date), Some(acv)) = (customer.conversion_date, customer.acv) {
            let index = date.year() * 12 + i32::try_from(date.month0()).unwrap_or(0);
            *monthly.entry(index).or_default() += acv;
        }
    }
    let (Some(first), Some(last)) = (monthly.keys().next(), monthly.keys().next_back()) else {
        return Vec::new();
    };
    (*first..=*last)
        .map(|index| monthly.get(&index).copied().unwrap_or(0.0))
        .collect()
}

/// Least-squares line through `series`; returns the fitted last value and
/// the slope relative to it.
fn fit_trend(series: &[f64]) -> Option<(f64, f64)> {
    if series.len() < MIN_TREND_MONTHS {
        return None;
    }
    let n = count_f64(series.len());
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / n;
    let (mut cov, mut var) = (0.0, 0.0);
    for (i, y) in series.iter().enumerate() {
        let dx = count_f64(i) - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }
    let slope = cov / var;
    let last = mean_y + slope * (n - 1.0 - mean_x);
    if last <= 0.0 {
        return None;
    }
    Some((last, (slope / last).clamp(-MAX_GROWTH, MAX_GROWTH)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::lifecycle::models::fixtures::training_customers;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn untrained_forecast_is_empty() {
        let forecast = RevenueForecaster::default().forecast(6, now());
        assert_eq!(forecast.forecast_period, "6 months");
        assert!(forecast.monthly_forecast.is_empty());
        assert!(forecast.seasonality_factors.is_empty());
        assert!(forecast.predicted_revenue.abs() < f64::EPSILON);
    }

    #[test]
    fn compounding_with_seasonality() {
        let mut model = RevenueForecaster::new(100_000.0, 0.05);
        // Conversions all fall in one month, so the configured trend is kept.
        let customers: Vec<Customer> = training_customers(12)
            .into_iter()
            .map(|mut c| {
                c.conversion_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
                c
            })
            .collect();
        model.train(&customers, 10);
        assert!(model.is_trained());

        let forecast = model.forecast(3, now());
        assert_eq!(forecast.monthly_forecast.len(), 3);
        let first = &forecast.monthly_forecast[0];
        assert_eq!(first.period, "2025-02");
        assert!((first.predicted_revenue - 100_000.0 * 1.05 * 0.9).abs() < 1e-6);
        assert!(
            (forecast.confidence_interval_upper - forecast.predicted_revenue * 1.15).abs() < 1e-6
        );
        assert_eq!(forecast.seasonality_factors.len(), 4);
    }

    #[test]
    fn trend_fit_tracks_growth() {
        let (base, growth) = fit_trend(&[100.0, 110.0, 120.0, 130.0]).unwrap();
        assert!((base - 130.0).abs() < 1e-9);
        assert!((growth - 10.0 / 130.0).abs() < 1e-9);
        assert!(fit_trend(&[100.0, 110.0]).is_none());
    }

    #[test]
    fn horizon_is_capped() {
        let mut model = RevenueForecaster::new(100_000.0, 0.05);
        model.train(&training_customers(12), 10);
        assert!(model.is_trained());

        let forecast = model.forecast(4_000_000, now());
        assert_eq!(forecast.forecast_period, "120 months");
        assert_eq!(forecast.monthly_forecast.len(), MAX_FORECAST_MONTHS as usize);
    }

    #[test]
    fn gaps_between_conversion_months_are_zero_filled() {
        let month = |m| chrono::NaiveDate::from_ymd_opt(2024, m, 15);
        let customers: Vec<Customer> = training_customers(3)
            .into_iter()
            .zip([month(1), month(4), month(4)])
            .map(|(mut c, date)| {
                c.conversion_date = date;
                c.acv = Some(1_000.0);
                c
            })
            .collect();
        assert_eq!(monthly_acv(&customers), vec![1_000.0, 0.0, 0.0, 2_000.0]);
        assert!(monthly_acv(&[]).is_empty());
    }

    #[test]
    fn quarters() {
        assert!((seasonality(1) - 0.9).abs() < f64::EPSILON);
        assert!((seasonality(6) - 1.1).abs() < f64::EPSILON);
        assert!((seasonality(12) - 1.15).abs() < f64::EPSILON);
    }
}
