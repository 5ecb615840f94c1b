//! Funnel counts, conversion rates and revenue KPIs.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::lifecycle::models::count_f64;
use crate::model::Customer;
use crate::storage::Database;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_f64(part) / count_f64(whole) * 100.0
    }
}

/// Mean of the present values, or 0.
fn mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / count_f64(present.len())
    }
}

fn mean_gap_days<'a>(
    customers: impl Iterator<Item = &'a Customer>,
    span: impl Fn(&Customer) -> (Option<NaiveDate>, Option<NaiveDate>),
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let gaps = customers.map(|c| match span(c) {
        (Some(from), Some(to)) => Some((to - from).num_days() as f64),
        _ => None,
    });
    mean(gaps)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleAnalytics {
    /// Every record, including those that progressed.
    pub total_leads: usize,
    pub total_mqls: usize,
    pub total_sqls: usize,
    pub total_customers: usize,
    pub churned_customers: usize,
    pub lead_to_mql_rate: f64,
    pub mql_to_sql_rate: f64,
    pub sql_to_customer_rate: f64,
    pub overall_conversion_rate: f64,
    pub churn_rate: f64,
    pub average_sales_cycle_days: f64,
    pub average_acv: f64,
    pub average_cac: f64,
    pub total_revenue: f64,
    pub average_clv: f64,
}

#[must_use]
pub fn summarize(customers: &[Customer]) -> LifecycleAnalytics {
    let total_leads = customers.len();
    let total_mqls = customers.iter().filter(|c| c.mql).count();
    let total_sqls = customers.iter().filter(|c| c.sql).count();
    let converted: Vec<&Customer> = customers.iter().filter(|c| c.is_customer).collect();
    let churned_customers = customers.iter().filter(|c| c.churned).count();

    LifecycleAnalytics {
        total_leads,
        total_mqls,
        total_sqls,
        total_customers: converted.len(),
        churned_customers,
        lead_to_mql_rate: percent(total_mqls, total_leads),
        mql_to_sql_rate: percent(total_sqls, total_mqls),
        sql_to_customer_rate: percent(converted.len(), total_sqls),
        overall_conversion_rate: percent(converted.len(), total_leads),
        churn_rate: percent(churned_customers, converted.len()),
        average_sales_cycle_days: mean(converted.iter().map(|c| c.sales_cycle_days)),
        average_acv: mean(converted.iter().map(|c| c.acv)),
        average_cac: mean(converted.iter().map(|c| c.cac)),
        total_revenue: converted.iter().filter_map(|c| c.acv).sum(),
        average_clv: mean(converted.iter().map(|c| c.ltv)),
    }
}

pub fn lifecycle_analytics(db: &Database) -> Result<LifecycleAnalytics> {
    Ok(summarize(&db.all_customers()?))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelMetrics {
    pub leads: usize,
    pub mqls: usize,
    pub sqls: usize,
    pub customers: usize,
    pub churned: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRates {
    pub lead_to_mql: f64,
    pub mql_to_sql: f64,
    pub sql_to_customer: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeMetrics {
    pub average_sales_cycle_days: f64,
    pub average_days_lead_to_mql: f64,
    pub average_days_mql_to_sql: f64,
    pub average_days_sql_to_customer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub funnel_metrics: FunnelMetrics,
    pub conversion_rates: ConversionRates,
    pub time_metrics: TimeMetrics,
}

pub fn conversion_rates(db: &Database) -> Result<ConversionReport> {
    let customers = db.all_customers()?;
    let analytics = summarize(&customers);
    Ok(ConversionReport {
        funnel_metrics: FunnelMetrics {
            leads: analytics.total_leads,
            mqls: analytics.total_mqls,
            sqls: analytics.total_sqls,
            customers: analytics.total_customers,
            churned: analytics.churned_customers,
        },
        conversion_rates: ConversionRates {
            lead_to_mql: analytics.lead_to_mql_rate,
            mql_to_sql: analytics.mql_to_sql_rate,
            sql_to_customer: analytics.sql_to_customer_rate,
            overall: analytics.overall_conversion_rate,
        },
        time_metrics: TimeMetrics {
            average_sales_cycle_days: analytics.average_sales_cycle_days,
            average_days_lead_to_mql: mean_gap_days(customers.iter(), |c| {
                (c.lead_creation_date, c.mql_date)
            }),
            average_days_mql_to_sql: mean_gap_days(customers.iter(), |c| (c.mql_date, c.sql_date)),
            average_days_sql_to_customer: mean_gap_days(customers.iter(), |c| {
                (c.sql_date, c.conversion_date)
            }),
        },
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevenueMetrics {
    pub total_revenue: f64,
    pub monthly_recurring_revenue: f64,
    pub annual_recurring_revenue: f64,
    pub average_deal_size: f64,
    pub customer_acquisition_cost: f64,
    pub customer_lifetime_value: f64,
    pub payback_period_months: f64,
    pub churn_rate: f64,
    pub expansion_revenue: f64,
}

/// Revenue KPIs of customers converted within `[start, end]`.
///
/// The churn rate is computed over every converted customer, not just the
/// window.
pub fn revenue_metrics(
    db: &Database,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<RevenueMetrics> {
    let all = db.all_customers()?;
    let in_window = |c: &&Customer| {
        c.is_customer
            && start.is_none_or(|s| c.conversion_date.is_some_and(|d| d >= s))
            && end.is_none_or(|e| c.conversion_date.is_some_and(|d| d <= e))
    };
    let customers: Vec<&Customer> = all.iter().filter(in_window).collect();
    if customers.is_empty() {
        return Ok(RevenueMetrics::default());
    }

    let count = count_f64(customers.len());
    let total_revenue: f64 = customers.iter().filter_map(|c| c.acv).sum();
    let average_deal_size = total_revenue / count;
    let customer_acquisition_cost = customers.iter().filter_map(|c| c.cac).sum::<f64>() / count;
    let customer_lifetime_value = customers.iter().filter_map(|c| c.ltv).sum::<f64>() / count;
    let payback_period_months = if average_deal_size > 0.0 {
        customer_acquisition_cost / (average_deal_size / 12.0)
    } else {
        0.0
    };
    let converted = all.iter().filter(|c| c.is_customer).count();
    let churned = all.iter().filter(|c| c.churned).count();

    Ok(RevenueMetrics {
        total_revenue,
        monthly_recurring_revenue: total_revenue / 12.0,
        annual_recurring_revenue: total_revenue,
        average_deal_size,
        customer_acquisition_cost,
        customer_lifetime_value,
        payback_period_months,
        churn_rate: percent(churned, converted),
        expansion_revenue: customers
            .iter()
            .filter(|c| c.expansion)
            .filter_map(|c| c.acv)
            .sum(),
    })
}
