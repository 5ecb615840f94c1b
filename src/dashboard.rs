//! Pipeline metrics for the dashboard views.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::{Deal, DealStatus, LOST_STAGE, WON_STAGE};
use crate::storage::Database;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_deals: usize,
    pub total_pipeline_value: f64,
    pub deals_by_status: BTreeMap<String, usize>,
    pub average_deal_size: f64,
    pub conversion_rate: f64,
    pub active_persons: u64,
    pub overdue_deals: usize,
    pub closed_deals: usize,
    pub active_deals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub person_workloads: Vec<serde_json::Value>,
    pub recent_ai_insights: Vec<serde_json::Value>,
}

pub fn dashboard(db: &Database, now: DateTime<Utc>) -> Result<Dashboard> {
    let deals = db.all_deals()?;
    let total_deals = deals.len();
    let total_pipeline_value: f64 = deals.iter().map(Deal::value).sum();

    let mut deals_by_status: BTreeMap<String, usize> = DealStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for deal in &deals {
        *deals_by_status.entry(deal.status.as_str().to_string()).or_default() += 1;
    }

    let (closed, active): (Vec<&Deal>, Vec<&Deal>) =
        deals.iter().partition(|deal| deal.status.is_closed());
    let today = now.date_naive();
    let overdue_deals = active
        .iter()
        .filter(|deal| deal.expected_close_date.is_some_and(|date| date < today))
        .count();

    let metrics = DashboardMetrics {
        total_deals,
        total_pipeline_value,
        deals_by_status,
        average_deal_size: ratio(total_pipeline_value, active.len()),
        conversion_rate: ratio(count_f64(closed.len()), total_deals),
        active_persons: db.count_persons()?,
        overdue_deals,
        closed_deals: closed.len(),
        active_deals: active.len(),
    };
    tracing::debug!(total_deals, active = metrics.active_deals, "dashboard computed");

    Ok(Dashboard {
        metrics,
        person_workloads: Vec::new(),
        recent_ai_insights: Vec::new(),
    })
}

#[allow(clippy::cast_precision_loss)]
const fn count_f64(count: usize) -> f64 {
    count as f64
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count_f64(count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub amount: f64,
    pub new_pipeline: f64,
    pub deals_closed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySales {
    pub country: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSales {
    pub stage: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadSourceSales {
    pub source: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSales {
    pub account: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub revenue: f64,
    pub deals: usize,
    pub contacts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_pipeline: f64,
    pub total_sales: f64,
    pub total_contacts: u64,
    pub avg_deal_size: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub historical_sales: Vec<MonthlySales>,
    pub country_analysis: Vec<CountrySales>,
    pub stage_analysis: Vec<StageSales>,
    pub lead_source_analysis: Vec<LeadSourceSales>,
    pub top_accounts: Vec<AccountSales>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub summary: AnalyticsSummary,
}

/// Board column to sales-funnel stage. Two funnel stages have no column.
const SALES_STAGES: [(&str, Option<DealStatus>); 8] = [
    ("Prospecting", Some(DealStatus::Lead)),
    ("Qualification", Some(DealStatus::QualifiedSolution)),
    ("Needs Analysis", Some(DealStatus::QualifiedDelivery)),
    ("Value Proposition", Some(DealStatus::QualifiedCso)),
    ("Id. Decision Makers", None),
    ("Perception Analysis", None),
    ("Proposal/Price Quote", Some(DealStatus::Deal)),
    ("Negotiation/Review", Some(DealStatus::Project)),
];

const LEAD_SOURCE_SHARES: [(&str, f64); 6] = [
    ("Web", 0.35),
    ("Inquiry", 0.25),
    ("Phone Inquiry", 0.15),
    ("Partner Referral", 0.10),
    ("Purchased List", 0.08),
    ("Other Sources", 0.07),
];

/// First day of each of the last `count` calendar months, oldest first.
fn recent_months(now: DateTime<Utc>, count: i32) -> Vec<NaiveDate> {
    let current = now.year() * 12 + i32::try_from(now.month0()).unwrap_or(0);
    (0..count)
        .rev()
        .filter_map(|back| {
            let index = current - back;
            let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
            NaiveDate::from_ymd_opt(index.div_euclid(12), month, 1)
        })
        .collect()
}

fn same_month(date: DateTime<Utc>, month: NaiveDate) -> bool {
    date.year() == month.year() && date.month() == month.month()
}

fn month_label(month: NaiveDate) -> String {
    month.format("%b %Y").to_string()
}

/// Group by key, summing value, sorted by amount descending then key.
fn ranked(deals: &[Deal], key: impl Fn(&Deal) -> String) -> Vec<(String, f64, usize)> {
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();
    for deal in deals {
        let entry = totals.entry(key(deal)).or_default();
        entry.0 += deal.value();
        entry.1 += 1;
    }
    let mut rows: Vec<(String, f64, usize)> = totals
        .into_iter()
        .map(|(name, (amount, count))| (name, amount, count))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Sales analytics computed from stored deals. Every figure is derived from
/// data; only the lead-source split uses fixed proportions.
pub fn analytics(db: &Database, now: DateTime<Utc>, default_win_rate: f64) -> Result<Analytics> {
    let deals = db.all_deals()?;
    let contacts = db.all_contacts()?;
    let total_pipeline: f64 = deals.iter().map(Deal::value).sum();

    let historical_sales = recent_months(now, 12)
        .into_iter()
        .map(|month| {
            let closed: Vec<&Deal> = deals
                .iter()
                .filter(|deal| deal.status.is_closed())
                .filter(|deal| same_month(deal.actual_close_date.unwrap_or(deal.updated_at), month))
                .collect();
            MonthlySales {
                month: month_label(month),
                amount: closed.iter().map(|deal| deal.value()).sum(),
                new_pipeline: deals
                    .iter()
                    .filter(|deal| same_month(deal.created_at, month))
                    .map(Deal::value)
                    .sum(),
                deals_closed: closed.len(),
            }
        })
        .collect();

    let country_analysis = ranked(&deals, |deal| {
        deal.country.clone().unwrap_or_else(|| "Unknown".to_string())
    })
    .into_iter()
    .take(8)
    .map(|(country, amount, count)| CountrySales {
        country,
        amount,
        count,
    })
    .collect();

    let stage_analysis = SALES_STAGES
        .iter()
        .map(|(stage, status)| {
            let in_stage = deals.iter().filter(|deal| Some(deal.status) == *status);
            let (amount, count) = in_stage.fold((0.0, 0), |(sum, n), deal| (sum + deal.value(), n + 1));
            StageSales {
                stage: (*stage).to_string(),
                amount,
                count,
            }
        })
        .collect();

    let lead_source_analysis = LEAD_SOURCE_SHARES
        .iter()
        .map(|(source, share)| LeadSourceSales {
            source: (*source).to_string(),
            amount: (total_pipeline * share).trunc(),
            count: usize::max(1, floor_share(deals.len(), *share)),
        })
        .collect();

    let top_accounts = ranked(&deals, |deal| {
        deal.customer_name.clone().unwrap_or_else(|| "Unknown".to_string())
    })
    .into_iter()
    .take(6)
    .map(|(account, amount, count)| AccountSales {
        account,
        amount,
        count,
    })
    .collect();

    let monthly_trends = recent_months(now, 6)
        .into_iter()
        .map(|month| {
            let created: Vec<&Deal> = deals
                .iter()
                .filter(|deal| same_month(deal.created_at, month))
                .collect();
            MonthlyTrend {
                month: month_label(month),
                revenue: created.iter().map(|deal| deal.value()).sum(),
                deals: created.len(),
                contacts: contacts
                    .iter()
                    .filter(|contact| same_month(contact.created_at, month))
                    .count(),
            }
        })
        .collect();

    let won = deals.iter().filter(|deal| deal.is_won()).count();
    let lost = deals
        .iter()
        .filter(|deal| deal.deal_stage.as_deref() == Some(LOST_STAGE))
        .count();
    let win_rate = if won + lost == 0 {
        default_win_rate
    } else {
        count_f64(won) / count_f64(won + lost)
    };

    let summary = AnalyticsSummary {
        total_pipeline,
        total_sales: deals
            .iter()
            .filter(|deal| deal.deal_stage.as_deref() == Some(WON_STAGE))
            .map(Deal::value)
            .sum(),
        total_contacts: u64::try_from(contacts.len()).unwrap_or(u64::MAX),
        avg_deal_size: ratio(total_pipeline, deals.len()),
        win_rate,
    };

    Ok(Analytics {
        historical_sales,
        country_analysis,
        stage_analysis,
        lead_source_analysis,
        top_accounts,
        monthly_trends,
        summary,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_share(count: usize, share: f64) -> usize {
    (count_f64(count) * share).floor() as usize
}
