//! Won accounts: satisfaction, health and delivery progress.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SbError};
use crate::model::{CustomerSatisfaction, Deal, HealthStatus, Person};
use crate::storage::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    DealValue,
    #[default]
    CloseDate,
    CustomerName,
}

impl SortBy {
    /// Unknown keys sort by close date.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("deal_value") => Self::DealValue,
            Some("customer_name") => Self::CustomerName,
            _ => Self::CloseDate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        if raw.map(str::trim) == Some("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthDistribution {
    #[serde(rename = "Green")]
    pub green: usize,
    #[serde(rename = "Yellow")]
    pub yellow: usize,
    #[serde(rename = "Red")]
    pub red: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessSummary {
    pub total_customers: usize,
    pub total_revenue: f64,
    pub average_deal_size: f64,
    pub average_satisfaction_score: f64,
    pub average_nps_score: f64,
    pub health_status_distribution: HealthDistribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedPerson {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

impl AssignedPerson {
    fn from_person(person: Option<Person>) -> Self {
        person.map_or(
            Self {
                name: None,
                email: None,
                department: None,
            },
            |p| Self {
                name: Some(p.name),
                email: Some(p.email),
                department: p.department,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatisfactionSnapshot {
    pub overall_score: Option<f64>,
    pub nps_score: Option<f64>,
    pub health_status: Option<HealthStatus>,
    pub implementation_status: Option<String>,
    pub completion_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub id: i64,
    pub customer_name: Option<String>,
    pub deal_title: String,
    pub deal_value: Option<f64>,
    pub close_date: Option<DateTime<Utc>>,
    pub assigned_person: AssignedPerson,
    pub region: Option<String>,
    pub country: Option<String>,
    pub satisfaction: Option<SatisfactionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub customer_requirements: Option<String>,
    pub business_goals: Option<String>,
    pub pain_points: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetail {
    pub deal: Deal,
    pub assigned_person: AssignedPerson,
    pub satisfaction: Option<CustomerSatisfaction>,
    pub conversation: Option<ConversationSnapshot>,
}

fn won_deals(db: &Database) -> Result<Vec<Deal>> {
    Ok(db.all_deals()?.into_iter().filter(Deal::is_won).collect())
}

fn require_won(db: &Database, deal_id: i64) -> Result<Deal> {
    db.get_deal(deal_id)?
        .filter(Deal::is_won)
        .ok_or_else(|| SbError::NotFound("Customer not found or deal not closed".to_string()))
}

fn assigned(db: &Database, deal: &Deal) -> Result<AssignedPerson> {
    let person = match deal.assigned_person_id {
        Some(id) => db.get_person(id)?,
        None => None,
    };
    Ok(AssignedPerson::from_person(person))
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let len = values.len();
    if len == 0 {
        0.0
    } else {
        values.sum::<f64>() / len as f64
    }
}

pub fn summary(db: &Database) -> Result<SuccessSummary> {
    let deals = won_deals(db)?;
    let total_revenue: f64 = deals.iter().map(Deal::value).sum();
    let satisfaction = db.all_satisfaction()?;

    let mut health = HealthDistribution::default();
    for record in &satisfaction {
        match record.customer_health_status {
            Some(HealthStatus::Green) => health.green += 1,
            Some(HealthStatus::Yellow) => health.yellow += 1,
            Some(HealthStatus::Red) => health.red += 1,
            None => {}
        }
    }

    let avg_satisfaction = mean(
        satisfaction
            .iter()
            .map(|s| s.overall_satisfaction_score.unwrap_or(0.0)),
    );
    let avg_nps = mean(satisfaction.iter().map(|s| s.nps_score.unwrap_or(0.0)));

    Ok(SuccessSummary {
        total_customers: deals.len(),
        total_revenue,
        average_deal_size: mean(deals.iter().map(Deal::value)),
        average_satisfaction_score: (avg_satisfaction * 10.0).round() / 10.0,
        average_nps_score: avg_nps.round(),
        health_status_distribution: health,
    })
}

fn compare(a: &Deal, b: &Deal, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::DealValue => a
            .estimated_value
            .partial_cmp(&b.estimated_value)
            .unwrap_or(Ordering::Equal),
        SortBy::CloseDate => a.actual_close_date.cmp(&b.actual_close_date),
        SortBy::CustomerName => a.customer_name.cmp(&b.customer_name),
    }
}

pub fn customers(db: &Database, query: &CustomerQuery) -> Result<Vec<CustomerRow>> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let matches = |field: Option<&str>, needle: &str| {
        field.is_some_and(|value| value.to_lowercase().contains(needle))
    };

    let mut deals: Vec<Deal> = won_deals(db)?
        .into_iter()
        .filter(|deal| {
            needle.as_deref().is_none_or(|needle| {
                matches(deal.customer_name.as_deref(), needle)
                    || matches(Some(&deal.title), needle)
                    || matches(deal.contact_person.as_deref(), needle)
            })
        })
        .collect();
    deals.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    deals
        .into_iter()
        .map(|deal| {
            let satisfaction = db.get_satisfaction(deal.id)?.map(|s| SatisfactionSnapshot {
                overall_score: s.overall_satisfaction_score,
                nps_score: s.nps_score,
                health_status: s.customer_health_status,
                implementation_status: s.implementation_status,
                completion_percentage: s.completion_percentage,
            });
            Ok(CustomerRow {
                id: deal.id,
                assigned_person: assigned(db, &deal)?,
                customer_name: deal.customer_name,
                deal_title: deal.title,
                deal_value: deal.estimated_value,
                close_date: deal.actual_close_date,
                region: deal.region,
                country: deal.country,
                satisfaction,
            })
        })
        .collect()
}

pub fn customer(db: &Database, deal_id: i64) -> Result<CustomerDetail> {
    let deal = require_won(db, deal_id)?;
    let conversation = db.get_conversation(deal_id)?.map(|c| ConversationSnapshot {
        customer_requirements: c.customer_requirements,
        business_goals: c.business_goals,
        pain_points: c.pain_points,
    });
    Ok(CustomerDetail {
        assigned_person: assigned(db, &deal)?,
        satisfaction: db.get_satisfaction(deal_id)?,
        conversation,
        deal,
    })
}

/// Create or replace the satisfaction record of a won deal.
pub fn record_satisfaction(
    db: &Database,
    deal_id: i64,
    mut record: CustomerSatisfaction,
    now: DateTime<Utc>,
) -> Result<CustomerSatisfaction> {
    require_won(db, deal_id)?;
    record.deal_id = deal_id;
    record.updated_at = now;
    record.validate()?;
    db.upsert_satisfaction(&record)?;
    tracing::info!(
        deal_id,
        health = ?record.customer_health_status,
        "customer satisfaction recorded"
    );
    Ok(record)
}
