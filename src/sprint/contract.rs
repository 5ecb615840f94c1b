//! Post-close paperwork tracking and reminder selection.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::ContractConfig;
use crate::error::Result;
use crate::model::{Deal, DealStatus};
use crate::storage::{Database, DealFilter};

pub const TASK_CONTRACT_SIGNED: &str = "Contract Signed";
pub const TASK_FINANCE_CONTACTED: &str = "Finance Contacted";

/// Paperwork state of a closed deal. All zero/false/empty when not applicable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractStatus {
    pub applicable: bool,
    pub days_since_close: i64,
    pub deadline_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub missing_tasks: Vec<String>,
    pub needs_reminder: bool,
    pub all_tasks_completed: bool,
}

/// Contract status only applies to deals in the `deal` column with a close date.
#[must_use]
pub fn contract_status(deal: &Deal, now: DateTime<Utc>, policy: ContractConfig) -> ContractStatus {
    let Some(closed_at) = deal.actual_close_date else {
        return ContractStatus::default();
    };
    if deal.status != DealStatus::Deal {
        return ContractStatus::default();
    }

    let days_since_close = (now - closed_at).num_days();
    let is_overdue = days_since_close > policy.deadline_days;

    let mut missing_tasks = Vec::new();
    if deal.contract_signed_date.is_none() {
        missing_tasks.push(TASK_CONTRACT_SIGNED.to_string());
    }
    if deal.finance_contacted_date.is_none() {
        missing_tasks.push(TASK_FINANCE_CONTACTED.to_string());
    }

    let reminder_due = !deal.email_reminder_sent
        || deal.last_reminder_date.is_none_or(|last| {
            now - last >= Duration::days(policy.reminder_interval_days)
        });
    let needs_reminder = is_overdue && !missing_tasks.is_empty() && reminder_due;

    ContractStatus {
        applicable: true,
        days_since_close,
        deadline_date: Some(closed_at + Duration::days(policy.deadline_days)),
        is_overdue,
        all_tasks_completed: missing_tasks.is_empty(),
        missing_tasks,
        needs_reminder,
    }
}

/// A deal whose paperwork is overdue, with its computed status.
#[derive(Debug, Clone, Serialize)]
pub struct DueReminder {
    pub deal: Deal,
    pub contract_status: ContractStatus,
}

/// Deals in the `deal` column that need a paperwork reminder now.
pub fn due_reminders(
    db: &Database,
    now: DateTime<Utc>,
    policy: ContractConfig,
) -> Result<Vec<DueReminder>> {
    let deals = db.list_deals(DealFilter {
        status: Some(DealStatus::Deal),
        ..DealFilter::default()
    })?;
    Ok(deals
        .into_iter()
        .filter_map(|deal| {
            let status = contract_status(&deal, now, policy);
            status.needs_reminder.then_some(DueReminder {
                deal,
                contract_status: status,
            })
        })
        .collect())
}

/// Record that a reminder went out for `deal_id`.
pub fn mark_reminder_sent(db: &Database, deal_id: i64, now: DateTime<Utc>) -> Result<Deal> {
    let mut deal = db.require_deal(deal_id)?;
    deal.email_reminder_sent = true;
    deal.last_reminder_date = Some(now);
    deal.updated_at = now;
    db.save_deal(&deal)?;
    tracing::info!(deal_id, "contract reminder marked as sent");
    Ok(deal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewDeal;

    fn policy() -> ContractConfig {
        ContractConfig {
            deadline_days: 30,
            reminder_interval_days: 7,
        }
    }

    fn closed_deal(now: DateTime<Utc>, days_ago: i64) -> Deal {
        Deal {
            id: 1,
            title: "Closed".into(),
            description: None,
            status: DealStatus::Deal,
            priority: crate::model::Priority::Medium,
            board_position: 0,
            customer_name: None,
            customer_email: None,
            contact_person: None,
            region: None,
            country: None,
            assigned_person_id: None,
            solution_owner_id: None,
            estimated_value: None,
            budget_range_min: None,
            budget_range_max: None,
            deal_stage: None,
            deal_probability: None,
            weighted_amount: None,
            created_at: now - Duration::days(days_ago + 10),
            updated_at: now,
            expected_close_date: None,
            actual_close_date: Some(now - Duration::days(days_ago)),
            contract_signed_date: None,
            finance_contacted_date: None,
            email_reminder_sent: false,
            last_reminder_date: None,
        }
    }

    #[test]
    fn not_applicable_without_close_date_or_outside_deal_column() {
        let now = Utc::now();
        let mut deal = closed_deal(now, 40);
        deal.actual_close_date = None;
        assert_eq!(contract_status(&deal, now, policy()), ContractStatus::default());

        let mut project = closed_deal(now, 40);
        project.status = DealStatus::Project;
        assert!(!contract_status(&project, now, policy()).applicable);
    }

    #[test]
    fn overdue_with_missing_tasks_needs_reminder() {
        let now = Utc::now();
        let status = contract_status(&closed_deal(now, 31), now, policy());
        assert!(status.applicable);
        assert_eq!(status.days_since_close, 31);
        assert!(status.is_overdue);
        assert_eq!(status.missing_tasks, [TASK_CONTRACT_SIGNED, TASK_FINANCE_CONTACTED]);
        assert!(status.needs_reminder);
        assert!(!status.all_tasks_completed);
    }

    #[test]
    fn exactly_at_deadline_is_not_overdue() {
        let now = Utc::now();
        let status = contract_status(&closed_deal(now, 30), now, policy());
        assert!(!status.is_overdue);
        assert!(!status.needs_reminder);
    }

    #[test]
    fn recent_reminder_suppresses_another() {
        let now = Utc::now();
        let mut deal = closed_deal(now, 45);
        deal.email_reminder_sent = true;
        deal.last_reminder_date = Some(now - Duration::days(3));
        assert!(!contract_status(&deal, now, policy()).needs_reminder);

        deal.last_reminder_date = Some(now - Duration::days(7));
        assert!(contract_status(&deal, now, policy()).needs_reminder);
    }

    #[test]
    fn completed_paperwork_never_reminds() {
        let now = Utc::now();
        let mut deal = closed_deal(now, 60);
        deal.contract_signed_date = Some(now - Duration::days(50));
        deal.finance_contacted_date = Some(now - Duration::days(50));
        let status = contract_status(&deal, now, policy());
        assert!(status.all_tasks_completed);
        assert!(!status.needs_reminder);
    }

    #[test]
    fn due_reminders_and_marking() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let overdue = db
            .insert_deal(
                &NewDeal {
                    title: "Overdue".into(),
                    status: DealStatus::Deal,
                    actual_close_date: Some(now - Duration::days(40)),
                    ..NewDeal::default()
                },
                0,
                now,
            )
            .unwrap();
        db.insert_deal(
            &NewDeal {
                title: "Fresh".into(),
                status: DealStatus::Deal,
                actual_close_date: Some(now - Duration::days(2)),
                ..NewDeal::default()
            },
            1,
            now,
        )
        .unwrap();

        let due = due_reminders(&db, now, policy()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].deal.id, overdue.id);

        mark_reminder_sent(&db, overdue.id, now).unwrap();
        assert!(due_reminders(&db, now, policy()).unwrap().is_empty());
    }
}
