use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SbError;
use crate::model::{PersonRole, title_case};

/// Board column a deal sits in. Declaration order is the column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    #[default]
    Lead,
    QualifiedSolution,
    QualifiedDelivery,
    QualifiedCso,
    Deal,
    Project,
}

impl DealStatus {
    pub const ALL: [Self; 6] = [
        Self::Lead,
        Self::QualifiedSolution,
        Self::QualifiedDelivery,
        Self::QualifiedCso,
        Self::Deal,
        Self::Project,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::QualifiedSolution => "qualified_solution",
            Self::QualifiedDelivery => "qualified_delivery",
            Self::QualifiedCso => "qualified_cso",
            Self::Deal => "deal",
            Self::Project => "project",
        }
    }

    /// Column title: "qualified_solution" -> "Qualified Solution".
    #[must_use]
    pub fn title(self) -> String {
        title_case(&self.as_str().replace('_', " "))
    }

    /// Deal and Project count as closed business.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Deal | Self::Project)
    }

    #[must_use]
    pub const fn is_qualified(self) -> bool {
        matches!(
            self,
            Self::QualifiedSolution | Self::QualifiedDelivery | Self::QualifiedCso
        )
    }

    /// Role that takes ownership of a deal entering this column.
    #[must_use]
    pub const fn owner_role(self) -> PersonRole {
        match self {
            Self::Lead | Self::Deal => PersonRole::Sales,
            Self::QualifiedSolution => PersonRole::HeadOfEngineering,
            Self::QualifiedDelivery => PersonRole::HeadOfDelivery,
            Self::QualifiedCso => PersonRole::Cso,
            Self::Project => PersonRole::ProjectManager,
        }
    }

    /// Lenient parse: snake_case value or column title, any case.
    pub fn parse(raw: &str) -> Result<Self, SbError> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                let valid = Self::ALL
                    .iter()
                    .map(|status| format!("'{}'", status.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                SbError::InvalidStatus(format!("Invalid status: {raw}. Valid statuses: [{valid}]"))
            })
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

sql_text_enum!(DealStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(SbError::ValidationFailed(format!("invalid priority {other}"))),
        }
    }
}

sql_text_enum!(Priority);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: DealStatus,
    pub priority: Priority,
    pub board_position: i64,

    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub contact_person: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,

    pub assigned_person_id: Option<i64>,
    pub solution_owner_id: Option<i64>,

    pub estimated_value: Option<f64>,
    pub budget_range_min: Option<f64>,
    pub budget_range_max: Option<f64>,
    pub deal_stage: Option<String>,
    pub deal_probability: Option<i64>,
    pub weighted_amount: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expected_close_date: Option<NaiveDate>,
    pub actual_close_date: Option<DateTime<Utc>>,
    pub contract_signed_date: Option<DateTime<Utc>>,
    pub finance_contacted_date: Option<DateTime<Utc>>,
    pub email_reminder_sent: bool,
    pub last_reminder_date: Option<DateTime<Utc>>,
}

impl Deal {
    /// Estimated value with a missing value counted as zero.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.estimated_value.unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_won(&self) -> bool {
        self.deal_stage.as_deref() == Some(WON_STAGE)
    }
}

/// `deal_stage` marker for a won sale.
pub const WON_STAGE: &str = "Closed Won";

/// `deal_stage` marker for a lost sale.
pub const LOST_STAGE: &str = "Closed Lost";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDeal {
    pub title: String,
    pub description: Option<String>,
    pub status: DealStatus,
    pub priority: Priority,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub contact_person: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub assigned_person_id: Option<i64>,
    pub estimated_value: Option<f64>,
    pub budget_range_min: Option<f64>,
    pub budget_range_max: Option<f64>,
    pub deal_stage: Option<String>,
    pub deal_probability: Option<i64>,
    pub expected_close_date: Option<NaiveDate>,
    pub actual_close_date: Option<DateTime<Utc>>,
}

impl NewDeal {
    pub fn validate(&self) -> Result<(), SbError> {
        if self.title.trim().is_empty() {
            return Err(SbError::ValidationFailed("title must not be empty".to_string()));
        }
        if let (Some(min), Some(max)) = (self.budget_range_min, self.budget_range_max) {
            if min > max {
                return Err(SbError::ValidationFailed(format!(
                    "budget_range_min {min} exceeds budget_range_max {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Partial deal update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DealPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<DealStatus>,
    pub priority: Option<Priority>,
    pub assigned_person_id: Option<i64>,
    pub customer_name: Option<String>,
    pub country: Option<String>,
    pub estimated_value: Option<f64>,
    pub budget_range_min: Option<f64>,
    pub budget_range_max: Option<f64>,
    pub deal_stage: Option<String>,
    pub expected_close_date: Option<NaiveDate>,
    pub actual_close_date: Option<DateTime<Utc>>,
    pub contract_signed_date: Option<DateTime<Utc>>,
    pub finance_contacted_date: Option<DateTime<Utc>>,
    pub board_position: Option<i64>,
}

impl DealPatch {
    pub fn apply(self, deal: &mut Deal) {
        if let Some(value) = self.title {
            deal.title = value;
        }
        if let Some(value) = self.description {
            deal.description = Some(value);
        }
        if let Some(value) = self.status {
            deal.status = value;
        }
        if let Some(value) = self.priority {
            deal.priority = value;
        }
        if let Some(value) = self.assigned_person_id {
            deal.assigned_person_id = Some(value);
        }
        if let Some(value) = self.customer_name {
            deal.customer_name = Some(value);
        }
        if let Some(value) = self.country {
            deal.country = Some(value);
        }
        if let Some(value) = self.estimated_value {
            deal.estimated_value = Some(value);
        }
        if let Some(value) = self.budget_range_min {
            deal.budget_range_min = Some(value);
        }
        if let Some(value) = self.budget_range_max {
            deal.budget_range_max = Some(value);
        }
        if let Some(value) = self.deal_stage {
            deal.deal_stage = Some(value);
        }
        if let Some(value) = self.expected_close_date {
            deal.expected_close_date = Some(value);
        }
        if let Some(value) = self.actual_close_date {
            deal.actual_close_date = Some(value);
        }
        if let Some(value) = self.contract_signed_date {
            deal.contract_signed_date = Some(value);
        }
        if let Some(value) = self.finance_contacted_date {
            deal.finance_contacted_date = Some(value);
        }
        if let Some(value) = self.board_position {
            deal.board_position = value.max(0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistory {
    pub id: i64,
    pub deal_id: i64,
    pub previous_status: Option<DealStatus>,
    pub new_status: DealStatus,
    pub changed_by_person_id: Option<i64>,
    pub change_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub deal_id: i64,
    pub commenter_name: String,
    pub commenter_role: Option<String>,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub commenter_name: String,
    #[serde(default)]
    pub commenter_role: Option<String>,
    pub comment_text: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), SbError> {
        if self.commenter_name.trim().is_empty() {
            return Err(SbError::ValidationFailed("commenter_name must not be empty".to_string()));
        }
        if self.comment_text.trim().is_empty() {
            return Err(SbError::ValidationFailed("comment_text must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_is_board_order() {
        let names: Vec<_> = DealStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            [
                "lead",
                "qualified_solution",
                "qualified_delivery",
                "qualified_cso",
                "deal",
                "project"
            ]
        );
        assert!(DealStatus::Lead < DealStatus::Project);
    }

    #[test]
    fn status_parse_accepts_value_name_and_title() {
        assert_eq!(DealStatus::parse("lead").unwrap(), DealStatus::Lead);
        assert_eq!(DealStatus::parse("QUALIFIED_CSO").unwrap(), DealStatus::QualifiedCso);
        assert_eq!(
            DealStatus::parse(" Qualified Delivery ").unwrap(),
            DealStatus::QualifiedDelivery
        );
    }

    #[test]
    fn status_parse_rejects_unknown() {
        let err = DealStatus::parse("won").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid status: won. Valid statuses: ["));
        assert!(msg.contains("'qualified_solution'"));
        assert!(matches!(err, SbError::InvalidStatus(_)));
    }

    #[test]
    fn status_titles() {
        assert_eq!(DealStatus::QualifiedSolution.title(), "Qualified Solution");
        assert_eq!(DealStatus::QualifiedCso.title(), "Qualified Cso");
        assert_eq!(DealStatus::Lead.title(), "Lead");
    }

    #[test]
    fn owner_roles() {
        assert_eq!(DealStatus::Lead.owner_role(), PersonRole::Sales);
        assert_eq!(DealStatus::Deal.owner_role(), PersonRole::Sales);
        assert_eq!(DealStatus::QualifiedSolution.owner_role(), PersonRole::HeadOfEngineering);
        assert_eq!(DealStatus::QualifiedDelivery.owner_role(), PersonRole::HeadOfDelivery);
        assert_eq!(DealStatus::QualifiedCso.owner_role(), PersonRole::Cso);
        assert_eq!(DealStatus::Project.owner_role(), PersonRole::ProjectManager);
    }

    #[test]
    fn closed_and_qualified_flags() {
        assert!(DealStatus::Deal.is_closed());
        assert!(DealStatus::Project.is_closed());
        assert!(!DealStatus::QualifiedCso.is_closed());
        assert!(DealStatus::QualifiedCso.is_qualified());
        assert!(!DealStatus::Lead.is_qualified());
    }

    #[test]
    fn new_deal_defaults_from_json() {
        let deal: NewDeal = serde_json::from_str(r#"{"title":"ERP rollout"}"#).unwrap();
        assert_eq!(deal.status, DealStatus::Lead);
        assert_eq!(deal.priority, Priority::Medium);
        deal.validate().unwrap();
    }

    #[test]
    fn new_deal_validation() {
        let blank = NewDeal {
            title: "  ".into(),
            ..NewDeal::default()
        };
        assert!(blank.validate().is_err());

        let inverted = NewDeal {
            title: "x".into(),
            budget_range_min: Some(10.0),
            budget_range_max: Some(5.0),
            ..NewDeal::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn priority_parse() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("critical".parse::<Priority>().is_err());
    }
}
