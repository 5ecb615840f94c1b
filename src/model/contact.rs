use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    Lead,
    Prospect,
    Qualified,
    Customer,
    Inactive,
    Lost,
}

impl ContactStatus {
    pub const ALL: [Self; 6] = [
        Self::Lead,
        Self::Prospect,
        Self::Qualified,
        Self::Customer,
        Self::Inactive,
        Self::Lost,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Prospect => "prospect",
            Self::Qualified => "qualified",
            Self::Customer => "customer",
            Self::Inactive => "inactive",
            Self::Lost => "lost",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| SbError::ValidationFailed(format!("invalid contact status {s}")))
    }
}

sql_text_enum!(ContactStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub full_name: String,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gmv: Option<f64>,
    pub estimated_revenue: Option<f64>,
    pub estimated_close_date: Option<NaiveDate>,
    pub contact_owner_id: Option<i64>,
    pub solution_designer_id: Option<i64>,
    pub delivery_team_assigned: Option<String>,
    pub status: ContactStatus,
    pub note: Option<String>,
    pub lead_source: Option<String>,
    pub solution_interest: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewContact {
    pub full_name: String,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gmv: Option<f64>,
    pub estimated_revenue: Option<f64>,
    pub estimated_close_date: Option<NaiveDate>,
    pub contact_owner_id: Option<i64>,
    pub solution_designer_id: Option<i64>,
    pub delivery_team_assigned: Option<String>,
    pub status: ContactStatus,
    pub note: Option<String>,
    pub lead_source: Option<String>,
    pub solution_interest: Option<String>,
}

impl NewContact {
    pub fn validate(&self) -> Result<(), SbError> {
        if self.full_name.trim().is_empty() {
            return Err(SbError::ValidationFailed("full_name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial contact update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPatch {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gmv: Option<f64>,
    pub estimated_revenue: Option<f64>,
    pub estimated_close_date: Option<NaiveDate>,
    pub contact_owner_id: Option<i64>,
    pub solution_designer_id: Option<i64>,
    pub delivery_team_assigned: Option<String>,
    pub status: Option<ContactStatus>,
    pub note: Option<String>,
    pub lead_source: Option<String>,
    pub solution_interest: Option<String>,
}

impl ContactPatch {
    pub fn apply(self, contact: &mut Contact) {
        if let Some(value) = self.full_name {
            contact.full_name = value;
        }
        if let Some(value) = self.position {
            contact.position = Some(value);
        }
        if let Some(value) = self.company_name {
            contact.company_name = Some(value);
        }
        if let Some(value) = self.email {
            contact.email = Some(value);
        }
        if let Some(value) = self.phone_number {
            contact.phone_number = Some(value);
        }
        if let Some(value) = self.gmv {
            contact.gmv = Some(value);
        }
        if let Some(value) = self.estimated_revenue {
            contact.estimated_revenue = Some(value);
        }
        if let Some(value) = self.estimated_close_date {
            contact.estimated_close_date = Some(value);
        }
        if let Some(value) = self.contact_owner_id {
            contact.contact_owner_id = Some(value);
        }
        if let Some(value) = self.solution_designer_id {
            contact.solution_designer_id = Some(value);
        }
        if let Some(value) = self.delivery_team_assigned {
            contact.delivery_team_assigned = Some(value);
        }
        if let Some(value) = self.status {
            contact.status = value;
        }
        if let Some(value) = self.note {
            contact.note = Some(value);
        }
        if let Some(value) = self.lead_source {
            contact.lead_source = Some(value);
        }
        if let Some(value) = self.solution_interest {
            contact.solution_interest = Some(value);
        }
    }
}
