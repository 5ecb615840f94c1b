use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Sales,
    HeadOfEngineering,
    HeadOfDelivery,
    Cso,
    ProjectManager,
}

impl PersonRole {
    pub const ALL: [Self; 5] = [
        Self::Sales,
        Self::HeadOfEngineering,
        Self::HeadOfDelivery,
        Self::Cso,
        Self::ProjectManager,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::HeadOfEngineering => "head_of_engineering",
            Self::HeadOfDelivery => "head_of_delivery",
            Self::Cso => "cso",
            Self::ProjectManager => "project_manager",
        }
    }
}

impl FromStr for PersonRole {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| SbError::ValidationFailed(format!("invalid role {s}")))
    }
}

sql_text_enum!(PersonRole);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: PersonRole,
    pub department: Option<String>,
    pub skills: Vec<String>,
    pub availability: f64,
    pub hourly_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub email: String,
    pub role: PersonRole,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "full_availability")]
    pub availability: f64,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

const fn full_availability() -> f64 {
    1.0
}

impl NewPerson {
    pub fn validate(&self) -> Result<(), SbError> {
        if self.name.trim().is_empty() {
            return Err(SbError::ValidationFailed("name must not be empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(SbError::ValidationFailed(format!("invalid email {}", self.email)));
        }
        if !(0.0..=1.0).contains(&self.availability) {
            return Err(SbError::ValidationFailed(format!(
                "availability {} must be between 0 and 1",
                self.availability
            )));
        }
        Ok(())
    }
}
