use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lifecycle::models::{ModelSet, ModelsStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub models_status: ModelsStatus,
}

#[must_use]
pub fn health(models: &ModelSet, now: DateTime<Utc>) -> Health {
    Health {
        status: "healthy",
        timestamp: now,
        version: crate::VERSION,
        models_status: models.status(),
    }
}
