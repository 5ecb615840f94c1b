//! Contact book: CRUD plus summary statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SbError};
use crate::model::{Contact, ContactPatch, ContactStatus, NewContact};
use crate::sprint::Message;
use crate::storage::{ContactQuery, Database};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

fn not_found() -> SbError {
    SbError::NotFound("Contact not found".to_string())
}

pub fn list_contacts(db: &Database, query: &ContactQuery) -> Result<Vec<Contact>> {
    let contacts = db.list_contacts(query)?;
    tracing::debug!(count = contacts.len(), skip = query.skip, "listed contacts");
    Ok(contacts)
}

pub fn get_contact(db: &Database, id: i64) -> Result<Contact> {
    db.get_contact(id)?.ok_or_else(not_found)
}

pub fn create_contact(db: &Database, contact: &NewContact, now: DateTime<Utc>) -> Result<Contact> {
    contact.validate()?;
    let created = db.insert_contact(contact, now)?;
    tracing::info!(contact_id = created.id, status = %created.status.as_str(), "contact created");
    Ok(created)
}

pub fn update_contact(
    db: &Database,
    id: i64,
    patch: ContactPatch,
    now: DateTime<Utc>,
) -> Result<Contact> {
    let mut contact = get_contact(db, id)?;
    patch.apply(&mut contact);
    if contact.full_name.trim().is_empty() {
        return Err(SbError::ValidationFailed("full_name must not be empty".to_string()));
    }
    contact.updated_at = now;
    db.save_contact(&contact)?;
    Ok(contact)
}

pub fn delete_contact(db: &Database, id: i64) -> Result<Message> {
    if !db.delete_contact(id)? {
        return Err(not_found());
    }
    tracing::info!(contact_id = id, "contact deleted");
    Ok(Message::new("Contact deleted successfully"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactStats {
    pub total_contacts: u64,
    pub status_distribution: BTreeMap<String, usize>,
    pub total_estimated_revenue: f64,
    pub average_gmv: f64,
}

pub fn contact_stats(db: &Database) -> Result<ContactStats> {
    let contacts = db.all_contacts()?;

    let mut status_distribution: BTreeMap<String, usize> = ContactStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for contact in &contacts {
        *status_distribution
            .entry(contact.status.as_str().to_string())
            .or_default() += 1;
    }

    let total_estimated_revenue = contacts.iter().filter_map(|c| c.estimated_revenue).sum();
    let gmvs: Vec<f64> = contacts.iter().filter_map(|c| c.gmv).collect();
    #[allow(clippy::cast_precision_loss)]
    let average_gmv = if gmvs.is_empty() {
        0.0
    } else {
        gmvs.iter().sum::<f64>() / gmvs.len() as f64
    };

    Ok(ContactStats {
        total_contacts: db.count_contacts()?,
        status_distribution,
        total_estimated_revenue,
        average_gmv,
    })
}
