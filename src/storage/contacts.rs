//! Contact book persistence.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{Result, SbError};
use crate::model::{Contact, ContactStatus, NewContact};
use crate::storage::sqlite::{Database, collect_rows};

const CONTACT_COLUMNS: &str = "id, full_name, position, company_name, email, phone_number, \
     gmv, estimated_revenue, estimated_close_date, contact_owner_id, solution_designer_id, \
     delivery_team_assigned, status, note, lead_source, solution_interest, created_at, updated_at";

/// Filters for [`Database::list_contacts`].
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub skip: u32,
    pub limit: u32,
    /// Case-insensitive match over name, company, email and position.
    pub search: Option<String>,
    pub status: Option<ContactStatus>,
    /// Substring match on company name.
    pub company: Option<String>,
    pub owner_id: Option<i64>,
}

impl Database {
    pub fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));
        let company = query
            .company
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE (?1 IS NULL
                    OR lower(full_name) LIKE ?1
                    OR lower(coalesce(company_name, '')) LIKE ?1
                    OR lower(coalesce(email, '')) LIKE ?1
                    OR lower(coalesce(position, '')) LIKE ?1)
               AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR lower(coalesce(company_name, '')) LIKE ?3)
               AND (?4 IS NULL OR contact_owner_id = ?4)
             ORDER BY id
             LIMIT ?5 OFFSET ?6"
        ))?;
        let rows = stmt.query_map(
            params![
                search,
                query.status,
                company,
                query.owner_id,
                i64::from(query.limit),
                i64::from(query.skip),
            ],
            contact_from_row,
        )?;
        collect_rows(rows)
    }

    /// Every contact, for summary statistics.
    pub fn all_contacts(&self) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id"))?;
        let rows = stmt.query_map([], contact_from_row)?;
        collect_rows(rows)
    }

    pub fn count_contacts(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?");
        Ok(self
            .conn()
            .query_row(&sql, [id], contact_from_row)
            .optional()?)
    }

    pub fn insert_contact(&self, contact: &NewContact, now: DateTime<Utc>) -> Result<Contact> {
        self.conn().execute(
            "INSERT INTO contacts (
                full_name, position, company_name, email, phone_number, gmv, estimated_revenue,
                estimated_close_date, contact_owner_id, solution_designer_id, delivery_team_assigned,
                status, note, lead_source, solution_interest, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                contact.full_name.trim(),
                contact.position,
                contact.company_name,
                contact.email,
                contact.phone_number,
                contact.gmv,
                contact.estimated_revenue,
                contact.estimated_close_date,
                contact.contact_owner_id,
                contact.solution_designer_id,
                contact.delivery_team_assigned,
                contact.status,
                contact.note,
                contact.lead_source,
                contact.solution_interest,
                now,
                now,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_contact(id)?
            .ok_or_else(|| SbError::Internal(format!("contact {id} vanished after insert")))
    }

    /// Write every column of `contact` back to its row.
    pub fn save_contact(&self, contact: &Contact) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE contacts SET
                full_name = ?, position = ?, company_name = ?, email = ?, phone_number = ?,
                gmv = ?, estimated_revenue = ?, estimated_close_date = ?, contact_owner_id = ?,
                solution_designer_id = ?, delivery_team_assigned = ?, status = ?, note = ?,
                lead_source = ?, solution_interest = ?, updated_at = ?
             WHERE id = ?",
            params![
                contact.full_name,
                contact.position,
                contact.company_name,
                contact.email,
                contact.phone_number,
                contact.gmv,
                contact.estimated_revenue,
                contact.estimated_close_date,
                contact.contact_owner_id,
                contact.solution_designer_id,
                contact.delivery_team_assigned,
                contact.status,
                contact.note,
                contact.lead_source,
                contact.solution_interest,
                contact.updated_at,
                contact.id,
            ],
        )?;
        if changed == 0 {
            return Err(SbError::NotFound("Contact not found".to_string()));
        }
        Ok(())
    }

    pub fn delete_contact(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM contacts WHERE id = ?", [id])?;
        Ok(changed > 0)
    }
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        full_name: row.get(1)?,
        position: row.get(2)?,
        company_name: row.get(3)?,
        email: row.get(4)?,
        phone_number: row.get(5)?,
        gmv: row.get(6)?,
        estimated_revenue: row.get(7)?,
        estimated_close_date: row.get(8)?,
        contact_owner_id: row.get(9)?,
        solution_designer_id: row.get(10)?,
        delivery_team_assigned: row.get(11)?,
        status: row.get(12)?,
        note: row.get(13)?,
        lead_source: row.get(14)?,
        solution_interest: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, company: &str, status: ContactStatus) -> NewContact {
        NewContact {
            full_name: name.to_string(),
            company_name: Some(company.to_string()),
            email: Some(format!("{}@{}.com", name.to_lowercase(), company.to_lowercase())),
            status,
            ..NewContact::default()
        }
    }

    fn query() -> ContactQuery {
        ContactQuery {
            limit: 100,
            ..ContactQuery::default()
        }
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_contact(&contact("Linh", "Acme", ContactStatus::Lead), now).unwrap();
        db.insert_contact(&contact("Minh", "Globex", ContactStatus::Customer), now)
            .unwrap();

        let by_company = db
            .list_contacts(&ContactQuery {
                search: Some("ACME".into()),
                ..query()
            })
            .unwrap();
        assert_eq!(by_company.len(), 1);
        assert_eq!(by_company[0].full_name, "Linh");

        let by_email = db
            .list_contacts(&ContactQuery {
                search: Some("minh@glob".into()),
                ..query()
            })
            .unwrap();
        assert_eq!(by_email.len(), 1);
    }

    #[test]
    fn filters_and_paging() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        for idx in 0..5 {
            db.insert_contact(&contact(&format!("C{idx}"), "Acme", ContactStatus::Prospect), now)
                .unwrap();
        }
        db.insert_contact(&contact("Other", "Initech", ContactStatus::Lost), now)
            .unwrap();

        let lost = db
            .list_contacts(&ContactQuery {
                status: Some(ContactStatus::Lost),
                ..query()
            })
            .unwrap();
        assert_eq!(lost.len(), 1);

        let page = db
            .list_contacts(&ContactQuery {
                skip: 2,
                limit: 2,
                company: Some("acm".into()),
                ..ContactQuery::default()
            })
            .unwrap();
        let names: Vec<_> = page.iter().map(|c| c.full_name.as_str()).collect();
        assert_eq!(names, ["C2", "C3"]);
    }

    #[test]
    fn save_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let mut stored = db
            .insert_contact(&contact("Linh", "Acme", ContactStatus::Lead), Utc::now())
            .unwrap();
        stored.status = ContactStatus::Qualified;
        db.save_contact(&stored).unwrap();
        assert_eq!(
            db.get_contact(stored.id).unwrap().unwrap().status,
            ContactStatus::Qualified
        );
        assert!(db.delete_contact(stored.id).unwrap());
        assert!(db.get_contact(stored.id).unwrap().is_none());
        assert!(matches!(
            db.save_contact(&stored).unwrap_err(),
            SbError::NotFound(_)
        ));
    }
}
