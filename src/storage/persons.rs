//! Team members that deals get assigned to.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{Result, SbError};
use crate::model::{NewPerson, Person, PersonRole};
use crate::storage::sqlite::{Database, collect_rows};

const PERSON_COLUMNS: &str =
    "id, name, email, role, department, skills, availability, hourly_rate, created_at";

impl Database {
    /// Insert a person. A duplicate email is a validation failure.
    pub fn insert_person(&self, person: &NewPerson, now: DateTime<Utc>) -> Result<Person> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM persons WHERE email = ?)",
            [&person.email],
            |row| row.get(0),
        )?;
        if exists {
            return Err(SbError::ValidationFailed(format!(
                "Person with email {} already exists",
                person.email
            )));
        }

        let skills = serde_json::to_string(&person.skills)?;
        self.conn().execute(
            "INSERT INTO persons (name, email, role, department, skills, availability, hourly_rate, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                person.name,
                person.email,
                person.role,
                person.department,
                skills,
                person.availability,
                person.hourly_rate,
                now,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_person(id)?
            .ok_or_else(|| SbError::Internal(format!("person {id} vanished after insert")))
    }

    pub fn get_person(&self, id: i64) -> Result<Option<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?");
        Ok(self
            .conn()
            .query_row(&sql, [id], person_from_row)
            .optional()?)
    }

    /// All persons, optionally restricted to one role, in insertion order.
    pub fn list_persons(&self, role: Option<PersonRole>) -> Result<Vec<Person>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE (?1 IS NULL OR role = ?1) ORDER BY id"
        ))?;
        let rows = stmt.query_map([role], person_from_row)?;
        collect_rows(rows)
    }

    /// Lowest-id person holding `role`, used for auto-assignment.
    pub fn first_person_with_role(&self, role: PersonRole) -> Result<Option<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE role = ? ORDER BY id LIMIT 1");
        Ok(self
            .conn()
            .query_row(&sql, [role], person_from_row)
            .optional()?)
    }

    pub fn count_persons(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let skills: String = row.get(5)?;
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        department: row.get(4)?,
        skills: serde_json::from_str(&skills).unwrap_or_default(),
        availability: row.get(6)?,
        hourly_rate: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_person(name: &str, email: &str, role: PersonRole) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            email: email.to_string(),
            role,
            department: Some("Sales".to_string()),
            skills: vec!["negotiation".to_string()],
            availability: 0.8,
            hourly_rate: Some(90.0),
        }
    }

    #[test]
    fn insert_and_get_person() {
        let db = Database::open_in_memory().unwrap();
        let created = db
            .insert_person(&new_person("Alice", "alice@example.com", PersonRole::Sales), Utc::now())
            .unwrap();
        let fetched = db.get_person(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Alice");
        assert_eq!(fetched.skills, vec!["negotiation".to_string()]);
        assert_eq!(fetched.role, PersonRole::Sales);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_person(&new_person("Alice", "alice@example.com", PersonRole::Sales), Utc::now())
            .unwrap();
        let err = db
            .insert_person(&new_person("Alias", "alice@example.com", PersonRole::Cso), Utc::now())
            .unwrap_err();
        assert!(matches!(err, SbError::ValidationFailed(_)));
    }

    #[test]
    fn list_filters_by_role_and_first_with_role() {
        let db = Database::open_in_memory().unwrap();
        db.insert_person(&new_person("A", "a@example.com", PersonRole::Sales), Utc::now())
            .unwrap();
        let cso = db
            .insert_person(&new_person("B", "b@example.com", PersonRole::Cso), Utc::now())
            .unwrap();
        db.insert_person(&new_person("C", "c@example.com", PersonRole::Cso), Utc::now())
            .unwrap();

        assert_eq!(db.list_persons(None).unwrap().len(), 3);
        assert_eq!(db.list_persons(Some(PersonRole::Cso)).unwrap().len(), 2);
        assert_eq!(
            db.first_person_with_role(PersonRole::Cso).unwrap().unwrap().id,
            cso.id
        );
        assert!(db
            .first_person_with_role(PersonRole::ProjectManager)
            .unwrap()
            .is_none());
        assert_eq!(db.count_persons().unwrap(), 3);
    }
}
