//! Deals with their status history and comments.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{Result, SbError};
use crate::model::{Comment, Deal, DealStatus, NewComment, NewDeal, StatusHistory};
use crate::storage::sqlite::{Database, collect_rows};

const DEAL_COLUMNS: &str = "id, title, description, status, priority, board_position, \
     customer_name, customer_email, contact_person, region, country, \
     assigned_person_id, solution_owner_id, estimated_value, budget_range_min, budget_range_max, \
     deal_stage, deal_probability, weighted_amount, created_at, updated_at, \
     expected_close_date, actual_close_date, contract_signed_date, finance_contacted_date, \
     email_reminder_sent, last_reminder_date";

/// Optional filters for [`Database::list_deals`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DealFilter {
    pub status: Option<DealStatus>,
    pub assigned_person_id: Option<i64>,
}

impl Database {
    /// Insert a new deal at `board_position` and return the stored row.
    pub fn insert_deal(
        &self,
        deal: &NewDeal,
        board_position: i64,
        now: DateTime<Utc>,
    ) -> Result<Deal> {
        self.conn().execute(
            "INSERT INTO deals (
                title, description, status, priority, board_position,
                customer_name, customer_email, contact_person, region, country,
                assigned_person_id, estimated_value, budget_range_min, budget_range_max,
                deal_stage, deal_probability, expected_close_date, actual_close_date,
                created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                deal.title.trim(),
                deal.description,
                deal.status,
                deal.priority,
                board_position.max(0),
                deal.customer_name,
                deal.customer_email,
                deal.contact_person,
                deal.region,
                deal.country,
                deal.assigned_person_id,
                deal.estimated_value,
                deal.budget_range_min,
                deal.budget_range_max,
                deal.deal_stage,
                deal.deal_probability,
                deal.expected_close_date,
                deal.actual_close_date,
                now,
                now,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        tracing::debug!(deal_id = id, status = %deal.status, "inserted deal");
        self.require_deal(id)
    }

    pub fn get_deal(&self, id: i64) -> Result<Option<Deal>> {
        let sql = format!("SELECT {DEAL_COLUMNS} FROM deals WHERE id = ?");
        Ok(self
            .conn()
            .query_row(&sql, [id], deal_from_row)
            .optional()?)
    }

    /// Like [`Database::get_deal`] but a missing row is `NotFound`.
    pub fn require_deal(&self, id: i64) -> Result<Deal> {
        self.get_deal(id)?
            .ok_or_else(|| SbError::NotFound("Deal not found".to_string()))
    }

    /// Deals ordered by board column then position.
    pub fn list_deals(&self, filter: DealFilter) -> Result<Vec<Deal>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DEAL_COLUMNS} FROM deals
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR assigned_person_id = ?2)
             ORDER BY CASE status
                WHEN 'lead' THEN 0
                WHEN 'qualified_solution' THEN 1
                WHEN 'qualified_delivery' THEN 2
                WHEN 'qualified_cso' THEN 3
                WHEN 'deal' THEN 4
                ELSE 5 END,
                board_position, id"
        ))?;
        let rows = stmt.query_map(
            params![filter.status, filter.assigned_person_id],
            deal_from_row,
        )?;
        collect_rows(rows)
    }

    /// Every deal, unordered beyond id. Used by analytics.
    pub fn all_deals(&self) -> Result<Vec<Deal>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {DEAL_COLUMNS} FROM deals ORDER BY id"))?;
        let rows = stmt.query_map([], deal_from_row)?;
        collect_rows(rows)
    }

    /// Write every mutable column of `deal` back to its row.
    pub fn save_deal(&self, deal: &Deal) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE deals SET
                title = ?, description = ?, status = ?, priority = ?, board_position = ?,
                customer_name = ?, customer_email = ?, contact_person = ?, region = ?, country = ?,
                assigned_person_id = ?, solution_owner_id = ?, estimated_value = ?,
                budget_range_min = ?, budget_range_max = ?, deal_stage = ?, deal_probability = ?,
                weighted_amount = ?, updated_at = ?, expected_close_date = ?, actual_close_date = ?,
                contract_signed_date = ?, finance_contacted_date = ?, email_reminder_sent = ?,
                last_reminder_date = ?
             WHERE id = ?",
            params![
                deal.title,
                deal.description,
                deal.status,
                deal.priority,
                deal.board_position.max(0),
                deal.customer_name,
                deal.customer_email,
                deal.contact_person,
                deal.region,
                deal.country,
                deal.assigned_person_id,
                deal.solution_owner_id,
                deal.estimated_value,
                deal.budget_range_min,
                deal.budget_range_max,
                deal.deal_stage,
                deal.deal_probability,
                deal.weighted_amount,
                deal.updated_at,
                deal.expected_close_date,
                deal.actual_close_date,
                deal.contract_signed_date,
                deal.finance_contacted_date,
                deal.email_reminder_sent,
                deal.last_reminder_date,
                deal.id,
            ],
        )?;
        if changed == 0 {
            return Err(SbError::NotFound("Deal not found".to_string()));
        }
        Ok(())
    }

    /// Delete a deal; dependent rows go with it. Returns whether a row existed.
    pub fn delete_deal(&self, id: i64) -> Result<bool> {
        let changed = self.conn().execute("DELETE FROM deals WHERE id = ?", [id])?;
        Ok(changed > 0)
    }

    /// Deals currently in `status`, optionally not counting `exclude`.
    pub fn count_in_status(&self, status: DealStatus, exclude: Option<i64>) -> Result<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM deals WHERE status = ?1 AND (?2 IS NULL OR id != ?2)",
            params![status, exclude],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn insert_status_history(
        &self,
        deal_id: i64,
        previous: Option<DealStatus>,
        new_status: DealStatus,
        changed_by_person_id: Option<i64>,
        change_reason: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<StatusHistory> {
        self.conn().execute(
            "INSERT INTO status_history (deal_id, previous_status, new_status, changed_by_person_id, change_reason, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![deal_id, previous, new_status, changed_by_person_id, change_reason, timestamp],
        )?;
        Ok(StatusHistory {
            id: self.conn().last_insert_rowid(),
            deal_id,
            previous_status: previous,
            new_status,
            changed_by_person_id,
            change_reason: change_reason.map(str::to_string),
            timestamp,
        })
    }

    /// Status changes of a deal, newest first.
    pub fn list_status_history(&self, deal_id: i64) -> Result<Vec<StatusHistory>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, deal_id, previous_status, new_status, changed_by_person_id, change_reason, timestamp
             FROM status_history WHERE deal_id = ? ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map([deal_id], |row| {
            Ok(StatusHistory {
                id: row.get(0)?,
                deal_id: row.get(1)?,
                previous_status: row.get(2)?,
                new_status: row.get(3)?,
                changed_by_person_id: row.get(4)?,
                change_reason: row.get(5)?,
                timestamp: row.get(6)?,
            })
        })?;
        collect_rows(rows)
    }

    pub fn insert_comment(
        &self,
        deal_id: i64,
        comment: &NewComment,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        self.conn().execute(
            "INSERT INTO comments (deal_id, commenter_name, commenter_role, comment_text, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                deal_id,
                comment.commenter_name,
                comment.commenter_role,
                comment.comment_text,
                now
            ],
        )?;
        Ok(Comment {
            id: self.conn().last_insert_rowid(),
            deal_id,
            commenter_name: comment.commenter_name.clone(),
            commenter_role: comment.commenter_role.clone(),
            comment_text: comment.comment_text.clone(),
            created_at: now,
        })
    }

    /// Comments on a deal, newest first.
    pub fn list_comments(&self, deal_id: i64) -> Result<Vec<Comment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, deal_id, commenter_name, commenter_role, comment_text, created_at
             FROM comments WHERE deal_id = ? ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([deal_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                deal_id: row.get(1)?,
                commenter_name: row.get(2)?,
                commenter_role: row.get(3)?,
                comment_text: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        collect_rows(rows)
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?", [id])?;
        Ok(changed > 0)
    }
}

fn deal_from_row(row: &Row<'_>) -> rusqlite::Result<Deal> {
    Ok(Deal {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        board_position: row.get(5)?,
        customer_name: row.get(6)?,
        customer_email: row.get(7)?,
        contact_person: row.get(8)?,
        region: row.get(9)?,
        country: row.get(10)?,
        assigned_person_id: row.get(11)?,
        solution_owner_id: row.get(12)?,
        estimated_value: row.get(13)?,
        budget_range_min: row.get(14)?,
        budget_range_max: row.get(15)?,
        deal_stage: row.get(16)?,
        deal_probability: row.get(17)?,
        weighted_amount: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
        expected_close_date: row.get(21)?,
        actual_close_date: row.get(22)?,
        contract_signed_date: row.get(23)?,
        finance_contacted_date: row.get(24)?,
        email_reminder_sent: row.get(25)?,
        last_reminder_date: row.get(26)?,
    })
}
