use rusqlite::{OptionalExtension, Row, params};

use crate::error::Result;
use crate::model::CustomerSatisfaction;
use crate::storage::sqlite::{Database, collect_rows};

const SATISFACTION_COLUMNS: &str = "deal_id, overall_satisfaction_score, nps_score, \
     customer_health_status, implementation_status, completion_percentage, current_phase, \
     latest_feedback, testimonial, last_contact_date, next_check_in_date, \
     support_tickets_count, support_tickets_resolved, usage_score, updated_at";

impl Database {
    pub fn upsert_satisfaction(&self, record: &CustomerSatisfaction) -> Result<()> {
        self.conn().execute(
            "INSERT INTO customer_satisfaction (
                deal_id, overall_satisfaction_score, nps_score, customer_health_status,
                implementation_status, completion_percentage, current_phase, latest_feedback,
                testimonial, last_contact_date, next_check_in_date, support_tickets_count,
                support_tickets_resolved, usage_score, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(deal_id) DO UPDATE SET
                overall_satisfaction_score=excluded.overall_satisfaction_score,
                nps_score=excluded.nps_score,
                customer_health_status=excluded.customer_health_status,
                implementation_status=excluded.implementation_status,
                completion_percentage=excluded.completion_percentage,
                current_phase=excluded.current_phase,
                latest_feedback=excluded.latest_feedback,
                testimonial=excluded.testimonial,
                last_contact_date=excluded.last_contact_date,
                next_check_in_date=excluded.next_check_in_date,
                support_tickets_count=excluded.support_tickets_count,
                support_tickets_resolved=excluded.support_tickets_resolved,
                usage_score=excluded.usage_score,
                updated_at=excluded.updated_at",
            params![
                record.deal_id,
                record.overall_satisfaction_score,
                record.nps_score,
                record.customer_health_status,
                record.implementation_status,
                record.completion_percentage,
                record.current_phase,
                record.latest_feedback,
                record.testimonial,
                record.last_contact_date,
                record.next_check_in_date,
                record.support_tickets_count,
                record.support_tickets_resolved,
                record.usage_score,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_satisfaction(&self, deal_id: i64) -> Result<Option<CustomerSatisfaction>> {
        let sql =
            format!("SELECT {SATISFACTION_COLUMNS} FROM customer_satisfaction WHERE deal_id = ?");
        Ok(self
            .conn()
            .query_row(&sql, [deal_id], satisfaction_from_row)
            .optional()?)
    }

    pub fn all_satisfaction(&self) -> Result<Vec<CustomerSatisfaction>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SATISFACTION_COLUMNS} FROM customer_satisfaction ORDER BY deal_id"
        ))?;
        let rows = stmt.query_map([], satisfaction_from_row)?;
        collect_rows(rows)
    }
}

fn satisfaction_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerSatisfaction> {
    Ok(CustomerSatisfaction {
        deal_id: row.get(0)?,
        overall_satisfaction_score: row.get(1)?,
        nps_score: row.get(2)?,
        customer_health_status: row.get(3)?,
        implementation_status: row.get(4)?,
        completion_percentage: row.get(5)?,
        current_phase: row.get(6)?,
        latest_feedback: row.get(7)?,
        testimonial: row.get(8)?,
        last_contact_date: row.get(9)?,
        next_check_in_date: row.get(10)?,
        support_tickets_count: row.get(11)?,
        support_tickets_resolved: row.get(12)?,
        usage_score: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
