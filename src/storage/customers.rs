//! Lifecycle analytics rows, activity log and stored churn scores.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde_json::Value;

use crate::error::{Result, SbError};
use crate::model::{ChurnPredictionRecord, Customer, CustomerActivity, LifecycleStage};
use crate::storage::sqlite::{Database, collect_rows};

const CUSTOMER_COLUMNS: &str = "id, external_id, first_name, last_name, email, industry, region, \
     lead_source, decision_maker_role, company_size, lead_score, mql, mql_date, sql_flag, sql_date, \
     is_customer, conversion_date, churned, churn_date, lead_creation_date, expected_close_date, \
     acv, ltv, cac, sales_cycle_days, tenure_months, renewals_count, logins_per_month, \
     active_features_used, product_usage_hours, tickets_raised, avg_support_response_hours, \
     nps_score, expansion, stage_probability, forecasted_revenue";

/// SQL predicate selecting the rows currently at `stage`.
const fn stage_predicate(stage: LifecycleStage) -> &'static str {
    match stage {
        LifecycleStage::Lead => "mql = 0 AND sql_flag = 0 AND is_customer = 0 AND churned = 0",
        LifecycleStage::Mql => "mql = 1 AND sql_flag = 0 AND is_customer = 0 AND churned = 0",
        LifecycleStage::Sql => "sql_flag = 1 AND is_customer = 0 AND churned = 0",
        LifecycleStage::Customer => "is_customer = 1 AND churned = 0",
        LifecycleStage::Churned => "churned = 1",
    }
}

impl Database {
    /// Customers page, optionally restricted to one stage.
    pub fn list_customers(
        &self,
        skip: u32,
        limit: u32,
        stage: Option<LifecycleStage>,
    ) -> Result<Vec<Customer>> {
        let predicate = stage.map_or("1 = 1", stage_predicate);
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {predicate} ORDER BY id LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(
            params![i64::from(limit), i64::from(skip)],
            customer_from_row,
        )?;
        collect_rows(rows)
    }

    pub fn all_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"))?;
        let rows = stmt.query_map([], customer_from_row)?;
        collect_rows(rows)
    }

    pub fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?");
        Ok(self
            .conn()
            .query_row(&sql, [id], customer_from_row)
            .optional()?)
    }

    pub fn require_customer(&self, id: i64) -> Result<Customer> {
        self.get_customer(id)?
            .ok_or_else(|| SbError::NotFound("Customer not found".to_string()))
    }

    pub fn customer_email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE lower(email) = lower(?))",
            [email],
            |row| row.get(0),
        )?)
    }

    /// Insert a customer row unless the email is already present.
    ///
    /// Returns `None` when the email was a duplicate.
    pub fn insert_customer(
        &self,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>> {
        if self.customer_email_exists(&customer.email)? {
            return Ok(None);
        }
        self.conn().execute(
            &format!(
                "INSERT INTO customers ({}, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                &CUSTOMER_COLUMNS["id, ".len()..]
            ),
            params![
                customer.external_id,
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.industry,
                customer.region,
                customer.lead_source,
                customer.decision_maker_role,
                customer.company_size,
                customer.lead_score,
                customer.mql,
                customer.mql_date,
                customer.sql,
                customer.sql_date,
                customer.is_customer,
                customer.conversion_date,
                customer.churned,
                customer.churn_date,
                customer.lead_creation_date,
                customer.expected_close_date,
                customer.acv,
                customer.ltv,
                customer.cac,
                customer.sales_cycle_days,
                customer.tenure_months,
                customer.renewals_count,
                customer.logins_per_month,
                customer.active_features_used,
                customer.product_usage_hours,
                customer.tickets_raised,
                customer.avg_support_response_hours,
                customer.nps_score,
                customer.expansion,
                customer.stage_probability,
                customer.forecasted_revenue,
                now,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.get_customer(id)
    }

    /// Persist the funnel flags and dates of `customer`.
    pub fn save_customer_stage(&self, customer: &Customer, now: DateTime<Utc>) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE customers SET
                mql = ?, mql_date = ?, sql_flag = ?, sql_date = ?, is_customer = ?,
                conversion_date = ?, churned = ?, churn_date = ?, updated_at = ?
             WHERE id = ?",
            params![
                customer.mql,
                customer.mql_date,
                customer.sql,
                customer.sql_date,
                customer.is_customer,
                customer.conversion_date,
                customer.churned,
                customer.churn_date,
                now,
                customer.id,
            ],
        )?;
        if changed == 0 {
            return Err(SbError::NotFound("Customer not found".to_string()));
        }
        Ok(())
    }

    pub fn insert_activity(
        &self,
        customer_id: i64,
        activity_type: &str,
        activity_data: &Value,
        timestamp: DateTime<Utc>,
    ) -> Result<CustomerActivity> {
        self.conn().execute(
            "INSERT INTO customer_activity (customer_id, activity_type, activity_data, timestamp)
             VALUES (?, ?, ?, ?)",
            params![customer_id, activity_type, activity_data, timestamp],
        )?;
        Ok(CustomerActivity {
            id: self.conn().last_insert_rowid(),
            customer_id,
            activity_type: activity_type.to_string(),
            activity_data: activity_data.clone(),
            timestamp,
        })
    }

    /// Activity of one customer, newest first.
    pub fn list_activity(&self, customer_id: i64) -> Result<Vec<CustomerActivity>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, customer_id, activity_type, activity_data, timestamp
             FROM customer_activity WHERE customer_id = ? ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map([customer_id], |row| {
            Ok(CustomerActivity {
                id: row.get(0)?,
                customer_id: row.get(1)?,
                activity_type: row.get(2)?,
                activity_data: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;
        collect_rows(rows)
    }

    pub fn insert_churn_prediction(&self, record: &ChurnPredictionRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO churn_predictions (
                customer_id, churn_probability, risk_level, risk_factors, recommendations,
                confidence, model_version, predicted_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.customer_id,
                record.churn_probability,
                record.risk_level,
                serde_json::to_string(&record.risk_factors)?,
                serde_json::to_string(&record.recommendations)?,
                record.confidence,
                record.model_version,
                record.predicted_at,
            ],
        )?;
        Ok(())
    }

    /// Most recent stored churn score for a customer.
    pub fn latest_churn_prediction(
        &self,
        customer_id: i64,
    ) -> Result<Option<ChurnPredictionRecord>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT customer_id, churn_probability, risk_level, risk_factors, recommendations,
                        confidence, model_version, predicted_at
                 FROM churn_predictions WHERE customer_id = ?
                 ORDER BY predicted_at DESC, id DESC LIMIT 1",
                [customer_id],
                |row| {
                    let factors: String = row.get(3)?;
                    let recommendations: String = row.get(4)?;
                    Ok(ChurnPredictionRecord {
                        customer_id: row.get(0)?,
                        churn_probability: row.get(1)?,
                        risk_level: row.get(2)?,
                        risk_factors: serde_json::from_str(&factors).unwrap_or_default(),
                        recommendations: serde_json::from_str(&recommendations)
                            .unwrap_or_default(),
                        confidence: row.get(5)?,
                        model_version: row.get(6)?,
                        predicted_at: row.get(7)?,
                    })
                },
            )
            .optional()?)
    }
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        external_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        industry: row.get(5)?,
        region: row.get(6)?,
        lead_source: row.get(7)?,
        decision_maker_role: row.get(8)?,
        company_size: row.get(9)?,
        lead_score: row.get(10)?,
        mql: row.get(11)?,
        mql_date: row.get(12)?,
        sql: row.get(13)?,
        sql_date: row.get(14)?,
        is_customer: row.get(15)?,
        conversion_date: row.get(16)?,
        churned: row.get(17)?,
        churn_date: row.get(18)?,
        lead_creation_date: row.get(19)?,
        expected_close_date: row.get(20)?,
        acv: row.get(21)?,
        ltv: row.get(22)?,
        cac: row.get(23)?,
        sales_cycle_days: row.get(24)?,
        tenure_months: row.get(25)?,
        renewals_count: row.get(26)?,
        logins_per_month: row.get(27)?,
        active_features_used: row.get(28)?,
        product_usage_hours: row.get(29)?,
        tickets_raised: row.get(30)?,
        avg_support_response_hours: row.get(31)?,
        nps_score: row.get(32)?,
        expansion: row.get(33)?,
        stage_probability: row.get(34)?,
        forecasted_revenue: row.get(35)?,
    })
}
