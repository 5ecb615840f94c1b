//! Bulk import from JSON and export to JSON or CSV.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SbError};
use crate::model::Customer;
use crate::storage::Database;

/// Parse a headcount such as `250`, `"1-10"`, `"500+"` or `"50-500 employees"`.
///
/// Ranges map to their midpoint.
#[must_use]
pub fn parse_company_size(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | '+'))
        .collect();
    let cleaned = cleaned.trim_end_matches('+');
    match cleaned.split_once('-') {
        Some((low, high)) => {
            let low: f64 = low.parse().ok()?;
            let high: f64 = high.parse().ok()?;
            Some((low + high) / 2.0)
        }
        None => cleaned.parse().ok(),
    }
}

/// Decode one import record, normalising a textual `company_size`.
fn decode_record(mut record: Value) -> std::result::Result<Customer, String> {
    let Some(fields) = record.as_object_mut() else {
        return Err("record is not an object".to_string());
    };
    if let Some(Value::String(size)) = fields.get("company_size") {
        let parsed = parse_company_size(size);
        fields.insert(
            "company_size".to_string(),
            parsed.map_or(Value::Null, Value::from),
        );
    }
    let customer: Customer = serde_json::from_value(record).map_err(|e| e.to_string())?;
    customer.validate().map_err(|e| e.to_string())?;
    Ok(customer)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub message: String,
    pub total_processed: usize,
    pub imported: usize,
    /// Records whose email already exists.
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Parse an import payload; it must be a JSON array of objects.
pub fn parse_import(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(records) => Ok(records),
        _ => Err(SbError::Import("expected a JSON array of customers".to_string())),
    }
}

/// Insert `records`, skipping duplicate emails and collecting bad rows.
///
/// Runs in one transaction; a storage failure rolls back the whole batch.
pub fn import_customers(
    db: &Database,
    records: Vec<Value>,
    now: DateTime<Utc>,
) -> Result<ImportReport> {
    let total_processed = records.len();
    let mut imported = 0;
    let mut skipped = 0;
    let mut errors = Vec::new();

    let tx = db.transaction()?;
    for (index, record) in records.into_iter().enumerate() {
        let customer = match decode_record(record) {
            Ok(customer) => customer,
            Err(reason) => {
                errors.push(format!("record {index}: {reason}"));
                continue;
            }
        };
        if db.insert_customer(&customer, now)?.is_some() {
            imported += 1;
        } else {
            skipped += 1;
        }
    }
    tx.commit()?;

    tracing::info!(imported, skipped, failed = errors.len(), "customers imported");
    Ok(ImportReport {
        message: format!("Successfully imported {imported} customers"),
        total_processed,
        imported,
        skipped,
        errors,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(SbError::ValidationFailed("Unsupported export format".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedCustomer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub customer_flag: bool,
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerExport {
    pub customers: Vec<ExportedCustomer>,
    pub export_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Csv(String),
    Json(CustomerExport),
}

const CSV_HEADER: [&str; 6] = ["id", "name", "email", "stage", "revenue", "churn_risk"];

/// Quote a CSV field when it contains a delimiter, quote or line break.
#[must_use]
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[must_use]
pub fn to_csv(customers: &[Customer]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    for customer in customers {
        let fields = [
            customer.id.to_string(),
            customer.display_name(),
            customer.email.clone(),
            customer.stage().label().to_string(),
            customer.acv.map(|v| v.to_string()).unwrap_or_default(),
            if customer.churned { "Yes" } else { "No" }.to_string(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        let _ = write!(out, "{}\r\n", line.join(","));
    }
    out
}

pub fn export_customers(db: &Database, format: ExportFormat, now: DateTime<Utc>) -> Result<Export> {
    let customers = db.all_customers()?;
    tracing::debug!(count = customers.len(), ?format, "exporting customers");
    Ok(match format {
        ExportFormat::Csv => Export::Csv(to_csv(&customers)),
        ExportFormat::Json => Export::Json(CustomerExport {
            customers: customers
                .iter()
                .map(|c| ExportedCustomer {
                    id: c.id,
                    name: c.display_name(),
                    email: c.email.clone(),
                    customer_flag: c.is_customer,
                    revenue: c.acv,
                })
                .collect(),
            export_date: now,
        }),
    })
}
