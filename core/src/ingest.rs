//! CSV ingestion — loads a delimited sales export into the store.
//!
//! The source file is read as a fixed single-byte encoding (Latin-1), the
//! encoding the upstream export uses. Order dates are normalized to ISO
//! text before storage so the relational date arithmetic agrees with the
//! scan strategies.
//!
//! POLICY: the whole load is rejected on the first malformed row; partial
//! silent data loss is worse than a hard failure.

use crate::{
    error::{MetricsError, MetricsResult},
    store::{SalesRow, SalesStore},
};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

const COL_CUSTOMER: &str = "CUSTOMERNAME";
const COL_ORDER_DATE: &str = "ORDERDATE";
const COL_SALES: &str = "SALES";
const COL_MSRP: &str = "MSRP";
const COL_QUANTITY: &str = "QUANTITYORDERED";

// The export writes month/day/year with an optional time-of-day;
// already-ISO dates are accepted too.
const DATETIME_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Parse a sales CSV and load it into a fresh in-memory store.
pub fn load_into_store(path: &Path) -> MetricsResult<SalesStore> {
    let store = SalesStore::in_memory()?;
    store.migrate()?;
    load_into(path, &store)?;
    Ok(store)
}

/// Parse a sales CSV into an existing store. Returns the row count.
pub fn load_into(path: &Path, store: &SalesStore) -> MetricsResult<usize> {
    let rows = parse_csv(path)?;
    let count = store.insert_rows(&rows)?;
    log::info!("loaded {count} sales rows from {}", path.display());
    Ok(count)
}

/// Parse every row of the export, or fail on the first malformed one.
/// Line numbers in errors are 1-based and count the header line.
pub fn parse_csv(path: &Path) -> MetricsResult<Vec<SalesRow>> {
    let bytes = std::fs::read(path).map_err(|e| MetricsError::StorageUnavailable {
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    // Latin-1: every byte maps directly to the same code point.
    let content: String = bytes.iter().map(|&b| b as char).collect();

    let mut lines = content.lines().enumerate();
    let Some((_, header)) = lines.next() else {
        return Err(MetricsError::StorageUnavailable {
            reason: format!("{} is empty", path.display()),
        });
    };
    let columns = Columns::from_header(header)?;

    let mut rows = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(columns.parse_line(index + 1, line)?);
    }
    Ok(rows)
}

/// Positions of the required columns within the header.
struct Columns {
    customer: usize,
    order_date: usize,
    sales: usize,
    msrp: usize,
    quantity: usize,
}

impl Columns {
    fn from_header(header: &str) -> MetricsResult<Self> {
        let names = split_fields(header);
        let find = |wanted: &str| {
            names
                .iter()
                .position(|n| n.trim().eq_ignore_ascii_case(wanted))
                .ok_or_else(|| MetricsError::MalformedRow {
                    line: 1,
                    field: wanted.to_string(),
                    value: "<missing column>".into(),
                })
        };
        Ok(Self {
            customer: find(COL_CUSTOMER)?,
            order_date: find(COL_ORDER_DATE)?,
            sales: find(COL_SALES)?,
            msrp: find(COL_MSRP)?,
            quantity: find(COL_QUANTITY)?,
        })
    }

    fn parse_line(&self, line_no: usize, line: &str) -> MetricsResult<SalesRow> {
        let fields = split_fields(line);
        let field = |index: usize, name: &str| {
            fields
                .get(index)
                .map(String::as_str)
                .ok_or_else(|| MetricsError::MalformedRow {
                    line: line_no,
                    field: name.to_string(),
                    value: "<missing field>".into(),
                })
        };
        Ok(SalesRow {
            customer: field(self.customer, COL_CUSTOMER)?.trim().to_string(),
            order_date: parse_order_date(line_no, field(self.order_date, COL_ORDER_DATE)?)?,
            sales: parse_amount(line_no, COL_SALES, field(self.sales, COL_SALES)?)?,
            msrp: parse_amount(line_no, COL_MSRP, field(self.msrp, COL_MSRP)?)?,
            quantity_ordered: parse_quantity(line_no, field(self.quantity, COL_QUANTITY)?)?,
        })
    }
}

/// Split one CSV line into fields. Handles quoted fields containing the
/// delimiter and doubled quotes inside quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_order_date(line: usize, text: &str) -> MetricsResult<NaiveDate> {
    let trimmed = text.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }
    Err(MetricsError::MalformedRow {
        line,
        field: COL_ORDER_DATE.to_string(),
        value: text.to_string(),
    })
}

fn parse_amount(line: usize, name: &str, text: &str) -> MetricsResult<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(MetricsError::MalformedRow {
            line,
            field: name.to_string(),
            value: text.to_string(),
        }),
    }
}

fn parse_quantity(line: usize, text: &str) -> MetricsResult<u32> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| MetricsError::MalformedRow {
            line,
            field: COL_QUANTITY.to_string(),
            value: text.to_string(),
        })
}
