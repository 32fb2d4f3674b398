//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Strategies and the directory call store methods — they never execute
//! SQL directly.
//!
//! All columns are stored as TEXT and parsed to typed values at read time.
//! A stored value that fails to parse surfaces as MalformedRow carrying the
//! offending rowid; a missing table surfaces as StorageUnavailable before
//! any query runs.

use crate::{
    error::{MetricsError, MetricsResult},
    metrics::CustomerStats,
    types::CustomerId,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

/// One sales transaction, parsed to typed values. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub customer: CustomerId,
    pub order_date: NaiveDate,
    pub sales: f64,
    pub msrp: f64,
    pub quantity_ordered: u32,
}

pub struct SalesStore {
    conn: Connection,
}

impl SalesStore {
    pub fn open(path: &str) -> MetricsResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and the default runner mode).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply the sales schema.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_sales.sql"))?;
        Ok(())
    }

    /// The sales table must exist before any access; a missing table is a
    /// storage failure, not a query error.
    fn ensure_table(&self) -> MetricsResult<()> {
        let present: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sales_data'",
            [],
            |row| row.get(0),
        )?;
        if present == 0 {
            return Err(MetricsError::StorageUnavailable {
                reason: "table 'sales_data' does not exist".into(),
            });
        }
        Ok(())
    }

    // ── Writes ─────────────────────────────────────────────────

    pub fn insert_rows(&self, rows: &[SalesRow]) -> MetricsResult<usize> {
        self.ensure_table()?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO sales_data (customer_name, order_date, sales, msrp, quantity_ordered)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.customer,
                row.order_date.format("%Y-%m-%d").to_string(),
                row.sales.to_string(),
                row.msrp.to_string(),
                row.quantity_ordered.to_string(),
            ])?;
        }
        Ok(rows.len())
    }

    /// Remove all rows, so a reload replaces the previous import.
    pub fn clear(&self) -> MetricsResult<()> {
        self.ensure_table()?;
        self.conn.execute("DELETE FROM sales_data", [])?;
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Every transaction row, in insertion order.
    pub fn load_all(&self) -> MetricsResult<Vec<SalesRow>> {
        self.ensure_table()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_name, order_date, sales, msrp, quantity_ordered
             FROM sales_data ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map([], raw_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.iter().map(typed_row).collect()
    }

    /// All rows for one exact customer identity, in insertion order.
    pub fn rows_for(&self, customer: &str) -> MetricsResult<Vec<SalesRow>> {
        self.ensure_table()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_name, order_date, sales, msrp, quantity_ordered
             FROM sales_data WHERE customer_name = ?1 ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map(params![customer], raw_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.iter().map(typed_row).collect()
    }

    /// Distinct customer identities via a relational DISTINCT projection.
    pub fn distinct_customers(&self) -> MetricsResult<Vec<CustomerId>> {
        self.ensure_table()?;
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT customer_name FROM sales_data ORDER BY customer_name ASC",
        )?;
        let names: Vec<CustomerId> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Per-customer statistics in one GROUP BY pass.
    ///
    /// The date difference uses julianday() on the ISO order_date text,
    /// which on date-only values is exactly the day count the scan
    /// strategies compute with chrono. Zero-sales rows contribute NULL to
    /// the margin average, so AVG skips exactly the rows the pure
    /// aggregator skips.
    pub fn aggregate_by_customer(&self) -> MetricsResult<Vec<CustomerStats>> {
        self.ensure_table()?;
        let mut stmt = self.conn.prepare(
            "SELECT customer_name,
                    COUNT(*),
                    CAST(julianday(MAX(order_date)) - julianday(MIN(order_date)) AS INTEGER),
                    SUM(CAST(sales AS REAL) - CAST(msrp AS REAL) * CAST(quantity_ordered AS REAL)),
                    AVG(CASE WHEN CAST(sales AS REAL) = 0.0 THEN NULL
                             ELSE (CAST(sales AS REAL)
                                   - CAST(msrp AS REAL) * CAST(quantity_ordered AS REAL))
                                  / CAST(sales AS REAL)
                        END)
             FROM sales_data
             GROUP BY customer_name
             ORDER BY customer_name ASC",
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(CustomerStats::from_totals(
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    pub fn row_count(&self) -> MetricsResult<i64> {
        self.ensure_table()?;
        self.conn
            .query_row("SELECT COUNT(*) FROM sales_data", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

type RawRow = (i64, String, String, String, String, String);

fn raw_row_mapper(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn typed_row(raw: &RawRow) -> MetricsResult<SalesRow> {
    let (id, customer, date, sales, msrp, quantity) = raw;
    let line = *id as usize;
    let order_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| malformed(line, "order_date", date))?;
    Ok(SalesRow {
        customer: customer.clone(),
        order_date,
        sales: stored_amount(line, "sales", sales)?,
        msrp: stored_amount(line, "msrp", msrp)?,
        quantity_ordered: quantity
            .parse::<u32>()
            .map_err(|_| malformed(line, "quantity_ordered", quantity))?,
    })
}

fn stored_amount(line: usize, field: &str, text: &str) -> MetricsResult<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(malformed(line, field, text)),
    }
}

fn malformed(line: usize, field: &str, value: &str) -> MetricsError {
    MetricsError::MalformedRow {
        line,
        field: field.to_string(),
        value: value.to_string(),
    }
}
