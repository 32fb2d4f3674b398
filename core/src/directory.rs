//! Customer directory — the distinct set of customer identities.
//!
//! Two equivalent derivations: a full scan with dedupe, and a relational
//! DISTINCT projection. Both return the identities sorted by byte order
//! (SQLite's BINARY collation matches Rust's string ordering), so the two
//! paths can be compared directly.

use crate::{error::MetricsResult, store::SalesStore, types::CustomerId};
use std::collections::BTreeSet;

/// Full-scan strategy: load every row, extract the identity, dedupe.
pub fn distinct_customers_scan(store: &SalesStore) -> MetricsResult<Vec<CustomerId>> {
    let rows = store.load_all()?;
    let set: BTreeSet<CustomerId> = rows.into_iter().map(|r| r.customer).collect();
    Ok(set.into_iter().collect())
}

/// Relational strategy: SELECT DISTINCT against the store.
pub fn distinct_customers_sql(store: &SalesStore) -> MetricsResult<Vec<CustomerId>> {
    store.distinct_customers()
}
