//! Aggregation strategies — one computation, three backends.
//!
//! CONTRACT (fixed, tested):
//!   - Iterative: one pass over the full table, grouping as it goes.
//!   - Recursive: one customer per frame with an explicit accumulator,
//!     depth bounded by MAX_RECURSION_DEPTH and rejected up front beyond.
//!   - Relational: one GROUP BY statement executed by the store.
//! All three produce identical per-customer statistics (within
//! floating-point tolerance) and surface identical error shapes.

use crate::{
    directory,
    error::{MetricsError, MetricsResult},
    metrics::{self, CustomerStats, PopulationMetrics},
    store::{SalesRow, SalesStore},
    types::CustomerId,
};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Upper bound on recursive descent. One frame per customer; datasets with
/// more distinct customers than this are rejected instead of risking the
/// stack.
pub const MAX_RECURSION_DEPTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Iterative,
    Recursive,
    Relational,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Iterative,
        Strategy::Recursive,
        Strategy::Relational,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Iterative => "iterative",
            Strategy::Recursive => "recursive",
            Strategy::Relational => "relational",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iterative" => Ok(Strategy::Iterative),
            "recursive" => Ok(Strategy::Recursive),
            "relational" | "sql" => Ok(Strategy::Relational),
            other => Err(format!(
                "unknown strategy {other:?} (expected iterative, recursive, or relational)"
            )),
        }
    }
}

/// Per-customer statistics for every customer in the store, under the
/// chosen strategy. Records come back sorted by customer identity.
pub fn per_customer_stats(
    store: &SalesStore,
    strategy: Strategy,
) -> MetricsResult<Vec<CustomerStats>> {
    log::debug!("computing per-customer statistics via {strategy} strategy");
    match strategy {
        Strategy::Iterative => iterative_stats(store),
        Strategy::Recursive => recursive_stats(store),
        Strategy::Relational => store.aggregate_by_customer(),
    }
}

/// Population means under the chosen strategy.
pub fn compute_metrics(
    store: &SalesStore,
    strategy: Strategy,
) -> MetricsResult<PopulationMetrics> {
    let stats = per_customer_stats(store, strategy)?;
    metrics::summarize(&stats)
}

fn iterative_stats(store: &SalesStore) -> MetricsResult<Vec<CustomerStats>> {
    let mut groups: BTreeMap<CustomerId, Vec<SalesRow>> = BTreeMap::new();
    for row in store.load_all()? {
        groups.entry(row.customer.clone()).or_default().push(row);
    }
    Ok(groups
        .iter()
        .map(|(customer, rows)| metrics::aggregate_rows(customer, rows))
        .collect())
}

fn recursive_stats(store: &SalesStore) -> MetricsResult<Vec<CustomerStats>> {
    let customers = directory::distinct_customers_scan(store)?;
    if customers.len() > MAX_RECURSION_DEPTH {
        return Err(MetricsError::RecursionLimit {
            customers: customers.len(),
            limit: MAX_RECURSION_DEPTH,
        });
    }
    descend(store, &customers, Vec::with_capacity(customers.len()))
}

/// One customer per frame. The accumulator is an explicit parameter — no
/// shared mutable state threads through the descent.
fn descend(
    store: &SalesStore,
    pending: &[CustomerId],
    mut acc: Vec<CustomerStats>,
) -> MetricsResult<Vec<CustomerStats>> {
    let Some((customer, rest)) = pending.split_first() else {
        return Ok(acc);
    };
    let rows = store.rows_for(customer)?;
    acc.push(metrics::aggregate_rows(customer, &rows));
    descend(store, rest, acc)
}
