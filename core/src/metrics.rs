//! Per-customer statistics and population means.
//!
//! RULE: the statistics formulas live here, once. aggregate_rows() is the
//! pure derivation the iterative and recursive strategies share, and
//! from_totals() is the single landing point for the edge-case policy —
//! the relational GROUP BY totals arrive through it too.

use crate::{
    error::{MetricsError, MetricsResult},
    store::SalesRow,
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Derived statistics for one customer. Computed fresh per invocation,
/// never persisted, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub customer: CustomerId,
    pub order_amount: u64,
    pub lifespan_days: i64,
    pub total_profit: f64,
    pub profit_margin: f64,
    pub profit_per_order: f64,
}

impl CustomerStats {
    /// Assemble a statistics record from aggregate totals, applying the
    /// defensive edge policy: zero orders means zero profit-per-order, and
    /// a customer with no margin-defined rows (every sale amount zero)
    /// reports margin 0 rather than NaN.
    pub fn from_totals(
        customer: CustomerId,
        order_amount: u64,
        lifespan_days: i64,
        total_profit: f64,
        profit_margin: Option<f64>,
    ) -> Self {
        let profit_per_order = if order_amount > 0 {
            total_profit / order_amount as f64
        } else {
            0.0
        };
        let profit_margin = profit_margin.unwrap_or_else(|| {
            log::warn!(
                "customer {customer:?} has no rows with nonzero sales; \
                 profit margin undefined, reporting 0"
            );
            0.0
        });
        Self {
            customer,
            order_amount,
            lifespan_days,
            total_profit,
            profit_margin,
            profit_per_order,
        }
    }
}

/// Profit of a single transaction: sales minus cost of goods at MSRP.
pub fn row_profit(row: &SalesRow) -> f64 {
    row.sales - row.msrp * row.quantity_ordered as f64
}

/// Reduce one customer's rows to a statistics record in a single pass.
///
/// Lifespan is the day count between the earliest and latest order (0 for
/// a single order). Rows with a zero sale amount carry no defined margin
/// and are excluded from the margin mean.
pub fn aggregate_rows(customer: &str, rows: &[SalesRow]) -> CustomerStats {
    let mut first: Option<NaiveDate> = None;
    let mut last: Option<NaiveDate> = None;
    let mut total_profit = 0.0;
    let mut margin_sum = 0.0;
    let mut margin_rows = 0u64;

    for row in rows {
        let profit = row_profit(row);
        total_profit += profit;
        if row.sales != 0.0 {
            margin_sum += profit / row.sales;
            margin_rows += 1;
        }
        first = Some(first.map_or(row.order_date, |d| d.min(row.order_date)));
        last = Some(last.map_or(row.order_date, |d| d.max(row.order_date)));
    }

    let lifespan_days = match (first, last) {
        (Some(first), Some(last)) => last.signed_duration_since(first).num_days(),
        _ => 0,
    };
    let profit_margin = if margin_rows > 0 {
        Some(margin_sum / margin_rows as f64)
    } else {
        None
    };

    CustomerStats::from_totals(
        customer.to_string(),
        rows.len() as u64,
        lifespan_days,
        total_profit,
        profit_margin,
    )
}

/// Arithmetic mean of each per-customer statistic across the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationMetrics {
    pub mean_order_amount: f64,
    pub mean_lifespan_days: f64,
    pub mean_total_profit: f64,
    pub mean_profit_margin: f64,
    pub mean_profit_per_order: f64,
}

/// Reduce per-customer records to population means.
pub fn summarize(stats: &[CustomerStats]) -> MetricsResult<PopulationMetrics> {
    if stats.is_empty() {
        return Err(MetricsError::EmptyPopulation);
    }
    let n = stats.len() as f64;
    Ok(PopulationMetrics {
        mean_order_amount: stats.iter().map(|s| s.order_amount as f64).sum::<f64>() / n,
        mean_lifespan_days: stats.iter().map(|s| s.lifespan_days as f64).sum::<f64>() / n,
        mean_total_profit: stats.iter().map(|s| s.total_profit).sum::<f64>() / n,
        mean_profit_margin: stats.iter().map(|s| s.profit_margin).sum::<f64>() / n,
        mean_profit_per_order: stats.iter().map(|s| s.profit_per_order).sum::<f64>() / n,
    })
}
