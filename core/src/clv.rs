//! Customer-lifetime-value estimation from population means.

use crate::{
    error::{MetricsError, MetricsResult},
    metrics::PopulationMetrics,
    store::SalesStore,
    strategy::{self, Strategy},
    types::DAYS_PER_YEAR,
};

/// CLV = mean profit per order × order frequency × lifespan in years,
/// where order frequency is the mean order count per lifespan year.
///
/// A population whose mean lifespan is zero days (every customer ordered
/// exactly once) has no defined order frequency.
pub fn estimate(metrics: &PopulationMetrics) -> MetricsResult<f64> {
    if metrics.mean_lifespan_days == 0.0 {
        return Err(MetricsError::DegenerateLifespan);
    }
    let lifespan_years = metrics.mean_lifespan_days / DAYS_PER_YEAR;
    let order_frequency = metrics.mean_order_amount / lifespan_years;
    Ok(metrics.mean_profit_per_order * order_frequency * lifespan_years)
}

/// Full pipeline: per-customer aggregation under the chosen strategy,
/// population means, then the CLV estimate.
pub fn compute_clv(store: &SalesStore, strategy: Strategy) -> MetricsResult<f64> {
    let metrics = strategy::compute_metrics(store, strategy)?;
    estimate(&metrics)
}
