//! clv-runner: headless harness for the sales metrics pipeline.
//!
//! Usage:
//!   clv-runner --csv data/sales_sample.csv --strategy all
//!   clv-runner --csv export.csv --db sales.db --strategy relational --json
//!   clv-runner --search

use anyhow::{Context, Result};
use clv_core::{
    clv, ingest,
    metrics::PopulationMetrics,
    search,
    store::SalesStore,
    strategy::{compute_metrics, Strategy},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Serialize)]
struct StrategyReport {
    strategy: &'static str,
    metrics: PopulationMetrics,
    clv: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--search") {
        return search_loop();
    }

    let csv = flag_value(&args, "--csv").unwrap_or("data/sales_sample.csv");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let strategy_arg = flag_value(&args, "--strategy").unwrap_or("all");
    let json = args.iter().any(|a| a == "--json");

    let strategies: Vec<Strategy> = if strategy_arg == "all" {
        Strategy::ALL.to_vec()
    } else {
        vec![strategy_arg.parse().map_err(anyhow::Error::msg)?]
    };

    if !json {
        println!("clv-runner — sales metrics & customer lifetime value");
        println!("  csv:       {csv}");
        println!("  db:        {db}");
        println!("  strategy:  {strategy_arg}");
        println!();
    }

    let store = if db == ":memory:" {
        SalesStore::in_memory()?
    } else {
        SalesStore::open(db)?
    };
    store.migrate()?;
    store.clear()?;
    let count = ingest::load_into(Path::new(csv), &store)?;

    let mut reports = Vec::new();
    for strategy in &strategies {
        let metrics = compute_metrics(&store, *strategy)
            .with_context(|| format!("{strategy} metrics computation failed"))?;
        let value = clv::estimate(&metrics)
            .with_context(|| format!("{strategy} CLV estimation failed"))?;
        reports.push(StrategyReport {
            strategy: strategy.name(),
            metrics,
            clv: value,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("{count} rows loaded");
    for report in &reports {
        println!();
        println!("[{}]", report.strategy);
        println!(
            "  mean order amount:     {:>12.4}",
            report.metrics.mean_order_amount
        );
        println!(
            "  mean lifespan (days):  {:>12.4}",
            report.metrics.mean_lifespan_days
        );
        println!(
            "  mean total profit:     {:>12.2}",
            report.metrics.mean_total_profit
        );
        println!(
            "  mean profit margin:    {:>12.4}",
            report.metrics.mean_profit_margin
        );
        println!(
            "  mean profit per order: {:>12.2}",
            report.metrics.mean_profit_per_order
        );
        println!("  CLV estimate:          {:>12.2}", report.clv);
    }

    if reports.len() > 1 {
        let high = reports.iter().map(|r| r.clv).fold(f64::MIN, f64::max);
        let low = reports.iter().map(|r| r.clv).fold(f64::MAX, f64::min);
        println!();
        println!("strategy agreement: CLV spread {:.9}", high - low);
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Interactive search demo: read a target and a comma-separated integer
/// list from stdin, run the four search routines, report positions.
fn search_loop() -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("target integer (empty to quit): ");
        io::stdout().flush()?;
        let Some(target_line) = lines.next() else { break };
        let target_line = target_line?;
        if target_line.trim().is_empty() {
            break;
        }
        let Ok(target) = target_line.trim().parse::<i64>() else {
            println!("not an integer: {target_line:?}");
            continue;
        };

        print!("comma-separated integers: ");
        io::stdout().flush()?;
        let Some(list_line) = lines.next() else { break };
        let list_line = list_line?;
        let parsed: Result<Vec<i64>, _> = list_line
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect();
        let Ok(items) = parsed else {
            println!("list must contain only integers: {list_line:?}");
            continue;
        };

        let sorted = search::is_sorted(&items);
        println!("list: {items:?} (sorted: {sorted}), target: {target}");
        report(
            "linear iterative",
            search::linear_search_iterative(&items, target),
        );
        report(
            "linear recursive",
            search::linear_search_recursive(&items, target),
        );
        if sorted {
            report(
                "binary iterative",
                search::binary_search_iterative(&items, target),
            );
            report(
                "binary recursive",
                search::binary_search_recursive(&items, target),
            );
        } else {
            println!("  binary search skipped (list not sorted)");
        }
    }

    Ok(())
}

fn report(label: &str, result: Option<usize>) {
    match result {
        Some(index) => println!("  {label}: found at index {index}"),
        None => println!("  {label}: not found"),
    }
}
