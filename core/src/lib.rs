//! clv-core — per-customer sales metrics and customer-lifetime-value
//! estimation over a SQLite-backed sales transaction table.
//!
//! RULES:
//!   - Only store.rs talks to the database. Everything else calls store
//!     methods — no module executes SQL directly.
//!   - The per-customer statistics formulas live once, in metrics.rs.
//!     The iterative and recursive strategies consume them; the relational
//!     strategy expresses the same formulas in a single GROUP BY statement.
//!   - All three strategies must agree numerically on the same dataset and
//!     surface failures through the same error taxonomy, so a caller cannot
//!     tell from the error shape which strategy ran.

pub mod clv;
pub mod directory;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod search;
pub mod store;
pub mod strategy;
pub mod types;
