//! CSV ingestion tests: decoding, field splitting, and the reject-the-
//! whole-load policy for malformed rows.

use clv_core::error::MetricsError;
use clv_core::ingest::{load_into_store, parse_csv};
use std::path::PathBuf;

const HEADER: &str = "ORDERNUMBER,QUANTITYORDERED,ORDERDATE,SALES,MSRP,CUSTOMERNAME\n";

// ── Helpers ──────────────────────────────────────────────────────────────────

struct TempCsv {
    path: PathBuf,
}

impl TempCsv {
    fn write(name: &str, bytes: &[u8]) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!("clv-ingest-{}-{name}.csv", std::process::id()));
        std::fs::write(&path, bytes).unwrap();
        Self { path }
    }
}

impl Drop for TempCsv {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn loads_well_formed_export() {
    let csv = TempCsv::write(
        "well-formed",
        format!(
            "{HEADER}\
             10107,30,2/24/2003 0:00,2871.00,95,Land of Toys Inc.\n\
             10121,34,5/7/2003 0:00,2765.90,80,Reims Collectables\n\
             10168,36,10/28/2003 0:00,3479.76,92,Land of Toys Inc.\n"
        )
        .as_bytes(),
    );

    let rows = parse_csv(&csv.path).unwrap();
    assert_eq!(rows.len(), 3);

    let first = &rows[0];
    assert_eq!(first.customer, "Land of Toys Inc.");
    assert_eq!(first.order_date.to_string(), "2003-02-24");
    assert_eq!(first.quantity_ordered, 30);
    assert!((first.sales - 2871.0).abs() < 1e-9);
    assert!((first.msrp - 95.0).abs() < 1e-9);
}

#[test]
fn quoted_fields_keep_embedded_delimiters() {
    let csv = TempCsv::write(
        "quoted",
        format!(
            "{HEADER}\
             10201,22,12/1/2003 0:00,2168.54,95,\"Toys \"\"R\"\" Us, Inc.\"\n"
        )
        .as_bytes(),
    );

    let rows = parse_csv(&csv.path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer, "Toys \"R\" Us, Inc.");
}

/// The export is Latin-1; high bytes must decode to their code points
/// instead of failing UTF-8 validation.
#[test]
fn latin1_high_bytes_decode() {
    let mut bytes = HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(b"10134,41,7/1/2003 0:00,3884.34,92,Lyon Souveniers Caf\xe9\n");
    let csv = TempCsv::write("latin1", &bytes);

    let rows = parse_csv(&csv.path).unwrap();
    assert_eq!(rows[0].customer, "Lyon Souveniers Café");
}

#[test]
fn blank_lines_are_skipped() {
    let csv = TempCsv::write(
        "blank-lines",
        format!(
            "{HEADER}\
             10107,30,2/24/2003 0:00,2871.00,95,Land of Toys Inc.\n\
             \n\
             10121,34,5/7/2003 0:00,2765.90,80,Reims Collectables\n"
        )
        .as_bytes(),
    );

    assert_eq!(parse_csv(&csv.path).unwrap().len(), 2);
}

/// One bad field rejects the entire load, and the error carries the
/// 1-based line number of the offender.
#[test]
fn malformed_sales_rejects_whole_load() {
    let csv = TempCsv::write(
        "bad-sales",
        format!(
            "{HEADER}\
             10107,30,2/24/2003 0:00,2871.00,95,Land of Toys Inc.\n\
             10121,34,5/7/2003 0:00,not-a-number,80,Reims Collectables\n"
        )
        .as_bytes(),
    );

    let err = parse_csv(&csv.path).unwrap_err();
    match err {
        MetricsError::MalformedRow { line, field, value } => {
            assert_eq!(line, 3);
            assert_eq!(field, "SALES");
            assert_eq!(value, "not-a-number");
        }
        other => panic!("expected MalformedRow, got {other:?}"),
    }
}

#[test]
fn negative_amounts_are_malformed() {
    let csv = TempCsv::write(
        "negative-sales",
        format!("{HEADER}10107,30,2/24/2003 0:00,-5.00,95,Land of Toys Inc.\n").as_bytes(),
    );

    let err = parse_csv(&csv.path).unwrap_err();
    assert!(
        matches!(err, MetricsError::MalformedRow { line: 2, .. }),
        "expected MalformedRow at line 2, got {err:?}"
    );
}

#[test]
fn unparseable_date_is_malformed() {
    let csv = TempCsv::write(
        "bad-date",
        format!("{HEADER}10107,30,sometime in 2003,2871.00,95,Land of Toys Inc.\n").as_bytes(),
    );

    let err = parse_csv(&csv.path).unwrap_err();
    assert!(
        matches!(err, MetricsError::MalformedRow { ref field, .. } if field == "ORDERDATE"),
        "expected ORDERDATE MalformedRow, got {err:?}"
    );
}

#[test]
fn missing_required_column_is_rejected() {
    let csv = TempCsv::write(
        "missing-column",
        b"ORDERNUMBER,QUANTITYORDERED,ORDERDATE,SALES,CUSTOMERNAME\n\
          10107,30,2/24/2003 0:00,2871.00,Land of Toys Inc.\n",
    );

    let err = parse_csv(&csv.path).unwrap_err();
    assert!(
        matches!(err, MetricsError::MalformedRow { line: 1, ref field, .. } if field == "MSRP"),
        "expected missing-MSRP error, got {err:?}"
    );
}

#[test]
fn unreadable_file_is_storage_unavailable() {
    let path = std::env::temp_dir().join("clv-ingest-does-not-exist.csv");
    let err = parse_csv(&path).unwrap_err();
    assert!(
        matches!(err, MetricsError::StorageUnavailable { .. }),
        "expected StorageUnavailable, got {err:?}"
    );
}

/// End to end: CSV → store → typed read-back.
#[test]
fn load_into_store_round_trips_rows() {
    let csv = TempCsv::write(
        "end-to-end",
        format!(
            "{HEADER}\
             10107,30,2/24/2003 0:00,2871.00,95,Land of Toys Inc.\n\
             10121,34,5/7/2003 0:00,2765.90,80,Reims Collectables\n\
             10168,36,10/28/2003 0:00,3479.76,92,Land of Toys Inc.\n"
        )
        .as_bytes(),
    );

    let store = load_into_store(&csv.path).unwrap();
    assert_eq!(store.row_count().unwrap(), 3);

    let customers = store.distinct_customers().unwrap();
    assert_eq!(
        customers,
        vec!["Land of Toys Inc.".to_string(), "Reims Collectables".to_string()]
    );

    let toys = store.rows_for("Land of Toys Inc.").unwrap();
    assert_eq!(toys.len(), 2);
    assert_eq!(toys[0].order_date.to_string(), "2003-02-24");
}
