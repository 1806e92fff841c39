use std::io::Write;

use rusty_sales::data::filter::selection;
use rusty_sales::data::loader::load_file;
use rusty_sales::metrics::hierarchy::DECOMPOSITION_LEVELS;
use rusty_sales::metrics::{Aggregate, build_hierarchy, grouped_sum};
use rusty_sales::{DashboardState, Dimension, LoadError, Measure};

const DATA: &str = "\
date,product,region,payment_method,order_status,sales_amount,marketing_spend
01/01/2023,A,East,Card,Cancelled,100,10
02/01/2023,A,East,Card,Completed,200,20
15/02/2023,B,West,Cash,Returned,50,5
16/02/2023,B,West,PayPal,Completed,oops,7
03/03/2023,C,North,Card,Completed,400,12
03/03/2023,A,North,Cash,Cancelled,150,8
";

fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn csv_to_report_end_to_end() {
    let file = write_temp(DATA, ".csv");
    let source = load_file(file.path()).expect("load");
    assert_eq!(source.len(), 6);
    // "oops" is coerced to missing, not rejected.
    assert_eq!(source.rows[3].sales_amount, None);

    let state = DashboardState::new(source);
    let report = state.report();

    let m = &report.key_metrics;
    assert_eq!(m.total_revenue, 900.0);
    assert_eq!(m.total_orders, 6);
    assert!((m.cancellation_rate - 100.0 / 3.0).abs() < 1e-9);
    assert!((m.return_rate - 100.0 / 6.0).abs() < 1e-9);

    let top = &report.revenue.by_product.rows[0];
    assert_eq!(top.key, vec!["A".to_string()]);
    assert_eq!(top.value, 450.0);

    let east = report
        .cancellations
        .by_region
        .iter()
        .find(|r| r.group == "East")
        .expect("East present");
    assert_eq!(east.rate, 50.0);

    // March is the latest month: 550 vs 50 in February.
    let mom = report.month_over_month.expect("growth reported");
    assert_eq!(mom.current, 550.0);
    assert_eq!(mom.previous, 50.0);
    assert_eq!(mom.growth_pct, 1000.0);

    let leaves: f64 = report.hierarchies.sales.leaves().iter().map(|(_, v)| v).sum();
    assert_eq!(leaves, m.total_revenue);
}

#[test]
fn filtering_to_nothing_yields_zeros() {
    let file = write_temp(DATA, ".csv");
    let mut state = DashboardState::new(load_file(file.path()).expect("load"));
    state.select(Dimension::Region, selection(["East"]));
    state.select(Dimension::Product, selection(["C"]));

    let report = state.report();
    assert_eq!(report.key_metrics.total_revenue, 0.0);
    assert_eq!(report.key_metrics.total_orders, 0);
    assert_eq!(report.key_metrics.cancellation_rate, 0.0);
    assert_eq!(report.key_metrics.return_rate, 0.0);
    assert!(report.trends.is_empty());
    assert!(report.latest_day.is_none());
}

#[test]
fn partition_exactness_on_loaded_data() {
    let file = write_temp(DATA, ".csv");
    let set = load_file(file.path()).expect("load");
    for measure in [Measure::SalesAmount, Measure::MarketingSpend] {
        let whole = set.total(measure);
        for dim in Dimension::ALL {
            let grouped = grouped_sum(&set, &[dim], measure);
            assert!((grouped.total() - whole).abs() < 1e-9);
        }
        let tree = build_hierarchy(&set, "Total", &DECOMPOSITION_LEVELS, Aggregate::Sum(measure));
        assert!((tree.value - whole).abs() < 1e-9);
    }
}

#[test]
fn bad_date_aborts_the_load() {
    let file = write_temp(
        "date,product,region,payment_method,order_status,sales_amount,marketing_spend\n\
         31/02/2023,A,East,Card,Completed,1,1\n",
        ".csv",
    );
    let err = load_file(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LoadError>(),
        Some(LoadError::InvalidDate { row: 1, .. })
    ));
}
