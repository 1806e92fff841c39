use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::percentage;
use super::time::{TimeParts, month_name};
use crate::data::model::{Dimension, Measure, OrderStatus, TransactionSet};

/// Orders per `(year, month, status)`, in chronological then status order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub year: i32,
    pub month_name: &'static str,
    pub order_status: String,
    pub count: usize,
}

pub fn status_distribution(set: &TransactionSet) -> Vec<StatusCount> {
    let mut counts: BTreeMap<(i32, u32, String), usize> = BTreeMap::new();
    for row in set {
        let time = TimeParts::from_date(row.date);
        let key = (time.year, time.month, row.order_status.to_string());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((year, month, order_status), count)| StatusCount {
            year,
            month_name: month_name(month).unwrap_or_default(),
            order_status,
            count,
        })
        .collect()
}

/// Revenue and return rate per `(year, month, product)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPerformance {
    pub year: i32,
    pub month_name: &'static str,
    pub product: String,
    pub revenue: f64,
    pub return_rate: f64,
}

pub fn product_performance(set: &TransactionSet) -> Vec<ProductPerformance> {
    #[derive(Default)]
    struct Acc {
        revenue: f64,
        orders: usize,
        returned: usize,
    }

    let mut groups: BTreeMap<(i32, u32, String), Acc> = BTreeMap::new();
    for row in set {
        let time = TimeParts::from_date(row.date);
        let acc = groups
            .entry((time.year, time.month, row.product.clone()))
            .or_default();
        acc.revenue += row.measure(Measure::SalesAmount);
        acc.orders += 1;
        if row.order_status == OrderStatus::Returned {
            acc.returned += 1;
        }
    }

    groups
        .into_iter()
        .map(|((year, month, product), acc)| ProductPerformance {
            year,
            month_name: month_name(month).unwrap_or_default(),
            product,
            revenue: acc.revenue,
            return_rate: percentage(acc.returned as f64, acc.orders as f64),
        })
        .collect()
}

/// A dense grid of `rows × columns` cells; `None` where no row of the source
/// falls into a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        self.cells[r][c]
    }
}

/// Sales summed per product × month name.
///
/// Columns are the month names present, in calendar order; months of
/// different years fall into the same column.
pub fn product_month_heatmap(set: &TransactionSet) -> PivotTable {
    let mut sums: BTreeMap<(String, u32), f64> = BTreeMap::new();
    let mut products: BTreeSet<String> = BTreeSet::new();
    let mut months: BTreeSet<u32> = BTreeSet::new();

    for row in set {
        let month = TimeParts::from_date(row.date).month;
        let product = row.dimension(Dimension::Product).to_string();
        products.insert(product.clone());
        months.insert(month);
        *sums.entry((product, month)).or_insert(0.0) += row.measure(Measure::SalesAmount);
    }

    let cells: Vec<Vec<Option<f64>>> = products
        .iter()
        .map(|p| {
            months
                .iter()
                .map(|&m| sums.get(&(p.clone(), m)).copied())
                .collect::<Vec<_>>()
        })
        .collect();

    PivotTable {
        rows: products.into_iter().collect(),
        columns: months
            .into_iter()
            .filter_map(month_name)
            .map(str::to_string)
            .collect(),
        cells,
    }
}
