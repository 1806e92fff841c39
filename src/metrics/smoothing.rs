use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::model::{Measure, TransactionSet};
use crate::error::MetricsError;

/// Trailing window length, counted in data points (not calendar days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SmoothingWindow(usize);

impl SmoothingWindow {
    pub const MIN: usize = 1;
    pub const MAX: usize = 30;
    pub const DEFAULT: usize = 15;

    pub fn new(size: usize) -> Result<Self, MetricsError> {
        if !(Self::MIN..=Self::MAX).contains(&size) {
            return Err(MetricsError::WindowOutOfRange {
                got: size,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(SmoothingWindow(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        SmoothingWindow(Self::DEFAULT)
    }
}

impl TryFrom<usize> for SmoothingWindow {
    type Error = MetricsError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        SmoothingWindow::new(size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Per-date sums of sales and marketing, raw and smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub sales_amount: f64,
    pub marketing_spend: f64,
    pub sales_amount_smooth: f64,
    pub marketing_spend_smooth: f64,
}

/// Sum `measure` per calendar date, ascending. Dates without orders are
/// absent, not zero.
pub fn daily_series(set: &TransactionSet, measure: Measure) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in set {
        *by_date.entry(row.date).or_insert(0.0) += row.measure(measure);
    }
    by_date
        .into_iter()
        .map(|(date, value)| DailyPoint { date, value })
        .collect()
}

/// Trailing mean over the last `window` points, using however many points
/// exist at the start of the series (minimum period 1).
pub fn rolling_mean(values: &[f64], window: SmoothingWindow) -> Vec<f64> {
    let w = window.get();
    (0..values.len())
        .map(|i| {
            let span = &values[(i + 1).saturating_sub(w)..=i];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

/// Daily sales and marketing sums with both columns smoothed.
pub fn smoothed_trends(set: &TransactionSet, window: SmoothingWindow) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in set {
        let entry = by_date.entry(row.date).or_insert((0.0, 0.0));
        entry.0 += row.measure(Measure::SalesAmount);
        entry.1 += row.measure(Measure::MarketingSpend);
    }

    let sales: Vec<f64> = by_date.values().map(|v| v.0).collect();
    let marketing: Vec<f64> = by_date.values().map(|v| v.1).collect();
    let sales_smooth = rolling_mean(&sales, window);
    let marketing_smooth = rolling_mean(&marketing, window);

    by_date
        .keys()
        .enumerate()
        .map(|(i, &date)| TrendPoint {
            date,
            sales_amount: sales[i],
            marketing_spend: marketing[i],
            sales_amount_smooth: sales_smooth[i],
            marketing_spend_smooth: marketing_smooth[i],
        })
        .collect()
}
