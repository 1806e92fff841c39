use serde::Serialize;

use super::grouped::{GroupedValues, grouped_sum};
use super::rates::overall_rate;
use crate::data::model::{Dimension, Measure, OrderStatus, TransactionSet};

/// Headline numbers for the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub cancellation_rate: f64,
    pub return_rate: f64,
    /// Revenue per region, in region order.
    pub region_revenue: GroupedValues,
}

pub fn key_metrics(set: &TransactionSet) -> KeyMetrics {
    KeyMetrics {
        total_revenue: set.total(Measure::SalesAmount),
        total_orders: set.len(),
        cancellation_rate: overall_rate(set, &OrderStatus::Cancelled),
        return_rate: overall_rate(set, &OrderStatus::Returned),
        region_revenue: grouped_sum(set, &[Dimension::Region], Measure::SalesAmount),
    }
}
