use std::collections::BTreeMap;

use serde::Serialize;

use super::percentage;
use crate::data::model::{Dimension, OrderStatus, TransactionSet};

/// Share of a group's orders that ended in a given status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub group: String,
    pub matched: usize,
    pub total: usize,
    /// Percentage in `[0, 100]`.
    pub rate: f64,
}

/// Order count per value of `dim`.
pub fn group_totals(set: &TransactionSet, dim: Dimension) -> BTreeMap<String, usize> {
    let mut totals = BTreeMap::new();
    for row in set {
        *totals.entry(row.dimension(dim).to_string()).or_insert(0) += 1;
    }
    totals
}

/// Rate of `status` per value of `dim`, against precomputed group totals.
///
/// Groups are taken from `totals`, so a group with no matching orders is
/// still reported (at 0%). Callers that need several rates over the same
/// dimension compute the totals once and pass them to each call.
pub fn status_rate_with_totals(
    set: &TransactionSet,
    status: &OrderStatus,
    dim: Dimension,
    totals: &BTreeMap<String, usize>,
) -> Vec<RateRow> {
    let mut matched: BTreeMap<&str, usize> = BTreeMap::new();
    for row in set.iter().filter(|t| &t.order_status == status) {
        *matched.entry(row.dimension(dim)).or_insert(0) += 1;
    }

    totals
        .iter()
        .map(|(group, &total)| {
            let hits = matched.get(group.as_str()).copied().unwrap_or(0);
            RateRow {
                group: group.clone(),
                matched: hits,
                total,
                rate: percentage(hits as f64, total as f64),
            }
        })
        .collect()
}

/// Rate of `status` per value of `dim`.
pub fn status_rate_by(set: &TransactionSet, status: &OrderStatus, dim: Dimension) -> Vec<RateRow> {
    let totals = group_totals(set, dim);
    status_rate_with_totals(set, status, dim, &totals)
}

/// Rate of `status` across the whole set; 0 for an empty set.
pub fn overall_rate(set: &TransactionSet, status: &OrderStatus) -> f64 {
    let hits = set.iter().filter(|t| &t.order_status == status).count();
    percentage(hits as f64, set.len() as f64)
}
