use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{Dimension, Measure, Transaction, TransactionSet};

/// One group: its key tuple and the aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: Vec<String>,
    pub value: f64,
}

/// Result of a grouped aggregation, in grouping order (keys ascending).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedValues {
    pub keys: Vec<Dimension>,
    pub rows: Vec<GroupRow>,
}

impl GroupedValues {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a group by its key tuple.
    pub fn get(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|r| r.value)
    }

    /// Sum over all groups.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Rows sorted descending by value; ties keep grouping order.
    pub fn ranked(&self) -> GroupedValues {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        GroupedValues {
            keys: self.keys.clone(),
            rows,
        }
    }
}

fn key_of(row: &Transaction, keys: &[Dimension]) -> Vec<String> {
    keys.iter().map(|&d| row.dimension(d).to_string()).collect()
}

fn group_by<F>(set: &TransactionSet, keys: &[Dimension], value: F) -> GroupedValues
where
    F: Fn(&Transaction) -> f64,
{
    let mut acc: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for row in set {
        *acc.entry(key_of(row, keys)).or_insert(0.0) += value(row);
    }
    GroupedValues {
        keys: keys.to_vec(),
        rows: acc
            .into_iter()
            .map(|(key, value)| GroupRow { key, value })
            .collect(),
    }
}

/// Sum `measure` per distinct key combination. Missing values add 0.
pub fn grouped_sum(set: &TransactionSet, keys: &[Dimension], measure: Measure) -> GroupedValues {
    group_by(set, keys, |t| t.measure(measure))
}

/// Row count per distinct key combination.
pub fn grouped_count(set: &TransactionSet, keys: &[Dimension]) -> GroupedValues {
    group_by(set, keys, |_| 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{sample_set, tx};

    #[test]
    fn sums_per_product() {
        let set = TransactionSet::from_rows(vec![
            tx("01/01/2023", "A", "East", "Card", "Cancelled", Some(100.0), 0.0),
            tx("02/01/2023", "A", "East", "Card", "Completed", Some(200.0), 0.0),
        ]);
        let by_product = grouped_sum(&set, &[Dimension::Product], Measure::SalesAmount);
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product.get(&["A"]), Some(300.0));
    }

    #[test]
    fn partition_sums_match_whole_set_for_every_key() {
        let set = sample_set();
        let whole = set.total(Measure::SalesAmount);
        let key_sets: [&[Dimension]; 5] = [
            &[Dimension::Product],
            &[Dimension::Region],
            &[Dimension::PaymentMethod],
            &[Dimension::OrderStatus],
            &[Dimension::Product, Dimension::Region, Dimension::PaymentMethod],
        ];
        for keys in key_sets {
            let grouped = grouped_sum(&set, keys, Measure::SalesAmount);
            assert!((grouped.total() - whole).abs() < 1e-9, "keys {keys:?}");
        }
    }

    #[test]
    fn ranked_is_descending_grouping_order_is_ascending() {
        let set = sample_set();
        let by_region = grouped_sum(&set, &[Dimension::Region], Measure::SalesAmount);
        let order: Vec<&str> = by_region.rows.iter().map(|r| r.key[0].as_str()).collect();
        assert_eq!(order, vec!["East", "North", "West"]);

        let ranked = by_region.ranked();
        let values: Vec<f64> = ranked.rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3200.0, 2950.0, 950.0]);
        assert_eq!(ranked.rows[0].key, vec!["East".to_string()]);
    }

    #[test]
    fn counts_rows_per_group() {
        let set = sample_set();
        let counts = grouped_count(&set, &[Dimension::PaymentMethod]);
        assert_eq!(counts.get(&["Card"]), Some(4.0));
        assert_eq!(counts.get(&["Cash"]), Some(3.0));
        assert_eq!(counts.get(&["PayPal"]), Some(2.0));
        assert_eq!(counts.total(), set.len() as f64);
    }

    #[test]
    fn empty_set_yields_no_groups() {
        let set = TransactionSet::default();
        let grouped = grouped_sum(&set, &[Dimension::Product], Measure::SalesAmount);
        assert!(grouped.is_empty());
        assert_eq!(grouped.total(), 0.0);
    }
}
