use std::collections::BTreeMap;

use serde::Serialize;

use super::time::TimeParts;
use crate::data::model::{Dimension, Measure, Transaction, TransactionSet};

/// One level of a hierarchical decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Year,
    Quarter,
    Month,
    Dimension(Dimension),
}

/// Year → quarter → month → product → region → payment method.
pub const DECOMPOSITION_LEVELS: [Level; 6] = [
    Level::Year,
    Level::Quarter,
    Level::Month,
    Level::Dimension(Dimension::Product),
    Level::Dimension(Dimension::Region),
    Level::Dimension(Dimension::PaymentMethod),
];

/// What a leaf accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Sum(Measure),
    Count,
}

impl Aggregate {
    fn value(self, row: &Transaction) -> f64 {
        match self {
            Aggregate::Sum(m) => row.measure(m),
            Aggregate::Count => 1.0,
        }
    }
}

impl Level {
    /// Sort position and display label of `row` at this level. Time levels
    /// sort chronologically, categorical levels lexically.
    fn key(self, row: &Transaction, time: &TimeParts) -> (i64, String) {
        match self {
            Level::Year => (time.year as i64, time.year.to_string()),
            Level::Quarter => (time.quarter as i64, time.quarter_name()),
            Level::Month => (time.month as i64, time.month_name().to_string()),
            Level::Dimension(d) => (0, row.dimension(d).to_string()),
        }
    }
}

/// A node of the decomposition tree. Internal node values are the sum of
/// their children; leaf values are the aggregate over the rows on that path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, label: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|c| c.label == label)
    }

    /// Follow a label path from this node.
    pub fn find(&self, path: &[&str]) -> Option<&HierarchyNode> {
        path.iter().try_fold(self, |node, label| node.child(label))
    }

    /// Flatten to `(path below root, value)` rows, one per leaf, in tree
    /// order. Equivalent to the flat grouped aggregation over all levels.
    pub fn leaves(&self) -> Vec<(Vec<String>, f64)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for child in &self.children {
            child.collect_leaves(&mut path, &mut out);
        }
        out
    }

    fn collect_leaves(&self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, f64)>) {
        path.push(self.label.clone());
        if self.is_leaf() {
            out.push((path.clone(), self.value));
        } else {
            for child in &self.children {
                child.collect_leaves(path, out);
            }
        }
        path.pop();
    }
}

#[derive(Default)]
struct NodeBuilder {
    value: f64,
    children: BTreeMap<(i64, String), NodeBuilder>,
}

impl NodeBuilder {
    fn finish(self, label: String) -> HierarchyNode {
        if self.children.is_empty() {
            return HierarchyNode {
                label,
                value: self.value,
                children: Vec::new(),
            };
        }
        let children: Vec<HierarchyNode> = self
            .children
            .into_iter()
            .map(|((_, child_label), b)| b.finish(child_label))
            .collect();
        HierarchyNode {
            label,
            value: children.iter().map(|c| c.value).sum(),
            children,
        }
    }
}

/// Build the tree `root_label → levels[0] → … → levels[n-1]`.
///
/// Every row lands on exactly one leaf, so the root equals the aggregate
/// over the whole set. An empty set yields a childless root worth 0.
pub fn build_hierarchy(
    set: &TransactionSet,
    root_label: &str,
    levels: &[Level],
    aggregate: Aggregate,
) -> HierarchyNode {
    let mut root = NodeBuilder::default();
    for row in set {
        let time = TimeParts::from_date(row.date);
        let mut node = &mut root;
        for level in levels {
            node = node.children.entry(level.key(row, &time)).or_default();
        }
        node.value += aggregate.value(row);
    }
    root.finish(root_label.to_string())
}
