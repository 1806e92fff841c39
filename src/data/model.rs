use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// OrderStatus – the lifecycle state of one order
// ---------------------------------------------------------------------------

/// Order status as recorded in the source file.
///
/// The three labels the dashboard reasons about get their own variants;
/// anything else is kept verbatim so it still shows up in distributions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum OrderStatus {
    Completed,
    Cancelled,
    Returned,
    Other(String),
}

impl OrderStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Completed" => OrderStatus::Completed,
            "Cancelled" => OrderStatus::Cancelled,
            "Returned" => OrderStatus::Returned,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dimension / Measure – the fields aggregations talk about
// ---------------------------------------------------------------------------

/// A categorical column usable as (part of) a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Product,
    Region,
    PaymentMethod,
    OrderStatus,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Product,
        Dimension::Region,
        Dimension::PaymentMethod,
        Dimension::OrderStatus,
    ];

    /// Column name in the source file.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Product => "product",
            Dimension::Region => "region",
            Dimension::PaymentMethod => "payment_method",
            Dimension::OrderStatus => "order_status",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A numeric column that can be summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    SalesAmount,
    MarketingSpend,
}

// ---------------------------------------------------------------------------
// Transaction – one row of the source table
// ---------------------------------------------------------------------------

/// A single order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub payment_method: String,
    pub order_status: OrderStatus,
    /// `None` when the source cell was empty or not a number.
    pub sales_amount: Option<f64>,
    pub marketing_spend: f64,
}

impl Transaction {
    /// Value of a categorical column.
    pub fn dimension(&self, dim: Dimension) -> &str {
        match dim {
            Dimension::Product => &self.product,
            Dimension::Region => &self.region,
            Dimension::PaymentMethod => &self.payment_method,
            Dimension::OrderStatus => self.order_status.as_str(),
        }
    }

    /// Value of a numeric column, with missing sales reading as zero.
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::SalesAmount => self.sales_amount.unwrap_or(0.0),
            Measure::MarketingSpend => self.marketing_spend,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionSet – the loaded (or filtered) table
// ---------------------------------------------------------------------------

/// An immutable table of transactions with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct TransactionSet {
    /// Rows in file order.
    pub rows: Vec<Transaction>,
    /// For each categorical column the sorted set of distinct values.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl TransactionSet {
    /// Build column indices from the loaded rows.
    pub fn from_rows(rows: Vec<Transaction>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        for dim in Dimension::ALL {
            unique_values.insert(dim, BTreeSet::new());
        }

        for row in &rows {
            for dim in Dimension::ALL {
                unique_values
                    .entry(dim)
                    .or_default()
                    .insert(row.dimension(dim).to_string());
            }
        }

        TransactionSet {
            rows,
            unique_values,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.rows.iter()
    }

    /// Distinct values of `dim`, sorted.
    pub fn values_of(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.unique_values.get(&dim)
    }

    /// Sum of a measure over every row.
    pub fn total(&self, measure: Measure) -> f64 {
        self.rows.iter().map(|t| t.measure(measure)).sum()
    }

    /// Rows with the given status, as a new set.
    pub fn with_status(&self, status: &OrderStatus) -> TransactionSet {
        TransactionSet::from_rows(
            self.rows
                .iter()
                .filter(|t| &t.order_status == status)
                .cloned()
                .collect(),
        )
    }

    /// Latest date present, if any.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|t| t.date).max()
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
