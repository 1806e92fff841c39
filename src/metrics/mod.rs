//! Metrics engine: pure aggregations over a (filtered) [`TransactionSet`].
//!
//! Nothing here keeps state between calls; every function takes the set it
//! should reduce and returns a fresh result.
//!
//! [`TransactionSet`]: crate::data::model::TransactionSet

pub mod growth;
pub mod grouped;
pub mod hierarchy;
pub mod pivot;
pub mod rates;
pub mod smoothing;
pub mod summary;
pub mod time;

pub use growth::{LatestDay, MonthOverMonth, latest_day, month_over_month};
pub use grouped::{GroupedValues, grouped_count, grouped_sum};
pub use hierarchy::{Aggregate, HierarchyNode, Level, build_hierarchy};
pub use rates::{RateRow, overall_rate, status_rate_by, status_rate_with_totals};
pub use smoothing::{
    DailyPoint, SmoothingWindow, TrendPoint, daily_series, rolling_mean, smoothed_trends,
};
pub use summary::{KeyMetrics, key_metrics};
pub use time::TimeParts;

/// `part / whole * 100`, or 0 when `whole` is zero.
///
/// Every percentage in the engine goes through here so no NaN or infinity
/// reaches a caller.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let pct = part / whole * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}
