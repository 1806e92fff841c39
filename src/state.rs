use std::collections::BTreeSet;

use crate::data::filter::{FilterState, apply_filters, init_filter_state};
use crate::data::model::{Dimension, TransactionSet};
use crate::error::MetricsError;
use crate::metrics::SmoothingWindow;
use crate::report::{DashboardReport, ReportOptions, build_report};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The user's current selections over one loaded table.
///
/// Holds no derived data: every [`report`](Self::report) call filters the
/// source again and recomputes every aggregate.
pub struct DashboardState {
    /// Loaded table, never modified.
    source: TransactionSet,

    /// Per-dimension filter selections.
    pub filters: FilterState,

    /// Trend smoothing window.
    pub window: SmoothingWindow,
}

impl DashboardState {
    /// Ingest a newly loaded table with every filter value selected.
    pub fn new(source: TransactionSet) -> Self {
        Self {
            filters: init_filter_state(&source),
            source,
            window: SmoothingWindow::default(),
        }
    }

    pub fn source(&self) -> &TransactionSet {
        &self.source
    }

    /// Rows passing the current filters, as a new set.
    pub fn filtered(&self) -> TransactionSet {
        apply_filters(&self.source, &self.filters)
    }

    /// Recompute the full report for the current selection.
    pub fn report(&self) -> DashboardReport {
        build_report(&self.filtered(), &ReportOptions { window: self.window })
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle(&mut self, dim: Dimension, value: &str) {
        let selected = self.filters.entry(dim).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Replace a dimension's selection.
    pub fn select(&mut self, dim: Dimension, values: BTreeSet<String>) {
        self.filters.insert(dim, values);
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(all_vals) = self.source.values_of(dim) {
            self.filters.insert(dim, all_vals.clone());
        }
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dim: Dimension) {
        self.filters.insert(dim, BTreeSet::new());
    }

    pub fn set_window(&mut self, size: usize) -> Result<(), MetricsError> {
        self.window = SmoothingWindow::new(size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::selection;
    use crate::data::model::fixtures::sample_set;

    #[test]
    fn toggling_values_changes_the_report() {
        let mut state = DashboardState::new(sample_set());
        assert_eq!(state.report().key_metrics.total_orders, 9);

        state.toggle(Dimension::Region, "East");
        assert_eq!(state.report().key_metrics.total_orders, 5);

        state.toggle(Dimension::Region, "East");
        assert_eq!(state.report().key_metrics.total_orders, 9);
        // Source is never narrowed.
        assert_eq!(state.source().len(), 9);
    }

    #[test]
    fn select_none_empties_the_report_without_errors() {
        let mut state = DashboardState::new(sample_set());
        state.select_none(Dimension::Product);
        let report = state.report();
        assert_eq!(report.key_metrics.total_orders, 0);
        assert_eq!(report.key_metrics.return_rate, 0.0);

        state.select_all(Dimension::Product);
        assert_eq!(state.filtered().len(), 9);
    }

    #[test]
    fn select_replaces_selection() {
        let mut state = DashboardState::new(sample_set());
        state.select(Dimension::PaymentMethod, selection(["PayPal"]));
        assert_eq!(state.filtered().len(), 2);
    }

    #[test]
    fn window_changes_are_validated() {
        let mut state = DashboardState::new(sample_set());
        assert!(state.set_window(31).is_err());
        assert_eq!(state.window.get(), 15);
        state.set_window(3).unwrap();
        assert_eq!(state.report().smoothing_window, 3);
    }
}
