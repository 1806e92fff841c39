use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::model::{Dimension, Transaction, TransactionSet};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// The dimensions the dashboard exposes as multi-select filters.
pub const FILTER_DIMENSIONS: [Dimension; 3] = [
    Dimension::Region,
    Dimension::Product,
    Dimension::PaymentMethod,
];

/// Per-dimension selection state: maps dimension → set of selected values.
/// If a dimension is absent it is unconstrained; if its set is empty nothing
/// passes.
pub type FilterState = BTreeMap<Dimension, BTreeSet<String>>;

/// Initialise a [`FilterState`] with every value of every filter dimension
/// selected (i.e., show everything).
pub fn init_filter_state(set: &TransactionSet) -> FilterState {
    FILTER_DIMENSIONS
        .iter()
        .map(|&dim| (dim, set.values_of(dim).cloned().unwrap_or_default()))
        .collect()
}

/// Whether a single row passes every active filter.
///
/// A row passes a dimension filter when:
/// * The dimension is not present in `filters` → passes (no constraint)
/// * The selected set is empty → nothing selected → fails
/// * The row's value for that dimension is in the selected set → passes
pub fn passes(row: &Transaction, filters: &FilterState) -> bool {
    filters
        .iter()
        .all(|(&dim, selected)| selected.contains(row.dimension(dim)))
}

/// Return a new set holding the rows of `set` that pass all active filters.
/// The source set is left untouched.
pub fn apply_filters(set: &TransactionSet, filters: &FilterState) -> TransactionSet {
    // Drop constraints that select every known value; they cannot exclude
    // anything.
    let active: FilterState = filters
        .iter()
        .filter(|(dim, selected)| match set.values_of(**dim) {
            Some(all_vals) => !all_vals.is_subset(selected),
            None => true,
        })
        .map(|(dim, selected)| (*dim, selected.clone()))
        .collect();

    let rows: Vec<Transaction> = set
        .iter()
        .filter(|row| passes(row, &active))
        .cloned()
        .collect();

    debug!(
        "filter kept {} of {} rows ({} active constraints)",
        rows.len(),
        set.len(),
        active.len()
    );
    TransactionSet::from_rows(rows)
}

/// Build a selection for one dimension from string slices.
pub fn selection<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::sample_set;

    #[test]
    fn default_state_selects_everything() {
        let set = sample_set();
        let filters = init_filter_state(&set);
        assert_eq!(filters.len(), 3);
        assert!(!filters.contains_key(&Dimension::OrderStatus));
        let filtered = apply_filters(&set, &filters);
        assert_eq!(filtered.len(), set.len());
    }

    #[test]
    fn restricts_to_selected_values() {
        let set = sample_set();
        let mut filters = init_filter_state(&set);
        filters.insert(Dimension::Region, selection(["East"]));
        filters.insert(Dimension::Product, selection(["Laptop", "Phone"]));

        let filtered = apply_filters(&set, &filters);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|t| t.region == "East"));
        assert!(filtered.iter().all(|t| t.product != "Tablet"));
        // Derived set re-indexes its own distinct values.
        assert_eq!(filtered.values_of(Dimension::Region).unwrap().len(), 1);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let set = sample_set();
        let mut filters = init_filter_state(&set);
        filters.insert(Dimension::PaymentMethod, BTreeSet::new());
        assert!(apply_filters(&set, &filters).is_empty());
    }

    #[test]
    fn absent_dimension_is_unconstrained() {
        let set = sample_set();
        let mut filters = FilterState::new();
        filters.insert(Dimension::Product, selection(["Tablet"]));
        let filtered = apply_filters(&set, &filters);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn unknown_values_select_nothing() {
        let set = sample_set();
        let mut filters = FilterState::new();
        filters.insert(Dimension::Region, selection(["Atlantis"]));
        assert!(apply_filters(&set, &filters).is_empty());
    }
}
