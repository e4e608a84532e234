use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map is unconstrained; an *empty* set means
/// "nothing selected" and hides every row.
pub type FilterState = BTreeMap<String, BTreeSet<Value>>;

/// Initialise a [`FilterState`] for the given filterable columns with all
/// observed values selected (i.e., show everything).
pub fn init_filter_state(dataset: &Dataset, filter_columns: &[String]) -> FilterState {
    filter_columns
        .iter()
        .filter_map(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| (col.clone(), vals.clone()))
        })
        .collect()
}

/// Return indices of records that pass all active filters, in source order.
///
/// A record passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The record's value for that column is in the selected set → passes
///
/// Columns combine conjunctively: a record must pass every filter.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            for (col, selected) in filters {
                if selected.is_empty() {
                    // Nothing selected for this column → hide everything
                    return false;
                }
                // Check all unique values are selected → no effective filter
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if selected.len() == all_vals.len() {
                        continue; // everything selected, no filtering needed
                    }
                }
                match rec.get(col) {
                    Some(val) => {
                        if !selected.contains(val) {
                            return false;
                        }
                    }
                    None => {
                        // record lacks this column → include only if Null is selected
                        if !selected.contains(&Value::Null) {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}
