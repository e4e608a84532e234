use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::loader::{LoadedSource, SourceCache};
use crate::data::model::Value;
use crate::report::Report;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Load-once source handle (None until the user opens a file).
    pub source: Option<Arc<LoadedSource>>,

    /// Cache backing `source`; reopening an unchanged file is free.
    pub cache: SourceCache,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Derived datasets for the current pass; `None` while `no_match`.
    pub report: Option<Report>,

    /// The expected "no records match the filters" outcome; suppresses all
    /// chart rendering for the pass.
    pub no_match: bool,

    /// Colour maps for scatter color-by columns, keyed lazily per column.
    pub color_maps: Vec<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            source: None,
            cache: SourceCache::default(),
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            report: None,
            no_match: false,
            color_maps: Vec::new(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Open (or re-open) a source file through the cache.
    pub fn open_path(&mut self, path: &Path) {
        match self.cache.get_or_load(path) {
            Ok(source) => {
                log::info!(
                    "{} profile active, {} records",
                    source.profile.name,
                    source.dataset.len()
                );
                self.set_source(source);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded source, initialise filters and colour maps.
    pub fn set_source(&mut self, source: Arc<LoadedSource>) {
        self.filters = init_filter_state(&source.dataset, &source.profile.filter_columns);

        self.color_maps = source
            .profile
            .scatters
            .iter()
            .filter_map(|s| s.color_column)
            .filter_map(|col| {
                source
                    .dataset
                    .unique_values
                    .get(col)
                    .map(|vals| ColorMap::new(col, vals))
            })
            .collect();

        self.source = Some(source);
        self.status_message = None;
        self.refilter();
    }

    /// Colour map for a given color-by column, if one was built.
    pub fn color_map_for(&self, column: &str) -> Option<&ColorMap> {
        self.color_maps.iter().find(|cm| cm.column == column)
    }

    /// Recompute the filtered subset and the report after a filter change.
    /// One full synchronous pass: filter → aggregate/correlate.
    pub fn refilter(&mut self) {
        let Some(source) = &self.source else {
            return;
        };

        self.visible_indices = filtered_indices(&source.dataset, &self.filters);

        if self.visible_indices.is_empty() {
            // Expected outcome, not a fault: charts are suppressed.
            self.report = None;
            self.no_match = true;
            return;
        }
        self.no_match = false;

        match Report::build(&source.dataset, &self.visible_indices, &source.profile) {
            Ok(report) => {
                self.report = Some(report);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Report pass failed: {e}");
                self.report = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(source) = &self.source {
            if let Some(all_vals) = source.dataset.unique_values.get(column) {
                let all_vals = all_vals.clone();
                self.filters.insert(column.to_string(), all_vals);
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Record};
    use crate::data::profile::Profile;
    use std::collections::BTreeMap;

    fn sales_source() -> Arc<LoadedSource> {
        let rows = [
            ("A", "13:01:00", "Food", 10.0),
            ("B", "14:30:00", "Food", 20.0),
            ("A", "15:45:30", "Sports", 5.0),
        ];
        let records: Vec<Record> = rows
            .iter()
            .map(|(city, time, line, total)| {
                let mut values = BTreeMap::new();
                values.insert("City".into(), Value::String(city.to_string()));
                values.insert("Customer_type".into(), Value::String("Member".into()));
                values.insert("Gender".into(), Value::String("Female".into()));
                values.insert("Product line".into(), Value::String(line.to_string()));
                values.insert("Time".into(), Value::String(time.to_string()));
                values.insert("Total".into(), Value::Float(*total));
                values.insert("Rating".into(), Value::Float(8.0));
                values.insert("gross margin percentage".into(), Value::Float(4.76));
                values.insert("Unit price".into(), Value::Float(*total / 2.0));
                values.insert("gross income".into(), Value::Float(total / 10.0));
                Record { values }
            })
            .collect();

        let raw = Dataset::from_records(records);
        let profile = Profile::detect(&raw).unwrap();
        let mut records = raw.records;
        crate::data::derive::apply_derivations(&mut records, &profile.derivations).unwrap();
        Arc::new(LoadedSource {
            dataset: Dataset::from_records(records),
            profile,
        })
    }

    #[test]
    fn set_source_defaults_to_full_domain() {
        let mut state = AppState::default();
        state.set_source(sales_source());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert!(!state.no_match);
        assert!(state.report.is_some());
        // Each filterable column starts with its whole domain selected.
        assert_eq!(state.filters["City"].len(), 2);
        assert_eq!(state.filters["product_type"].len(), 2);
    }

    #[test]
    fn empty_selection_raises_no_match_and_suppresses_report() {
        let mut state = AppState::default();
        state.set_source(sales_source());
        state.select_none("City");
        assert!(state.visible_indices.is_empty());
        assert!(state.no_match);
        assert!(state.report.is_none());

        // Recovery: selecting everything again restores the pass.
        state.select_all("City");
        assert!(!state.no_match);
        assert!(state.report.is_some());
    }

    #[test]
    fn toggling_a_value_narrows_the_subset() {
        let mut state = AppState::default();
        state.set_source(sales_source());
        state.toggle_filter_value("City", &Value::String("B".into()));
        assert_eq!(state.visible_indices, vec![0, 2]);

        let report = state.report.as_ref().unwrap();
        assert_eq!(report.kpis[0].value, "US $ 15");
    }
}
