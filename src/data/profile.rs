use super::aggregate::Reduce;
use super::derive::Derivation;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Dashboard profiles – one per deployment variant
// ---------------------------------------------------------------------------
//
// A profile is pure data: which columns the loaded table must carry, which
// columns get derived, which are filterable, and which KPIs / charts the
// central panel renders. The engines below `data/` know nothing about
// variants; they only see column names.

/// One scalar KPI shown in the header row.
#[derive(Debug, Clone)]
pub struct KpiSpec {
    pub label: &'static str,
    pub column: &'static str,
    pub op: Reduce,
    /// Decimal places for display; 0 renders as a thousands-grouped integer.
    pub decimals: u32,
    pub prefix: &'static str,
    /// Append a star string built from the rounded value.
    pub stars: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One grouped bar chart: group by a column, reduce another.
#[derive(Debug, Clone)]
pub struct BarSpec {
    pub title: &'static str,
    pub group_column: &'static str,
    pub value_column: &'static str,
    pub op: Reduce,
    pub orientation: Orientation,
}

/// One scatter chart over two numeric columns.
#[derive(Debug, Clone)]
pub struct ScatterSpec {
    pub title: &'static str,
    pub x_column: &'static str,
    pub y_column: &'static str,
    /// Collapse to one point per distinct x (mean of y) before plotting.
    pub mean_by_x: bool,
    /// Color points by this categorical column.
    pub color_column: Option<&'static str>,
    pub trend: bool,
}

/// Everything variant-specific about one deployment.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    /// Columns the source file must provide (pre-derivation).
    pub required_columns: &'static [&'static str],
    pub derivations: Vec<Derivation>,
    /// Columns exposed in the filter side panel (may include derived ones).
    pub filter_columns: Vec<String>,
    pub kpis: Vec<KpiSpec>,
    pub bars: Vec<BarSpec>,
    pub scatters: Vec<ScatterSpec>,
    /// Numeric columns for the correlation heatmap; empty = no heatmap.
    pub correlation_columns: Vec<String>,
}

const SEX_LABELS: &[(i64, &str)] = &[(1, "Male"), (2, "Female")];

impl Profile {
    /// Supermarket sales variant.
    pub fn sales() -> Self {
        Profile {
            name: "Sales",
            required_columns: &[
                "City",
                "Customer_type",
                "Gender",
                "Product line",
                "Time",
                "Total",
                "Rating",
                "gross margin percentage",
                "Unit price",
                "gross income",
            ],
            derivations: vec![
                Derivation::hour_of_day("hour", "Time"),
                Derivation::copy_column("product_type", "Product line"),
            ],
            filter_columns: ["City", "Customer_type", "Gender", "product_type"]
                .map(String::from)
                .to_vec(),
            kpis: vec![
                KpiSpec {
                    label: "Total Sales",
                    column: "Total",
                    op: Reduce::Sum,
                    decimals: 0,
                    prefix: "US $ ",
                    stars: false,
                },
                KpiSpec {
                    label: "Average Rating",
                    column: "Rating",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: true,
                },
                KpiSpec {
                    label: "Average Sale Per Transaction",
                    column: "Total",
                    op: Reduce::Mean,
                    decimals: 2,
                    prefix: "US $ ",
                    stars: false,
                },
                KpiSpec {
                    label: "Average Gross Margin %",
                    column: "gross margin percentage",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: false,
                },
            ],
            bars: vec![
                BarSpec {
                    title: "Sales by Product Line",
                    group_column: "product_type",
                    value_column: "Total",
                    op: Reduce::Sum,
                    orientation: Orientation::Horizontal,
                },
                BarSpec {
                    title: "Sales by Hour",
                    group_column: "hour",
                    value_column: "Total",
                    op: Reduce::Sum,
                    orientation: Orientation::Vertical,
                },
            ],
            scatters: vec![ScatterSpec {
                title: "Average Gross Income by Unit Price",
                x_column: "Unit price",
                y_column: "gross income",
                mean_by_x: true,
                color_column: None,
                trend: true,
            }],
            correlation_columns: Vec::new(),
        }
    }

    /// Clinical biomarker variant.
    pub fn biomarkers() -> Self {
        Profile {
            name: "Biomarkers",
            required_columns: &["subj_id", "grp", "sex", "age", "ptau217", "nfl", "gfap"],
            derivations: vec![Derivation::code_label("sex_bin", "sex", SEX_LABELS)],
            filter_columns: ["grp", "sex_bin"].map(String::from).to_vec(),
            kpis: vec![
                KpiSpec {
                    label: "Total Patients",
                    column: "subj_id",
                    op: Reduce::Count,
                    decimals: 0,
                    prefix: "",
                    stars: false,
                },
                KpiSpec {
                    label: "Average Age",
                    column: "age",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: false,
                },
                KpiSpec {
                    label: "Plasma p-tau217",
                    column: "ptau217",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: false,
                },
                KpiSpec {
                    label: "Plasma NfL",
                    column: "nfl",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: false,
                },
                KpiSpec {
                    label: "Average GFAP",
                    column: "gfap",
                    op: Reduce::Mean,
                    decimals: 1,
                    prefix: "",
                    stars: false,
                },
            ],
            bars: vec![
                BarSpec {
                    title: "Plasma p-tau217 by Group",
                    group_column: "grp",
                    value_column: "ptau217",
                    op: Reduce::Mean,
                    orientation: Orientation::Vertical,
                },
                BarSpec {
                    title: "Plasma NfL by Group",
                    group_column: "grp",
                    value_column: "nfl",
                    op: Reduce::Mean,
                    orientation: Orientation::Vertical,
                },
                BarSpec {
                    title: "Plasma GFAP by Group",
                    group_column: "grp",
                    value_column: "gfap",
                    op: Reduce::Mean,
                    orientation: Orientation::Vertical,
                },
            ],
            scatters: vec![
                ScatterSpec {
                    title: "p-tau217 vs NfL",
                    x_column: "nfl",
                    y_column: "ptau217",
                    mean_by_x: false,
                    color_column: Some("grp"),
                    trend: true,
                },
                ScatterSpec {
                    title: "p-tau217 vs GFAP",
                    x_column: "gfap",
                    y_column: "ptau217",
                    mean_by_x: false,
                    color_column: Some("grp"),
                    trend: true,
                },
            ],
            correlation_columns: ["ptau217", "nfl", "gfap"].map(String::from).to_vec(),
        }
    }

    /// Pick the variant matching the loaded table's columns, if any. The two
    /// schemas are disjoint on their marker columns, so presence decides.
    pub fn detect(dataset: &Dataset) -> Option<Self> {
        for profile in [Profile::sales(), Profile::biomarkers()] {
            if dataset.has_columns(profile.required_columns) {
                return Some(profile);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, Value};
    use std::collections::BTreeMap;

    fn dataset_with_columns(columns: &[&str]) -> Dataset {
        let mut values = BTreeMap::new();
        for col in columns {
            values.insert(col.to_string(), Value::Integer(1));
        }
        Dataset::from_records(vec![Record { values }])
    }

    #[test]
    fn detects_sales_schema() {
        let ds = dataset_with_columns(Profile::sales().required_columns);
        assert_eq!(Profile::detect(&ds).map(|p| p.name), Some("Sales"));
    }

    #[test]
    fn detects_biomarker_schema() {
        let ds = dataset_with_columns(Profile::biomarkers().required_columns);
        assert_eq!(Profile::detect(&ds).map(|p| p.name), Some("Biomarkers"));
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let ds = dataset_with_columns(&["foo", "bar"]);
        assert!(Profile::detect(&ds).is_none());
    }
}
