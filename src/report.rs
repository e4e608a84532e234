use thiserror::Error;

use crate::data::aggregate::{self, AggregateError, Reduce};
use crate::data::correlate::{self, CorrelateError, CorrelationMatrix};
use crate::data::model::{Dataset, Value};
use crate::data::profile::{KpiSpec, Orientation, Profile, ScatterSpec};

// ---------------------------------------------------------------------------
// Report – everything one render pass hands to the charts
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// One formatted KPI for the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub label: &'static str,
    pub value: String,
}

/// One bar chart: (group label, reduced value) in display order.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub title: &'static str,
    pub orientation: Orientation,
    pub entries: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Value of the color-by column for this point, if the spec has one.
    pub color_value: Option<Value>,
}

/// One scatter chart with an optional least-squares trend line.
#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub title: &'static str,
    pub color_column: Option<&'static str>,
    pub points: Vec<ScatterPoint>,
    /// `(slope, intercept)`, absent when the fit is undefined.
    pub trend: Option<(f64, f64)>,
}

/// The derived datasets for one render pass over the filtered subset.
#[derive(Debug, Clone)]
pub struct Report {
    pub kpis: Vec<Kpi>,
    pub bars: Vec<BarSeries>,
    pub scatters: Vec<ScatterSeries>,
    /// Matrix for the heatmap, or why it is undefined for this subset.
    /// `None` when the profile has no correlation columns.
    pub correlation: Option<Result<CorrelationMatrix, CorrelateError>>,
}

impl Report {
    /// Compute every KPI, series, and matrix the profile asks for.
    ///
    /// Callers must not invoke this on an empty subset: the empty-result
    /// state replaces the whole pass (see `AppState::refilter`).
    pub fn build(
        dataset: &Dataset,
        indices: &[usize],
        profile: &Profile,
    ) -> Result<Report, ReportError> {
        debug_assert!(!indices.is_empty(), "empty subset never reaches Report::build");

        let kpis = profile
            .kpis
            .iter()
            .map(|spec| {
                let value = aggregate::reduce(dataset, indices, spec.column, spec.op)?;
                Ok(Kpi {
                    label: spec.label,
                    value: format_kpi(spec, value),
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        let bars = profile
            .bars
            .iter()
            .map(|spec| {
                let groups = aggregate::group_reduce(
                    dataset,
                    indices,
                    &[spec.group_column],
                    spec.value_column,
                    spec.op,
                )?;
                let entries = groups
                    .into_iter()
                    .map(|(key, value)| (group_label(&key), value))
                    .collect();
                Ok(BarSeries {
                    title: spec.title,
                    orientation: spec.orientation,
                    entries,
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        let scatters = profile
            .scatters
            .iter()
            .map(|spec| scatter_series(dataset, indices, spec))
            .collect::<Result<Vec<_>, ReportError>>()?;

        let correlation = if profile.correlation_columns.is_empty() {
            None
        } else {
            Some(correlate::correlate(
                dataset,
                indices,
                &profile.correlation_columns,
            ))
        };

        Ok(Report {
            kpis,
            bars,
            scatters,
            correlation,
        })
    }
}

fn scatter_series(
    dataset: &Dataset,
    indices: &[usize],
    spec: &ScatterSpec,
) -> Result<ScatterSeries, ReportError> {
    let points: Vec<ScatterPoint> = if spec.mean_by_x {
        // One point per distinct x: mean of y within the group.
        let groups = aggregate::group_reduce(
            dataset,
            indices,
            &[spec.x_column],
            spec.y_column,
            Reduce::Mean,
        )?;
        groups
            .into_iter()
            .filter_map(|(key, y)| {
                let x = key.first().and_then(Value::as_f64)?;
                Some(ScatterPoint {
                    x,
                    y,
                    color_value: None,
                })
            })
            .collect()
    } else {
        // Raw record pairs; rows with missing cells are dropped, like a
        // pandas scatter drops NaN.
        indices
            .iter()
            .filter_map(|&i| {
                let rec = &dataset.records[i];
                let x = rec.get(spec.x_column)?.as_f64()?;
                let y = rec.get(spec.y_column)?.as_f64()?;
                let color_value = spec
                    .color_column
                    .and_then(|col| rec.get(col))
                    .cloned();
                Some(ScatterPoint { x, y, color_value })
            })
            .collect()
    };

    let trend = if spec.trend {
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        correlate::trend_line(&xs, &ys)
    } else {
        None
    };

    Ok(ScatterSeries {
        title: spec.title,
        color_column: spec.color_column,
        points,
        trend,
    })
}

fn group_label(key: &[Value]) -> String {
    key.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" / ")
}

// ---------------------------------------------------------------------------
// KPI formatting – rounding lives here, at the presentation boundary
// ---------------------------------------------------------------------------

fn format_kpi(spec: &KpiSpec, value: f64) -> String {
    let rounded = aggregate::round_to(value, spec.decimals);
    let number = if spec.decimals == 0 {
        group_thousands(rounded as i64)
    } else {
        format!("{rounded:.prec$}", prec = spec.decimals as usize)
    };

    let mut out = format!("{}{}", spec.prefix, number);
    if spec.stars {
        out.push(' ');
        out.push_str(&aggregate::repeat_symbol("★", rounded));
    }
    out
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterState};
    use crate::data::model::Record;
    use crate::data::profile::BarSpec;
    use std::collections::{BTreeMap, BTreeSet};

    fn city_dataset() -> Dataset {
        let rows = [("A", 10.0), ("B", 20.0), ("A", 5.0)];
        let records = rows
            .iter()
            .map(|(city, total)| {
                let mut values = BTreeMap::new();
                values.insert("City".to_string(), Value::String(city.to_string()));
                values.insert("Total".to_string(), Value::Float(*total));
                Record { values }
            })
            .collect();
        Dataset::from_records(records)
    }

    fn total_by_city_profile() -> Profile {
        Profile {
            name: "Test",
            required_columns: &["City", "Total"],
            derivations: Vec::new(),
            filter_columns: vec!["City".to_string()],
            kpis: vec![KpiSpec {
                label: "Total",
                column: "Total",
                op: Reduce::Sum,
                decimals: 0,
                prefix: "US $ ",
                stars: false,
            }],
            bars: vec![BarSpec {
                title: "Total by City",
                group_column: "City",
                value_column: "Total",
                op: Reduce::Sum,
                orientation: Orientation::Vertical,
            }],
            scatters: Vec::new(),
            correlation_columns: Vec::new(),
        }
    }

    #[test]
    fn filtered_sum_feeds_the_kpi() {
        // Selection {City: {A}} → 2 records, sum(Total) = 15.
        let ds = city_dataset();
        let mut filters = FilterState::new();
        filters.insert(
            "City".to_string(),
            std::iter::once(Value::String("A".into())).collect::<BTreeSet<_>>(),
        );
        let indices = filtered_indices(&ds, &filters);
        assert_eq!(indices.len(), 2);

        let report = Report::build(&ds, &indices, &total_by_city_profile()).unwrap();
        assert_eq!(report.kpis[0].value, "US $ 15");
    }

    #[test]
    fn bar_series_keeps_ascending_group_order() {
        let ds = city_dataset();
        let report = Report::build(&ds, &[0, 1, 2], &total_by_city_profile()).unwrap();
        assert_eq!(
            report.bars[0].entries,
            vec![("A".to_string(), 15.0), ("B".to_string(), 20.0)]
        );
    }

    #[test]
    fn scatter_with_trend_over_raw_pairs() {
        let mut profile = total_by_city_profile();
        profile.scatters = vec![ScatterSpec {
            title: "Total vs Total",
            x_column: "Total",
            y_column: "Total",
            mean_by_x: false,
            color_column: Some("City"),
            trend: true,
        }];

        let ds = city_dataset();
        let report = Report::build(&ds, &[0, 1, 2], &profile).unwrap();
        let scatter = &report.scatters[0];
        assert_eq!(scatter.points.len(), 3);
        assert_eq!(
            scatter.points[0].color_value,
            Some(Value::String("A".into()))
        );
        let (slope, intercept) = scatter.trend.unwrap();
        assert!((slope - 1.0).abs() < 1e-12);
        assert!(intercept.abs() < 1e-12);
    }

    #[test]
    fn correlation_error_is_carried_not_fatal() {
        let mut profile = total_by_city_profile();
        profile.correlation_columns = vec!["Total".to_string(), "Total".to_string()];

        let ds = city_dataset();
        // Single-record subset: the report still builds, the matrix slot
        // carries the insufficiency.
        let report = Report::build(&ds, &[0], &profile).unwrap();
        assert_eq!(
            report.correlation,
            Some(Err(CorrelateError::InsufficientData { rows: 1 }))
        );
    }

    #[test]
    fn kpi_formatting_variants() {
        let int_spec = KpiSpec {
            label: "Total Sales",
            column: "Total",
            op: Reduce::Sum,
            decimals: 0,
            prefix: "US $ ",
            stars: false,
        };
        assert_eq!(format_kpi(&int_spec, 1234567.4), "US $ 1,234,567");

        let star_spec = KpiSpec {
            label: "Average Rating",
            column: "Rating",
            op: Reduce::Mean,
            decimals: 1,
            prefix: "",
            stars: true,
        };
        assert_eq!(format_kpi(&star_spec, 7.04), "7.0 ★★★★★★★");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(-12345), "-12,345");
    }
}
