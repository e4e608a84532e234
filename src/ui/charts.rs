use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};

use crate::color::{self, ColorMap};
use crate::data::correlate::{CorrelateError, CorrelationMatrix};
use crate::data::model::Value;
use crate::data::profile::Orientation;
use crate::report::{BarSeries, Report, ScatterSeries};
use crate::state::AppState;

const ACCENT: Color32 = Color32::from_rgb(0x00, 0x83, 0xb8);
const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Central panel – KPI header and chart grid
// ---------------------------------------------------------------------------

/// Render the whole dashboard for the current pass.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.source.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to build the dashboard  (File → Open…)");
        });
        return;
    }

    if state.no_match {
        // Expected empty-result outcome: warn and render nothing else.
        ui.add_space(12.0);
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(
                RichText::new("No data available based on the current filter settings!")
                    .color(Color32::YELLOW)
                    .heading(),
            );
        });
        return;
    }

    let Some(report) = &state.report else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpi_row(ui, report);
            ui.separator();

            // Two charts per row.
            let mut charts: Vec<ChartKind<'_>> = Vec::new();
            charts.extend(report.bars.iter().map(ChartKind::Bar));
            charts.extend(report.scatters.iter().map(ChartKind::Scatter));
            if let Some(correlation) = &report.correlation {
                charts.push(ChartKind::Heatmap(correlation));
            }

            for pair in charts.chunks(2) {
                ui.columns(pair.len(), |cols| {
                    for (ui, chart) in cols.iter_mut().zip(pair) {
                        match chart {
                            ChartKind::Bar(series) => bar_chart(ui, series),
                            ChartKind::Scatter(series) => scatter_chart(ui, state, series),
                            ChartKind::Heatmap(correlation) => heatmap(ui, correlation),
                        }
                    }
                });
            }
        });
}

enum ChartKind<'a> {
    Bar(&'a BarSeries),
    Scatter(&'a ScatterSeries),
    Heatmap(&'a Result<CorrelationMatrix, CorrelateError>),
}

// ---------------------------------------------------------------------------
// KPI header row
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, report: &Report) {
    ui.columns(report.kpis.len().max(1), |cols| {
        for (ui, kpi) in cols.iter_mut().zip(&report.kpis) {
            ui.vertical(|ui: &mut Ui| {
                ui.label(RichText::new(kpi.label).strong());
                ui.label(RichText::new(&kpi.value).heading().color(ACCENT));
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, series: &BarSeries) {
    ui.strong(series.title);

    let horizontal = series.orientation == Orientation::Horizontal;
    let bars: Vec<Bar> = series
        .entries
        .iter()
        .enumerate()
        .map(|(i, (_, value))| Bar::new(i as f64, *value))
        .collect();

    let mut chart = BarChart::new(bars).width(0.6).color(ACCENT);
    if horizontal {
        chart = chart.horizontal();
    }

    let labels: Vec<String> = series.entries.iter().map(|(l, _)| l.clone()).collect();
    let formatter = move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if idx >= 0.0 && (mark.value - idx).abs() < f64::EPSILON {
            labels.get(idx as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut plot = Plot::new(series.title)
        .height(CHART_HEIGHT)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false);
    plot = if horizontal {
        plot.y_axis_formatter(formatter)
    } else {
        plot.x_axis_formatter(formatter)
    };

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(chart);
    });
}

// ---------------------------------------------------------------------------
// Scatter charts
// ---------------------------------------------------------------------------

fn scatter_chart(ui: &mut Ui, state: &AppState, series: &ScatterSeries) {
    ui.strong(series.title);

    let color_map: Option<&ColorMap> = series
        .color_column
        .and_then(|col| state.color_map_for(col));

    // One Points group per color value so the legend names the groups.
    let mut groups: BTreeMap<Option<Value>, Vec<[f64; 2]>> = BTreeMap::new();
    for point in &series.points {
        groups
            .entry(point.color_value.clone())
            .or_default()
            .push([point.x, point.y]);
    }

    Plot::new(series.title)
        .height(CHART_HEIGHT)
        .legend(egui_plot::Legend::default())
        .show(ui, |plot_ui| {
            for (color_value, coords) in groups {
                let color = match (&color_value, color_map) {
                    (Some(val), Some(cm)) => cm.color_for(val),
                    _ => ACCENT,
                };
                let mut points = Points::new(PlotPoints::from(coords))
                    .radius(2.5)
                    .color(color);
                if let Some(val) = &color_value {
                    points = points.name(val.to_string());
                }
                plot_ui.points(points);
            }

            if let Some((slope, intercept)) = series.trend {
                let xs = series.points.iter().map(|p| p.x);
                let (min_x, max_x) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
                if min_x.is_finite() && max_x > min_x {
                    let line = Line::new(PlotPoints::from(vec![
                        [min_x, slope * min_x + intercept],
                        [max_x, slope * max_x + intercept],
                    ]))
                    .color(Color32::LIGHT_GRAY)
                    .width(1.5);
                    plot_ui.line(line);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, correlation: &Result<CorrelationMatrix, CorrelateError>) {
    ui.strong("Correlation");

    let matrix = match correlation {
        Ok(m) => m,
        Err(e) => {
            // Undefined statistic: show why instead of a placeholder matrix.
            ui.label(RichText::new(e.to_string()).color(Color32::YELLOW));
            return;
        }
    };

    egui::Grid::new("correlation_heatmap")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for col in &matrix.columns {
                ui.label(RichText::new(col).strong());
            }
            ui.end_row();

            for (i, row_name) in matrix.columns.iter().enumerate() {
                ui.label(RichText::new(row_name).strong());
                for j in 0..matrix.len() {
                    let r = matrix.coefficient(i, j);
                    ui.label(
                        RichText::new(format!(" {r:.2} "))
                            .background_color(color::diverging(r))
                            .color(Color32::BLACK)
                            .monospace(),
                    );
                }
                ui.end_row();
            }
        });
}
