use airq_dashboard::data::{DashboardReport, Field, ScatterSeries, SummaryStatistics};
use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{StationColors, PM10_COLOR, PM25_COLOR};

const CHART_HEIGHT: f32 = 280.0;

fn station_color(colors: Option<&StationColors>, station: &str) -> Color32 {
    colors.map_or(Color32::LIGHT_BLUE, |c| c.color_for(station))
}

/// Tick label for integer x positions, empty between them.
fn category_label(names: &[String], value: f64) -> String {
    let idx = value.round();
    if value < 0.0 || (value - idx).abs() > 1e-6 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Scorecards
// ---------------------------------------------------------------------------

/// `"12.34 µg/m³"`, or a dash when there is no data.
pub fn format_mean(mean: Option<f64>, field: Field) -> String {
    match mean {
        Some(v) => format!("{v:.2} {}", field.unit()),
        None => "—".to_string(),
    }
}

pub fn scorecards(ui: &mut Ui, summary: &SummaryStatistics) {
    let cards = [
        ("Total rows".to_string(), summary.count.to_string()),
        (
            "Mean PM2.5".to_string(),
            format_mean(summary.mean(Field::Pm25), Field::Pm25),
        ),
        (
            "Mean PM10".to_string(),
            format_mean(summary.mean(Field::Pm10), Field::Pm10),
        ),
    ];
    ui.columns(cards.len(), |cols: &mut [Ui]| {
        for (col, (title, value)) in cols.iter_mut().zip(cards) {
            col.group(|ui: &mut Ui| {
                ui.label(RichText::new(title).small());
                ui.heading(RichText::new(value).color(PM25_COLOR));
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Per-station grouped bar chart
// ---------------------------------------------------------------------------

/// PM2.5 and PM10 means side by side for every station in the selection.
pub fn pollutant_bars(ui: &mut Ui, report: &DashboardReport) {
    let mut names: Vec<String> = report
        .pollutant_means
        .iter()
        .flat_map(|agg| agg.means.keys().cloned())
        .collect();
    names.sort();
    names.dedup();

    let width = 0.35;
    let charts: Vec<BarChart> = report
        .pollutant_means
        .iter()
        .enumerate()
        .map(|(k, agg)| {
            let offset = (k as f64 - 0.5) * width;
            let bars: Vec<Bar> = names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    let mean = agg.get(name)?;
                    Some(Bar::new(i as f64 + offset, mean).width(width).name(name))
                })
                .collect();
            let color = if agg.field == Field::Pm25 {
                PM25_COLOR
            } else {
                PM10_COLOR
            };
            BarChart::new(bars).name(agg.field.column()).color(color)
        })
        .collect();

    Plot::new("pollutant_bars")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Station")
        .y_axis_label("Mean concentration (µg/m³)")
        .x_axis_formatter(move |mark, _range| category_label(&names, mark.value))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter plots
// ---------------------------------------------------------------------------

pub fn scatter_plot(
    ui: &mut Ui,
    id: &str,
    series: &[ScatterSeries],
    (x, y): (Field, Field),
    colors: Option<&StationColors>,
) {
    if series.is_empty() {
        ui.label(format!("No {x} / {y} pairs in the selection."));
        return;
    }
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(format!("{x} ({})", x.unit()))
        .y_axis_label(format!("{y} ({})", y.unit()))
        .show(ui, |plot_ui| {
            for s in series {
                let points = Points::new(s.points.clone())
                    .name(&s.station)
                    .color(station_color(colors, &s.station).gamma_multiply(0.6))
                    .radius(1.5);
                plot_ui.points(points);
            }
        });
}

// ---------------------------------------------------------------------------
// Trend line chart
// ---------------------------------------------------------------------------

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_label(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn trend_plot(ui: &mut Ui, report: &DashboardReport, colors: Option<&StationColors>) {
    let field = report.options.detail_field;
    if report.trend.is_empty() {
        ui.label(format!("No {field} values in the selection."));
        return;
    }
    Plot::new("trend_plot")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Period")
        .y_axis_label(format!("Mean {field} ({})", field.unit()))
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .show(ui, |plot_ui| {
            for (station, points) in &report.trend {
                let line_points: PlotPoints = points
                    .iter()
                    .map(|p| [day_number(p.period), p.mean])
                    .collect();
                plot_ui.line(
                    Line::new(line_points)
                        .name(station)
                        .color(station_color(colors, station))
                        .width(1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

pub fn box_plot(ui: &mut Ui, report: &DashboardReport, colors: Option<&StationColors>) {
    let field = report.options.detail_field;
    if report.boxes.is_empty() {
        ui.label(format!("No {field} values in the selection."));
        return;
    }
    let names: Vec<String> = report.boxes.keys().cloned().collect();
    let boxes: Vec<BoxElem> = report
        .boxes
        .iter()
        .enumerate()
        .map(|(i, (station, stats))| {
            let color = station_color(colors, station);
            BoxElem::new(
                i as f64,
                BoxSpread::new(stats.min, stats.q1, stats.median, stats.q3, stats.max),
            )
            .name(format!("{station} (n={})", stats.n))
            .box_width(0.5)
            .fill(color.gamma_multiply(0.4))
            .stroke(egui::Stroke::new(1.5, color))
        })
        .collect();

    Plot::new("box_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Station")
        .y_axis_label(format!("{field} ({})", field.unit()))
        .x_axis_formatter(move |mark, _range| category_label(&names, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name(field.column()));
        });
}
