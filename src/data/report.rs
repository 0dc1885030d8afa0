use std::collections::BTreeMap;

use super::aggregate::{
    compute_box_stats, compute_scatter, compute_station_aggregates, compute_summary,
    compute_trend, BoxStats, Resolution, ScatterSeries, StationAggregate, SummaryStatistics,
    TrendPoint,
};
use super::filter::{apply_criteria, SelectionCriteria};
use super::model::{Field, ObservationTable};
use super::stations::{station_markers, StationMarker, StationRegistry};

/// Knobs of the dashboard that are not part of the row selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    /// Field shown in the trend and box-plot charts.
    pub detail_field: Field,
    pub resolution: Resolution,
    /// Marker radius divisor for the map.
    pub marker_scale: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            detail_field: Field::Pm25,
            resolution: Resolution::Monthly,
            marker_scale: 10.0,
        }
    }
}

/// Everything the dashboard draws for one selection, fully owned so the
/// UI can cache it between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub criteria: SelectionCriteria,
    pub options: ReportOptions,
    pub summary: SummaryStatistics,
    /// PM2.5 and PM10 per station (grouped bar chart).
    pub pollutant_means: Vec<StationAggregate>,
    /// WSPM vs PM2.5.
    pub wind_scatter: Vec<ScatterSeries>,
    /// TEMP vs PM2.5.
    pub temp_scatter: Vec<ScatterSeries>,
    pub trend: BTreeMap<String, Vec<TrendPoint>>,
    pub boxes: BTreeMap<String, BoxStats>,
    /// PM2.5 markers for registry stations present in the selection.
    pub markers: Vec<StationMarker>,
}

/// Run the whole pipeline for one selection.
pub fn build_report(
    table: &ObservationTable,
    criteria: &SelectionCriteria,
    registry: &StationRegistry,
    options: ReportOptions,
) -> DashboardReport {
    let view = apply_criteria(table, criteria);

    let pollutant_means = compute_station_aggregates(&view, &Field::REQUIRED);
    let markers = pollutant_means
        .iter()
        .find(|a| a.field == Field::Pm25)
        .map(|pm25| station_markers(registry, pm25, options.marker_scale))
        .unwrap_or_default();

    DashboardReport {
        criteria: criteria.clone(),
        options,
        summary: compute_summary(&view),
        wind_scatter: compute_scatter(&view, Field::Wspm, Field::Pm25),
        temp_scatter: compute_scatter(&view, Field::Temp, Field::Pm25),
        trend: compute_trend(&view, options.detail_field, options.resolution),
        boxes: compute_box_stats(&view, options.detail_field),
        pollutant_means,
        markers,
    }
}
