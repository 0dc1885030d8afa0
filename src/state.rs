use airq_dashboard::config::DashboardConfig;
use airq_dashboard::data::{
    build_report, DashboardReport, ObservationTable, ReportOptions, SelectionCriteria,
    StationFilter, StationRegistry,
};

use crate::color::StationColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until a file is loaded).
    pub table: Option<ObservationTable>,

    /// Date range and station the user picked.
    pub criteria: SelectionCriteria,

    /// Detail field, trend resolution and marker scale.
    pub options: ReportOptions,

    /// Station → coordinate lookup for the map.
    pub registry: StationRegistry,

    /// `[lat, lon]` the map is centred on.
    pub map_center: [f64; 2],

    /// Derived results for the current criteria (cached).
    pub report: Option<DashboardReport>,

    /// Per-station colours, rebuilt on load.
    pub station_colors: Option<StationColors>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            table: None,
            criteria: SelectionCriteria::new(
                config.default_start,
                config.default_end,
                StationFilter::All,
            ),
            options: ReportOptions {
                marker_scale: config.map.marker_scale,
                ..ReportOptions::default()
            },
            registry: config.registry(),
            map_center: config.map.center,
            report: None,
            station_colors: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded table, reset the station filter and colours.
    pub fn set_table(&mut self, table: ObservationTable) {
        self.station_colors = Some(StationColors::new(table.stations()));
        self.criteria.station = StationFilter::All;
        self.table = Some(table);
        self.report = None;
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the report when criteria or options changed since the
    /// cached one was built.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let stale = self
            .report
            .as_ref()
            .map_or(true, |r| r.criteria != self.criteria || r.options != self.options);
        if !stale {
            return;
        }
        if !self.criteria.is_valid_range() {
            log::debug!(
                "start {} is after end {}, selection is empty",
                self.criteria.start,
                self.criteria.end
            );
        }
        self.report = Some(build_report(
            table,
            &self.criteria,
            &self.registry,
            self.options,
        ));
    }

    pub fn set_station(&mut self, station: StationFilter) {
        self.criteria.station = station;
        self.refilter();
    }

    /// Number of rows in the current selection.
    pub fn visible_count(&self) -> usize {
        self.report.as_ref().map_or(0, |r| r.summary.count)
    }
}
