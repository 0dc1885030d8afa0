/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ObservationTable (schema checked here)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ ObservationTable  │  Vec<Observation>, station index, coverage
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range + station → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐      ┌──────────┐
///   │ aggregate  │ ───▶ │ stations │  summary, per-station means → markers
///   └───────────┘      └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  everything one frame of the dashboard needs
///   └──────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
pub mod stations;

pub use aggregate::{
    compute_box_stats, compute_scatter, compute_station_aggregate, compute_station_aggregates,
    compute_summary, compute_trend, BoxStats, Resolution, ScatterSeries, StationAggregate,
    SummaryStatistics, TrendPoint,
};
pub use error::SchemaError;
pub use filter::{
    apply_criteria, filter_by_date_range, filter_by_station, FilteredView, SelectionCriteria,
    StationFilter,
};
pub use model::{Field, Observation, ObservationTable};
pub use report::{build_report, DashboardReport, ReportOptions};
pub use stations::{station_markers, StationLocation, StationMarker, StationRegistry};
