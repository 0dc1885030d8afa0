//! End-to-end: files on disk → loader → filter → aggregate → report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use airq_dashboard::config::DashboardConfig;
use airq_dashboard::data::loader::load_file;
use airq_dashboard::data::{
    apply_criteria, build_report, compute_station_aggregate, compute_summary,
    filter_by_date_range, filter_by_station, Field, FilteredView, ReportOptions, SchemaError,
    SelectionCriteria, StationFilter,
};
use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

const SCENARIO_CSV: &str = "\
datetime,station,PM2.5,PM10,WSPM,TEMP
2013-03-01 00:00:00,Aotizhongxin,10,20,1.0,2.0
2013-03-02 00:00:00,Aotizhongxin,20,40,2.0,3.0
2013-03-01 00:00:00,Changping,5,15,3.0,NA
";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn schema_error(err: &anyhow::Error) -> Option<&SchemaError> {
    err.downcast_ref::<SchemaError>()
}

#[test]
fn single_day_scenario_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write(&dir, "combined.csv", SCENARIO_CSV)).unwrap();

    let view = filter_by_date_range(&table, date("2013-03-01"), date("2013-03-01"));
    assert_eq!(view.len(), 2);

    let agg = compute_station_aggregate(&view, Field::Pm25);
    assert_eq!(agg.len(), 2);
    assert_eq!(agg.get("Aotizhongxin"), Some(10.0));
    assert_eq!(agg.get("Changping"), Some(5.0));
}

#[test]
fn inverted_range_and_unknown_station_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write(&dir, "combined.csv", SCENARIO_CSV)).unwrap();

    let inverted = filter_by_date_range(&table, date("2017-01-01"), date("2013-01-01"));
    assert!(inverted.is_empty());
    let summary = compute_summary(&inverted);
    assert_eq!(summary.count, 0);
    assert_eq!(summary.mean(Field::Pm25), None);
    assert_eq!(summary.mean(Field::Pm10), None);

    let unknown = filter_by_station(&FilteredView::all(&table), &StationFilter::only("Unknown"));
    assert!(unknown.is_empty());
}

#[test]
fn filters_commute_and_summary_counts_rows() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write(&dir, "combined.csv", SCENARIO_CSV)).unwrap();

    let ranges = [
        ("2013-03-01", "2013-03-01"),
        ("2013-03-01", "2013-03-02"),
        ("2013-03-02", "2013-03-31"),
        ("2013-03-05", "2013-03-01"),
    ];
    let stations = [
        StationFilter::All,
        StationFilter::only("Aotizhongxin"),
        StationFilter::only("Changping"),
        StationFilter::only("Unknown"),
    ];
    for (start, end) in ranges {
        for station in &stations {
            let (start, end) = (date(start), date(end));
            let date_first = filter_by_station(&filter_by_date_range(&table, start, end), station);
            let station_first =
                filter_by_station(&FilteredView::all(&table), station).within_dates(start, end);
            assert_eq!(date_first, station_first, "{start}..={end} {station}");
            assert_eq!(compute_summary(&date_first).count, date_first.len());

            let agg = compute_station_aggregate(&date_first, Field::Pm25);
            for name in agg.means.keys() {
                assert!(date_first.iter().any(|o| &o.station == name));
            }

            // idempotent
            assert_eq!(filter_by_date_range(&table, start, end), filter_by_date_range(&table, start, end));
        }
    }
}

#[test]
fn missing_required_column_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "no_pm10.csv",
        "datetime,station,PM2.5\n2013-03-01 00:00:00,Changping,5\n",
    );
    let err = load_file(&path).unwrap_err();
    assert_eq!(schema_error(&err), Some(&SchemaError::missing("PM10")));
}

#[test]
fn json_records_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "combined.json",
        r#"[
            {"datetime": "2013-03-01T00:00:00", "station": "Changping", "PM2.5": 5.0, "PM10": 15.0},
            {"datetime": "2013-03-01T01:00:00", "station": "Changping", "PM2.5": 7.0, "PM10": null}
        ]"#,
    );
    let table = load_file(&path).unwrap();
    let summary = compute_summary(&FilteredView::all(&table));
    assert_eq!(summary.count, 2);
    assert_eq!(summary.mean(Field::Pm25), Some(6.0));
    assert_eq!(summary.mean(Field::Pm10), Some(15.0));
}

fn write_parquet(path: &Path) {
    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("datetime", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        ArrowField::new("station", DataType::Utf8, false),
        ArrowField::new("PM2.5", DataType::Float64, true),
        ArrowField::new("PM10", DataType::Float64, true),
    ]));
    let hour_ms = 3_600_000i64;
    // 2013-03-01T00:00:00
    let t0 = date("2013-03-01").and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMillisecondArray::from(vec![t0, t0 + hour_ms, t0 + 24 * hour_ms])),
        Arc::new(StringArray::from(vec!["Aotizhongxin", "Changping", "Changping"])),
        Arc::new(Float64Array::from(vec![Some(12.0), None, Some(30.0)])),
        Arc::new(Float64Array::from(vec![Some(20.0), Some(25.0), Some(50.0)])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn parquet_timestamps_and_nulls_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.parquet");
    write_parquet(&path);

    let table = load_file(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert!(!table.has_field(Field::Wspm));

    let view = filter_by_date_range(&table, date("2013-03-01"), date("2013-03-01"));
    assert_eq!(view.len(), 2);
    let agg = compute_station_aggregate(&view, Field::Pm25);
    // Changping's only row that day has no PM2.5.
    assert_eq!(agg.get("Aotizhongxin"), Some(12.0));
    assert!(!agg.contains("Changping"));
}

#[test]
fn report_uses_configured_registry() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write(&dir, "combined.csv", SCENARIO_CSV)).unwrap();
    let config_path = write(
        &dir,
        "config.toml",
        r#"
default_start = "2013-03-01"
default_end = "2013-03-31"

[map]
marker_scale = 5.0

[[stations]]
name = "Changping"
lat = 40.218
lon = 116.231
"#,
    );
    let config = DashboardConfig::resolve(Some(&config_path)).unwrap();
    let criteria = SelectionCriteria::new(config.default_start, config.default_end, StationFilter::All);
    let options = ReportOptions {
        marker_scale: config.map.marker_scale,
        ..ReportOptions::default()
    };

    let report = build_report(&table, &criteria, &config.registry(), options);
    assert_eq!(report.summary.count, apply_criteria(&table, &criteria).len());
    assert_eq!(report.markers.len(), 1);
    assert_eq!(report.markers[0].location.name, "Changping");
    assert_eq!(report.markers[0].radius, 1.0);
    assert_eq!(report.wind_scatter.len(), 2);
    // Changping's TEMP is NA, so it has no temperature pairs.
    assert_eq!(report.temp_scatter.len(), 1);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DashboardConfig::resolve(Some(&dir.path().join("absent.toml"))).is_err());
}
