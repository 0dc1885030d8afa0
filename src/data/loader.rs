use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::SchemaError;
use super::model::{Field, Observation, ObservationTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; `datetime`, `station`, `PM2.5`, `PM10` plus any
///   optional measurement columns (the combined PRSA export)
/// * `.parquet` – same columns; `datetime` may be a string, date or timestamp
/// * `.json`    – `[{ "datetime": "...", "station": "...", "PM2.5": 12.0, ... }, ...]`
///
/// A missing required column fails with [`SchemaError::MissingRequiredColumn`].
pub fn load_file(path: &Path) -> Result<ObservationTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!(SchemaError::UnsupportedExtension(other.to_string())),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} observations from {} ({} stations, fields {:?})",
        table.len(),
        path.display(),
        table.stations().len(),
        table.fields().iter().map(|f| f.column()).collect::<Vec<_>>()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Column layout shared by every format
// ---------------------------------------------------------------------------

/// How the timestamp is stored in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TimeColumns {
    Datetime(usize),
    /// Raw PRSA files carry `year`, `month`, `day`, `hour` instead.
    Parts {
        year: usize,
        month: usize,
        day: usize,
        hour: usize,
    },
}

/// Header positions of the schema columns. Unknown columns are ignored.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    time: TimeColumns,
    station: usize,
    fields: Vec<(Field, usize)>,
}

impl ColumnLayout {
    fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, SchemaError> {
        let find = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);

        let time = match find("datetime") {
            Some(i) => TimeColumns::Datetime(i),
            None => match (find("year"), find("month"), find("day"), find("hour")) {
                (Some(year), Some(month), Some(day), Some(hour)) => TimeColumns::Parts {
                    year,
                    month,
                    day,
                    hour,
                },
                _ => return Err(SchemaError::missing("datetime")),
            },
        };
        let station = find("station").ok_or_else(|| SchemaError::missing("station"))?;

        let fields: Vec<(Field, usize)> = Field::ALL
            .into_iter()
            .filter_map(|f| Some((f, find(f.column())?)))
            .collect();
        for required in Field::REQUIRED {
            if !fields.iter().any(|(f, _)| *f == required) {
                return Err(SchemaError::missing(required.column()));
            }
        }

        Ok(ColumnLayout {
            time,
            station,
            fields,
        })
    }

    fn field_set(&self) -> BTreeSet<Field> {
        self.fields.iter().map(|(f, _)| *f).collect()
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a tz-naive timestamp; a bare date means midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// `[year, month, day, hour]`; any missing part fails the whole timestamp.
fn timestamp_from_parts(parts: [Option<i64>; 4]) -> Option<NaiveDateTime> {
    let [year, month, day, hour] = parts;
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year?).ok()?,
        u32::try_from(month?).ok()?,
        u32::try_from(day?).ok()?,
    )?;
    date.and_hms_opt(u32::try_from(hour?).ok()?, 0, 0)
}

/// Empty cells, `NA` and `nan` are missing values, as is anything that is
/// not a number.
fn parse_measurement(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|v| v.fract() == 0.0).map(|v| v as i64))
}

/// Final per-row validation: the table invariant is a timestamp and a
/// non-empty station on every row.
fn build_observation(
    row: usize,
    timestamp: Option<NaiveDateTime>,
    station: Option<&str>,
    values: impl IntoIterator<Item = (Field, Option<f64>)>,
) -> Result<Observation, SchemaError> {
    let timestamp = timestamp.ok_or_else(|| SchemaError::invalid_row(row, "unparseable timestamp"))?;
    let station = station
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SchemaError::invalid_row(row, "empty station"))?;

    let mut obs = Observation::new(timestamp, station);
    for (field, value) in values {
        obs.set(field, value);
    }
    Ok(obs)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per line.
pub fn load_csv(path: &Path) -> Result<ObservationTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse CSV from any reader (used by [`load_csv`] and by tests).
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ObservationTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let layout = ColumnLayout::resolve(&headers)?;
    log::debug!("CSV column layout: {layout:?}");

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let timestamp = match layout.time {
            TimeColumns::Datetime(i) => parse_timestamp(cell(i)),
            TimeColumns::Parts {
                year,
                month,
                day,
                hour,
            } => timestamp_from_parts([year, month, day, hour].map(|i| parse_int(cell(i)))),
        };
        let values = layout
            .fields
            .iter()
            .map(|&(f, i)| (f, parse_measurement(cell(i))));

        rows.push(build_observation(
            row_no,
            timestamp,
            Some(cell(layout.station)),
            values,
        )?);
    }

    Ok(ObservationTable::new(rows, layout.field_set()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records',
/// date_format='iso')`):
///
/// ```json
/// [
///   { "datetime": "2013-03-01 00:00:00", "station": "Aotizhongxin", "PM2.5": 4.0, "PM10": 4.0 },
///   ...
/// ]
/// ```
///
/// The column set is the union of keys over all records; a record without a
/// measurement key has that value missing.
pub fn load_json(path: &Path) -> Result<ObservationTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

static JSON_NULL: JsonValue = JsonValue::Null;

pub fn parse_json(text: &str) -> Result<ObservationTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        keys.extend(obj.keys().map(String::as_str));
    }
    let headers: Vec<&str> = keys.into_iter().collect();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut rows = Vec::with_capacity(records.len());
    for (row_no, rec) in records.iter().enumerate() {
        let get = |idx: usize| rec.get(headers[idx]).unwrap_or(&JSON_NULL);

        let timestamp = match layout.time {
            TimeColumns::Datetime(i) => json_text(get(i)).as_deref().and_then(parse_timestamp),
            TimeColumns::Parts {
                year,
                month,
                day,
                hour,
            } => timestamp_from_parts([year, month, day, hour].map(|i| json_int(get(i)))),
        };
        let station = json_text(get(layout.station));
        let values = layout.fields.iter().map(|&(f, i)| (f, json_f64(get(i))));

        rows.push(build_observation(row_no, timestamp, station.as_deref(), values)?);
    }

    Ok(ObservationTable::new(rows, layout.field_set()))
}

fn json_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_f64(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_measurement(s),
        _ => None,
    }
}

fn json_int(val: &JsonValue) -> Option<i64> {
    match val {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => parse_int(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing observations.
///
/// Column types are normalised through Arrow casts: `datetime` to text (so
/// string, `Date32` and `Timestamp` columns all parse the same way),
/// `station` to text and measurements to `Float64` (unparseable values
/// become nulls, i.e. missing).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
pub fn load_parquet(path: &Path) -> Result<ObservationTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let layout = ColumnLayout::resolve(&headers)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    let mut offset = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        let time = match layout.time {
            TimeColumns::Datetime(i) => BatchTime::Text(cast_column(batch.column(i), &DataType::Utf8)?),
            TimeColumns::Parts {
                year,
                month,
                day,
                hour,
            } => BatchTime::Parts([
                cast_column(batch.column(year), &DataType::Int64)?,
                cast_column(batch.column(month), &DataType::Int64)?,
                cast_column(batch.column(day), &DataType::Int64)?,
                cast_column(batch.column(hour), &DataType::Int64)?,
            ]),
        };
        let station_col = cast_column(batch.column(layout.station), &DataType::Utf8)?;
        let stations = station_col.as_string::<i32>();
        let field_cols: Vec<(Field, ArrayRef)> = layout
            .fields
            .iter()
            .map(|&(f, i)| Ok((f, cast_column(batch.column(i), &DataType::Float64)?)))
            .collect::<Result<_>>()?;

        for row in 0..n_rows {
            let timestamp = time.timestamp_at(row);
            let station = (!stations.is_null(row)).then(|| stations.value(row));
            let values = field_cols.iter().map(|(f, col)| {
                let arr = col.as_primitive::<Float64Type>();
                (*f, (!arr.is_null(row)).then(|| arr.value(row)))
            });
            rows.push(build_observation(offset + row, timestamp, station, values)?);
        }
        offset += n_rows;
    }

    Ok(ObservationTable::new(rows, layout.field_set()))
}

// -- Parquet / Arrow helpers --

/// Timestamp columns of one record batch, already cast.
enum BatchTime {
    Text(ArrayRef),
    /// year, month, day, hour as Int64.
    Parts([ArrayRef; 4]),
}

impl BatchTime {
    fn timestamp_at(&self, row: usize) -> Option<NaiveDateTime> {
        match self {
            BatchTime::Text(col) => {
                let s = col.as_string::<i32>();
                (!s.is_null(row)).then(|| s.value(row)).and_then(parse_timestamp)
            }
            BatchTime::Parts(cols) => timestamp_from_parts(cols.each_ref().map(|col| {
                let arr = col.as_primitive::<Int64Type>();
                (!arr.is_null(row)).then(|| arr.value(row))
            })),
        }
    }
}

fn cast_column(col: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    cast(col, to).with_context(|| format!("casting {:?} column to {to:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<ObservationTable> {
        read_csv(csv::Reader::from_reader(text.as_bytes()))
    }

    fn schema_error(err: &anyhow::Error) -> Option<&SchemaError> {
        err.downcast_ref::<SchemaError>()
    }

    #[test]
    fn parses_combined_export() {
        let table = read(
            "No,year,month,day,hour,PM2.5,PM10,TEMP,wd,WSPM,station,datetime\n\
             1,2013,3,1,0,4,4,-0.7,NNW,4.4,Aotizhongxin,2013-03-01 00:00:00\n\
             2,2013,3,1,1,NA,8,-1.1,N,4.7,Changping,2013-03-01 01:00:00\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_field(Field::Wspm));
        assert!(!table.has_field(Field::So2));

        let second = &table.rows()[1];
        assert_eq!(second.station, "Changping");
        assert_eq!(second.get(Field::Pm25), None);
        assert_eq!(second.get(Field::Pm10), Some(8.0));
        assert_eq!(second.timestamp, parse_timestamp("2013-03-01 01:00:00").unwrap());
    }

    #[test]
    fn missing_pm10_is_schema_error() {
        let err = read("datetime,station,PM2.5\n2013-03-01 00:00:00,Changping,3\n").unwrap_err();
        assert_eq!(schema_error(&err), Some(&SchemaError::missing("PM10")));
    }

    #[test]
    fn missing_datetime_without_parts_is_schema_error() {
        let err = read("year,station,PM2.5,PM10\n2013,Changping,3,4\n").unwrap_err();
        assert_eq!(schema_error(&err), Some(&SchemaError::missing("datetime")));
    }

    #[test]
    fn builds_timestamp_from_parts() {
        let table = read("year,month,day,hour,station,PM2.5,PM10\n2014,7,9,13,Changping,30,60\n").unwrap();
        assert_eq!(
            table.rows()[0].timestamp,
            parse_timestamp("2014-07-09 13:00:00").unwrap()
        );
    }

    #[test]
    fn empty_station_is_invalid_row() {
        let err = read("datetime,station,PM2.5,PM10\n2013-03-01 00:00:00, ,3,4\n").unwrap_err();
        assert!(matches!(
            schema_error(&err),
            Some(SchemaError::InvalidRow { row: 0, .. })
        ));
    }

    #[test]
    fn bad_timestamp_is_invalid_row() {
        let err = read(
            "datetime,station,PM2.5,PM10\n\
             2013-03-01 00:00:00,Changping,3,4\n\
             yesterday,Changping,3,4\n",
        )
        .unwrap_err();
        assert!(matches!(
            schema_error(&err),
            Some(SchemaError::InvalidRow { row: 1, .. })
        ));
    }

    #[test]
    fn timestamp_formats() {
        let midnight = parse_timestamp("2013-03-01 00:00:00").unwrap();
        assert_eq!(parse_timestamp("2013-03-01"), Some(midnight));
        assert_eq!(parse_timestamp("2013-03-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2013-03-01 00:00"), Some(midnight));
        assert_eq!(parse_timestamp("03/01/2013"), None);
    }

    #[test]
    fn json_records_union_keys() {
        let table = parse_json(
            r#"[
                {"datetime": "2013-03-01 00:00:00", "station": "Changping", "PM2.5": 3.0, "PM10": null},
                {"datetime": "2013-03-01 01:00:00", "station": "Changping", "PM2.5": "NA", "PM10": 6, "WSPM": 1.2}
            ]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_field(Field::Wspm));
        assert_eq!(table.rows()[0].get(Field::Pm10), None);
        assert_eq!(table.rows()[0].get(Field::Wspm), None);
        assert_eq!(table.rows()[1].get(Field::Pm25), None);
        assert_eq!(table.rows()[1].get(Field::Pm10), Some(6.0));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("observations.xlsx")).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::UnsupportedExtension("xlsx".to_string()))
        );
    }
}
