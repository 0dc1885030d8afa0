use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Field – a numeric measurement column
// ---------------------------------------------------------------------------

/// The numeric measurement columns of the multi-site air-quality dataset.
///
/// `PM2.5` and `PM10` are required in every table; the pollutant gases and
/// meteorological readings are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Pm25,
    Pm10,
    So2,
    No2,
    Co,
    O3,
    Temp,
    Pres,
    Dewp,
    Rain,
    Wspm,
}

impl Field {
    pub const COUNT: usize = 11;

    /// All fields in column order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Pm25,
        Field::Pm10,
        Field::So2,
        Field::No2,
        Field::Co,
        Field::O3,
        Field::Temp,
        Field::Pres,
        Field::Dewp,
        Field::Rain,
        Field::Wspm,
    ];

    /// Fields a table cannot be loaded without.
    pub const REQUIRED: [Field; 2] = [Field::Pm25, Field::Pm10];

    /// Column header as it appears in the source files.
    pub fn column(self) -> &'static str {
        match self {
            Field::Pm25 => "PM2.5",
            Field::Pm10 => "PM10",
            Field::So2 => "SO2",
            Field::No2 => "NO2",
            Field::Co => "CO",
            Field::O3 => "O3",
            Field::Temp => "TEMP",
            Field::Pres => "PRES",
            Field::Dewp => "DEWP",
            Field::Rain => "RAIN",
            Field::Wspm => "WSPM",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::Pm25 | Field::Pm10 | Field::So2 | Field::No2 | Field::Co | Field::O3 => {
                "µg/m³"
            }
            Field::Temp | Field::Dewp => "°C",
            Field::Pres => "hPa",
            Field::Rain => "mm",
            Field::Wspm => "m/s",
        }
    }

    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the table
// ---------------------------------------------------------------------------

/// One hourly measurement record at a station.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub station: String,
    /// Indexed by [`Field::index`]; `None` when the cell was missing.
    values: [Option<f64>; Field::COUNT],
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, station: impl Into<String>) -> Self {
        Self {
            timestamp,
            station: station.into(),
            values: [None; Field::COUNT],
        }
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        // NaN is a missing cell, not a measurement.
        self.values[field.index()] = value.filter(|v| !v.is_nan());
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

// ---------------------------------------------------------------------------
// ObservationTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed station index and coverage.
///
/// Rows keep file order. The table is never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: Vec<Observation>,
    /// Fields whose column was present in the source.
    fields: BTreeSet<Field>,
    /// Sorted set of station identifiers.
    stations: BTreeSet<String>,
    coverage: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl ObservationTable {
    /// Build indices from the loaded rows.
    pub fn new(rows: Vec<Observation>, fields: BTreeSet<Field>) -> Self {
        let stations = rows.iter().map(|o| o.station.clone()).collect();
        let coverage = rows.iter().fold(None, |acc, o| match acc {
            None => Some((o.timestamp, o.timestamp)),
            Some((lo, hi)) => Some((lo.min(o.timestamp), hi.max(o.timestamp))),
        });
        Self {
            rows,
            fields,
            stations,
            coverage,
        }
    }

    /// Convenience for in-memory tables: every field counts as tracked.
    pub fn from_rows(rows: Vec<Observation>) -> Self {
        Self::new(rows, Field::ALL.into_iter().collect())
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn fields(&self) -> &BTreeSet<Field> {
        &self.fields
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn stations(&self) -> &BTreeSet<String> {
        &self.stations
    }

    /// Earliest and latest timestamp in the table.
    pub fn coverage(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.coverage
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
