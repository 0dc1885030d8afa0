use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::model::{Observation, ObservationTable};

// ---------------------------------------------------------------------------
// Selection criteria
// ---------------------------------------------------------------------------

/// Which station(s) a view is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StationFilter {
    /// Sentinel: no station restriction.
    #[default]
    All,
    Only(String),
}

impl StationFilter {
    pub fn only(station: impl Into<String>) -> Self {
        StationFilter::Only(station.into())
    }

    pub fn matches(&self, station: &str) -> bool {
        match self {
            StationFilter::All => true,
            StationFilter::Only(s) => s == station,
        }
    }
}

impl FromStr for StationFilter {
    type Err = std::convert::Infallible;

    /// `"all"` (any case) is the sentinel, anything else names a station.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(StationFilter::All)
        } else {
            Ok(StationFilter::Only(s.to_string()))
        }
    }
}

impl fmt::Display for StationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationFilter::All => f.write_str("All"),
            StationFilter::Only(s) => f.write_str(s),
        }
    }
}

/// The user's current selection. `start > end` is allowed and selects nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub station: StationFilter,
}

impl SelectionCriteria {
    pub fn new(start: NaiveDate, end: NaiveDate, station: StationFilter) -> Self {
        Self {
            start,
            end,
            station,
        }
    }

    pub fn is_valid_range(&self) -> bool {
        self.start <= self.end
    }
}

// ---------------------------------------------------------------------------
// FilteredView – row subset of a table
// ---------------------------------------------------------------------------

/// A borrowed subset of an [`ObservationTable`].
///
/// Holds ascending row indices into the table, so two views built from the
/// same predicates compare equal regardless of the order the filters ran in.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a ObservationTable,
    indices: Vec<usize>,
}

impl PartialEq for FilteredView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table) && self.indices == other.indices
    }
}

impl<'a> FilteredView<'a> {
    /// View over every row of the table.
    pub fn all(table: &'a ObservationTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    fn retain(&self, mut keep: impl FnMut(&Observation) -> bool) -> Self {
        let rows = self.table.rows();
        Self {
            table: self.table,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| keep(&rows[i]))
                .collect(),
        }
    }

    /// Rows whose calendar date lies in `start..=end`.
    pub fn within_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            return Self {
                table: self.table,
                indices: Vec::new(),
            };
        }
        self.retain(|o| {
            let d = o.date();
            start <= d && d <= end
        })
    }

    pub fn for_station(&self, station: &StationFilter) -> Self {
        match station {
            StationFilter::All => self.clone(),
            StationFilter::Only(_) => self.retain(|o| station.matches(&o.station)),
        }
    }

    pub fn table(&self) -> &'a ObservationTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Observation> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Free-function entry points
// ---------------------------------------------------------------------------

/// Rows with `start <= timestamp.date() <= end`. Empty when `start > end`.
pub fn filter_by_date_range(
    table: &ObservationTable,
    start: NaiveDate,
    end: NaiveDate,
) -> FilteredView<'_> {
    FilteredView::all(table).within_dates(start, end)
}

/// [`StationFilter::All`] returns the view unchanged; an unknown station
/// yields an empty view.
pub fn filter_by_station<'a>(view: &FilteredView<'a>, station: &StationFilter) -> FilteredView<'a> {
    view.for_station(station)
}

/// Date range first, then station.
pub fn apply_criteria<'a>(
    table: &'a ObservationTable,
    criteria: &SelectionCriteria,
) -> FilteredView<'a> {
    let view = filter_by_date_range(table, criteria.start, criteria.end);
    let view = filter_by_station(&view, &criteria.station);
    log::debug!(
        "criteria {}..={} station={} -> {} of {} rows",
        criteria.start,
        criteria.end,
        criteria.station,
        view.len(),
        table.len()
    );
    view
}
