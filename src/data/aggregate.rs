use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::filter::FilteredView;
use super::model::Field;

// ---------------------------------------------------------------------------
// Running mean
// ---------------------------------------------------------------------------

/// Sum/count accumulator. Values are added in row order so repeated runs
/// over the same view give bit-identical means.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

// ---------------------------------------------------------------------------
// Summary statistics (scorecards)
// ---------------------------------------------------------------------------

/// Row count plus the mean of every tracked field over a view.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatistics {
    pub count: usize,
    means: BTreeMap<Field, Option<f64>>,
}

impl SummaryStatistics {
    /// Mean of `field`, or `None` when there is no data for it.
    pub fn mean(&self, field: Field) -> Option<f64> {
        self.means.get(&field).copied().flatten()
    }

    /// Tracked fields with their means.
    pub fn means(&self) -> impl Iterator<Item = (Field, Option<f64>)> + '_ {
        self.means.iter().map(|(f, m)| (*f, *m))
    }
}

/// Count and arithmetic mean of each tracked field. Missing cells are
/// skipped; a field without any value reports `None`, never zero.
pub fn compute_summary(view: &FilteredView<'_>) -> SummaryStatistics {
    let fields = view.table().fields();
    let mut accs = [MeanAcc::default(); Field::COUNT];
    for obs in view.iter() {
        for &field in fields {
            accs[field.index()].push(obs.get(field));
        }
    }
    SummaryStatistics {
        count: view.len(),
        means: fields
            .iter()
            .map(|&f| (f, accs[f.index()].mean()))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Per-station grouped means
// ---------------------------------------------------------------------------

/// Station → mean of one field.
///
/// Only stations with at least one value of `field` in the view have an
/// entry; downstream renderers must skip everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct StationAggregate {
    pub field: Field,
    pub means: BTreeMap<String, f64>,
}

impl StationAggregate {
    pub fn get(&self, station: &str) -> Option<f64> {
        self.means.get(station).copied()
    }

    pub fn contains(&self, station: &str) -> bool {
        self.means.contains_key(station)
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

pub fn compute_station_aggregate(view: &FilteredView<'_>, field: Field) -> StationAggregate {
    let mut groups: BTreeMap<&str, MeanAcc> = BTreeMap::new();
    for obs in view.iter() {
        groups
            .entry(obs.station.as_str())
            .or_default()
            .push(obs.get(field));
    }
    StationAggregate {
        field,
        means: groups
            .into_iter()
            .filter_map(|(station, acc)| Some((station.to_string(), acc.mean()?)))
            .collect(),
    }
}

/// One aggregate per requested field, in the order given.
pub fn compute_station_aggregates(view: &FilteredView<'_>, fields: &[Field]) -> Vec<StationAggregate> {
    fields
        .iter()
        .map(|&f| compute_station_aggregate(view, f))
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter series
// ---------------------------------------------------------------------------

/// `[x, y]` pairs for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub station: String,
    pub points: Vec<[f64; 2]>,
}

/// Per-station point pairs for rows where both `x` and `y` are present.
pub fn compute_scatter(view: &FilteredView<'_>, x: Field, y: Field) -> Vec<ScatterSeries> {
    let mut groups: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for obs in view.iter() {
        if let (Some(xv), Some(yv)) = (obs.get(x), obs.get(y)) {
            groups.entry(obs.station.as_str()).or_default().push([xv, yv]);
        }
    }
    groups
        .into_iter()
        .map(|(station, points)| ScatterSeries {
            station: station.to_string(),
            points,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trend series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    Daily,
    #[default]
    Monthly,
}

impl Resolution {
    /// First day of the bucket containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Resolution::Daily => date,
            Resolution::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub period: NaiveDate,
    pub mean: f64,
}

/// Per-station mean of `field` per period, sorted by period. Periods with
/// no value are absent rather than zero.
pub fn compute_trend(
    view: &FilteredView<'_>,
    field: Field,
    resolution: Resolution,
) -> BTreeMap<String, Vec<TrendPoint>> {
    let mut buckets: BTreeMap<&str, BTreeMap<NaiveDate, MeanAcc>> = BTreeMap::new();
    for obs in view.iter() {
        buckets
            .entry(obs.station.as_str())
            .or_default()
            .entry(resolution.period_start(obs.date()))
            .or_default()
            .push(obs.get(field));
    }
    buckets
        .into_iter()
        .filter_map(|(station, periods)| {
            let points: Vec<TrendPoint> = periods
                .into_iter()
                .filter_map(|(period, acc)| Some(TrendPoint { period, mean: acc.mean()? }))
                .collect();
            (!points.is_empty()).then(|| (station.to_string(), points))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box-plot statistics
// ---------------------------------------------------------------------------

/// Five-number summary of one station's values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub n: usize,
}

impl BoxStats {
    /// `None` for an empty slice. Quartiles use linear interpolation
    /// between closest ranks.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(BoxStats {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            n: sorted.len(),
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn compute_box_stats(view: &FilteredView<'_>, field: Field) -> BTreeMap<String, BoxStats> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for obs in view.iter() {
        if let Some(v) = obs.get(field) {
            groups.entry(obs.station.as_str()).or_default().push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(station, values)| Some((station.to_string(), BoxStats::compute(&values)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter_by_date_range, FilteredView};
    use crate::data::model::{Observation, ObservationTable};
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(ts: &str, station: &str) -> Observation {
        let ts = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap();
        Observation::new(ts, station)
    }

    fn scenario_table() -> ObservationTable {
        ObservationTable::from_rows(vec![
            at("2013-03-01 00:00", "Aotizhongxin").with(Field::Pm25, 10.0),
            at("2013-03-02 00:00", "Aotizhongxin").with(Field::Pm25, 20.0),
            at("2013-03-01 00:00", "Changping").with(Field::Pm25, 5.0),
        ])
    }

    #[test]
    fn station_aggregate_for_single_day() {
        let table = scenario_table();
        let view = filter_by_date_range(&table, date("2013-03-01"), date("2013-03-01"));
        assert_eq!(view.len(), 2);

        let agg = compute_station_aggregate(&view, Field::Pm25);
        let expected: BTreeMap<String, f64> = [
            ("Aotizhongxin".to_string(), 10.0),
            ("Changping".to_string(), 5.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(agg.means, expected);
    }

    #[test]
    fn empty_view_has_no_means() {
        let table = scenario_table();
        let view = filter_by_date_range(&table, date("2017-01-01"), date("2013-01-01"));
        let summary = compute_summary(&view);
        assert_eq!(summary.count, 0);
        assert!(summary.means().all(|(_, m)| m.is_none()));
        assert_eq!(summary.mean(Field::Pm25), None);
        assert!(compute_station_aggregate(&view, Field::Pm25).is_empty());
    }

    #[test]
    fn summary_skips_missing_cells() {
        let table = ObservationTable::from_rows(vec![
            at("2013-03-01 00:00", "Changping").with(Field::Pm25, 4.0).with(Field::Pm10, 8.0),
            at("2013-03-01 01:00", "Changping").with(Field::Pm25, 6.0),
        ]);
        let summary = compute_summary(&FilteredView::all(&table));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean(Field::Pm25), Some(5.0));
        assert_eq!(summary.mean(Field::Pm10), Some(8.0));
        assert_eq!(summary.mean(Field::Wspm), None);
    }

    #[test]
    fn station_without_values_is_absent() {
        let table = ObservationTable::from_rows(vec![
            at("2013-03-01 00:00", "Changping"),
            at("2013-03-01 00:00", "Aotizhongxin").with(Field::Pm10, 30.0),
        ]);
        let agg = compute_station_aggregate(&FilteredView::all(&table), Field::Pm10);
        assert!(!agg.contains("Changping"));
        assert_eq!(agg.get("Aotizhongxin"), Some(30.0));
    }

    #[test]
    fn scatter_needs_both_coordinates() {
        let table = ObservationTable::from_rows(vec![
            at("2013-03-01 00:00", "Changping").with(Field::Wspm, 1.5).with(Field::Pm25, 40.0),
            at("2013-03-01 01:00", "Changping").with(Field::Pm25, 42.0),
        ]);
        let series = compute_scatter(&FilteredView::all(&table), Field::Wspm, Field::Pm25);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![[1.5, 40.0]]);
    }

    #[test]
    fn monthly_trend_buckets_by_first_day() {
        let table = ObservationTable::from_rows(vec![
            at("2013-03-01 00:00", "Changping").with(Field::Pm25, 10.0),
            at("2013-03-31 23:00", "Changping").with(Field::Pm25, 30.0),
            at("2013-04-02 00:00", "Changping").with(Field::Pm25, 7.0),
        ]);
        let trend = compute_trend(&FilteredView::all(&table), Field::Pm25, Resolution::Monthly);
        assert_eq!(
            trend["Changping"],
            vec![
                TrendPoint { period: date("2013-03-01"), mean: 20.0 },
                TrendPoint { period: date("2013-04-01"), mean: 7.0 },
            ]
        );
    }

    #[test]
    fn box_stats_interpolate_quartiles() {
        let stats = BoxStats::compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.n, 4);
        assert!(BoxStats::compute(&[]).is_none());
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let table = scenario_table();
        let view = FilteredView::all(&table);
        let a = compute_summary(&view).mean(Field::Pm25).unwrap();
        let b = compute_summary(&view).mean(Field::Pm25).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
