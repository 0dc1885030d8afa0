//! Writes a synthetic hourly multi-site dataset (`sample_data.csv` and
//! `sample_data.parquet`) with the columns the dashboard loads.

use std::sync::Arc;

use airq_dashboard::data::Field;
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, Timelike};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// `value` most of the time, missing with probability `p`.
    fn drop_out(&mut self, value: f64, p: f64) -> Option<f64> {
        (self.next_f64() >= p).then_some(value)
    }
}

/// Generated columns, in output order.
const FIELDS: [Field; 6] = [
    Field::Pm25,
    Field::Pm10,
    Field::No2,
    Field::O3,
    Field::Temp,
    Field::Wspm,
];

/// (station, baseline PM2.5, temperature offset)
const STATIONS: [(&str, f64, f64); 3] = [
    ("Aotizhongxin", 80.0, 0.0),
    ("Changping", 65.0, -1.5),
    ("Dongsi", 85.0, 0.5),
];

const MISSING_RATE: f64 = 0.01;

struct Row {
    datetime: String,
    station: &'static str,
    values: [Option<f64>; FIELDS.len()],
}

fn generate(rng: &mut SimpleRng, start: NaiveDate, days: i64) -> Vec<Row> {
    let mut rows = Vec::new();
    let Some(t0) = start.and_hms_opt(0, 0, 0) else {
        return rows;
    };
    for hour in 0..days * 24 {
        let ts = t0 + Duration::hours(hour);
        let day = hour as f64 / 24.0;
        let diurnal = (2.0 * std::f64::consts::PI * (ts.hour() as f64 - 15.0) / 24.0).cos();
        // Warms from early spring towards summer.
        let seasonal = -2.0 + 25.0 * (day / days as f64);

        for &(station, base_pm, temp_offset) in &STATIONS {
            let wspm = rng.gauss(2.0, 1.2).abs();
            let temp = seasonal + 5.0 * diurnal + temp_offset + rng.gauss(0.0, 1.5);
            let pm25 = (base_pm * (-0.35 * wspm).exp() * rng.gauss(0.0, 0.5).exp()).max(2.0);
            let pm10 = pm25 * 1.3 + rng.gauss(10.0, 8.0).abs();
            let no2 = (0.4 * pm25 + rng.gauss(20.0, 8.0)).max(1.0);
            let o3 = (30.0 + 4.0 * temp.max(0.0) - 0.2 * pm25 + rng.gauss(0.0, 10.0)).max(1.0);

            let raw = [pm25, pm10, no2, o3, temp, wspm];
            let values = raw.map(|v| rng.drop_out((v * 10.0).round() / 10.0, MISSING_RATE));
            rows.push(Row {
                datetime: ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                station,
                values,
            });
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["datetime", "station"];
    header.extend(FIELDS.iter().map(|f| f.column()));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.datetime.clone(), row.station.to_string()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map_or_else(|| "NA".to_string(), |v| v.to_string())),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let mut fields = vec![
        ArrowField::new("datetime", DataType::Utf8, false),
        ArrowField::new("station", DataType::Utf8, false),
    ];
    fields.extend(
        FIELDS
            .iter()
            .map(|f| ArrowField::new(f.column(), DataType::Float64, true)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.datetime.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.station).collect::<Vec<_>>(),
        )),
    ];
    for i in 0..FIELDS.len() {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.values[i]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2013, 3, 1).context("start date")?;
    let rows = generate(&mut rng, start, 122);

    write_csv(&rows, "sample_data.csv")?;
    write_parquet(&rows, "sample_data.parquet")?;

    println!(
        "Wrote {} observations ({} stations) to sample_data.csv and sample_data.parquet",
        rows.len(),
        STATIONS.len()
    );
    Ok(())
}
