//! CSV file data adapter.
//!
//! Price datasets use the column layout
//! `time, open, close, high, low, volume, year, month, day, day_of_week, weekend, hour, minute, second`
//! optionally followed by derived columns. Only `time` and the OHLCV columns are read; calendar
//! fields are always re-derived from `time`.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::dataset::EnrichedRow;
use crate::domain::error::{BenchError, Result};
use crate::domain::price_point::{normalize, time_from_millis, PricePoint};
use crate::domain::strategy::{Action, Decision};
use crate::ports::data_port::DataPort;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct PriceRecord {
    time: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
}

#[derive(Debug, Serialize)]
struct EnrichedRecord {
    time: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
    year: i32,
    month: u32,
    day: u32,
    day_of_week: u32,
    weekend: bool,
    hour: u32,
    minute: u32,
    second: u32,
    change: f64,
    prev_change: f64,
    next_change: f64,
    sma: f64,
    ema: f64,
    volatility: f64,
}

impl From<&EnrichedRow> for EnrichedRecord {
    fn from(row: &EnrichedRow) -> Self {
        let p = &row.point;
        EnrichedRecord {
            time: p.time.format(TIME_FORMAT).to_string(),
            open: p.open,
            close: p.close,
            high: p.high,
            low: p.low,
            volume: p.volume,
            year: p.year,
            month: p.month,
            day: p.day,
            day_of_week: p.day_of_week,
            weekend: p.is_weekend,
            hour: p.hour,
            minute: p.minute,
            second: p.second,
            change: row.change,
            prev_change: row.prev_change,
            next_change: row.next_change,
            sma: row.sma,
            ema: row.ema,
            volatility: row.volatility,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DecisionRecord {
    action: String,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        CsvAdapter
    }
}

/// Epoch milliseconds, or a `YYYY-MM-DD HH:MM:SS` (also `T`-separated) UTC timestamp.
pub fn parse_time(raw: &str, row: usize) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return time_from_millis(ms, row);
    }
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| BenchError::Data {
            row,
            reason: format!("invalid time {raw:?}: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn load_points(&self, path: &Path) -> Result<Vec<PricePoint>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut points = Vec::new();
        for (row, result) in rdr.deserialize::<PriceRecord>().enumerate() {
            let rec = result?;
            let time = parse_time(&rec.time, row)?;
            points.push(PricePoint::at(
                time, rec.open, rec.close, rec.high, rec.low, rec.volume,
            ));
        }

        let dropped = normalize(&mut points);
        if dropped > 0 {
            tracing::warn!(
                path = %path.display(),
                dropped,
                "dropped rows with duplicate timestamps"
            );
        }
        tracing::debug!(path = %path.display(), rows = points.len(), "loaded dataset");
        Ok(points)
    }

    fn load_decisions(&self, path: &Path) -> Result<Vec<Decision>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut decisions = Vec::new();
        for (row, result) in rdr.deserialize::<DecisionRecord>().enumerate() {
            let rec = result?;
            let action = rec
                .action
                .parse::<Action>()
                .map_err(|violation| BenchError::ModelContract { row, violation })?;
            let amount = rec.amount.unwrap_or(0.0);
            decisions.push(match action {
                Action::Buy => Decision::buy(amount),
                Action::Sell => Decision::sell(amount),
                Action::Hold => Decision::hold(),
            });
        }
        Ok(decisions)
    }

    fn write_enriched(&self, path: &Path, rows: &[EnrichedRow]) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for row in rows {
            wtr.serialize(EnrichedRecord::from(row))?;
        }
        wtr.flush()?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "wrote enriched dataset");
        Ok(())
    }
}
