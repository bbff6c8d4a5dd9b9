//! Price point (candle) representation and calendar derivation.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

use super::error::{BenchError, Result};

/// One OHLCV sample for a fixed interval, with calendar fields derived from `time` (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub time: NaiveDateTime,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl PricePoint {
    /// Builds source row `row` from the exchange candle layout
    /// `[time_ms, open, close, high, low, volume]`.
    pub fn from_candle(
        row: usize,
        time_ms: i64,
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: f64,
    ) -> Result<Self> {
        let time = time_from_millis(time_ms, row)?;
        Ok(Self::at(time, open, close, high, low, volume))
    }

    /// Builds a point at an already-parsed UTC time.
    pub fn at(time: NaiveDateTime, open: f64, close: f64, high: f64, low: f64, volume: f64) -> Self {
        let day_of_week = time.weekday().num_days_from_monday();
        PricePoint {
            time,
            open,
            close,
            high,
            low,
            volume,
            year: time.year(),
            month: time.month(),
            day: time.day(),
            day_of_week,
            is_weekend: day_of_week >= 5,
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }

    /// Epoch milliseconds of `time`.
    pub fn time_ms(&self) -> i64 {
        self.time.and_utc().timestamp_millis()
    }

    /// `(year, month, day)` of the point.
    pub fn date_key(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }

    /// Prices must be strictly positive and volume non-negative.
    pub fn validate(&self, row: usize) -> Result<()> {
        for (name, value) in [
            ("open", self.open),
            ("close", self.close),
            ("high", self.high),
            ("low", self.low),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(BenchError::Data {
                    row,
                    reason: format!("{name} must be positive (got {value})"),
                });
            }
        }
        if self.volume.is_nan() || self.volume < 0.0 {
            return Err(BenchError::Data {
                row,
                reason: format!("volume must be non-negative (got {})", self.volume),
            });
        }
        Ok(())
    }
}

/// UTC time of an epoch-milliseconds timestamp read from source row `row`.
pub fn time_from_millis(time_ms: i64, row: usize) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(time_ms)
        .map(|t| t.naive_utc())
        .ok_or_else(|| BenchError::Data {
            row,
            reason: format!("timestamp {time_ms} out of range"),
        })
}

/// Sorts points ascending by time and drops repeated timestamps, keeping the first seen.
/// Returns the number of dropped duplicates.
pub fn normalize(points: &mut Vec<PricePoint>) -> usize {
    let before = points.len();
    points.sort_by_key(|p| p.time);
    points.dedup_by_key(|p| p.time);
    before - points.len()
}
