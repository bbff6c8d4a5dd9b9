#![allow(dead_code)]

use candlebench::domain::dataset::EnrichedRow;
use candlebench::domain::error::{BenchError, Result};
pub use candlebench::domain::price_point::PricePoint;
use candlebench::domain::strategy::Decision;
use candlebench::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

/// In-memory dataset source that records what would have been written.
pub struct MockDataPort {
    pub points: Vec<PricePoint>,
    pub decisions: Vec<Decision>,
    pub error: Option<String>,
    pub written: RefCell<Vec<(PathBuf, usize)>>,
}

impl MockDataPort {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points,
            decisions: Vec::new(),
            error: None,
            written: RefCell::new(Vec::new()),
        }
    }

    pub fn with_decisions(mut self, decisions: Vec<Decision>) -> Self {
        self.decisions = decisions;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_points(&self, _path: &Path) -> Result<Vec<PricePoint>> {
        if let Some(reason) = &self.error {
            return Err(BenchError::Data {
                row: 0,
                reason: reason.clone(),
            });
        }
        Ok(self.points.clone())
    }

    fn load_decisions(&self, _path: &Path) -> Result<Vec<Decision>> {
        Ok(self.decisions.clone())
    }

    fn write_enriched(&self, path: &Path, rows: &[EnrichedRow]) -> Result<()> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), rows.len()));
        Ok(())
    }
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

pub fn make_point(time: NaiveDateTime, open: f64, close: f64) -> PricePoint {
    PricePoint::at(time, open, close, open.max(close) + 1.0, open.min(close) - 0.5, 10.0)
}

/// `n` points spaced `step_minutes` apart from `start`, with closes from `close_at(i)` and each
/// open equal to the previous close.
pub fn generate_points(
    start: NaiveDateTime,
    step_minutes: i64,
    n: usize,
    close_at: impl Fn(usize) -> f64,
) -> Vec<PricePoint> {
    let mut prev = close_at(0);
    (0..n)
        .map(|i| {
            let close = close_at(i);
            let p = make_point(start + Duration::minutes(step_minutes * i as i64), prev, close);
            prev = close;
            p
        })
        .collect()
}

/// One point per day for seven days starting on Monday 2024-01-01.
pub fn one_week_daily() -> Vec<PricePoint> {
    generate_points(datetime(2024, 1, 1, 0, 0), 24 * 60, 7, |i| 100.0 + i as f64)
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Renders points in the dataset CSV layout with epoch-millisecond times.
pub fn points_csv(points: &[PricePoint]) -> String {
    let mut out = String::from("time,open,close,high,low,volume\n");
    for p in points {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            p.time_ms(),
            p.open,
            p.close,
            p.high,
            p.low,
            p.volume
        ));
    }
    out
}
