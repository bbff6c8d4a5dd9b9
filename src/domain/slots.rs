//! Intraday slot statistics.
//!
//! Rows are bucketed by their position within a day (`row_index % slots_per_day`) and the
//! per-row direction `open - close` is collected for every slot.

use std::cmp::Ordering;

use crate::domain::error::{BenchError, Result};
use crate::domain::indicator::MINUTES_PER_DAY;
use crate::domain::price_point::PricePoint;

#[derive(Debug, Clone)]
pub struct SlotAccumulator {
    granularity_minutes: u32,
    slots_per_day: usize,
    rows: usize,
    tallies: Vec<i64>,
    directions: Vec<Vec<f64>>,
}

impl SlotAccumulator {
    pub fn new(granularity_minutes: u32) -> Result<Self> {
        if granularity_minutes == 0 || MINUTES_PER_DAY % granularity_minutes != 0 {
            return Err(BenchError::invalid(
                "slots",
                "granularity",
                format!("{granularity_minutes} minutes does not divide a day evenly"),
            ));
        }
        let slots_per_day = (MINUTES_PER_DAY / granularity_minutes) as usize;
        Ok(SlotAccumulator {
            granularity_minutes,
            slots_per_day,
            rows: 0,
            tallies: vec![0; slots_per_day],
            directions: vec![Vec::new(); slots_per_day],
        })
    }

    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    pub fn push(&mut self, point: &PricePoint) {
        let slot = self.rows % self.slots_per_day;
        let direction = point.open - point.close;
        if direction > 0.0 {
            self.tallies[slot] += 1;
        } else if direction < 0.0 {
            self.tallies[slot] -= 1;
        }
        self.directions[slot].push(direction);
        self.rows += 1;
    }

    pub fn fold<'a>(mut self, points: impl IntoIterator<Item = &'a PricePoint>) -> Self {
        for point in points {
            self.push(point);
        }
        self
    }

    pub fn finish(self) -> SlotReport {
        let stats = self
            .directions
            .iter()
            .enumerate()
            .filter(|(_, dirs)| !dirs.is_empty())
            .map(|(slot, dirs)| {
                let (mean, stddev) = mean_pstdev(dirs);
                SlotStats {
                    slot,
                    start_minute: slot as u32 * self.granularity_minutes,
                    tally: self.tallies[slot],
                    mean,
                    stddev,
                    samples: dirs.len(),
                }
            })
            .collect();
        SlotReport {
            granularity_minutes: self.granularity_minutes,
            slots_per_day: self.slots_per_day,
            rows: self.rows,
            stats,
            directions: self.directions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotStats {
    pub slot: usize,
    /// Minutes after the first row's time of day.
    pub start_minute: u32,
    pub tally: i64,
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

#[derive(Debug, Clone)]
pub struct SlotReport {
    pub granularity_minutes: u32,
    pub slots_per_day: usize,
    pub rows: usize,
    /// One entry per slot that received at least one row, in slot order.
    pub stats: Vec<SlotStats>,
    directions: Vec<Vec<f64>>,
}

impl SlotReport {
    pub fn ranked_by_stddev(&self) -> Vec<&SlotStats> {
        self.ranked(|a, b| b.stddev.total_cmp(&a.stddev))
    }

    pub fn ranked_by_mean(&self) -> Vec<&SlotStats> {
        self.ranked(|a, b| b.mean.total_cmp(&a.mean))
    }

    pub fn ranked_by_tally(&self) -> Vec<&SlotStats> {
        self.ranked(|a, b| b.tally.cmp(&a.tally))
    }

    /// Direction of `slot` on each day, oldest first.
    pub fn trend(&self, slot: usize) -> Result<&[f64]> {
        match self.directions.get(slot) {
            Some(dirs) if !dirs.is_empty() => Ok(dirs),
            _ => Err(BenchError::invalid(
                "slots",
                "slot",
                format!(
                    "slot {slot} has no samples ({} slots per day, {} rows)",
                    self.slots_per_day, self.rows
                ),
            )),
        }
    }

    fn ranked(&self, cmp: impl Fn(&SlotStats, &SlotStats) -> Ordering) -> Vec<&SlotStats> {
        let mut ranked: Vec<&SlotStats> = self.stats.iter().collect();
        ranked.sort_by(|a, b| cmp(a, b));
        ranked
    }
}

fn mean_pstdev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    /// Rows at `gran`-minute spacing from midnight with the given (open, close) pairs.
    fn rows(gran: i64, pairs: &[(f64, f64)]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(o, c))| {
                let t = start + chrono::Duration::minutes(gran * i as i64);
                PricePoint::at(t, o, c, o.max(c), o.min(c), 1.0)
            })
            .collect()
    }

    #[test]
    fn granularity_must_divide_day() {
        assert_eq!(SlotAccumulator::new(5).unwrap().slots_per_day(), 288);
        assert_eq!(SlotAccumulator::new(720).unwrap().slots_per_day(), 2);
        match SlotAccumulator::new(7).unwrap_err() {
            BenchError::ConfigInvalid { section, key, .. } => {
                assert_eq!((section.as_str(), key.as_str()), ("slots", "granularity"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(SlotAccumulator::new(0).unwrap_err().is_configuration());
    }

    #[test]
    fn tally_counts_directions() {
        // two slots per day, three days
        let points = rows(
            720,
            &[
                (10.0, 9.0),  // slot 0 +
                (10.0, 11.0), // slot 1 -
                (10.0, 8.0),  // slot 0 +
                (10.0, 10.0), // slot 1 flat
                (10.0, 12.0), // slot 0 -
                (10.0, 11.0), // slot 1 -
            ],
        );
        let report = SlotAccumulator::new(720).unwrap().fold(&points).finish();
        assert_eq!(report.rows, 6);
        assert_eq!(report.stats[0].tally, 1);
        assert_eq!(report.stats[1].tally, -2);
        assert_eq!(report.stats[1].samples, 3);
        assert_eq!(report.stats[1].start_minute, 720);
    }

    #[test]
    fn mean_and_population_stddev() {
        let points = rows(720, &[(10.0, 8.0), (5.0, 5.0), (10.0, 6.0), (5.0, 5.0)]);
        let report = SlotAccumulator::new(720).unwrap().fold(&points).finish();
        // slot 0 directions: 2, 4
        assert_relative_eq!(report.stats[0].mean, 3.0);
        assert_relative_eq!(report.stats[0].stddev, 1.0);
        assert_eq!(report.stats[1].stddev, 0.0);
    }

    #[test]
    fn rankings_are_descending() {
        let points = rows(
            480,
            &[(10.0, 9.0), (10.0, 14.0), (10.0, 7.0), (10.0, 9.5), (10.0, 10.0), (10.0, 13.0)],
        );
        let report = SlotAccumulator::new(480).unwrap().fold(&points).finish();
        let by_mean: Vec<usize> = report.ranked_by_mean().iter().map(|s| s.slot).collect();
        assert_eq!(by_mean, vec![0, 2, 1]);
        let by_tally: Vec<usize> = report.ranked_by_tally().iter().map(|s| s.slot).collect();
        assert_eq!(by_tally[0], 0);
        assert_eq!(by_tally[2], 1);
        let by_stddev = report.ranked_by_stddev();
        assert!(by_stddev[0].stddev >= by_stddev[1].stddev);
    }

    #[test]
    fn partial_day_only_reports_seen_slots() {
        let points = rows(5, &[(1.0, 2.0), (2.0, 1.0)]);
        let report = SlotAccumulator::new(5).unwrap().fold(&points).finish();
        assert_eq!(report.stats.len(), 2);
        assert!(report.trend(100).unwrap_err().is_configuration());
        assert!(report.trend(288).is_err());
    }

    #[test]
    fn trend_is_per_day_series() {
        let points = rows(720, &[(10.0, 9.0), (1.0, 1.0), (10.0, 12.0), (1.0, 1.0)]);
        let report = SlotAccumulator::new(720).unwrap().fold(&points).finish();
        assert_eq!(report.trend(0).unwrap(), &[1.0, -2.0]);
    }
}
