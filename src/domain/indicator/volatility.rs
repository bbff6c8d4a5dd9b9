//! Annualized volatility over a trailing multi-day window.
//!
//! The window is sampled once per day (every `day_stride`-th price, starting at the oldest),
//! day-over-day relative changes are taken, and their sample standard deviation is scaled
//! by sqrt(252).

use std::collections::VecDeque;

use crate::domain::error::{BenchError, Result};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_point::PricePoint;

pub const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

/// Two day-over-day changes are needed for a sample standard deviation.
pub const MIN_DAILY_SAMPLES: usize = 3;

#[derive(Debug, Clone)]
pub struct VolatilityAccumulator {
    window: VecDeque<f64>,
    size: usize,
    day_stride: usize,
}

/// Daily samples taken from a window of `window_size` prices.
pub fn daily_sample_count(window_size: usize, day_stride: usize) -> usize {
    if day_stride == 0 {
        return 0;
    }
    window_size.div_ceil(day_stride)
}

impl VolatilityAccumulator {
    pub fn new(size: usize, day_stride: usize) -> Result<Self> {
        if day_stride == 0 {
            return Err(BenchError::invalid(
                "indicators",
                "granularity",
                "day stride must be at least 1",
            ));
        }
        let samples = daily_sample_count(size, day_stride);
        if samples < MIN_DAILY_SAMPLES {
            return Err(BenchError::InsufficientDailySamples {
                window: size,
                samples,
                minimum: MIN_DAILY_SAMPLES,
            });
        }
        Ok(VolatilityAccumulator {
            window: VecDeque::with_capacity(size),
            size,
            day_stride,
        })
    }

    /// Feeds the next (positive) price. Returns `None` while the initial window is filling.
    pub fn advance(&mut self, price: f64) -> Option<f64> {
        if self.window.len() < self.size {
            self.window.push_back(price);
            return None;
        }
        self.window.pop_front();
        self.window.push_back(price);
        Some(self.current())
    }

    fn current(&self) -> f64 {
        let samples: Vec<f64> = self
            .window
            .iter()
            .step_by(self.day_stride)
            .copied()
            .collect();
        let changes: Vec<f64> = samples.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        sample_stddev(&changes) * TRADING_PERIODS_PER_YEAR.sqrt()
    }
}

fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

pub fn calculate_volatility(
    points: &[PricePoint],
    window_size: usize,
    day_stride: usize,
) -> Result<IndicatorSeries> {
    let mut acc = VolatilityAccumulator::new(window_size, day_stride)?;
    let indicator_type = IndicatorType::Volatility(window_size);
    if window_size > points.len() {
        return Ok(IndicatorSeries::empty(indicator_type));
    }

    let mut values = Vec::with_capacity(points.len() - window_size);
    for (row, p) in points.iter().enumerate() {
        if p.close.is_nan() || p.close <= 0.0 {
            return Err(BenchError::Data {
                row,
                reason: format!("close must be positive for volatility (got {})", p.close),
            });
        }
        if let Some(value) = acc.advance(p.close) {
            values.push(IndicatorPoint {
                time: p.time,
                value,
            });
        }
    }

    Ok(IndicatorSeries {
        indicator_type,
        values,
    })
}
