//! Exponential Moving Average.
//!
//! k = smoothing/(n+1), seed with the mean of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Emitted in lock-step with SMA(n).

use crate::domain::error::{BenchError, Result};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_point::PricePoint;

pub const DEFAULT_SMOOTHING: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct EmaAccumulator {
    size: usize,
    k: f64,
    seen: usize,
    sum: f64,
    ema: Option<f64>,
}

impl EmaAccumulator {
    pub fn new(size: usize, smoothing: f64) -> Result<Self> {
        if size == 0 {
            return Err(BenchError::invalid(
                "indicators",
                "window_size",
                "window_size must be at least 1",
            ));
        }
        if smoothing.is_nan() || smoothing <= 0.0 {
            return Err(BenchError::invalid(
                "indicators",
                "smoothing",
                "smoothing must be positive",
            ));
        }
        Ok(EmaAccumulator {
            size,
            k: smoothing / (1.0 + size as f64),
            seen: 0,
            sum: 0.0,
            ema: None,
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Mean of the first `size` prices, once they have all been seen.
    pub fn seed(&self) -> Option<f64> {
        (self.seen >= self.size).then(|| self.sum / self.size as f64)
    }

    /// Feeds the next price. Returns `None` until the seed window is complete.
    pub fn advance(&mut self, price: f64) -> Option<f64> {
        match self.ema {
            None if self.seen < self.size => {
                self.seen += 1;
                self.sum += price;
                if self.seen == self.size {
                    self.ema = self.seed();
                }
                None
            }
            prev => {
                let prev = prev.unwrap_or(price);
                let next = price * self.k + prev * (1.0 - self.k);
                self.ema = Some(next);
                Some(next)
            }
        }
    }
}

/// EMA series aligned with `calculate_sma`. A window longer than the data yields an empty
/// series; a zero window or a non-positive smoothing is a configuration error.
pub fn calculate_ema(
    points: &[PricePoint],
    window_size: usize,
    smoothing: f64,
) -> Result<IndicatorSeries> {
    let indicator_type = IndicatorType::Ema(window_size);
    let mut acc = EmaAccumulator::new(window_size, smoothing)?;
    if window_size > points.len() {
        return Ok(IndicatorSeries::empty(indicator_type));
    }

    let values = points
        .iter()
        .filter_map(|p| {
            acc.advance(p.close).map(|value| IndicatorPoint {
                time: p.time,
                value,
            })
        })
        .collect();

    Ok(IndicatorSeries {
        indicator_type,
        values,
    })
}
