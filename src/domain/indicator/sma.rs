//! Simple Moving Average.
//!
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n, emitted for i >= n.
//! The first n closes only fill the window.

use std::collections::VecDeque;

use crate::domain::error::{BenchError, Result};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_point::PricePoint;

/// Running mean over a fixed trailing window.
#[derive(Debug, Clone)]
pub struct SmaAccumulator {
    window: VecDeque<f64>,
    size: usize,
    sum: f64,
}

impl SmaAccumulator {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(BenchError::invalid(
                "indicators",
                "window_size",
                "window_size must be at least 1",
            ));
        }
        Ok(SmaAccumulator {
            window: VecDeque::with_capacity(size),
            size,
            sum: 0.0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Feeds the next price. Returns `None` while the initial window is filling.
    pub fn advance(&mut self, price: f64) -> Option<f64> {
        if self.window.len() < self.size {
            self.window.push_back(price);
            self.sum += price;
            return None;
        }
        if let Some(oldest) = self.window.pop_front() {
            self.sum -= oldest;
        }
        self.window.push_back(price);
        self.sum += price;
        Some(self.sum / self.size as f64)
    }
}

/// A window longer than the data yields an empty series; a zero window is an error.
pub fn calculate_sma(points: &[PricePoint], window_size: usize) -> Result<IndicatorSeries> {
    let indicator_type = IndicatorType::Sma(window_size);
    let mut acc = SmaAccumulator::new(window_size)?;
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
