//! Technical indicator implementations.
//!
//! Rolling indicators are computed by stateful accumulators that own the trailing window, so
//! each new price costs O(1) (SMA/EMA) or O(days in window) (volatility) instead of a rescan:
//! - `SmaAccumulator`, `EmaAccumulator`, `VolatilityAccumulator` advance one price at a time
//! - `calculate_*` functions fold a whole `PricePoint` slice into an `IndicatorSeries`
//!
//! Every rolling series is aligned to the suffix of its input that starts at index
//! `window_size`: the first `window_size` prices only fill the initial window.

pub mod change;
pub mod ema;
pub mod sma;
pub mod volatility;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::error::{BenchError, Result};

pub const MINUTES_PER_DAY: u32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Volatility(usize),
    Change,
    PrevChange,
    NextChange,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Plain values, dropping the time keys.
    pub fn raw(&self) -> Vec<f64> {
        self.values.iter().map(|p| p.value).collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(window) => write!(f, "SMA({})", window),
            IndicatorType::Ema(window) => write!(f, "EMA({})", window),
            IndicatorType::Volatility(window) => write!(f, "VOLATILITY({})", window),
            IndicatorType::Change => write!(f, "CHANGE"),
            IndicatorType::PrevChange => write!(f, "PREV_CHANGE"),
            IndicatorType::NextChange => write!(f, "NEXT_CHANGE"),
        }
    }
}

/// Number of samples covering `days` at one sample every `granularity_minutes`:
/// `ceil(1440 * days / granularity_minutes)`.
pub fn window_size(days: u32, granularity_minutes: u32) -> Result<usize> {
    if days == 0 {
        return Err(BenchError::invalid(
            "indicators",
            "days",
            "days must be at least 1",
        ));
    }
    let minutes = u64::from(MINUTES_PER_DAY) * u64::from(days);
    Ok(minutes.div_ceil(granularity(granularity_minutes)?) as usize)
}

/// Distance, in samples, between consecutive daily samples: `ceil(1440 / granularity_minutes)`.
pub fn day_stride(granularity_minutes: u32) -> Result<usize> {
    Ok(u64::from(MINUTES_PER_DAY).div_ceil(granularity(granularity_minutes)?) as usize)
}

fn granularity(granularity_minutes: u32) -> Result<u64> {
    if granularity_minutes == 0 {
        return Err(BenchError::invalid(
            "indicators",
            "granularity",
            "granularity must be at least 1 minute",
        ));
    }
    Ok(u64::from(granularity_minutes))
}
