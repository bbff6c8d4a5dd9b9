//! Dataset enrichment: raw candles to the derived indicator table.

use crate::domain::error::Result;
use crate::domain::indicator::change::{
    calculate_change, calculate_next_change, calculate_prev_change,
};
use crate::domain::indicator::ema::{calculate_ema, EmaAccumulator, DEFAULT_SMOOTHING};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::volatility::calculate_volatility;
use crate::domain::indicator::{day_stride, window_size};
use crate::domain::price_point::PricePoint;

/// Days of history fed to the rolling indicators when nothing else is configured.
pub const DEFAULT_DAYS: u32 = 20;
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub days: u32,
    pub granularity_minutes: u32,
    pub smoothing: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            days: DEFAULT_DAYS,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl IndicatorConfig {
    pub fn window_size(&self) -> Result<usize> {
        window_size(self.days, self.granularity_minutes)
    }

    pub fn day_stride(&self) -> Result<usize> {
        day_stride(self.granularity_minutes)
    }
}

/// A source row plus every derived column.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub point: PricePoint,
    pub change: f64,
    pub prev_change: f64,
    pub next_change: f64,
    pub sma: f64,
    pub ema: f64,
    pub volatility: f64,
}

/// Builds the enriched table. Rows lacking any column (indicator warm-up, the first row's
/// previous change, the last row's next change) are dropped, so row `j` of the output is
/// source row `window_size + j`.
pub fn enrich(points: &[PricePoint], config: &IndicatorConfig) -> Result<Vec<EnrichedRow>> {
    let window = config.window_size()?;
    let stride = config.day_stride()?;
    EmaAccumulator::new(window, config.smoothing)?;

    for (row, p) in points.iter().enumerate() {
        p.validate(row)?;
    }

    let volatility = calculate_volatility(points, window, stride)?;
    if points.len() <= window + 1 {
        return Ok(Vec::new());
    }

    let change = calculate_change(points)?;
    let prev_change = calculate_prev_change(points)?;
    let next_change = calculate_next_change(points)?;
    let sma = calculate_sma(points, window)?;
    let ema = calculate_ema(points, window, config.smoothing)?;
    tracing::debug!(
        sma = %sma.indicator_type,
        ema = %ema.indicator_type,
        volatility = %volatility.indicator_type,
        stride,
        "indicator series ready"
    );

    let rows = (window..points.len() - 1)
        .map(|i| {
            let j = i - window;
            EnrichedRow {
                point: points[i].clone(),
                change: change.values[i].value,
                prev_change: prev_change.values[i - 1].value,
                next_change: next_change.values[i].value,
                sma: sma.values[j].value,
                ema: ema.values[j].value,
                volatility: volatility.values[j].value,
            }
        })
        .collect();

    Ok(rows)
}
