//! Per-row percentage change and its neighbours.
//!
//! CHANGE[i] = round((C[i] - O[i]) / O[i] * 100, 2)
//! PREV_CHANGE[i] = CHANGE[i-1], undefined for the first row.
//! NEXT_CHANGE[i] = CHANGE[i+1], undefined for the last row.

use crate::domain::error::{BenchError, Result};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_point::PricePoint;

pub fn change_pct(point: &PricePoint, row: usize) -> Result<f64> {
    if point.open.is_nan() || point.open <= 0.0 {
        return Err(BenchError::Data {
            row,
            reason: format!("open must be positive to compute change (got {})", point.open),
        });
    }
    Ok(round2((point.close - point.open) / point.open * 100.0))
}

pub fn changes(points: &[PricePoint]) -> Result<Vec<f64>> {
    points
        .iter()
        .enumerate()
        .map(|(row, p)| change_pct(p, row))
        .collect()
}

pub fn calculate_change(points: &[PricePoint]) -> Result<IndicatorSeries> {
    let values = changes(points)?
        .into_iter()
        .zip(points)
        .map(|(value, p)| IndicatorPoint {
            time: p.time,
            value,
        })
        .collect();
    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Change,
        values,
    })
}

/// Keyed to rows `1..`; one shorter than the input.
pub fn calculate_prev_change(points: &[PricePoint]) -> Result<IndicatorSeries> {
    let change = changes(points)?;
    let values = points
        .iter()
        .skip(1)
        .zip(&change)
        .map(|(p, &value)| IndicatorPoint {
            time: p.time,
            value,
        })
        .collect();
    Ok(IndicatorSeries {
        indicator_type: IndicatorType::PrevChange,
        values,
    })
}

/// Keyed to rows `..len-1`; one shorter than the input.
pub fn calculate_next_change(points: &[PricePoint]) -> Result<IndicatorSeries> {
    let change = changes(points)?;
    let values = points
        .iter()
        .zip(change.iter().skip(1))
        .map(|(p, &value)| IndicatorPoint {
            time: p.time,
            value,
        })
        .collect();
    Ok(IndicatorSeries {
        indicator_type: IndicatorType::NextChange,
        values,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
