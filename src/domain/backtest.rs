//! Backtest engine: replays price points through a strategy against a ledger.
//!
//! A run moves through `Initialized -> Replaying -> Finalized`. Each row is shown to the model
//! before its decision is applied at that row's open, so the model never sees later rows.

use chrono::NaiveDateTime;

use super::error::{BenchError, Result};
use super::ledger::{Ledger, SellBound};
use super::price_point::PricePoint;
use super::report::BacktestReport;
use super::strategy::{Action, Decision, Strategy};

pub const DEFAULT_INITIAL_FUNDS: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_funds: f64,
    pub sell_bound: SellBound,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_funds: DEFAULT_INITIAL_FUNDS,
            sell_bound: SellBound::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    Replaying,
    Finalized,
}

/// A BUY or SELL that was applied to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub row: usize,
    pub time: NaiveDateTime,
    pub action: Action,
    pub amount: f64,
    pub price: f64,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub report: BacktestReport,
    pub fills: Vec<Fill>,
}

pub struct Backtest<M: Strategy> {
    config: BacktestConfig,
    model: M,
    ledger: Ledger,
    phase: Phase,
    rows_seen: usize,
    last_time: Option<NaiveDateTime>,
    last_close: f64,
    fills: Vec<Fill>,
}

impl<M: Strategy> Backtest<M> {
    pub fn new(model: M, config: BacktestConfig) -> Result<Self> {
        let ledger = Ledger::new(config.initial_funds)?;
        Ok(Backtest {
            config,
            model,
            ledger,
            phase: Phase::Initialized,
            rows_seen: 0,
            last_time: None,
            last_close: 0.0,
            fills: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Feeds one row to the model and applies its decision at the row's open.
    ///
    /// On a rejected decision the ledger is left exactly as it was before the row.
    pub fn step(&mut self, point: &PricePoint) -> Result<Decision> {
        if self.phase == Phase::Finalized {
            return Err(BenchError::Finalized);
        }
        let row = self.rows_seen;
        point.validate(row)?;
        if let Some(prev) = self.last_time.filter(|prev| point.time <= *prev) {
            return Err(BenchError::Data {
                row,
                reason: format!("time {} is not after previous row {}", point.time, prev),
            });
        }

        self.phase = Phase::Replaying;
        let decision = self.model.evaluate(point);
        let applied = match decision.action {
            Action::Hold => None,
            Action::Buy => Some(self.ledger.buy(decision.amount, point.open)),
            Action::Sell => Some(self.ledger.sell(
                decision.amount,
                point.open,
                self.config.sell_bound,
            )),
        };

        if let Some(result) = applied {
            let units = result.map_err(|violation| BenchError::ModelContract { row, violation })?;
            tracing::debug!(
                row,
                time = %point.time,
                action = %decision.action,
                amount = decision.amount,
                price = point.open,
                units,
                "fill"
            );
            self.fills.push(Fill {
                row,
                time: point.time,
                action: decision.action,
                amount: decision.amount,
                price: point.open,
                units,
            });
        }

        self.rows_seen += 1;
        self.last_time = Some(point.time);
        self.last_close = point.close;
        Ok(decision)
    }

    /// Values the ledger at the last replayed close. Only valid once per run.
    pub fn finalize(&mut self) -> Result<BacktestReport> {
        if self.phase == Phase::Finalized {
            return Err(BenchError::Finalized);
        }
        if self.rows_seen == 0 {
            return Err(BenchError::Data {
                row: 0,
                reason: "no rows to replay".into(),
            });
        }
        self.phase = Phase::Finalized;
        let report = BacktestReport::compute(&self.ledger, self.last_close, self.config.initial_funds);
        tracing::info!(
            model = self.model.name(),
            rows = self.rows_seen,
            fills = self.fills.len(),
            net_worth = report.net_worth,
            "backtest finalized"
        );
        Ok(report)
    }

    pub fn into_result(mut self) -> Result<BacktestResult> {
        let report = self.finalize()?;
        Ok(BacktestResult {
            report,
            fills: self.fills,
        })
    }
}

/// Replays every point through `model` and returns the final report with the fill journal.
pub fn run_backtest<M: Strategy>(
    points: &[PricePoint],
    model: M,
    config: &BacktestConfig,
) -> Result<BacktestResult> {
    let mut bt = Backtest::new(model, config.clone())?;
    for point in points {
        bt.step(point)?;
    }
    bt.into_result()
}
