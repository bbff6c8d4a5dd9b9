//! Cash/equity bookkeeping for a single simulated asset.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::{BenchError, ContractViolation, Result, TradeSide};

/// What a SELL amount is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SellBound {
    /// Bounded by uninvested cash as well as by held equity value. Units never go negative.
    Cash,
    /// Bounded by the dollar value of held units at the row's open.
    #[default]
    EquityValue,
}

impl fmt::Display for SellBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellBound::Cash => write!(f, "cash"),
            SellBound::EquityValue => write!(f, "equity"),
        }
    }
}

impl FromStr for SellBound {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(SellBound::Cash),
            "equity" | "equity_value" => Ok(SellBound::EquityValue),
            other => Err(BenchError::invalid(
                "backtest",
                "sell_bound",
                format!("unknown sell bound {other:?} (expected cash or equity)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    equity_units: f64,
}

impl Ledger {
    pub fn new(initial_funds: f64) -> Result<Self> {
        if initial_funds.is_nan() || initial_funds <= 0.0 {
            return Err(BenchError::invalid(
                "backtest",
                "initial_funds",
                format!("initial_funds must be positive (got {initial_funds})"),
            ));
        }
        Ok(Ledger {
            cash: initial_funds,
            equity_units: 0.0,
        })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn equity_units(&self) -> f64 {
        self.equity_units
    }

    /// Dollar value of held units at `price`.
    pub fn equity_value(&self, price: f64) -> f64 {
        self.equity_units * price
    }

    /// Spends `amount` dollars on units at `open`. Returns the units bought.
    /// The ledger is untouched when the amount is rejected.
    pub fn buy(&mut self, amount: f64, open: f64) -> std::result::Result<f64, ContractViolation> {
        check_positive(TradeSide::Buy, amount)?;
        if amount > self.cash {
            return Err(ContractViolation::InsufficientFunds {
                amount,
                available: self.cash,
            });
        }
        let units = amount / open;
        self.cash -= amount;
        self.equity_units += units;
        Ok(units)
    }

    /// Sells `amount` dollars of units at `open`. Returns the units sold.
    /// The ledger is untouched when the amount is rejected.
    pub fn sell(
        &mut self,
        amount: f64,
        open: f64,
        bound: SellBound,
    ) -> std::result::Result<f64, ContractViolation> {
        check_positive(TradeSide::Sell, amount)?;
        let available = match bound {
            SellBound::Cash => self.cash.min(self.equity_value(open)),
            SellBound::EquityValue => self.equity_value(open),
        };
        if amount > available {
            return Err(ContractViolation::InsufficientEquity { amount, available });
        }
        // selling the whole position must not leave rounding dust below zero
        let units = (amount / open).min(self.equity_units);
        self.cash += amount;
        self.equity_units -= units;
        Ok(units)
    }
}

fn check_positive(side: TradeSide, amount: f64) -> std::result::Result<(), ContractViolation> {
    if amount.is_nan() || amount <= 0.0 {
        return Err(ContractViolation::NonPositiveAmount {
            action: side,
            amount,
        });
    }
    Ok(())
}
