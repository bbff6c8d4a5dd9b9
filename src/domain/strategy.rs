//! Strategy capability and the decisions it produces.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ContractViolation;
use crate::domain::price_point::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

impl FromStr for Action {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            _ => Err(ContractViolation::UnrecognizedAction(s.trim().to_string())),
        }
    }
}

/// One per-row instruction. `amount` is in dollars at the row's open and is ignored for HOLD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub amount: f64,
}

impl Decision {
    pub fn buy(amount: f64) -> Self {
        Decision {
            action: Action::Buy,
            amount,
        }
    }

    pub fn sell(amount: f64) -> Self {
        Decision {
            action: Action::Sell,
            amount,
        }
    }

    pub fn hold() -> Self {
        Decision {
            action: Action::Hold,
            amount: 0.0,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Action::Hold => write!(f, "HOLD"),
            action => write!(f, "{} ${:.2}", action, self.amount),
        }
    }
}

/// A decision model queried once per row, in time order, with no look-ahead.
///
/// Implementations own whatever state they carry between rows.
pub trait Strategy {
    fn name(&self) -> &str;

    fn evaluate(&mut self, point: &PricePoint) -> Decision;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&mut self, point: &PricePoint) -> Decision {
        (**self).evaluate(point)
    }
}
