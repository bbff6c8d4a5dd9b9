//! Built-in decision models.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::{BenchError, Result};
use crate::domain::price_point::PricePoint;
use crate::domain::strategy::{Decision, Strategy};

/// Weekly purchases spread the funds over one year.
pub const DCA_WEEKS_PER_YEAR: f64 = 52.0;
const DCA_PURCHASES: u32 = 52;

/// Invests its whole funds snapshot on the first row, then holds.
///
/// The snapshot is taken at construction and never re-read from the simulator, so build it from
/// the same `initial_funds` as the `BacktestConfig` (see [`build_model`]).
#[derive(Debug, Clone)]
pub struct BuyOnceModel {
    funds: f64,
    has_bought: bool,
}

impl BuyOnceModel {
    pub fn new(funds: f64) -> Self {
        BuyOnceModel {
            funds,
            has_bought: false,
        }
    }
}

impl Strategy for BuyOnceModel {
    fn name(&self) -> &str {
        "buy_once"
    }

    fn evaluate(&mut self, _point: &PricePoint) -> Decision {
        if self.has_bought {
            return Decision::hold();
        }
        self.has_bought = true;
        Decision::buy(self.funds)
    }
}

/// Dollar-cost averaging: buys `funds / 52` on the first row of every Monday.
///
/// Makes exactly 52 purchases. The last one spends whatever is left of the funds, so float
/// residue from `funds / 52` is neither overdrawn nor bought as dust on a 53rd Monday.
#[derive(Debug, Clone)]
pub struct DcaModel {
    weekly: f64,
    remaining: f64,
    purchases: u32,
    last_buy: Option<(i32, u32, u32)>,
}

impl DcaModel {
    pub fn new(funds: f64) -> Self {
        DcaModel {
            weekly: funds / DCA_WEEKS_PER_YEAR,
            remaining: funds,
            purchases: 0,
            last_buy: None,
        }
    }

    pub fn weekly_amount(&self) -> f64 {
        self.weekly
    }

    pub fn purchases(&self) -> u32 {
        self.purchases
    }
}

impl Strategy for DcaModel {
    fn name(&self) -> &str {
        "dca"
    }

    fn evaluate(&mut self, point: &PricePoint) -> Decision {
        let date = point.date_key();
        if point.day_of_week != 0
            || self.last_buy == Some(date)
            || self.purchases >= DCA_PURCHASES
        {
            return Decision::hold();
        }
        self.purchases += 1;
        let amount = if self.purchases == DCA_PURCHASES {
            self.remaining
        } else {
            self.weekly.min(self.remaining)
        };
        self.remaining -= amount;
        self.last_buy = Some(date);
        Decision::buy(amount)
    }
}

/// Replays a fixed decision list, one entry per row, then holds.
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    decisions: Vec<Decision>,
    cursor: usize,
}

impl ScriptedModel {
    pub fn new(decisions: Vec<Decision>) -> Self {
        ScriptedModel {
            decisions,
            cursor: 0,
        }
    }
}

impl Strategy for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn evaluate(&mut self, _point: &PricePoint) -> Decision {
        let decision = self
            .decisions
            .get(self.cursor)
            .copied()
            .unwrap_or_else(Decision::hold);
        self.cursor += 1;
        decision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    BuyOnce,
    Dca,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::BuyOnce => write!(f, "buy_once"),
            ModelKind::Dca => write!(f, "dca"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "buy_once" => Ok(ModelKind::BuyOnce),
            "dca" => Ok(ModelKind::Dca),
            other => Err(BenchError::invalid(
                "backtest",
                "model",
                format!("unknown model {other:?} (expected buy_once or dca)"),
            )),
        }
    }
}

/// Builds a built-in model funded with the simulator's own `initial_funds`.
pub fn build_model(kind: ModelKind, initial_funds: f64) -> Box<dyn Strategy> {
    match kind {
        ModelKind::BuyOnce => Box::new(BuyOnceModel::new(initial_funds)),
        ModelKind::Dca => Box::new(DcaModel::new(initial_funds)),
    }
}
