//! Final performance snapshot of a backtest run.

use std::fmt;

use super::ledger::Ledger;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub initial_funds: f64,
    pub cash: f64,
    pub equity_units: f64,
    /// Close of the last replayed row, used to value held units.
    pub last_close: f64,
    pub equity_value: f64,
    pub net_worth: f64,
    pub gain_fraction: f64,
}

impl BacktestReport {
    pub fn compute(ledger: &Ledger, last_close: f64, initial_funds: f64) -> Self {
        let equity_value = ledger.equity_value(last_close);
        let net_worth = equity_value + ledger.cash();
        BacktestReport {
            initial_funds,
            cash: ledger.cash(),
            equity_units: ledger.equity_units(),
            last_close,
            equity_value,
            net_worth,
            gain_fraction: net_worth / initial_funds - 1.0,
        }
    }

    /// Signed gain as a percentage string, e.g. `+10.0000%`.
    pub fn gain_string(&self) -> String {
        let pct = self.gain_fraction * 100.0;
        if pct < 0.0 {
            format!("-{:.4}%", -pct)
        } else {
            format!("+{:.4}%", pct)
        }
    }
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Results ===")?;
        writeln!(f, "Uninvested: ${:.4}", self.cash)?;
        writeln!(
            f,
            "Equity:     {:.4} units (${:.4} on latest date)",
            self.equity_units, self.equity_value
        )?;
        writeln!(f, "Net:        ${:.4}", self.net_worth)?;
        write!(f, "% Gain:     {}", self.gain_string())
    }
}
