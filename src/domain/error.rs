//! Domain error types.

use std::fmt;

/// The specific rule a strategy broke when its decision was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    #[error("unrecognized model action {0:?}")]
    UnrecognizedAction(String),

    #[error("model tried to {action} a non-positive amount (${amount})")]
    NonPositiveAmount { action: TradeSide, amount: f64 },

    #[error("model tried to BUY ${amount} with insufficient funds (${available})")]
    InsufficientFunds { amount: f64, available: f64 },

    #[error("model tried to SELL ${amount} exceeding its bound (${available})")]
    InsufficientEquity { amount: f64, available: f64 },
}

/// Side of a ledger mutation, used in violation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Top-level error type for candlebench.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error at row {row}: {reason}")]
    Data { row: usize, reason: String },

    #[error("volatility window of {window} prices yields {samples} daily samples, need at least {minimum}")]
    InsufficientDailySamples {
        window: usize,
        samples: usize,
        minimum: usize,
    },

    #[error("model contract violated at row {row}: {violation}")]
    ModelContract {
        row: usize,
        violation: ContractViolation,
    },

    #[error("backtest run already finalized")]
    Finalized,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BenchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        BenchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BenchError::ConfigParse { .. }
                | BenchError::ConfigMissing { .. }
                | BenchError::ConfigInvalid { .. }
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(
            self,
            BenchError::Data { .. } | BenchError::InsufficientDailySamples { .. }
        )
    }

    pub fn is_model_contract(&self) -> bool {
        matches!(self, BenchError::ModelContract { .. })
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

impl From<&BenchError> for std::process::ExitCode {
    fn from(err: &BenchError) -> Self {
        let code: u8 = match err {
            BenchError::Io(_) | BenchError::Csv(_) | BenchError::Finalized => 1,
            BenchError::ConfigParse { .. }
            | BenchError::ConfigMissing { .. }
            | BenchError::ConfigInvalid { .. } => 2,
            BenchError::Data { .. } | BenchError::InsufficientDailySamples { .. } => 3,
            BenchError::ModelContract { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violation_message_names_amounts() {
        let err = BenchError::ModelContract {
            row: 3,
            violation: ContractViolation::InsufficientFunds {
                amount: 150_000.0,
                available: 100_000.0,
            },
        };
        assert_eq!(
            err.to_string(),
            "model contract violated at row 3: model tried to BUY $150000 with insufficient funds ($100000)"
        );
    }

    #[test]
    fn non_positive_amount_names_side() {
        let v = ContractViolation::NonPositiveAmount {
            action: TradeSide::Sell,
            amount: 0.0,
        };
        assert_eq!(v.to_string(), "model tried to SELL a non-positive amount ($0)");
    }

    #[test]
    fn families() {
        assert!(BenchError::missing("backtest", "initial_funds").is_configuration());
        assert!(BenchError::Data {
            row: 0,
            reason: "open must be positive".into()
        }
        .is_data());
        assert!(BenchError::InsufficientDailySamples {
            window: 10,
            samples: 1,
            minimum: 3
        }
        .is_data());
        assert!(BenchError::ModelContract {
            row: 0,
            violation: ContractViolation::UnrecognizedAction("SHORT".into())
        }
        .is_model_contract());
    }

    #[test]
    fn config_invalid_display() {
        let err = BenchError::invalid("backtest", "initial_funds", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config value [backtest] initial_funds: must be positive"
        );
    }
}
