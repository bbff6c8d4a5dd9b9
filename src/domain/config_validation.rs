//! Configuration validation and typed settings.
//!
//! Every key is checked before a run starts, and the offending `[section] key` is named in the
//! error. Values that fail to parse are errors rather than silently falling back to defaults.

use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::dataset::IndicatorConfig;
use crate::domain::error::{BenchError, Result};
use crate::domain::ledger::SellBound;
use crate::domain::models::ModelKind;
use crate::ports::config_port::ConfigPort;

/// Backtest parameters plus the built-in model to run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub config: BacktestConfig,
    pub model: ModelKind,
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<()> {
    read_backtest_settings(config).map(|_| ())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<()> {
    read_indicator_config(config).map(|_| ())
}

/// `[backtest]`: `initial_funds` is required; `model` defaults to `buy_once` and `sell_bound`
/// to `equity`.
pub fn read_backtest_settings(config: &dyn ConfigPort) -> Result<BacktestSettings> {
    let initial_funds: f64 = parse_key(config, "backtest", "initial_funds")?
        .ok_or_else(|| BenchError::missing("backtest", "initial_funds"))?;
    if initial_funds.is_nan() || initial_funds <= 0.0 {
        return Err(BenchError::invalid(
            "backtest",
            "initial_funds",
            "initial_funds must be positive",
        ));
    }
    let model = match config.get_string("backtest", "model") {
        Some(v) => v.parse::<ModelKind>()?,
        None => ModelKind::BuyOnce,
    };
    let sell_bound = match config.get_string("backtest", "sell_bound") {
        Some(v) => v.parse::<SellBound>()?,
        None => SellBound::default(),
    };
    Ok(BacktestSettings {
        config: BacktestConfig {
            initial_funds,
            sell_bound,
        },
        model,
    })
}

/// `[indicators]`: every key is optional and falls back to [`IndicatorConfig::default`].
pub fn read_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig> {
    let defaults = IndicatorConfig::default();
    let days: u32 = parse_key(config, "indicators", "days")?.unwrap_or(defaults.days);
    if days == 0 {
        return Err(BenchError::invalid("indicators", "days", "days must be at least 1"));
    }
    let granularity_minutes: u32 = parse_key(config, "indicators", "granularity")?
        .unwrap_or(defaults.granularity_minutes);
    if granularity_minutes == 0 {
        return Err(BenchError::invalid(
            "indicators",
            "granularity",
            "granularity must be at least 1 minute",
        ));
    }
    let smoothing: f64 =
        parse_key(config, "indicators", "smoothing")?.unwrap_or(defaults.smoothing);
    if smoothing.is_nan() || smoothing <= 0.0 {
        return Err(BenchError::invalid(
            "indicators",
            "smoothing",
            "smoothing must be positive",
        ));
    }
    Ok(IndicatorConfig {
        days,
        granularity_minutes,
        smoothing,
    })
}

fn parse_key<T: FromStr>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            BenchError::invalid(section, key, format!("cannot parse {raw:?}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid_key(err: BenchError, expected: &str) {
        match err {
            BenchError::ConfigInvalid { key, .. } => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {expected}, got {other}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            "[backtest]\ninitial_funds = 52000\nmodel = dca\nsell_bound = cash\n",
        );
        let settings = read_backtest_settings(&config).unwrap();
        assert_eq!(settings.config.initial_funds, 52_000.0);
        assert_eq!(settings.config.sell_bound, SellBound::Cash);
        assert_eq!(settings.model, ModelKind::Dca);
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn backtest_defaults() {
        let config = make_config("[backtest]\ninitial_funds = 1000\n");
        let settings = read_backtest_settings(&config).unwrap();
        assert_eq!(settings.model, ModelKind::BuyOnce);
        assert_eq!(settings.config.sell_bound, SellBound::EquityValue);
    }

    #[test]
    fn missing_initial_funds_fails() {
        let config = make_config("[backtest]\nmodel = dca\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, BenchError::ConfigMissing { .. }));
    }

    #[test]
    fn initial_funds_must_be_positive() {
        let config = make_config("[backtest]\ninitial_funds = 0\n");
        assert_invalid_key(validate_backtest_config(&config).unwrap_err(), "initial_funds");
        let config = make_config("[backtest]\ninitial_funds = -10\n");
        assert_invalid_key(validate_backtest_config(&config).unwrap_err(), "initial_funds");
    }

    #[test]
    fn non_numeric_funds_fails() {
        let config = make_config("[backtest]\ninitial_funds = lots\n");
        assert_invalid_key(validate_backtest_config(&config).unwrap_err(), "initial_funds");
    }

    #[test]
    fn unknown_model_fails() {
        let config = make_config("[backtest]\ninitial_funds = 10\nmodel = momentum\n");
        assert_invalid_key(validate_backtest_config(&config).unwrap_err(), "model");
    }

    #[test]
    fn unknown_sell_bound_fails() {
        let config = make_config("[backtest]\ninitial_funds = 10\nsell_bound = units\n");
        assert_invalid_key(validate_backtest_config(&config).unwrap_err(), "sell_bound");
    }

    #[test]
    fn indicator_defaults_when_section_missing() {
        let config = make_config("[backtest]\ninitial_funds = 10\n");
        assert_eq!(read_indicator_config(&config).unwrap(), IndicatorConfig::default());
    }

    #[test]
    fn indicator_values_are_read() {
        let config = make_config("[indicators]\ndays = 3\ngranularity = 5\nsmoothing = 1.5\n");
        let ic = read_indicator_config(&config).unwrap();
        assert_eq!(ic.days, 3);
        assert_eq!(ic.granularity_minutes, 5);
        assert_eq!(ic.smoothing, 1.5);
    }

    #[test]
    fn zero_days_fails() {
        let config = make_config("[indicators]\ndays = 0\n");
        assert_invalid_key(validate_indicator_config(&config).unwrap_err(), "days");
    }

    #[test]
    fn negative_granularity_fails() {
        let config = make_config("[indicators]\ngranularity = -5\n");
        assert_invalid_key(validate_indicator_config(&config).unwrap_err(), "granularity");
    }

    #[test]
    fn non_positive_smoothing_fails() {
        let config = make_config("[indicators]\nsmoothing = 0\n");
        assert_invalid_key(validate_indicator_config(&config).unwrap_err(), "smoothing");
    }
}
