//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    read_backtest_settings, read_indicator_config, validate_backtest_config,
    validate_indicator_config, BacktestSettings,
};
use crate::domain::dataset::{enrich, IndicatorConfig, DEFAULT_GRANULARITY_MINUTES};
use crate::domain::error::{BenchError, Result};
use crate::domain::ledger::SellBound;
use crate::domain::models::{build_model, ModelKind, ScriptedModel};
use crate::domain::slots::{SlotAccumulator, SlotReport, SlotStats};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "candlebench", about = "Candle indicators and strategy backtests")]
pub struct Cli {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a dataset through a model and print the result
    Backtest {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// buy_once or dca
        #[arg(short, long)]
        model: Option<String>,
        /// Replay a decision log (`action,amount`) instead of a built-in model
        #[arg(long, conflicts_with = "model")]
        decisions: Option<PathBuf>,
        #[arg(long)]
        funds: Option<f64>,
        /// cash or equity
        #[arg(long)]
        sell_bound: Option<String>,
    },
    /// Write the dataset with change, SMA, EMA and volatility columns
    Enrich {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        granularity: Option<u32>,
    },
    /// Rank intraday slots by direction statistics
    Slots {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long, default_value_t = DEFAULT_GRANULARITY_MINUTES)]
        granularity: u32,
        /// Print one slot's per-day direction series
        #[arg(long)]
        slot: Option<usize>,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the stderr log subscriber. Safe to call more than once.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            config,
            model,
            decisions,
            funds,
            sell_bound,
        } => run_backtest_command(&BacktestArgs {
            data,
            config,
            model,
            decisions,
            funds,
            sell_bound,
        }),
        Command::Enrich {
            data,
            output,
            config,
            days,
            granularity,
        } => run_enrich(&data, &output, config.as_deref(), days, granularity),
        Command::Slots {
            data,
            granularity,
            slot,
            top,
        } => run_slots(&data, granularity, slot, top),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

#[derive(Debug, Clone, Default)]
pub struct BacktestArgs {
    pub data: PathBuf,
    pub config: Option<PathBuf>,
    pub model: Option<String>,
    pub decisions: Option<PathBuf>,
    pub funds: Option<f64>,
    pub sell_bound: Option<String>,
}

/// Config file values first, then command-line overrides.
pub fn resolve_backtest_settings(args: &BacktestArgs) -> Result<BacktestSettings> {
    let mut settings = match &args.config {
        Some(path) => read_backtest_settings(&load_config(path)?)?,
        None => BacktestSettings {
            config: BacktestConfig::default(),
            model: ModelKind::BuyOnce,
        },
    };
    if let Some(funds) = args.funds {
        settings.config.initial_funds = funds;
    }
    if let Some(model) = &args.model {
        settings.model = model.parse()?;
    }
    if let Some(bound) = &args.sell_bound {
        settings.config.sell_bound = bound.parse::<SellBound>()?;
    }
    Ok(settings)
}

pub fn execute_backtest(args: &BacktestArgs, data_port: &dyn DataPort) -> Result<BacktestResult> {
    let settings = resolve_backtest_settings(args)?;

    tracing::info!(path = %args.data.display(), "loading dataset");
    let points = data_port.load_points(&args.data)?;

    let result = match &args.decisions {
        Some(path) => {
            tracing::info!(path = %path.display(), "replaying decision log");
            let decisions = data_port.load_decisions(path)?;
            run_backtest(&points, ScriptedModel::new(decisions), &settings.config)?
        }
        None => {
            tracing::info!(
                model = %settings.model,
                initial_funds = settings.config.initial_funds,
                sell_bound = %settings.config.sell_bound,
                rows = points.len(),
                "running backtest"
            );
            let model = build_model(settings.model, settings.config.initial_funds);
            run_backtest(&points, model, &settings.config)?
        }
    };
    Ok(result)
}

fn run_backtest_command(args: &BacktestArgs) -> Result<()> {
    let result = execute_backtest(args, &CsvAdapter::new())?;
    println!("{}", result.report);
    Ok(())
}

/// Config file values first, then command-line overrides.
pub fn resolve_indicator_config(
    config_path: Option<&Path>,
    days: Option<u32>,
    granularity: Option<u32>,
) -> Result<IndicatorConfig> {
    let mut config = match config_path {
        Some(path) => read_indicator_config(&load_config(path)?)?,
        None => IndicatorConfig::default(),
    };
    if let Some(days) = days {
        config.days = days;
    }
    if let Some(granularity) = granularity {
        config.granularity_minutes = granularity;
    }
    Ok(config)
}

fn run_enrich(
    data: &Path,
    output: &Path,
    config_path: Option<&Path>,
    days: Option<u32>,
    granularity: Option<u32>,
) -> Result<()> {
    let config = resolve_indicator_config(config_path, days, granularity)?;
    let adapter = CsvAdapter::new();

    tracing::info!(path = %data.display(), "loading dataset");
    let points = adapter.load_points(data)?;

    tracing::info!(
        days = config.days,
        granularity = config.granularity_minutes,
        window = config.window_size()?,
        "computing indicators"
    );
    let rows = enrich(&points, &config)?;
    if rows.is_empty() {
        tracing::warn!(
            rows = points.len(),
            window = config.window_size()?,
            "dataset is not longer than the indicator window; nothing to write"
        );
    }

    adapter.write_enriched(output, &rows)?;
    tracing::info!(path = %output.display(), rows = rows.len(), "wrote enriched dataset");
    Ok(())
}

fn run_slots(data: &Path, granularity: u32, slot: Option<usize>, top: usize) -> Result<()> {
    let accumulator = SlotAccumulator::new(granularity)?;
    tracing::info!(path = %data.display(), "loading dataset");
    let points = CsvAdapter::new().load_points(data)?;
    let report = accumulator.fold(&points).finish();
    tracing::info!(
        slots = report.stats.len(),
        slots_per_day = report.slots_per_day,
        rows = report.rows,
        "slot statistics"
    );

    match slot {
        Some(slot) => {
            for (day, direction) in report.trend(slot)?.iter().enumerate() {
                println!("day {day}: {direction:.4}");
            }
        }
        None => print_rankings(&report, top),
    }
    Ok(())
}

fn print_rankings(report: &SlotReport, top: usize) {
    let sections: [(&str, Vec<&SlotStats>); 3] = [
        ("stddev", report.ranked_by_stddev()),
        ("mean", report.ranked_by_mean()),
        ("tally", report.ranked_by_tally()),
    ];
    for (name, ranked) in sections {
        println!("top/bottom {top} {name}:");
        let k = top.min(ranked.len());
        for s in &ranked[..k] {
            println!("  {}", format_slot(s));
        }
        if ranked.len() > k {
            println!("  ...");
            let tail = ranked.len().saturating_sub(k).max(k);
            for s in &ranked[tail..] {
                println!("  {}", format_slot(s));
            }
        }
        println!();
    }
}

fn format_slot(s: &SlotStats) -> String {
    format!(
        "slot {:>4} (+{:02}:{:02})  mean {:>10.4}  stddev {:>10.4}  tally {:>5}  n={}",
        s.slot,
        s.start_minute / 60,
        s.start_minute % 60,
        s.mean,
        s.stddev,
        s.tally,
        s.samples
    )
}

fn run_validate(config_path: &Path) -> Result<()> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;
    println!("Configuration is valid.");
    Ok(())
}

/// Validates `[backtest]` when present and `[indicators]` always.
pub fn validate_config(config: &dyn ConfigPort) -> Result<()> {
    if config.has_section("backtest") {
        validate_backtest_config(config)?;
    }
    validate_indicator_config(config)?;
    if !config.has_section("backtest") && !config.has_section("indicators") {
        return Err(BenchError::missing("backtest", "initial_funds"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_backtest_flags() {
        let cli = Cli::parse_from([
            "candlebench",
            "backtest",
            "--data",
            "btc.csv",
            "--model",
            "dca",
            "--funds",
            "52000",
        ]);
        assert_eq!(cli.log_level, "info");
        match cli.command {
            Command::Backtest {
                data, model, funds, ..
            } => {
                assert_eq!(data, PathBuf::from("btc.csv"));
                assert_eq!(model.as_deref(), Some("dca"));
                assert_eq!(funds, Some(52_000.0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn decisions_conflict_with_model() {
        let result = Cli::try_parse_from([
            "candlebench",
            "backtest",
            "-d",
            "btc.csv",
            "--model",
            "dca",
            "--decisions",
            "log.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_log_level_after_subcommand() {
        let cli = Cli::parse_from([
            "candlebench",
            "slots",
            "-d",
            "btc.csv",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Slots {
                granularity, top, ..
            } => {
                assert_eq!(granularity, DEFAULT_GRANULARITY_MINUTES);
                assert_eq!(top, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_without_config() {
        let args = BacktestArgs {
            model: Some("dca".into()),
            funds: Some(5_200.0),
            sell_bound: Some("cash".into()),
            ..BacktestArgs::default()
        };
        let settings = resolve_backtest_settings(&args).unwrap();
        assert_eq!(settings.model, ModelKind::Dca);
        assert_eq!(settings.config.initial_funds, 5_200.0);
        assert_eq!(settings.config.sell_bound, SellBound::Cash);
    }

    #[test]
    fn bad_model_override_is_configuration_error() {
        let args = BacktestArgs {
            model: Some("momentum".into()),
            ..BacktestArgs::default()
        };
        assert!(resolve_backtest_settings(&args).unwrap_err().is_configuration());
    }

    #[test]
    fn indicator_overrides() {
        let config = resolve_indicator_config(None, Some(3), Some(720)).unwrap();
        assert_eq!(config.days, 3);
        assert_eq!(config.granularity_minutes, 720);
        assert_eq!(config.window_size().unwrap(), 6);
    }

    #[test]
    fn validate_config_requires_a_known_section() {
        let empty = FileConfigAdapter::from_string("[other]\nkey = 1\n").unwrap();
        assert!(validate_config(&empty).unwrap_err().is_configuration());

        let indicators = FileConfigAdapter::from_string("[indicators]\ndays = 5\n").unwrap();
        assert!(validate_config(&indicators).is_ok());
    }
}
