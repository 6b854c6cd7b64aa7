//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, Direction, RunMode};
use crate::domain::config_validation::{parse_date, validate_all, validate_codes};
use crate::domain::error::FlagtraderError;
use crate::domain::flag::FlagConfig;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::metrics::Summary;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::Strategy;
use crate::domain::universe::{parse_codes, run_batch, BatchResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_history_port::PriceHistoryPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "flagtrader", about = "Flag pattern detector and backtester")]
pub struct Cli {
    /// Log debug output from the detector and backtest loop
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the flag breakout strategy over the configured history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Report flags on the most recent bar of each symbol
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            data_dir,
        } => run_batch_command(&config, code.as_deref(), data_dir, None),
        Command::Scan {
            config,
            code,
            data_dir,
        } => run_batch_command(&config, code.as_deref(), data_dir, Some(RunMode::LatestOnly)),
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            code,
            data_dir,
        } => run_info(&config, code.as_deref(), data_dir),
    }
}

fn fail(err: FlagtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    mode_override: Option<RunMode>,
) -> Result<BacktestConfig, FlagtraderError> {
    let start_date = parse_date(adapter, "start_date")?;
    let end_date = parse_date(adapter, "end_date")?;

    let mode = match mode_override {
        Some(mode) => mode,
        None => parse_mode(adapter.get_string("backtest", "mode").as_deref())?,
    };

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
        commission: adapter.get_double("backtest", "commission", 0.0),
        min_data_points: adapter.get_usize("backtest", "min_data_points", 100),
        mode,
        indicators: build_indicator_config(adapter).indicator_types(),
    })
}

fn parse_mode(value: Option<&str>) -> Result<RunMode, FlagtraderError> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("backtest") => Ok(RunMode::Backtest),
        Some("latest") => Ok(RunMode::LatestOnly),
        Some(other) => Err(FlagtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "mode".into(),
            reason: format!("unknown mode '{}'", other),
        }),
    }
}

pub fn build_flag_config(adapter: &dyn ConfigPort) -> FlagConfig {
    let d = FlagConfig::default();
    FlagConfig {
        look_back: adapter.get_usize("flag", "look_back", d.look_back),
        look_forward: adapter.get_usize("flag", "look_forward", d.look_forward),
        min_top_len: adapter.get_usize("flag", "min_top_len", d.min_top_len),
        max_top_len: adapter.get_usize("flag", "max_top_len", d.max_top_len),
        min_pole_len: adapter.get_usize("flag", "min_pole_len", d.min_pole_len),
        max_pole_len: adapter.get_usize("flag", "max_pole_len", d.max_pole_len),
        long_trend_r2: adapter.get_double("flag", "long_trend_r2", d.long_trend_r2),
        long_trend_slope: adapter.get_double("flag", "long_trend_slope", d.long_trend_slope),
        min_top_points: adapter.get_usize("flag", "min_top_points", d.min_top_points),
        min_bottom_points: adapter.get_usize("flag", "min_bottom_points", d.min_bottom_points),
        slope_min: adapter.get_double("flag", "slope_min", d.slope_min),
        slope_max: adapter.get_double("flag", "slope_max", d.slope_max),
        slope_tolerance: adapter.get_double("flag", "slope_tolerance", d.slope_tolerance),
        trend_accuracy: adapter.get_double("flag", "trend_accuracy", d.trend_accuracy),
        max_retracement: adapter.get_double("flag", "max_retracement", d.max_retracement),
        max_flat_days: adapter.get_usize("flag", "max_flat_days", d.max_flat_days),
        trend_filter_period: adapter.get_usize(
            "flag",
            "trend_filter_period",
            d.trend_filter_period,
        ),
    }
}

pub fn build_indicator_config(adapter: &dyn ConfigPort) -> IndicatorConfig {
    let d = IndicatorConfig::default();
    IndicatorConfig {
        macd_fast: adapter.get_usize("indicators", "macd_fast", d.macd_fast),
        macd_slow: adapter.get_usize("indicators", "macd_slow", d.macd_slow),
        macd_signal: adapter.get_usize("indicators", "macd_signal", d.macd_signal),
        bollinger_period: adapter.get_usize("indicators", "bollinger_period", d.bollinger_period),
        adx_period: adapter.get_usize("indicators", "adx_period", d.adx_period),
        pvo_fast: adapter.get_usize("indicators", "pvo_fast", d.pvo_fast),
        pvo_slow: adapter.get_usize("indicators", "pvo_slow", d.pvo_slow),
        pvo_signal: adapter.get_usize("indicators", "pvo_signal", d.pvo_signal),
    }
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Strategy {
    Strategy::flag_breakout(
        build_flag_config(adapter),
        adapter.get_double("backtest", "max_gap", 0.05),
        adapter.get_double("backtest", "take_profit_retracement", 0.65),
    )
}

pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, FlagtraderError> {
    let raw = match code_override {
        Some(c) => c.to_string(),
        None => {
            validate_codes(config)?;
            config
                .get_string("backtest", "codes")
                .or_else(|| config.get_string("backtest", "code"))
                .unwrap_or_default()
        }
    };
    parse_codes(&raw).map_err(|e| FlagtraderError::ConfigInvalid {
        section: "backtest".into(),
        key: "codes".into(),
        reason: e.to_string(),
    })
}

pub fn resolve_data_dir(data_dir_override: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    data_dir_override
        .or_else(|| config.get_string("backtest", "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn run_batch_command(
    config_path: &Path,
    code_override: Option<&str>,
    data_dir_override: Option<PathBuf>,
    mode: Option<RunMode>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }

    let config = match build_backtest_config(&adapter, mode) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let strategy = build_strategy(&adapter);
    let codes = match resolve_codes(code_override, &adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data_dir = resolve_data_dir(data_dir_override, &adapter);

    eprintln!(
        "Running {} on {} codes from {} ({} to {})",
        strategy.name,
        codes.len(),
        data_dir.display(),
        config.start_date,
        config.end_date
    );
    let port = CsvAdapter::new(data_dir);
    let batch = run_batch(&port, &codes, &strategy, &config);

    if batch.results.is_empty() {
        eprintln!("error: no codes could be run");
        for skip in &batch.skipped {
            eprintln!("  {}: {:?}", skip.code, skip.reason);
        }
        return ExitCode::from(5);
    }

    match config.mode {
        RunMode::Backtest => print_backtest(&batch),
        RunMode::LatestOnly => print_scan(&batch),
    }
    ExitCode::SUCCESS
}

fn print_backtest(batch: &BatchResult) {
    for result in &batch.results {
        print_result(result);
    }
    for skip in &batch.skipped {
        eprintln!("{}: skipped ({:?})", skip.code, skip.reason);
    }
    print_summary(&batch.summary);
}

fn print_result(result: &BacktestResult) {
    let account = &result.account;
    eprintln!(
        "\n{}: {} flags, {} trades, balance {:.2} ({:+.2}%)",
        result.code,
        result.flags.len(),
        account.num_trades,
        account.total_balance,
        account.percentage_gain_loss
    );
    for signal in &result.signals {
        let side = match signal.direction {
            Direction::Long => "BUY ",
            Direction::Short => "SELL",
        };
        eprintln!("  {} {} @ {:.3}", signal.date, side, signal.price);
    }
}

fn print_summary(summary: &Summary) {
    eprintln!("\n=== Summary ===");
    eprintln!("Symbols:        {}", summary.symbols);
    eprintln!("Flags found:    {}", summary.flags_found);
    eprintln!("Round trips:    {}", summary.trades);
    eprintln!("Win rate:       {:.1}%", summary.win_rate * 100.0);
    eprintln!("Avg holding:    {:.1} days", summary.avg_holding_days);
    eprintln!("Open positions: {}", summary.open_positions);
    eprintln!(
        "Balance:        {:.2} -> {:.2} ({:+.2}%)",
        summary.initial_balance, summary.final_balance, summary.total_return
    );
}

fn print_scan(batch: &BatchResult) {
    let mut found = 0;
    for result in &batch.results {
        for flag in &result.flags {
            found += 1;
            println!(
                "{},{},{:.3},{:.3},{}",
                result.code,
                flag.trigger_date,
                flag.trigger_price,
                flag.target_price,
                flag.pole.length
            );
            for (indicator, value) in &result.latest_indicators {
                eprintln!("  {} {} = {:.4}", result.code, indicator, value);
            }
        }
    }
    eprintln!(
        "{} flags on the latest bar across {} symbols ({} skipped)",
        found,
        batch.results.len(),
        batch.skipped.len()
    );
    info!("scan complete");
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter).and_then(|_| validate_codes(&adapter)) {
        return fail(e);
    }

    let flag = build_flag_config(&adapter);
    eprintln!(
        "\nFlag top:  {}-{} bars, >= {} maxima, >= {} minima",
        flag.min_top_len, flag.max_top_len, flag.min_top_points, flag.min_bottom_points
    );
    eprintln!(
        "Flag pole: {}-{} bars, R2 > {}, slope > {}",
        flag.min_pole_len, flag.max_pole_len, flag.long_trend_r2, flag.long_trend_slope
    );
    eprintln!(
        "Slopes in ({}, {}), within {} of each other, R2 > {}",
        flag.slope_min, flag.slope_max, flag.slope_tolerance, flag.trend_accuracy
    );
    let indicators = build_indicator_config(&adapter).indicator_types();
    let names: Vec<String> = indicators.iter().map(|t| t.to_string()).collect();
    eprintln!("Indicators: {}", names.join(", "));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, code: Option<&str>, data_dir_override: Option<PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let codes = match resolve_codes(code, &adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let port = CsvAdapter::new(resolve_data_dir(data_dir_override, &adapter));

    for c in &codes {
        let series = port
            .fetch_series(c, NaiveDate::MIN, NaiveDate::MAX)
            .and_then(|bars| PriceSeries::new(c.as_str(), bars));
        match series {
            Ok(series) => match (series.first_date(), series.last_date()) {
                (Some(first), Some(last)) => {
                    println!("{}: {} bars, {} to {}", c, series.len(), first, last)
                }
                _ => eprintln!("{}: no data found", c),
            },
            Err(e) => eprintln!("error reading {}: {}", c, e),
        }
    }
    ExitCode::SUCCESS
}
