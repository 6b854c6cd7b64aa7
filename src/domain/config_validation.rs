//! Configuration validation.
//!
//! Checks every `[backtest]`, `[flag]` and `[indicators]` value before a run
//! so that a bad threshold fails up front instead of silently producing no
//! flags.

use chrono::NaiveDate;

use crate::domain::error::FlagtraderError;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    validate_backtest_config(config)?;
    validate_flag_config(config)?;
    validate_indicator_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    validate_dates(config)?;

    let capital = config.get_double("backtest", "initial_capital", 10_000.0);
    if capital <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "must be positive"));
    }
    if config.get_double("backtest", "commission", 0.0) < 0.0 {
        return Err(invalid("backtest", "commission", "must be non-negative"));
    }
    if config.get_int("backtest", "min_data_points", 100) < 1 {
        return Err(invalid("backtest", "min_data_points", "must be at least 1"));
    }
    let gap = config.get_double("backtest", "max_gap", 0.05);
    if !(0.0..=1.0).contains(&gap) {
        return Err(invalid("backtest", "max_gap", "must be between 0 and 1"));
    }
    if config.get_double("backtest", "take_profit_retracement", 0.65) <= 0.0 {
        return Err(invalid(
            "backtest",
            "take_profit_retracement",
            "must be positive",
        ));
    }
    if let Some(mode) = config.get_string("backtest", "mode") {
        if !matches!(mode.trim().to_lowercase().as_str(), "backtest" | "latest") {
            return Err(invalid(
                "backtest",
                "mode",
                "must be 'backtest' or 'latest'",
            ));
        }
    }
    Ok(())
}

/// `codes` (comma separated) or a single `code` must be present and parse.
pub fn validate_codes(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    let (key, value) = match (
        config.get_string("backtest", "codes"),
        config.get_string("backtest", "code"),
    ) {
        (Some(c), _) => ("codes", c),
        (None, Some(c)) => ("code", c),
        (None, None) => {
            return Err(FlagtraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: "codes".to_string(),
            });
        }
    };
    parse_codes(&value)
        .map(|_| ())
        .map_err(|e| invalid("backtest", key, &e.to_string()))
}

pub fn validate_flag_config(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    for key in [
        "look_back",
        "look_forward",
        "min_top_len",
        "max_top_len",
        "min_pole_len",
        "max_pole_len",
    ] {
        if config.get_int("flag", key, 1) < 1 {
            return Err(invalid("flag", key, "must be at least 1"));
        }
    }
    for key in [
        "min_top_points",
        "min_bottom_points",
        "max_flat_days",
        "trend_filter_period",
    ] {
        if config.get_int("flag", key, 0) < 0 {
            return Err(invalid("flag", key, "must be non-negative"));
        }
    }

    let min_top = config.get_int("flag", "min_top_len", 10);
    let max_top = config.get_int("flag", "max_top_len", 20);
    if min_top > max_top {
        return Err(invalid(
            "flag",
            "min_top_len",
            "must not exceed max_top_len",
        ));
    }
    let min_pole = config.get_int("flag", "min_pole_len", 10);
    let max_pole = config.get_int("flag", "max_pole_len", 40);
    if min_pole > max_pole {
        return Err(invalid(
            "flag",
            "min_pole_len",
            "must not exceed max_pole_len",
        ));
    }

    for key in ["long_trend_r2", "trend_accuracy"] {
        let value = config.get_double("flag", key, 0.8);
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid("flag", key, "must be between 0 and 1"));
        }
    }

    let slope_min = config.get_double("flag", "slope_min", -1.0);
    let slope_max = config.get_double("flag", "slope_max", 0.0);
    if slope_min >= slope_max {
        return Err(invalid("flag", "slope_min", "must be below slope_max"));
    }
    if config.get_double("flag", "slope_tolerance", 0.03) <= 0.0 {
        return Err(invalid("flag", "slope_tolerance", "must be positive"));
    }
    let retracement = config.get_double("flag", "max_retracement", 0.65);
    if !(retracement > 0.0 && retracement <= 1.0) {
        return Err(invalid(
            "flag",
            "max_retracement",
            "must be in (0, 1]",
        ));
    }
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    for key in [
        "macd_fast",
        "macd_slow",
        "macd_signal",
        "bollinger_period",
        "adx_period",
        "pvo_fast",
        "pvo_slow",
        "pvo_signal",
    ] {
        if config.get_int("indicators", key, 1) < 1 {
            return Err(invalid("indicators", key, "must be at least 1"));
        }
    }
    if config.get_int("indicators", "macd_fast", 12) >= config.get_int("indicators", "macd_slow", 26)
    {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "must be below macd_slow",
        ));
    }
    if config.get_int("indicators", "pvo_fast", 12) >= config.get_int("indicators", "pvo_slow", 26) {
        return Err(invalid("indicators", "pvo_fast", "must be below pvo_slow"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FlagtraderError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, FlagtraderError> {
    let value = config
        .get_string("backtest", key)
        .ok_or_else(|| FlagtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "backtest",
            key,
            &format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> FlagtraderError {
    FlagtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
