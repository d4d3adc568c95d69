//! Configuration validation.
//!
//! Validates all recognized config fields before a run starts.

use crate::domain::error::PsytraderError;
use crate::domain::session::parse_weekday;
use crate::ports::config_port::ConfigPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    validate_symbol(config)?;
    validate_data_dir(config)?;
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    validate_preset(config)?;
    validate_anchor_weekday(config)?;
    validate_anchor_time(config)?;
    validate_cooldown(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    validate_fraction(config, "entry_offset", 0.0001)?;
    validate_fraction(config, "sl_offset", 0.0001)?;
    validate_positive_fraction(config, "take_profit", 0.01)?;
    validate_positive_fraction(config, "risk_per_trade", 0.01)?;
    validate_positive_fraction(config, "trailing_offset", 0.005)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PsytraderError {
    PsytraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    match config.get_string("run", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("run", "symbol", "symbol must not be empty")),
        None => Err(PsytraderError::ConfigMissing {
            section: "run".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    match config.get_string("run", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("run", "data_dir", "data_dir must not be empty")),
        None => Err(PsytraderError::ConfigMissing {
            section: "run".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    let value = config.get_double("run", "initial_capital", 1_000_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "run",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    let value = config.get_double("run", "commission_pct", 0.0);
    if value < 0.0 {
        return Err(invalid(
            "run",
            "commission_pct",
            "commission_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    let start_str = config.get_string("run", "start");
    let end_str = config.get_string("run", "end");

    let start = parse_required_datetime(start_str.as_deref(), "start")?;
    let end = parse_required_datetime(end_str.as_deref(), "end")?;

    if start >= end {
        return Err(invalid("run", "start", "start must be before end"));
    }
    Ok(())
}

fn parse_required_datetime(
    value: Option<&str>,
    field: &str,
) -> Result<DateTime<Utc>, PsytraderError> {
    match value {
        None => Err(PsytraderError::ConfigMissing {
            section: "run".to_string(),
            key: field.to_string(),
        }),
        Some(s) => parse_datetime(s).ok_or_else(|| {
            invalid(
                "run",
                field,
                format!(
                    "invalid {} format, expected RFC 3339, \
                     YYYY-MM-DD HH:MM:SS or YYYY-MM-DD",
                    field
                ),
            )
        }),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC assumed), or a bare date
/// (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn validate_preset(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    match config.get_string("session", "preset") {
        None => Ok(()),
        Some(p) if matches!(p.to_lowercase().as_str(), "crypto" | "forex") => Ok(()),
        Some(p) => Err(invalid(
            "session",
            "preset",
            format!("unknown preset '{}', expected crypto or forex", p),
        )),
    }
}

fn validate_anchor_weekday(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    match config.get_string("session", "anchor_weekday") {
        None => Ok(()),
        Some(s) => match parse_weekday(&s) {
            Some(_) => Ok(()),
            None => Err(invalid(
                "session",
                "anchor_weekday",
                format!("unknown weekday '{}'", s),
            )),
        },
    }
}

fn validate_anchor_time(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    let hour = config.get_int("session", "anchor_hour", 22);
    if !(0..=23).contains(&hour) {
        return Err(invalid(
            "session",
            "anchor_hour",
            "anchor_hour must be between 0 and 23",
        ));
    }
    let minute = config.get_int("session", "anchor_minute", 0);
    if !(0..=59).contains(&minute) {
        return Err(invalid(
            "session",
            "anchor_minute",
            "anchor_minute must be between 0 and 59",
        ));
    }
    Ok(())
}

fn validate_cooldown(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    let hours = config.get_int("session", "cooldown_hours", 6);
    if hours < 0 {
        return Err(invalid(
            "session",
            "cooldown_hours",
            "cooldown_hours must be non-negative",
        ));
    }
    Ok(())
}

fn validate_fraction(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), PsytraderError> {
    let value = config.get_double("strategy", key, default);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be in [0, 1)", key),
        ));
    }
    Ok(())
}

fn validate_positive_fraction(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), PsytraderError> {
    let value = config.get_double("strategy", key, default);
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be in (0, 1)", key),
        ));
    }
    Ok(())
}
