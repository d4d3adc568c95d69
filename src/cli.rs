//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_execution::PaperExecutor;
use crate::domain::alerts::scan_alerts;
use crate::domain::config_validation::{
    parse_datetime, validate_run_config, validate_session_config, validate_strategy_config,
};
use crate::domain::error::PsytraderError;
use crate::domain::levels::{calc_psy_levels, LevelSeries};
use crate::domain::ohlcv::Bar;
use crate::domain::session::{parse_weekday, AnchorRule};
use crate::domain::strategy::{BreakoutStrategy, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::execution_port::ExecutionPort;

#[derive(Parser, Debug)]
#[command(name = "psytrader", about = "Weekly session-level breakout backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the breakout strategy against historical data
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Compute psy levels and export the per-bar series as CSV
    Levels {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scan the series for level-cross alerts
    Alerts {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for the configured symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, symbol } => run_strategy(&config, symbol.as_deref()),
        Command::Levels { config, output } => run_levels(&config, output.as_ref()),
        Command::Alerts { config } => run_alerts(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PsytraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Anchor convention from `[session]`: `preset = crypto|forex`, or explicit
/// `anchor_weekday` / `anchor_hour` / `anchor_minute` (crypto defaults).
pub fn build_anchor_rule(config: &dyn ConfigPort) -> Result<AnchorRule, PsytraderError> {
    if let Some(preset) = config.get_string("session", "preset") {
        return match preset.to_lowercase().as_str() {
            "crypto" => Ok(AnchorRule::crypto()),
            "forex" => Ok(AnchorRule::forex()),
            other => Err(PsytraderError::ConfigInvalid {
                section: "session".into(),
                key: "preset".into(),
                reason: format!("unknown preset '{}', expected crypto or forex", other),
            }),
        };
    }

    let default = AnchorRule::crypto();
    let weekday = match config.get_string("session", "anchor_weekday") {
        Some(s) => parse_weekday(&s).ok_or_else(|| PsytraderError::ConfigInvalid {
            section: "session".into(),
            key: "anchor_weekday".into(),
            reason: format!("unknown weekday '{}'", s),
        })?,
        None => default.weekday,
    };
    let hour = config.get_int("session", "anchor_hour", default.hour as i64) as u32;
    let minute = config.get_int("session", "anchor_minute", default.minute as i64) as u32;
    Ok(AnchorRule::new(weekday, hour, minute))
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> StrategyParams {
    let defaults = StrategyParams::default();
    StrategyParams {
        entry_offset: config.get_double("strategy", "entry_offset", defaults.entry_offset),
        take_profit: config.get_double("strategy", "take_profit", defaults.take_profit),
        risk_per_trade: config.get_double("strategy", "risk_per_trade", defaults.risk_per_trade),
        sl_offset: config.get_double("strategy", "sl_offset", defaults.sl_offset),
        trailing_offset: config.get_double(
            "strategy",
            "trailing_offset",
            defaults.trailing_offset,
        ),
        cooldown_hours: config.get_int("session", "cooldown_hours", defaults.cooldown_hours),
    }
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), PsytraderError> {
    validate_run_config(config)?;
    validate_session_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

struct RunInput {
    symbol: String,
    bars: Vec<Bar>,
}

/// Resolve symbol/data_dir/start/end from `[run]` and fetch the series.
/// An empty fetch rejects the run.
fn load_bars(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<RunInput, PsytraderError> {
    let symbol = match symbol_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("run", "symbol")
            .ok_or_else(|| PsytraderError::ConfigMissing {
                section: "run".into(),
                key: "symbol".into(),
            })?,
    };
    let data_dir = config
        .get_string("run", "data_dir")
        .ok_or_else(|| PsytraderError::ConfigMissing {
            section: "run".into(),
            key: "data_dir".into(),
        })?;
    let start = parse_run_datetime(config, "start")?;
    let end = parse_run_datetime(config, "end")?;

    let adapter = CsvAdapter::new(PathBuf::from(data_dir));
    let bars = adapter.fetch_bars(&symbol, start, end)?;
    if bars.is_empty() {
        return Err(PsytraderError::NoData { symbol });
    }
    Ok(RunInput { symbol, bars })
}

fn parse_run_datetime(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<DateTime<Utc>, PsytraderError> {
    let raw = config
        .get_string("run", key)
        .ok_or_else(|| PsytraderError::ConfigMissing {
            section: "run".into(),
            key: key.into(),
        })?;
    parse_datetime(&raw).ok_or_else(|| PsytraderError::ConfigInvalid {
        section: "run".into(),
        key: key.into(),
        reason: format!("invalid datetime '{}'", raw),
    })
}

fn run_strategy(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let anchor = match build_anchor_rule(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = build_strategy_params(&config);

    let input = match load_bars(&config, symbol_override) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loaded {} bars for {}", input.bars.len(), input.symbol);

    let series = calc_psy_levels(&input.bars, &anchor);
    eprintln!("Found {} sessions", series.sessions.len());

    let initial_capital = config.get_double("run", "initial_capital", 1_000_000.0);
    let commission_pct = config.get_double("run", "commission_pct", 0.0);
    let mut exec = PaperExecutor::new(initial_capital, commission_pct);
    let mut strategy = BreakoutStrategy::new(params, anchor);

    for (bar, point) in input.bars.iter().zip(&series.points) {
        exec.apply_bar(bar);
        if let Err(e) = strategy.on_bar(bar, point.levels.as_ref(), &mut exec) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    // Flatten at end of data so the final position is accounted for.
    exec.close_position();

    for trade in exec.trades() {
        println!(
            "{},{},{:.4},{:.2},{:.2},{},{:.2},{:?}",
            trade.entry_time,
            trade.exit_time,
            trade.size,
            trade.entry_price,
            trade.exit_price,
            trade.direction,
            trade.pnl,
            trade.reason,
        );
    }

    let final_cash = exec.cash();
    let wins = exec.trades().iter().filter(|t| t.pnl > 0.0).count();
    eprintln!("\n=== Run Summary ===");
    eprintln!("Trades:        {}", exec.trades().len());
    eprintln!("Wins:          {}", wins);
    eprintln!("Final equity:  {:.2}", final_cash);
    eprintln!("Net PnL:       {:.2}", final_cash - initial_capital);

    ExitCode::SUCCESS
}

fn run_levels(config_path: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let anchor = match build_anchor_rule(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let input = match load_bars(&config, None) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let series = calc_psy_levels(&input.bars, &anchor);
    let csv = render_levels_csv(&series);

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, csv) {
                let err = PsytraderError::Io(e);
                eprintln!("error: {err}");
                return (&err).into();
            }
            eprintln!("Wrote {} level points to {}", series.points.len(), path.display());
        }
        None => print!("{csv}"),
    }
    ExitCode::SUCCESS
}

/// One row per bar; empty fields where no levels apply.
pub fn render_levels_csv(series: &LevelSeries) -> String {
    let mut out = String::from("timestamp,psy_hi,psy_lo\n");
    for point in &series.points {
        match point.levels {
            Some(levels) => out.push_str(&format!(
                "{},{},{}\n",
                point.timestamp.to_rfc3339(),
                levels.hi,
                levels.lo
            )),
            None => out.push_str(&format!("{},,\n", point.timestamp.to_rfc3339())),
        }
    }
    out
}

fn run_alerts(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let anchor = match build_anchor_rule(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let input = match load_bars(&config, None) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let series = calc_psy_levels(&input.bars, &anchor);
    let alerts = scan_alerts(&input.bars, &series);
    for alert in &alerts {
        println!(
            "{} {} @ {:.2}",
            alert.timestamp.to_rfc3339(),
            alert.kind,
            alert.level
        );
    }
    eprintln!("{} alerts for {}", alerts.len(), input.symbol);
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config).and_then(|_| build_anchor_rule(&config).map(|_| ())) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config OK: {}", config_path.display());
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let symbol = match symbol_override.map(String::from).or_else(|| config.get_string("run", "symbol")) {
        Some(s) => s,
        None => {
            let err = PsytraderError::ConfigMissing {
                section: "run".into(),
                key: "symbol".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    let data_dir = match config.get_string("run", "data_dir") {
        Some(d) => d,
        None => {
            let err = PsytraderError::ConfigMissing {
                section: "run".into(),
                key: "data_dir".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let adapter = CsvAdapter::new(PathBuf::from(data_dir));
    match adapter.get_data_range(&symbol) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            let err = PsytraderError::NoData { symbol };
            eprintln!("error: {err}");
            (&err).into()
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
