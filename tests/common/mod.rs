#![allow(dead_code)]

use chrono::{DateTime, NaiveDateTime, Utc};
use psytrader::adapters::paper_execution::PaperExecutor;
use psytrader::domain::levels::{calc_psy_levels, LevelSeries};
use psytrader::domain::ohlcv::Bar;
use psytrader::domain::session::AnchorRule;
use psytrader::domain::strategy::{BreakoutStrategy, StrategyParams};

pub fn ts(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
}

pub fn bar(time: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(time),
        open,
        high,
        low,
        close,
        volume: 1.0,
    }
}

pub fn flat_bar(time: &str, price: f64) -> Bar {
    bar(time, price, price, price, price)
}

/// Compute levels and fold the strategy over the whole series with a paper
/// executor. Panics on out-of-order input.
pub fn run_pipeline(
    bars: &[Bar],
    params: StrategyParams,
    anchor: AnchorRule,
    initial_capital: f64,
) -> (PaperExecutor, LevelSeries) {
    let series = calc_psy_levels(bars, &anchor);
    let mut exec = PaperExecutor::new(initial_capital, 0.0);
    let mut strategy = BreakoutStrategy::new(params, anchor);

    for (b, point) in bars.iter().zip(&series.points) {
        exec.apply_bar(b);
        strategy
            .on_bar(b, point.levels.as_ref(), &mut exec)
            .unwrap();
    }
    (exec, series)
}

/// A week of bars around the 2024-01-06 crypto anchor whose defining window
/// pins the levels at hi=50000, lo=49000: lead-in hour plus the six hours
/// after the anchor, then quiet bars until the cooldown ends at 04:00.
pub fn window_week_bars() -> Vec<Bar> {
    vec![
        bar("2024-01-06 21:30:00", 49_500.0, 50_000.0, 49_000.0, 49_500.0),
        flat_bar("2024-01-06 22:00:00", 49_500.0),
        flat_bar("2024-01-06 23:00:00", 49_600.0),
        flat_bar("2024-01-07 01:00:00", 49_400.0),
        flat_bar("2024-01-07 03:55:00", 49_500.0),
    ]
}
