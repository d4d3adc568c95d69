//! Paper execution adapter.
//!
//! Minimal stand-in for an external execution engine, used by the CLI `run`
//! command and the integration tests. Market entries fill at the decision
//! bar's close; the bracket is enforced against subsequent bar ranges with
//! the stop checked before the target. Optional percentage commission is
//! charged on entry and exit notional. No slippage, margin, or drawdown
//! accounting.

use chrono::{DateTime, Utc};

use crate::domain::ohlcv::Bar;
use crate::domain::position::{CloseReason, ClosedTrade, Direction, OpenPosition};
use crate::ports::execution_port::ExecutionPort;

pub struct PaperExecutor {
    cash: f64,
    commission_pct: f64,
    position: Option<OpenPosition>,
    entry_time: Option<DateTime<Utc>>,
    mark_price: f64,
    mark_time: Option<DateTime<Utc>>,
    trades: Vec<ClosedTrade>,
}

impl PaperExecutor {
    pub fn new(initial_capital: f64, commission_pct: f64) -> Self {
        Self {
            cash: initial_capital,
            commission_pct,
            position: None,
            entry_time: None,
            mark_price: 0.0,
            mark_time: None,
            trades: Vec::new(),
        }
    }

    /// Advance to `bar`: enforce the open position's bracket against the
    /// bar's range, then mark at the close. Call once per bar, before the
    /// strategy evaluates it.
    pub fn apply_bar(&mut self, bar: &Bar) {
        self.mark_time = Some(bar.timestamp);

        if let Some(pos) = self.position.clone() {
            let stop_hit = match pos.direction {
                Direction::Long => pos.stop.is_some_and(|s| bar.low <= s),
                Direction::Short => pos.stop.is_some_and(|s| bar.high >= s),
            };
            let target_hit = match pos.direction {
                Direction::Long => pos.target.is_some_and(|t| bar.high >= t),
                Direction::Short => pos.target.is_some_and(|t| bar.low <= t),
            };

            // Stop before target when a bar spans both.
            if stop_hit {
                self.close_at(pos.stop.unwrap_or(bar.close), CloseReason::Stop);
            } else if target_hit {
                self.close_at(pos.target.unwrap_or(bar.close), CloseReason::Target);
            }
        }

        self.mark_price = bar.close;
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    fn commission(&self, notional: f64) -> f64 {
        notional * self.commission_pct
    }

    fn close_at(&mut self, price: f64, reason: CloseReason) {
        let Some(pos) = self.position.take() else {
            return;
        };
        let pnl = pos.unrealized_pnl(price);
        let commission = self.commission(price * pos.size);
        self.cash += pnl - commission;

        let exit_time = self.mark_time.unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.trades.push(ClosedTrade {
            direction: pos.direction,
            size: pos.size,
            entry_price: pos.entry_price,
            exit_price: price,
            entry_time: self.entry_time.take().unwrap_or(exit_time),
            exit_time,
            pnl: pnl - commission,
            reason,
        });
    }
}

impl ExecutionPort for PaperExecutor {
    fn account_equity(&self) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |p| p.unrealized_pnl(self.mark_price))
    }

    fn current_position(&self) -> Option<OpenPosition> {
        self.position.clone()
    }

    fn submit_entry(&mut self, direction: Direction, size: f64) {
        if self.position.is_some() {
            // One position at a time; a second entry is ignored.
            return;
        }
        self.cash -= self.commission(self.mark_price * size);
        self.entry_time = self.mark_time;
        self.position = Some(OpenPosition {
            direction,
            entry_price: self.mark_price,
            size,
            stop: None,
            target: None,
        });
    }

    fn set_stop(&mut self, level: f64) {
        if let Some(pos) = self.position.as_mut() {
            pos.stop = Some(level);
        }
    }

    fn set_target(&mut self, level: f64) {
        if let Some(pos) = self.position.as_mut() {
            pos.target = Some(level);
        }
    }

    fn close_position(&mut self) {
        self.close_at(self.mark_price, CloseReason::Forced);
    }
}
