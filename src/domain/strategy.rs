//! Session-level breakout strategy state machine.
//!
//! Evaluated as a strict fold over bars in timestamp order. Each bar passes
//! through a fixed pipeline: attach any pending bracket, skip when no levels
//! are defined, detect session rollover, apply the cooldown gate, then either
//! trail the take-profit (position open) or look for breakouts (flat).
//!
//! Entries use a two-step fill-then-bracket protocol: the market order goes
//! out on the decision bar, and the stop/target are attached on the next bar
//! once the realized fill price is observable through the execution port.

use chrono::{DateTime, Duration, Utc};

use crate::domain::error::PsytraderError;
use crate::domain::levels::PsyLevels;
use crate::domain::ohlcv::Bar;
use crate::domain::position::{Direction, OpenPosition};
use crate::domain::session::AnchorRule;
use crate::ports::execution_port::ExecutionPort;

/// Entries whose risk distance falls below this are discarded.
const MIN_RISK_DISTANCE: f64 = 1e-8;

/// Strategy tuning parameters. All offsets are fractions of price.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    /// Breakout buffer beyond the level edge.
    pub entry_offset: f64,
    /// Profit fraction that both sets the initial target and arms trailing.
    pub take_profit: f64,
    /// Fraction of account equity risked per entry.
    pub risk_per_trade: f64,
    /// Stop buffer beyond the opposite level edge.
    pub sl_offset: f64,
    /// Distance behind current price once trailing is active.
    pub trailing_offset: f64,
    /// Hours after a session rollover before trading resumes.
    pub cooldown_hours: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            entry_offset: 0.0001,
            take_profit: 0.01,
            risk_per_trade: 0.01,
            sl_offset: 0.0001,
            trailing_offset: 0.005,
            cooldown_hours: 6,
        }
    }
}

/// Observable state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    /// Flat and allowed to trade.
    Idle,
    /// Flat but gated until the post-rollover deadline.
    Cooldown,
    /// One open position; trailing logic active.
    InPosition,
}

/// The breakout strategy. One instance per run; owns all temporal state.
#[derive(Debug)]
pub struct BreakoutStrategy {
    params: StrategyParams,
    anchor: AnchorRule,
    current_session: Option<DateTime<Utc>>,
    cooldown_until: Option<DateTime<Utc>>,
    pending_stop: Option<f64>,
    last_seen: Option<DateTime<Utc>>,
}

impl BreakoutStrategy {
    pub fn new(params: StrategyParams, anchor: AnchorRule) -> Self {
        Self {
            params,
            anchor,
            current_session: None,
            cooldown_until: None,
            pending_stop: None,
            last_seen: None,
        }
    }

    /// Derive the machine's state at `now`.
    pub fn state(&self, now: DateTime<Utc>, exec: &dyn ExecutionPort) -> StrategyState {
        if exec.current_position().is_some() {
            StrategyState::InPosition
        } else if self.cooldown_until.is_some_and(|deadline| now < deadline) {
            StrategyState::Cooldown
        } else {
            StrategyState::Idle
        }
    }

    /// Evaluate one bar. `levels` is the pair in effect at this bar, if any.
    ///
    /// Bars must arrive in strictly increasing timestamp order; a stale bar
    /// is a caller contract violation and fails the run.
    pub fn on_bar(
        &mut self,
        bar: &Bar,
        levels: Option<&PsyLevels>,
        exec: &mut dyn ExecutionPort,
    ) -> Result<(), PsytraderError> {
        if let Some(last_seen) = self.last_seen {
            if bar.timestamp <= last_seen {
                return Err(PsytraderError::OutOfOrderBar {
                    timestamp: bar.timestamp,
                    last_seen,
                });
            }
        }
        self.last_seen = Some(bar.timestamp);

        // 1. Attach the bracket left pending by the previous bar's entry,
        //    now that the fill price is known.
        if let Some(stop) = self.pending_stop.take() {
            if let Some(pos) = exec.current_position() {
                let target = match pos.direction {
                    Direction::Long => pos.entry_price * (1.0 + self.params.take_profit),
                    Direction::Short => pos.entry_price * (1.0 - self.params.take_profit),
                };
                exec.set_stop(stop);
                exec.set_target(target);
            }
            // If the entry never filled, the pending bracket is dropped.
        }

        // 2. No levels defined for this bar: nothing further to do.
        let Some(levels) = levels else {
            return Ok(());
        };
        debug_assert!(levels.hi >= levels.lo);

        // 3. Session rollover: an anchor bar starting a session we have not
        //    recorded, or the very first evaluated bar of the run.
        let is_new_anchor =
            self.anchor.matches(bar.timestamp) && self.current_session != Some(bar.timestamp);
        if is_new_anchor || self.current_session.is_none() {
            if exec.current_position().is_some() {
                exec.close_position();
            }
            self.pending_stop = None;
            self.current_session = Some(bar.timestamp);
            self.cooldown_until =
                Some(bar.timestamp + Duration::hours(self.params.cooldown_hours));
        }

        // 4. Cooldown gate: no trading action until the deadline passes.
        if self
            .cooldown_until
            .is_some_and(|deadline| bar.timestamp < deadline)
        {
            return Ok(());
        }

        // 5. Position open: trail the take-profit, nothing else.
        if let Some(pos) = exec.current_position() {
            self.update_trailing(bar.close, &pos, exec);
            return Ok(());
        }

        // 6. Flat: look for a breakout.
        self.check_breakout(bar, levels, exec)
    }

    /// Once unrealized profit reaches `take_profit` from entry, ratchet the
    /// target to `trailing_offset` beyond the current price. The target only
    /// ever moves in the favorable direction.
    fn update_trailing(&self, price: f64, pos: &OpenPosition, exec: &mut dyn ExecutionPort) {
        match pos.direction {
            Direction::Long => {
                if price >= pos.entry_price * (1.0 + self.params.take_profit) {
                    let target = price * (1.0 + self.params.trailing_offset);
                    if pos.target.map_or(true, |current| target > current) {
                        exec.set_target(target);
                    }
                }
            }
            Direction::Short => {
                if price <= pos.entry_price * (1.0 - self.params.take_profit) {
                    let target = price * (1.0 - self.params.trailing_offset);
                    if pos.target.map_or(true, |current| target < current) {
                        exec.set_target(target);
                    }
                }
            }
        }
    }

    fn check_breakout(
        &mut self,
        bar: &Bar,
        levels: &PsyLevels,
        exec: &mut dyn ExecutionPort,
    ) -> Result<(), PsytraderError> {
        // Step 3 always records a session before trading is possible; a miss
        // here means the pipeline was bypassed.
        if self.current_session.is_none() {
            return Err(PsytraderError::NoSessionEstablished {
                timestamp: bar.timestamp,
            });
        }

        let price = bar.close;
        let buy_breakout = levels.hi * (1.0 + self.params.entry_offset);
        let sell_breakout = levels.lo * (1.0 - self.params.entry_offset);

        if price >= buy_breakout {
            self.place_entry(Direction::Long, price, levels, exec);
        } else if price <= sell_breakout {
            self.place_entry(Direction::Short, price, levels, exec);
        }
        Ok(())
    }

    /// Size by risk budget and submit a market entry. The stop is computed
    /// from the opposite level edge now and parked until the next bar.
    fn place_entry(
        &mut self,
        direction: Direction,
        price: f64,
        levels: &PsyLevels,
        exec: &mut dyn ExecutionPort,
    ) {
        let stop = match direction {
            Direction::Long => levels.lo * (1.0 - self.params.sl_offset),
            Direction::Short => levels.hi * (1.0 + self.params.sl_offset),
        };

        let risk_distance = (price - stop).abs();
        if risk_distance < MIN_RISK_DISTANCE {
            return;
        }

        let mut size = exec.account_equity() * self.params.risk_per_trade / risk_distance;
        if size >= 1.0 {
            size = size.floor();
        }

        exec.submit_entry(direction, size);
        self.pending_stop = Some(stop);
    }
}
