//! Execution/accounting port trait.
//!
//! Narrow capability set over the external execution engine: the strategy
//! reads equity and the open position, submits sized market entries, adjusts
//! the bracket, and force-closes on session rollover. Fill simulation, cash
//! accounting, and reporting live behind this trait, not in the domain.

use crate::domain::position::{Direction, OpenPosition};

pub trait ExecutionPort {
    fn account_equity(&self) -> f64;

    fn current_position(&self) -> Option<OpenPosition>;

    /// Submit a directional sized market entry. The fill price is only
    /// observable on a later call to [`ExecutionPort::current_position`].
    fn submit_entry(&mut self, direction: Direction, size: f64);

    fn set_stop(&mut self, level: f64);

    fn set_target(&mut self, level: f64);

    /// Unconditionally close the open position, if any.
    fn close_position(&mut self);
}
