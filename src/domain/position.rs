//! Position types shared between the strategy and the execution port.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn is_long(&self) -> bool {
        matches!(self, Direction::Long)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// The open position as the execution collaborator reports it. Stop and
/// target are `None` until the strategy attaches its bracket (one bar after
/// entry, once the fill price is known).
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub entry_price: f64,
    pub size: f64,
    pub stop: Option<f64>,
    pub target: Option<f64>,
}

impl OpenPosition {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let per_unit = match self.direction {
            Direction::Long => price - self.entry_price,
            Direction::Short => self.entry_price - price,
        };
        per_unit * self.size
    }

    /// Whether a bar reaching `price` would trigger the stop.
    pub fn stop_hit(&self, price: f64) -> bool {
        match (self.direction, self.stop) {
            (Direction::Long, Some(stop)) => price <= stop,
            (Direction::Short, Some(stop)) => price >= stop,
            (_, None) => false,
        }
    }

    /// Whether a bar reaching `price` would trigger the target.
    pub fn target_hit(&self, price: f64) -> bool {
        match (self.direction, self.target) {
            (Direction::Long, Some(target)) => price >= target,
            (Direction::Short, Some(target)) => price <= target,
            (_, None) => false,
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Stop,
    Target,
    /// Unconditional close at session rollover (or end of run).
    Forced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pnl: f64,
    pub reason: CloseReason,
}
