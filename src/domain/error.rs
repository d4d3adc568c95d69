//! Domain error types.

use chrono::{DateTime, Utc};

/// Top-level error type for psytrader.
#[derive(Debug, thiserror::Error)]
pub enum PsytraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("out-of-order bar at {timestamp} (last seen {last_seen})")]
    OutOfOrderBar {
        timestamp: DateTime<Utc>,
        last_seen: DateTime<Utc>,
    },

    #[error("trading decision attempted at {timestamp} before any session was established")]
    NoSessionEstablished { timestamp: DateTime<Utc> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PsytraderError> for std::process::ExitCode {
    fn from(err: &PsytraderError) -> Self {
        let code: u8 = match err {
            PsytraderError::Io(_) => 1,
            PsytraderError::ConfigParse { .. }
            | PsytraderError::ConfigMissing { .. }
            | PsytraderError::ConfigInvalid { .. } => 2,
            PsytraderError::Data { .. } => 3,
            PsytraderError::OutOfOrderBar { .. } | PsytraderError::NoSessionEstablished { .. } => 4,
            PsytraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
