// Log levels for the per-thread logging core

use std::str::FromStr;

/// Log level (0-5, lower is more verbose)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Fine-grained tracing (per-operation walk details)
    Trace = 0,
    /// Debug-level messages (autosave ticks, pool internals)
    Debug = 1,
    /// Informational (snapshot written, benchmark pass finished)
    Info = 2,
    /// Warning conditions (skipped snapshot elements, slow passes)
    Warn = 3,
    /// Error conditions (sink I/O failure, load failure)
    Error = 4,
    /// Unrecoverable conditions
    Fatal = 5,
}

impl Level {
    /// Get level as u8 (0-5)
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Fixed four-character name used in the on-disk line format
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRAC",
            Level::Debug => "DEBU",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERRO",
            Level::Fatal => "FATA",
        }
    }

    /// Create from u8 value (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            5 => Some(Level::Fatal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}
