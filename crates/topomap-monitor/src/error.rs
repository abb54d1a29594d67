//! Error types for snapshot polling

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by snapshot sources and the poller
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The source failed to produce a snapshot
    #[error("snapshot source failed: {0}")]
    Source(String),

    /// A fetch did not finish within the configured timeout
    #[error("snapshot fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Replay file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replay file is not a JSON array of snapshots
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A replay source needs at least one snapshot
    #[error("replay source has no snapshots")]
    Empty,

    /// The poller has stopped
    #[error("monitor stopped")]
    Closed,
}

impl MonitorError {
    /// Whether the next tick may succeed where this one failed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failures_are_recoverable() {
        assert!(MonitorError::Source("ping failed".into()).is_recoverable());
        assert!(MonitorError::Timeout(Duration::from_secs(1)).is_recoverable());
        assert!(!MonitorError::Closed.is_recoverable());
        assert!(!MonitorError::Empty.is_recoverable());
    }
}
