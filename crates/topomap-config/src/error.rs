//! Error types for configuration I/O

use std::path::PathBuf;

/// Errors reading or writing a topology document
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Extension is neither JSON nor YAML
    #[error("unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not a valid document
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Document could not be encoded
    #[error("failed to serialize {path}: {message}")]
    Serialize { path: PathBuf, message: String },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create serialize error for path
    pub fn serialize_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Serialize {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether retrying the same operation later could succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path() {
        let err = ConfigError::parse_error("/etc/topomap.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "failed to parse /etc/topomap.json: expected value at line 1"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn io_errors_are_recoverable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(ConfigError::io_error("a.json", io).is_recoverable());
    }
}
