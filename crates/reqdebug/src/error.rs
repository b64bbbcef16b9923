//! Error type for the reqdebug facade.
//!
//! Collecting entries and timing never fails. Errors only come from the
//! edges: reading configuration and writing output.

use std::path::PathBuf;

/// Errors raised while configuring or rendering a debug session.
#[derive(Debug)]
pub enum ReqDebugError {
    /// Reading or writing a file failed.
    Io(std::io::Error),
    /// A TOML configuration document could not be parsed.
    Config(toml::de::Error),
    /// JSON encoding failed.
    Json(serde_json::Error),
    /// The file route was selected without a log file path.
    MissingLogFile,
    /// A configuration file does not exist.
    ConfigNotFound(PathBuf),
}

/// Result alias for reqdebug operations.
pub type Result<T> = std::result::Result<T, ReqDebugError>;

impl std::fmt::Display for ReqDebugError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReqDebugError::Io(e) => write!(f, "I/O error: {e}"),
            ReqDebugError::Config(e) => write!(f, "Invalid configuration: {e}"),
            ReqDebugError::Json(e) => write!(f, "JSON error: {e}"),
            ReqDebugError::MissingLogFile => {
                write!(f, "File route selected but no log_file configured")
            }
            ReqDebugError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ReqDebugError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReqDebugError::Io(e) => Some(e),
            ReqDebugError::Config(e) => Some(e),
            ReqDebugError::Json(e) => Some(e),
            ReqDebugError::MissingLogFile | ReqDebugError::ConfigNotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for ReqDebugError {
    fn from(err: std::io::Error) -> Self {
        ReqDebugError::Io(err)
    }
}

impl From<toml::de::Error> for ReqDebugError {
    fn from(err: toml::de::Error) -> Self {
        ReqDebugError::Config(err)
    }
}

impl From<serde_json::Error> for ReqDebugError {
    fn from(err: serde_json::Error) -> Self {
        ReqDebugError::Json(err)
    }
}
