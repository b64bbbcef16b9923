//! Centralized configuration for a debug session.
//!
//! `DebugConfig` is a plain typed struct. It can be built programmatically,
//! parsed from TOML, or overridden from `REQDEBUG_*` environment variables.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ReqDebugError, Result};

/// Configuration for a [`DebugSession`](crate::DebugSession)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    // Collection
    /// Record log entries at all
    pub collect: bool,
    /// Least severe level that is still recorded (None = everything)
    pub log_level: Option<log::Level>,
    /// Channel name stamped on every entry
    pub channel: String,

    // Timers
    /// Decimal places in `time_end`/`time_get` output
    pub timer_precision: u32,

    // Output
    /// Render the log when the session is output
    pub output: bool,
    /// Route used by [`DebugSession::output`](crate::DebugSession::output)
    pub route: RouteKind,
    /// Destination of the file route
    pub log_file: Option<PathBuf>,
}

/// Available output routes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Plain text lines
    #[default]
    Text,
    /// JSON array, suitable for a response header
    Json,
    /// Plain text lines appended to `log_file`
    File,
}

impl RouteKind {
    fn parse(val: &str) -> Option<Self> {
        match val.to_lowercase().as_str() {
            "text" | "plain" => Some(RouteKind::Text),
            "json" | "header" => Some(RouteKind::Json),
            "file" => Some(RouteKind::File),
            _ => None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            collect: true,
            log_level: None,
            channel: "general".to_string(),
            timer_precision: 4,
            output: false,
            route: RouteKind::Text,
            log_file: None,
        }
    }
}

impl DebugConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    ///
    /// # Environment Variables
    ///
    /// | Variable | Values | Description |
    /// |----------|--------|-------------|
    /// | `REQDEBUG_COLLECT` | 0/1 | Record entries |
    /// | `REQDEBUG_OUTPUT` | 0/1 | Render on output |
    /// | `REQDEBUG_ROUTE` | text/json/file | Output route |
    /// | `REQDEBUG_LOG_FILE` | path | File route destination |
    /// | `REQDEBUG_CHANNEL` | name | Channel name |
    /// | `REQDEBUG_PRECISION` | integer | Timer decimal places |
    /// | `REQDEBUG_LOG` | error/warn/info/debug | Least severe level kept |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| env::var(name).ok());
        config
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReqDebugError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// `<config dir>/reqdebug/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reqdebug").join("config.toml"))
    }

    /// Load the default config file when present, then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("REQDEBUG_COLLECT") {
            self.collect = parse_flag(&val);
        }
        if let Some(val) = lookup("REQDEBUG_OUTPUT") {
            self.output = parse_flag(&val);
        }
        if let Some(route) = lookup("REQDEBUG_ROUTE").and_then(|v| RouteKind::parse(&v)) {
            self.route = route;
        }
        if let Some(path) = lookup("REQDEBUG_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        if let Some(channel) = lookup("REQDEBUG_CHANNEL") {
            self.channel = channel;
        }
        if let Some(precision) = lookup("REQDEBUG_PRECISION").and_then(|v| v.parse().ok()) {
            self.timer_precision = precision;
        }
        if let Some(level) = lookup("REQDEBUG_LOG") {
            self.log_level = match level.to_lowercase().as_str() {
                "error" => Some(log::Level::Error),
                "warn" | "warning" => Some(log::Level::Warn),
                "info" => Some(log::Level::Info),
                "debug" => Some(log::Level::Debug),
                "trace" => Some(log::Level::Trace),
                _ => None,
            };
        }
    }

    // ─────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────

    /// Enable or disable collection
    #[must_use]
    pub fn with_collect(mut self, collect: bool) -> Self {
        self.collect = collect;
        self
    }

    /// Enable or disable output
    #[must_use]
    pub fn with_output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }

    /// Set the output route
    #[must_use]
    pub fn with_route(mut self, route: RouteKind) -> Self {
        self.route = route;
        self
    }

    /// Route output to a file
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.route = RouteKind::File;
        self.log_file = Some(path.into());
        self
    }

    /// Set the channel name
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Set the timer precision
    #[must_use]
    pub fn with_timer_precision(mut self, precision: u32) -> Self {
        self.timer_precision = precision;
        self
    }

    /// Set the least severe level that is still recorded
    #[must_use]
    pub fn with_log_level(mut self, level: log::Level) -> Self {
        self.log_level = Some(level);
        self
    }
}

fn parse_flag(val: &str) -> bool {
    !matches!(val.to_lowercase().as_str(), "0" | "false" | "off" | "no" | "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DebugConfig::new();
        assert!(config.collect);
        assert!(!config.output);
        assert_eq!(config.route, RouteKind::Text);
        assert_eq!(config.channel, "general");
        assert_eq!(config.timer_precision, 4);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = DebugConfig::new()
            .with_output(true)
            .with_route(RouteKind::Json)
            .with_channel("db")
            .with_timer_precision(2)
            .with_log_level(log::Level::Warn);

        assert!(config.output);
        assert_eq!(config.route, RouteKind::Json);
        assert_eq!(config.channel, "db");
        assert_eq!(config.timer_precision, 2);
        assert_eq!(config.log_level, Some(log::Level::Warn));
    }

    #[test]
    fn test_with_log_file_selects_file_route() {
        let config = DebugConfig::new().with_log_file("/tmp/debug.log");
        assert_eq!(config.route, RouteKind::File);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/debug.log")));
    }

    #[test]
    fn test_apply_env() {
        let mut config = DebugConfig::new();
        config.apply_env(lookup(&[
            ("REQDEBUG_COLLECT", "0"),
            ("REQDEBUG_OUTPUT", "1"),
            ("REQDEBUG_ROUTE", "header"),
            ("REQDEBUG_CHANNEL", "api"),
            ("REQDEBUG_PRECISION", "6"),
            ("REQDEBUG_LOG", "warning"),
        ]));
        assert!(!config.collect);
        assert!(config.output);
        assert_eq!(config.route, RouteKind::Json);
        assert_eq!(config.channel, "api");
        assert_eq!(config.timer_precision, 6);
        assert_eq!(config.log_level, Some(log::Level::Warn));
    }

    #[test]
    fn test_apply_env_ignores_garbage() {
        let mut config = DebugConfig::new();
        config.apply_env(lookup(&[
            ("REQDEBUG_ROUTE", "carrier-pigeon"),
            ("REQDEBUG_PRECISION", "many"),
        ]));
        assert_eq!(config.route, RouteKind::Text);
        assert_eq!(config.timer_precision, 4);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DebugConfig::from_toml_str(
            r#"
            output = true
            route = "file"
            log_file = "/var/log/debug.log"
            log_level = "info"
            "#,
        )
        .unwrap();
        assert!(config.output);
        assert!(config.collect);
        assert_eq!(config.route, RouteKind::File);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/debug.log")));
        assert_eq!(config.log_level, Some(log::Level::Info));
        assert_eq!(config.channel, "general");
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let err = DebugConfig::from_toml_str("timer_precision = \"four\"").unwrap_err();
        assert!(matches!(err, ReqDebugError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "channel = \"jobs\"\n").unwrap();
        let config = DebugConfig::from_file(&path).unwrap();
        assert_eq!(config.channel, "jobs");

        let missing = DebugConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ReqDebugError::ConfigNotFound(_)));
    }
}
