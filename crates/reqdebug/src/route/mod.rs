//! Output routes.
//!
//! A route turns the collected log into something a transport can carry:
//!
//! - [`TextRoute`] - One plain line per entry
//! - [`FileRoute`] - Text lines appended to a log file
//! - [`JsonRoute`] - A JSON array, e.g. for a response header
//!
//! Every route abstracts arguments before rendering them, so cyclic or
//! deeply shared values are safe to output.

mod file;
mod json;
mod text;

pub use file::FileRoute;
pub use json::JsonRoute;
pub use text::TextRoute;

use reqdebug_core::{Abstracter, LogEntry};

use crate::config::{DebugConfig, RouteKind};
use crate::error::{ReqDebugError, Result};

/// Renders log entries.
pub trait Route {
    /// Short route name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Renders `entries`, abstracting values with `abstracter`.
    fn process(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Result<String>;
}

/// Builds the route selected by `config`.
pub fn from_config(config: &DebugConfig) -> Result<Box<dyn Route>> {
    Ok(match config.route {
        RouteKind::Text => Box::new(TextRoute::new()),
        RouteKind::Json => Box::new(JsonRoute::new()),
        RouteKind::File => {
            let path = config
                .log_file
                .clone()
                .ok_or(ReqDebugError::MissingLogFile)?;
            Box::new(FileRoute::new(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_configured_route() {
        let config = DebugConfig::new().with_route(RouteKind::Json);
        assert_eq!(from_config(&config).unwrap().name(), "json");
        assert_eq!(from_config(&DebugConfig::new()).unwrap().name(), "text");
    }

    #[test]
    fn file_route_needs_path() {
        let config = DebugConfig::new().with_route(RouteKind::File);
        assert!(matches!(
            from_config(&config),
            Err(ReqDebugError::MissingLogFile)
        ));
    }
}
