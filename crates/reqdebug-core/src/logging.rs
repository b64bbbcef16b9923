//! Internal diagnostics for reqdebug.
//!
//! reqdebug collects *user* debug output through its own log entries and
//! routes. This module is about the library's own diagnostics, emitted
//! through the standard [`log`] facade so that the host application decides
//! where they go.
//!
//! # Log Levels
//!
//! - **warn**: misuse that is tolerated (unknown timer labels)
//! - **debug**: session lifecycle, output rendering
//! - **trace**: traversal details (recursion markers, callable detection)
//!
//! # Log Targets
//!
//! - `reqdebug`: Root target for all reqdebug logs
//! - `reqdebug::abstracter`: Value abstraction and cycle detection
//! - `reqdebug::stopwatch`: Timer engine
//! - `reqdebug::entry`: Log entry construction
//! - `reqdebug::output`: Output routes
//!
//! Example filter: `RUST_LOG=reqdebug::abstracter=trace`

// Re-export log macros for ergonomic use
pub use log::{debug, error, info, trace, warn};

// Re-export log level types for programmatic use
pub use log::{Level, LevelFilter};

/// Log targets used by reqdebug components.
pub mod targets {
    /// Root target for all reqdebug logs.
    pub const REQDEBUG: &str = "reqdebug";

    /// Value abstraction and cycle detection.
    pub const ABSTRACTER: &str = "reqdebug::abstracter";

    /// Named and anonymous timers.
    pub const STOPWATCH: &str = "reqdebug::stopwatch";

    /// Log entry construction and metadata extraction.
    pub const ENTRY: &str = "reqdebug::entry";

    /// Output routes (text, file, JSON).
    pub const OUTPUT: &str = "reqdebug::output";
}

/// Returns whether logging is enabled at the given level for the given target.
#[inline]
#[must_use]
pub fn is_enabled(level: Level, target: &str) -> bool {
    log::log_enabled!(target: target, level)
}

/// Logs an abstraction event at TRACE level.
#[macro_export]
macro_rules! log_abstracter {
    ($($arg:tt)*) => {
        $crate::logging::trace!(target: "reqdebug::abstracter", $($arg)*)
    };
}

/// Logs a timer event at DEBUG level.
#[macro_export]
macro_rules! log_stopwatch {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "reqdebug::stopwatch", $($arg)*)
    };
}

/// Logs an output event at DEBUG level.
#[macro_export]
macro_rules! log_output {
    ($($arg:tt)*) => {
        $crate::logging::debug!(target: "reqdebug::output", $($arg)*)
    };
}
