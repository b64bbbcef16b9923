//! Request-scoped debug console.
//!
//! `reqdebug` collects log entries, timings and variable dumps while a
//! request runs, then renders them through an output route:
//!
//! - [`DebugSession`] - the facade (`log`, `warn`, `time_end`, ...)
//! - [`DebugConfig`] - typed configuration (defaults, TOML, environment)
//! - [`route`] - text, file and JSON renderers
//! - [`testing`] - capture helpers for tests
//!
//! Value abstraction, timers and log entries live in [`reqdebug_core`] and
//! are re-exported here.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod route;
mod session;
pub mod testing;

pub use config::{DebugConfig, RouteKind};
pub use error::{ReqDebugError, Result};
pub use route::{FileRoute, JsonRoute, Route, TextRoute};
pub use session::DebugSession;

pub use reqdebug_core;
pub use reqdebug_core::{
    AbstractedValue, Abstracter, Array, ArrayRef, Clock, Item, Key, LogEntry, ManualClock, Meta,
    ObjectRef, StopWatch, SystemClock, Value, meta,
};
