//! The debug session facade.
//!
//! One [`DebugSession`] lives for one request. It records log entries,
//! owns the request's timers, and renders everything through a route at the
//! end.

use reqdebug_core::logging::targets;
use reqdebug_core::{
    Abstracter, Clock, Item, LogEntry, Meta, StopWatch, SystemClock, Value, log_output,
};

use crate::config::DebugConfig;
use crate::error::Result;
use crate::route::{self, Route};

/// Request-scoped debug console.
///
/// # Example
///
/// ```ignore
/// use reqdebug::{DebugConfig, DebugSession, Value};
///
/// let mut debug = DebugSession::new(DebugConfig::new().with_output(true));
/// debug.time(Some("db"));
/// debug.info(vec!["loading user".into(), 42.into()]);
/// debug.time_end(vec!["db".into()]);
///
/// if let Some(text) = debug.output()? {
///     eprintln!("{text}");
/// }
/// ```
#[derive(Debug)]
pub struct DebugSession<C: Clock = SystemClock> {
    config: DebugConfig,
    stop_watch: StopWatch<C>,
    abstracter: Abstracter,
    log: Vec<LogEntry>,
    group_depth: usize,
}

impl DebugSession<SystemClock> {
    /// Creates a session timed by the wall clock, request time = now.
    #[must_use]
    pub fn new(config: DebugConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> DebugSession<C> {
    /// Creates a session with a custom clock, request time = now.
    #[must_use]
    pub fn with_clock(config: DebugConfig, clock: C) -> Self {
        Self::from_stop_watch(config, StopWatch::new(clock))
    }

    /// Creates a session whose request timer started at `request_time`.
    #[must_use]
    pub fn with_request_time(config: DebugConfig, clock: C, request_time: f64) -> Self {
        Self::from_stop_watch(config, StopWatch::with_request_time(clock, request_time))
    }

    fn from_stop_watch(config: DebugConfig, stop_watch: StopWatch<C>) -> Self {
        log::debug!(target: targets::REQDEBUG, "session started on channel '{}'", config.channel);
        Self {
            config,
            stop_watch,
            abstracter: Abstracter::new(),
            log: Vec::new(),
            group_depth: 0,
        }
    }

    /// Replaces the abstracter (e.g. to use a custom policy).
    #[must_use]
    pub fn with_abstracter(mut self, abstracter: Abstracter) -> Self {
        self.abstracter = abstracter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    #[must_use]
    pub fn stop_watch(&self) -> &StopWatch<C> {
        &self.stop_watch
    }

    pub fn stop_watch_mut(&mut self) -> &mut StopWatch<C> {
        &mut self.stop_watch
    }

    // ─────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────

    /// Records a `log` entry.
    pub fn log(&mut self, args: Vec<Value>) {
        self.record("log", args);
    }

    /// Records an `info` entry.
    pub fn info(&mut self, args: Vec<Value>) {
        self.record("info", args);
    }

    /// Records a `warn` entry.
    pub fn warn(&mut self, args: Vec<Value>) {
        self.record("warn", args);
    }

    /// Records an `error` entry.
    pub fn error(&mut self, args: Vec<Value>) {
        self.record("error", args);
    }

    /// Opens a group; following entries are nested until [`group_end`](Self::group_end).
    pub fn group(&mut self, args: Vec<Value>) {
        self.group_depth += 1;
        self.record("group", args);
    }

    /// Closes the innermost group. Ignored when no group is open.
    pub fn group_end(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        self.record("groupEnd", Vec::new());
    }

    /// Current group nesting depth.
    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.group_depth
    }

    fn record(&mut self, method: &str, args: Vec<Value>) {
        let entry = LogEntry::new(self.config.channel.clone(), method, args, Meta::new());
        self.append(entry);
    }

    /// Adds an entry to the log, subject to `collect`, the level filter and
    /// the entry's own `append_log` flag.
    pub fn append(&mut self, entry: LogEntry) {
        if !self.config.collect || !entry.append_log() {
            return;
        }
        if let Some(min) = self.config.log_level {
            if method_level(entry.method()) > min {
                return;
            }
        }
        self.log.push(entry);
    }

    /// Entries recorded so far.
    #[must_use]
    pub fn get_log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Drops all recorded entries and open groups.
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.group_depth = 0;
    }

    // ─────────────────────────────────────────────────
    // Timers
    // ─────────────────────────────────────────────────

    /// Starts (or resumes) a timer. Without a label, opens an anonymous scope.
    pub fn time(&mut self, label: Option<&str>) {
        self.stop_watch.start(label);
    }

    /// Stops a timer and logs `"<label>: <seconds> sec"`.
    ///
    /// Arguments: `[label, precision, silent]`, all optional. Scalar labels
    /// are stringified. `precision` and `silent` end up in metadata and
    /// override embedded metadata of the same name; a truthy `silent`
    /// suppresses the entry. Returns the elapsed seconds, or `None` for an unknown label
    /// (after logging a warning).
    pub fn time_end(&mut self, args: Vec<Value>) -> Option<f64> {
        self.time_entry(args, true)
    }

    /// Like [`time_end`](Self::time_end) without stopping the timer.
    pub fn time_get(&mut self, args: Vec<Value>) -> Option<f64> {
        self.time_entry(args, false)
    }

    /// Forgets all timers except the request timer.
    pub fn reset_timers(&mut self) {
        self.stop_watch.reset();
    }

    fn time_entry(&mut self, args: Vec<Value>, stop: bool) -> Option<f64> {
        let mut entry = LogEntry::with_defaults(
            self.config.channel.clone(),
            "time",
            args,
            Meta::new(),
            &[
                ("label", Value::Undefined),
                ("precision", Value::from(self.config.timer_precision)),
                ("silent", Value::Bool(false)),
            ],
            &["precision", "silent"],
        );
        let label = entry.args().first().and_then(timer_label);

        let elapsed = if stop {
            self.stop_watch.stop(label.as_deref())
        } else {
            self.stop_watch.get(label.as_deref())
        };
        let Some(elapsed) = elapsed else {
            let label = label.unwrap_or_default();
            log::warn!(target: targets::STOPWATCH, "timer '{}' does not exist", label);
            self.warn(vec![Value::from(format!("Timer '{label}' does not exist"))]);
            return None;
        };

        let precision = entry
            .get_meta("precision")
            .and_then(Value::as_i64)
            .unwrap_or(i64::from(self.config.timer_precision))
            .clamp(0, MAX_PRECISION) as usize;
        let label = label.unwrap_or_else(|| "time".to_string());
        entry.set_args(vec![Value::from(format!(
            "{label}: {elapsed:.precision$} sec"
        ))]);
        entry.set_return_value(elapsed);
        if entry.get_meta("silent").is_some_and(Value::is_truthy) {
            entry.set_append_log(false);
        }
        entry.set_meta("silent", Value::Undefined);
        self.append(entry);
        Some(elapsed)
    }

    // ─────────────────────────────────────────────────
    // Abstraction and output
    // ─────────────────────────────────────────────────

    /// Abstracts a value as a route would.
    #[must_use]
    pub fn abstract_value(&self, value: &Value, method: Option<&str>) -> Item {
        self.abstracter.get_abstraction(value, method)
    }

    /// Renders the log through the configured route.
    ///
    /// Returns `Ok(None)` when output is disabled.
    pub fn output(&self) -> Result<Option<String>> {
        if !self.config.output {
            return Ok(None);
        }
        let route = route::from_config(&self.config)?;
        self.output_to(route.as_ref()).map(Some)
    }

    /// Renders the log through `route`, regardless of configuration.
    pub fn output_to(&self, route: &dyn Route) -> Result<String> {
        log_output!(
            "rendering {} entries via {} route",
            self.log.len(),
            route.name()
        );
        route.process(&self.log, &self.abstracter)
    }
}

/// Upper bound on timer decimal places.
const MAX_PRECISION: i64 = 17;

/// Timer label from a positional argument. Scalars are stringified; null
/// and undefined mean "no label".
fn timer_label(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Undefined => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Severity of a facade method, for the level filter.
fn method_level(method: &str) -> log::Level {
    match method {
        "error" => log::Level::Error,
        "warn" => log::Level::Warn,
        "info" => log::Level::Info,
        _ => log::Level::Debug,
    }
}
