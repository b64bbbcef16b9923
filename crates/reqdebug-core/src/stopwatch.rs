//! Named and anonymous timers.
//!
//! A [`StopWatch`] keeps two kinds of timers:
//!
//! - **Label timers**: named accumulators that can be paused with
//!   [`StopWatch::stop`] and resumed with [`StopWatch::start`].
//! - **Stack timers**: anonymous start instants pushed and popped in LIFO
//!   order, for nested scopes that don't need names.
//!
//! The request timer (label [`REQUEST_TIME`]) is seeded at construction and
//! survives [`StopWatch::reset`]. Unlabelled queries fall back to it when the
//! stack is empty.
//!
//! Queries return `Option<f64>`: `None` means "no such timer", which is not
//! the same as a timer that measured zero seconds.

use std::cell::Cell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

use crate::log_stopwatch;

/// Label of the timer seeded at request start.
pub const REQUEST_TIME: &str = "requestTime";

/// Source of "now" in fractional seconds.
pub trait Clock {
    /// Current instant in seconds.
    fn now(&self) -> f64;
}

/// Wall clock, seconds since the Unix epoch with microsecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let now = chrono::Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    /// Sets the clock to `now`.
    pub fn set(&self, now: f64) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// State of one label timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    /// Seconds accumulated while previously running.
    pub accumulated: f64,
    /// Instant the timer was last (re)started, `None` while paused.
    pub running_since: Option<f64>,
}

impl Timer {
    fn started_at(now: f64) -> Self {
        Self {
            accumulated: 0.0,
            running_since: Some(now),
        }
    }

    /// Total elapsed seconds as of `now`.
    #[must_use]
    pub fn elapsed(&self, now: f64) -> f64 {
        self.accumulated + self.running_since.map_or(0.0, |since| now - since)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

/// Request-scoped set of timers.
#[derive(Debug)]
pub struct StopWatch<C: Clock = SystemClock> {
    clock: C,
    labels: HashMap<String, Timer>,
    stack: Vec<f64>,
}

impl Default for StopWatch<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> StopWatch<C> {
    /// Creates a stopwatch whose request timer starts now.
    #[must_use]
    pub fn new(clock: C) -> Self {
        let now = clock.now();
        Self::with_request_time(clock, now)
    }

    /// Creates a stopwatch whose request timer started at `request_time`
    /// (e.g. the instant the server accepted the request).
    #[must_use]
    pub fn with_request_time(clock: C, request_time: f64) -> Self {
        let mut labels = HashMap::new();
        labels.insert(REQUEST_TIME.to_string(), Timer::started_at(request_time));
        Self {
            clock,
            labels,
            stack: Vec::new(),
        }
    }

    /// The clock driving this stopwatch.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Starts a timer.
    ///
    /// Without a label, opens a nested anonymous scope. With a label, creates
    /// the timer or resumes a paused one; a running timer is left alone.
    pub fn start(&mut self, label: Option<&str>) {
        let now = self.clock.now();
        let Some(label) = label else {
            self.stack.push(now);
            return;
        };
        match self.labels.entry(label.to_string()) {
            Entry::Vacant(slot) => {
                log_stopwatch!("timer '{}' started", label);
                slot.insert(Timer::started_at(now));
            }
            Entry::Occupied(mut slot) => {
                let timer = slot.get_mut();
                if timer.running_since.is_none() {
                    log_stopwatch!("timer '{}' resumed", label);
                    timer.running_since = Some(now);
                }
            }
        }
    }

    /// Elapsed seconds for a timer, or `None` if the label was never started.
    ///
    /// Without a label, measures from the innermost anonymous start, or from
    /// the request start if no anonymous scope is open.
    #[must_use]
    pub fn get(&self, label: Option<&str>) -> Option<f64> {
        let now = self.clock.now();
        match label {
            None => match self.stack.last() {
                Some(start) => Some(now - start),
                None => self.labels.get(REQUEST_TIME).map(|t| t.elapsed(now)),
            },
            Some(label) => self.labels.get(label).map(|t| t.elapsed(now)),
        }
    }

    /// Stops a timer and returns its elapsed seconds.
    ///
    /// Without a label, closes the innermost anonymous scope (if any). With a
    /// label, pauses the timer with its total so far; a later
    /// [`start`](Self::start) continues from there. Unknown labels return
    /// `None` and change nothing.
    pub fn stop(&mut self, label: Option<&str>) -> Option<f64> {
        let elapsed = self.get(label);
        match label {
            None => {
                // An empty stack still reports request time.
                self.stack.pop();
            }
            Some(label) => {
                if let (Some(timer), Some(elapsed)) = (self.labels.get_mut(label), elapsed) {
                    *timer = Timer {
                        accumulated: elapsed,
                        running_since: None,
                    };
                    log_stopwatch!("timer '{}' paused at {:.6}s", label, elapsed);
                }
            }
        }
        elapsed
    }

    /// Forgets every label timer except the request timer and closes all
    /// anonymous scopes.
    pub fn reset(&mut self) {
        self.labels.retain(|label, _| label == REQUEST_TIME);
        self.stack.clear();
    }

    /// Returns the timer for `label`.
    #[must_use]
    pub fn timer(&self, label: &str) -> Option<&Timer> {
        self.labels.get(label)
    }

    /// Returns true if `label` exists and is running.
    #[must_use]
    pub fn is_running(&self, label: &str) -> bool {
        self.labels.get(label).is_some_and(Timer::is_running)
    }

    /// Iterates label timers (including the request timer), in no
    /// particular order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &Timer)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of open anonymous scopes.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn watch() -> (StopWatch<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1000.0);
        (StopWatch::new(clock.clone()), clock)
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("timer should exist");
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn label_accumulates_across_pause_and_resume() {
        let (mut sw, clock) = watch();
        sw.start(Some("x"));
        clock.advance(1.5);
        approx(sw.stop(Some("x")), 1.5);

        clock.advance(10.0);
        approx(sw.get(Some("x")), 1.5);

        sw.start(Some("x"));
        clock.advance(0.25);
        approx(sw.stop(Some("x")), 1.75);
    }

    #[test]
    fn starting_running_timer_is_noop() {
        let (mut sw, clock) = watch();
        sw.start(Some("x"));
        clock.advance(2.0);
        sw.start(Some("x"));
        clock.advance(1.0);
        approx(sw.get(Some("x")), 3.0);
        assert!(sw.is_running("x"));
    }

    #[test]
    fn unknown_label_is_none() {
        let (mut sw, _) = watch();
        assert_eq!(sw.get(Some("unknown")), None);
        assert_eq!(sw.stop(Some("unknown")), None);
        assert!(sw.timer("unknown").is_none());
    }

    #[test]
    fn zero_duration_is_some() {
        let (mut sw, _) = watch();
        sw.start(Some("x"));
        approx(sw.stop(Some("x")), 0.0);
    }

    #[test]
    fn anonymous_stack_is_lifo() {
        let (mut sw, clock) = watch();
        sw.start(None);
        clock.advance(1.0);
        sw.start(None);
        clock.advance(2.0);
        approx(sw.stop(None), 2.0);
        approx(sw.stop(None), 3.0);
        assert_eq!(sw.stack_depth(), 0);
    }

    #[test]
    fn empty_stack_falls_back_to_request_time() {
        let clock = ManualClock::new(50.0);
        let mut sw = StopWatch::with_request_time(clock.clone(), 45.0);
        approx(sw.get(None), 5.0);
        clock.advance(1.0);
        approx(sw.stop(None), 6.0);
        assert_eq!(sw.stack_depth(), 0);
    }

    #[test]
    fn reset_keeps_request_time_only() {
        let (mut sw, clock) = watch();
        sw.start(Some("x"));
        sw.start(None);
        clock.advance(4.0);
        sw.reset();

        assert_eq!(sw.get(Some("x")), None);
        assert_eq!(sw.stack_depth(), 0);
        approx(sw.get(None), 4.0);
        approx(sw.get(Some(REQUEST_TIME)), 4.0);
        assert_eq!(sw.labels().count(), 1);
    }

    #[test]
    fn request_timer_pauses_and_resumes() {
        let clock = ManualClock::new(10.0);
        let mut sw = StopWatch::with_request_time(clock.clone(), 8.0);
        approx(sw.stop(Some(REQUEST_TIME)), 2.0);
        assert!(!sw.is_running(REQUEST_TIME));

        clock.advance(5.0);
        approx(sw.get(None), 2.0);

        sw.start(Some(REQUEST_TIME));
        clock.advance(1.0);
        approx(sw.get(None), 3.0);

        sw.stop(Some(REQUEST_TIME));
        sw.reset();
        clock.advance(1.0);
        approx(sw.get(Some(REQUEST_TIME)), 3.0);
        assert!(!sw.is_running(REQUEST_TIME));
    }

    #[test]
    fn get_leaves_stack_alone() {
        let (mut sw, clock) = watch();
        sw.start(None);
        clock.advance(1.0);
        approx(sw.get(None), 1.0);
        approx(sw.get(None), 1.0);
        assert_eq!(sw.stack_depth(), 1);
        approx(sw.stop(None), 1.0);
        assert_eq!(sw.stack_depth(), 0);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a > 1_000_000_000.0);
        assert!(b >= a);
    }
}
