//! CaptureRoute for capturing rendered output in tests
//!
//! Wraps another route and keeps every rendered line for assertions.

use std::cell::RefCell;
use std::rc::Rc;

use reqdebug_core::{Abstracter, LogEntry};

use crate::error::Result;
use crate::route::{Route, TextRoute};

/// A route that records what an inner route renders
///
/// Clones share the same buffer, so a clone can be handed to
/// [`DebugSession::output_to`](crate::DebugSession::output_to) and the
/// original used for assertions.
#[derive(Clone)]
pub struct CaptureRoute {
    inner: Rc<dyn Route>,
    lines: Rc<RefCell<Vec<String>>>,
}

impl CaptureRoute {
    /// Capture plain text output
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(TextRoute::new())
    }

    /// Capture the output of `route`
    #[must_use]
    pub fn wrap(route: impl Route + 'static) -> Self {
        Self {
            inner: Rc::new(route),
            lines: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Lines rendered so far, oldest first.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Rendered lines joined with newlines.
    #[must_use]
    pub fn output_string(&self) -> String {
        self.lines.borrow().join("\n")
    }

    /// Case-insensitive substring search over the rendered text.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.lines
            .borrow()
            .iter()
            .any(|line| line.to_lowercase().contains(&needle))
    }

    /// Regex search over the rendered text. An invalid pattern never matches.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        regex::Regex::new(pattern).is_ok_and(|re| re.is_match(&self.output_string()))
    }

    /// # Panics
    ///
    /// Panics unless some rendered line contains `needle`.
    pub fn assert_contains(&self, needle: &str) {
        assert!(
            self.contains(needle),
            "no rendered line contains {needle:?}; got:\n{}",
            self.output_string()
        );
    }

    /// # Panics
    ///
    /// Panics unless exactly `expected` lines were rendered.
    pub fn assert_line_count(&self, expected: usize) {
        let actual = self.lines.borrow().len();
        assert!(
            actual == expected,
            "rendered {actual} lines, wanted {expected}; got:\n{}",
            self.output_string()
        );
    }

    /// Forgets everything rendered so far.
    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Default for CaptureRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CaptureRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRoute")
            .field("inner", &self.inner.name())
            .field("line_count", &self.lines.borrow().len())
            .finish()
    }
}

impl Route for CaptureRoute {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn process(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Result<String> {
        let rendered = self.inner.process(entries, abstracter)?;
        self.lines
            .borrow_mut()
            .extend(rendered.lines().map(String::from));
        Ok(rendered)
    }
}
