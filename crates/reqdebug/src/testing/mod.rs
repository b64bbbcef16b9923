//! Testing utilities for reqdebug output
//!
//! Provides `CaptureRoute` for capturing and asserting on rendered output in tests.

mod capture;

pub use capture::CaptureRoute;
