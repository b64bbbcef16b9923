//! Core types for reqdebug.
//!
//! This crate provides the building blocks the debug facade and its output
//! routes share:
//!
//! - [`Value`]: dynamically typed log arguments with shared containers
//! - [`Abstracter`] / [`AbstractArray`]: render-safe abstractions of values,
//!   with cycle detection and callable detection
//! - [`StopWatch`]: named (pausable) and anonymous (nested) timers
//! - [`LogEntry`]: a recorded call with positional args and metadata
//!
//! # Design Principles
//!
//! - Single request, single thread: containers are `Rc`-shared
//! - No failure modes: unknown timers are `None`, cycles become markers
//! - Internal diagnostics go through the `log` facade (see [`logging`])

#![forbid(unsafe_code)]

mod abstract_array;
mod abstracter;
mod entry;
pub mod logging;
mod stopwatch;
pub mod value;

pub use abstract_array::AbstractArray;
pub use abstracter::{
    AbstractedValue, Abstracter, AbstractionKind, ContainerPolicy, History, Item, NeedsAbstraction,
};
pub use entry::{ExportedEntry, LogEntry, Meta};
pub use stopwatch::{Clock, ManualClock, REQUEST_TIME, StopWatch, SystemClock, Timer};
pub use value::{Array, ArrayRef, Identity, Key, META_TAG, ObjectRef, Resource, Value, meta};
