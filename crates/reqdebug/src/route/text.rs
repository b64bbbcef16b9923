//! Plain text rendering.

use reqdebug_core::{AbstractedValue, Abstracter, Item, Key, LogEntry, Value};

use super::Route;
use crate::error::Result;

/// One line per entry: `method: arg, arg`.
///
/// Entries between `group` and `groupEnd` are indented two spaces per level;
/// `groupEnd` itself produces no line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRoute;

impl TextRoute {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders entries to lines.
    #[must_use]
    pub fn lines(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Vec<String> {
        let mut depth = 0usize;
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.method() == "groupEnd" {
                depth = depth.saturating_sub(1);
                continue;
            }
            lines.push(format!(
                "{}{}",
                "  ".repeat(depth),
                self.format_entry(entry, abstracter)
            ));
            if entry.method() == "group" {
                depth += 1;
            }
        }
        lines
    }

    /// Renders a single entry without indentation.
    #[must_use]
    pub fn format_entry(&self, entry: &LogEntry, abstracter: &Abstracter) -> String {
        let args = abstracter
            .abstract_args(entry.args(), Some(entry.method()))
            .iter()
            .map(|item| format_item(item, false))
            .collect::<Vec<_>>()
            .join(", ");
        if args.is_empty() {
            entry.method().to_string()
        } else {
            format!("{}: {}", entry.method(), args)
        }
    }
}

impl Route for TextRoute {
    fn name(&self) -> &'static str {
        "text"
    }

    fn process(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Result<String> {
        Ok(self.lines(entries, abstracter).join("\n"))
    }
}

/// Formats one slot. Top-level strings are printed bare, nested ones quoted.
fn format_item(item: &Item, nested: bool) -> String {
    match item {
        Item::Raw(Value::String(s)) if nested => format!("{s:?}"),
        Item::Raw(value) => value.to_string(),
        Item::Abstracted(abs) => format_abstraction(abs),
    }
}

fn format_abstraction(abs: &AbstractedValue) -> String {
    match abs {
        AbstractedValue::Array { values, .. } => {
            let is_list = values
                .iter()
                .enumerate()
                .all(|(i, (k, _))| *k == Key::Int(i as i64));
            let inner = values
                .iter()
                .map(|(k, v)| {
                    if is_list {
                        format_item(v, true)
                    } else {
                        format!("{} => {}", format_key(k), format_item(v, true))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{inner}]")
        }
        AbstractedValue::Callable {
            class_name,
            method_name,
        } => format!("callable {class_name}::{method_name}"),
        AbstractedValue::Recursion => "*RECURSION*".to_string(),
        AbstractedValue::Object {
            class_name,
            properties,
        } => {
            let inner = properties
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_item(v, true)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{class_name} {{{inner}}}")
        }
        AbstractedValue::Resource { kind, id } => format!("Resource id #{id}: {kind}"),
    }
}

fn format_key(key: &Key) -> String {
    match key {
        Key::Int(i) => i.to_string(),
        Key::Str(s) => format!("{s:?}"),
    }
}
