//! JSON rendering for header transport.

use serde::Serialize;

use reqdebug_core::{Abstracter, Item, LogEntry, Meta};

use super::Route;
use crate::error::Result;

#[derive(Serialize)]
struct JsonEntry<'a> {
    method: &'a str,
    args: Vec<Item>,
    #[serde(skip_serializing_if = "no_meta")]
    meta: &'a Meta,
}

fn no_meta(meta: &&Meta) -> bool {
    meta.is_empty()
}

/// Serializes entries as a JSON array of `{method, args, meta}` objects.
///
/// Entries that opted out of the visible log are skipped. Output is a single
/// line so it can be carried in a response header.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRoute;

impl JsonRoute {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Route for JsonRoute {
    fn name(&self) -> &'static str {
        "json"
    }

    fn process(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Result<String> {
        let rows: Vec<JsonEntry<'_>> = entries
            .iter()
            .filter(|entry| entry.append_log())
            .map(|entry| JsonEntry {
                method: entry.method(),
                args: abstracter.abstract_args(entry.args(), Some(entry.method())),
                meta: entry.meta(),
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }
}
