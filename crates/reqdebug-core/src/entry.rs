//! Log entries.
//!
//! A [`LogEntry`] is one call to the debug facade: the method name, its
//! positional arguments and out-of-band metadata. Metadata can be passed
//! explicitly, embedded in the arguments with [`meta`](crate::value::meta),
//! or lifted out of named parameters with a default-argument template.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::{Key, META_KEY, Value};

// ============================================================================
// Metadata
// ============================================================================

/// Ordered string-keyed metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    entries: Vec<(String, Value)>,
}

impl Meta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sets a value. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|slot| slot.0 == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Copies every entry of `other` on top of this one.
    pub fn merge(&mut self, other: Meta) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Meta {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut meta = Self::new();
        for (k, v) in iter {
            meta.insert(k, v);
        }
        meta
    }
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ============================================================================
// Log entry
// ============================================================================

/// The public triple of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedEntry {
    pub method: String,
    pub args: Vec<Value>,
    pub meta: Meta,
}

/// One recorded debug call.
#[derive(Debug, Clone)]
pub struct LogEntry {
    subject: String,
    method: String,
    args: Vec<Value>,
    meta: Meta,
    append_log: bool,
    return_value: Option<Value>,
}

impl LogEntry {
    /// Builds an entry, lifting embedded metadata out of `args`.
    ///
    /// `subject` names the debug channel that produced the entry.
    pub fn new(
        subject: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        meta: Meta,
    ) -> Self {
        Self::with_defaults(subject, method, args, meta, &[], &[])
    }

    /// Builds an entry whose arguments follow a named template.
    ///
    /// The first `default_args.len()` arguments are paired with the template
    /// names (missing ones take the template default, extra ones are
    /// dropped). Names listed in `args_to_meta` move into metadata and win
    /// over any other metadata with the same key. Remaining arguments keep
    /// template order.
    ///
    /// Metadata precedence, lowest first: `meta`, embedded
    /// [`meta`](crate::value::meta) arguments, `args_to_meta` values.
    pub fn with_defaults(
        subject: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        meta: Meta,
        default_args: &[(&str, Value)],
        args_to_meta: &[&str],
    ) -> Self {
        let (mut args, embedded) = extract_meta(args);
        let mut meta = meta;
        meta.merge(embedded);

        if !default_args.is_empty() {
            let mut named: Vec<(&str, Value)> = default_args
                .iter()
                .enumerate()
                .map(|(i, (name, default))| {
                    (*name, args.get(i).cloned().unwrap_or_else(|| default.clone()))
                })
                .collect();
            for name in args_to_meta {
                if let Some(pos) = named.iter().position(|(n, _)| n == name) {
                    let (name, value) = named.remove(pos);
                    meta.insert(name, value);
                }
            }
            args = named.into_iter().map(|(_, v)| v).collect();
        }

        Self {
            subject: subject.into(),
            method: method.into(),
            args,
            meta,
            append_log: true,
            return_value: None,
        }
    }

    /// The channel that produced this entry.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Replaces the positional arguments.
    pub fn set_args(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    #[must_use]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Returns `(method, args, meta)`. Internal flags are not included.
    #[must_use]
    pub fn export(&self) -> ExportedEntry {
        ExportedEntry {
            method: self.method.clone(),
            args: self.args.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Metadata value for `key`.
    #[must_use]
    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Metadata value for `key`, or `default` when absent.
    #[must_use]
    pub fn get_meta_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.meta.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Sets a metadata key. [`Value::Undefined`] removes the key instead.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if value.is_undefined() {
            self.meta.remove(&key);
        } else {
            self.meta.insert(key, value);
        }
    }

    /// Merges a whole mapping into the metadata.
    pub fn merge_meta(&mut self, meta: Meta) {
        self.meta.merge(meta);
    }

    /// Whether the entry belongs in the visible log.
    #[must_use]
    pub fn append_log(&self) -> bool {
        self.append_log
    }

    pub fn set_append_log(&mut self, append: bool) {
        self.append_log = append;
    }

    /// Result handed back to the caller, for methods that return one.
    #[must_use]
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn set_return_value(&mut self, value: impl Into<Value>) {
        self.return_value = Some(value.into());
    }
}

/// Splits metadata carriers out of `args`, keeping the rest in order.
fn extract_meta(args: Vec<Value>) -> (Vec<Value>, Meta) {
    let mut meta = Meta::new();
    let mut kept = Vec::with_capacity(args.len());
    for arg in args {
        let carrier = match &arg {
            Value::Array(array) if array.borrow().is_meta() => array.clone(),
            _ => {
                kept.push(arg);
                continue;
            }
        };
        let tag = Key::from(META_KEY);
        for (k, v) in carrier.borrow().iter() {
            if *k != tag {
                meta.insert(k.to_string(), v.clone());
            }
        }
    }
    if !meta.is_empty() {
        log::trace!(
            target: crate::logging::targets::ENTRY,
            "extracted {} embedded meta keys",
            meta.len()
        );
    }
    (kept, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::meta;

    #[test]
    fn embedded_meta_is_extracted() {
        let entry = LogEntry::new(
            "general",
            "log",
            vec![Value::Int(1), meta([("foo", "bar")])],
            Meta::new(),
        );
        let exported = entry.export();
        assert_eq!(exported.args, vec![Value::Int(1)]);
        assert_eq!(exported.meta.get("foo"), Some(&Value::from("bar")));
        assert!(!exported.meta.contains_key("debug"));
    }

    #[test]
    fn args_close_gaps_after_extraction() {
        let entry = LogEntry::new(
            "general",
            "log",
            vec![
                Value::from("a"),
                meta([("x", 1)]),
                Value::from("b"),
                meta([("y", 2)]),
                Value::from("c"),
            ],
            Meta::new(),
        );
        assert_eq!(
            entry.args(),
            &[Value::from("a"), Value::from("b"), Value::from("c")]
        );
        let keys: Vec<&str> = entry.meta().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn embedded_meta_wins_over_explicit() {
        let explicit: Meta = [("channel", "explicit"), ("keep", "me")].into_iter().collect();
        let entry = LogEntry::new(
            "general",
            "log",
            vec![meta([("channel", "inline")])],
            explicit,
        );
        assert_eq!(entry.get_meta("channel"), Some(&Value::from("inline")));
        assert_eq!(entry.get_meta("keep"), Some(&Value::from("me")));
    }

    #[test]
    fn default_args_move_to_meta() {
        let entry = LogEntry::with_defaults(
            "general",
            "log",
            vec![Value::from("hello"), Value::from("warn")],
            Meta::new(),
            &[("msg", Value::from("default")), ("level", Value::from("info"))],
            &["level"],
        );
        assert_eq!(entry.args(), &[Value::from("hello")]);
        assert_eq!(entry.get_meta("level"), Some(&Value::from("warn")));
    }

    #[test]
    fn default_args_fill_missing_and_drop_extra() {
        let template = [
            ("label", Value::Undefined),
            ("precision", Value::Int(4)),
            ("silent", Value::Bool(false)),
        ];

        let short = LogEntry::with_defaults(
            "general",
            "time",
            vec![Value::from("db")],
            Meta::new(),
            &template,
            &["precision"],
        );
        assert_eq!(short.args(), &[Value::from("db"), Value::Bool(false)]);
        assert_eq!(short.get_meta("precision"), Some(&Value::Int(4)));

        let long = LogEntry::with_defaults(
            "general",
            "time",
            vec![
                Value::from("db"),
                Value::Int(2),
                Value::Bool(true),
                Value::from("extra"),
            ],
            Meta::new(),
            &template,
            &[],
        );
        assert_eq!(
            long.args(),
            &[Value::from("db"), Value::Int(2), Value::Bool(true)]
        );
    }

    #[test]
    fn args_to_meta_wins_over_embedded() {
        let entry = LogEntry::with_defaults(
            "general",
            "log",
            vec![Value::from("m"), Value::from("error"), meta([("level", "inline")])],
            [("level", "explicit")].into_iter().collect(),
            &[("msg", Value::Null), ("level", Value::from("info"))],
            &["level"],
        );
        assert_eq!(entry.get_meta("level"), Some(&Value::from("error")));
    }

    #[test]
    fn set_meta_variants() {
        let mut entry = LogEntry::new("general", "log", vec![], Meta::new());
        entry.set_meta("a", 1);
        assert_eq!(entry.get_meta_or("a", 0), Value::Int(1));

        entry.merge_meta([("b", 2), ("a", 3)].into_iter().collect());
        assert_eq!(entry.get_meta("a"), Some(&Value::Int(3)));
        assert_eq!(entry.get_meta("b"), Some(&Value::Int(2)));

        entry.set_meta("a", Value::Undefined);
        assert_eq!(entry.get_meta("a"), None);
        assert_eq!(entry.get_meta_or("a", "fallback"), Value::from("fallback"));
    }

    #[test]
    fn flags_default_and_stay_out_of_export() {
        let mut entry = LogEntry::new("general", "time", vec![], Meta::new());
        assert!(entry.append_log());
        assert!(entry.return_value().is_none());

        entry.set_append_log(false);
        entry.set_return_value(1.5);
        assert_eq!(entry.return_value(), Some(&Value::Float(1.5)));

        let json = serde_json::to_value(entry.export()).unwrap();
        assert_eq!(json, serde_json::json!({"method": "time", "args": [], "meta": {}}));
    }
}
