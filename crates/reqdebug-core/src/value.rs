//! Dynamic values passed to the debug console.
//!
//! Log arguments are heterogeneous, so they are carried as [`Value`]s.
//! Arrays and objects are shared handles: the same container can appear in
//! several places (or inside itself), and the abstracter tells them apart by
//! identity rather than by content.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

/// Marker stored under the `"debug"` key of an argument array that carries
/// metadata rather than data.
pub const META_TAG: &str = "\u{0}meta\u{0}";

/// Key under which [`META_TAG`] is stored.
pub const META_KEY: &str = "debug";

// ============================================================================
// Keys
// ============================================================================

/// An array key. Integer and string keys are distinct and never renumbered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl Key {
    /// Returns the key as a string slice if it is a string key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }

    /// Returns the key as an integer if it is an integer key.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Str(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

// ============================================================================
// Arrays
// ============================================================================

/// Ordered key/value container.
#[derive(Debug, Clone, Default)]
pub struct Array {
    entries: Vec<(Key, Value)>,
}

impl Array {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list with keys `0..n`.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut array = Self::new();
        for value in values {
            array.push(value);
        }
        array
    }

    /// Appends a value under the next integer key (one past the largest
    /// integer key, or `0`).
    pub fn push(&mut self, value: impl Into<Value>) {
        let next = self
            .entries
            .iter()
            .filter_map(|(k, _)| k.as_int())
            .max()
            .map_or(0, |max| max + 1);
        self.entries.push((Key::Int(next), value.into()));
    }

    /// Sets `key` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|slot| slot.0 == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the array has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Returns true if the keys are exactly `0, 1, .., n-1` in order.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64))
    }

    /// Returns true if this array is a metadata carrier (see [`META_TAG`]).
    #[must_use]
    pub fn is_meta(&self) -> bool {
        matches!(
            self.get(&Key::from(META_KEY)),
            Some(Value::String(tag)) if tag == META_TAG
        )
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Array {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut array = Self::new();
        for (k, v) in iter {
            array.insert(k, v);
        }
        array
    }
}

/// Shared handle to an [`Array`]. Clones refer to the same container.
#[derive(Clone, Default)]
pub struct ArrayRef(Rc<RefCell<Array>>);

impl ArrayRef {
    /// Wraps an array in a new shared handle.
    #[must_use]
    pub fn new(array: Array) -> Self {
        Self(Rc::new(RefCell::new(array)))
    }

    /// Borrows the array.
    ///
    /// # Panics
    ///
    /// Panics if the array is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Array> {
        self.0.borrow()
    }

    /// Mutably borrows the array.
    ///
    /// # Panics
    ///
    /// Panics if the array is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, Array> {
        self.0.borrow_mut()
    }

    /// Returns true if both handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the underlying container.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::Array(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }
}

impl fmt::Debug for ArrayRef {
    // Never recurse: the array may contain itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(array) => write!(f, "Array(len={})", array.len()),
            Err(_) => f.write_str("Array(<borrowed>)"),
        }
    }
}

// ============================================================================
// Objects and resources
// ============================================================================

/// A class instance: class name, callable method names and properties.
#[derive(Debug)]
pub struct Object {
    class_name: String,
    methods: Vec<String>,
    properties: RefCell<Array>,
}

/// Shared handle to an [`Object`]. Clones refer to the same instance.
#[derive(Clone)]
pub struct ObjectRef(Rc<Object>);

impl ObjectRef {
    /// Creates an instance of `class_name` with no methods or properties.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self(Rc::new(Object {
            class_name: class_name.into(),
            methods: Vec::new(),
            properties: RefCell::new(Array::new()),
        }))
    }

    /// Creates an instance exposing the given methods.
    #[must_use]
    pub fn with_methods<I, S>(class_name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Rc::new(Object {
            class_name: class_name.into(),
            methods: methods.into_iter().map(Into::into).collect(),
            properties: RefCell::new(Array::new()),
        }))
    }

    /// The instance's class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.0.class_name
    }

    /// Method names are matched case-insensitively.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.0.methods.iter().any(|m| m.eq_ignore_ascii_case(name))
    }

    /// Sets a property.
    pub fn set_property(&self, name: impl Into<Key>, value: impl Into<Value>) {
        self.0.properties.borrow_mut().insert(name, value);
    }

    /// Borrows the property table.
    #[must_use]
    pub fn properties(&self) -> Ref<'_, Array> {
        self.0.properties.borrow()
    }

    /// Returns true if both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the underlying instance.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::Object(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0.class_name)
    }
}

/// An opaque external handle (stream, connection, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Resource type, e.g. `"stream"`.
    pub kind: String,
    /// Handle id.
    pub id: u64,
}

/// Container identity used for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// An [`ArrayRef`] allocation.
    Array(usize),
    /// An [`ObjectRef`] allocation.
    Object(usize),
}

// ============================================================================
// Values
// ============================================================================

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    String(String),
    /// Shared array.
    Array(ArrayRef),
    /// Shared object.
    Object(ObjectRef),
    /// External resource.
    Resource(Resource),
    /// The unset sentinel. Never a legitimate argument.
    Undefined,
}

impl Value {
    /// Wraps an array in a new shared handle.
    #[must_use]
    pub fn array(array: Array) -> Self {
        Value::Array(ArrayRef::new(array))
    }

    /// Builds a list value with keys `0..n`.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::array(Array::list(values))
    }

    /// Returns true for arrays, objects and resources.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Resource(_))
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Truthiness: null, undefined, `false`, `0`, `0.0` and `""` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Object(_) | Value::Resource(_) => true,
        }
    }

    /// Container identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::Array(a) => Some(a.identity()),
            Value::Object(o) => Some(o.identity()),
            _ => None,
        }
    }
}

/// Scalars compare by value; arrays and objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Resource(a), Value::Resource(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Array(a) => write!(f, "array({})", a.borrow().len()),
            Value::Object(o) => write!(f, "object({})", o.class_name()),
            Value::Resource(r) => write!(f, "resource({}) #{}", r.kind, r.id),
            Value::Undefined => f.write_str("undefined"),
        }
    }
}

/// Containers serialize as a short summary. Abstract them first to get
/// their structure.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            other => serializer.collect_str(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::array(a)
    }
}

impl From<ArrayRef> for Value {
    fn from(a: ArrayRef) -> Self {
        Value::Array(a)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<Resource> for Value {
    fn from(r: Resource) -> Self {
        Value::Resource(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Builds a metadata argument: an array tagged with [`META_TAG`] whose other
/// entries become log entry metadata.
///
/// ```ignore
/// debug.log(vec!["message".into(), meta([("channel", "db")])]);
/// ```
pub fn meta<I, K, V>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<Value>,
{
    let mut array = Array::new();
    array.insert(META_KEY, META_TAG);
    for (k, v) in entries {
        array.insert(k, v);
    }
    Value::array(array)
}
