//! Value abstraction.
//!
//! Before a value reaches an output route it is *abstracted*: containers are
//! replaced by an [`AbstractedValue`] tree that is safe to render. Cycles are
//! cut with [`AbstractedValue::Recursion`], `[object, "method"]` pairs become
//! [`AbstractedValue::Callable`], objects and resources become summaries.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::abstract_array::AbstractArray;
use crate::log_abstracter;
use crate::value::{Identity, Key, ObjectRef, Value};

// ============================================================================
// Policy
// ============================================================================

/// Decides whether a value must be abstracted before output.
pub trait NeedsAbstraction {
    /// Returns true if `value` should be replaced by its abstraction.
    fn needs_abstraction(&self, value: &Value) -> bool;
}

impl<F> NeedsAbstraction for F
where
    F: Fn(&Value) -> bool,
{
    fn needs_abstraction(&self, value: &Value) -> bool {
        self(value)
    }
}

/// Arrays, objects and resources need abstraction; scalars do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerPolicy;

impl NeedsAbstraction for ContainerPolicy {
    fn needs_abstraction(&self, value: &Value) -> bool {
        value.is_container()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Broad classification of an [`AbstractedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstractionKind {
    /// An ordinary array whose entries were walked.
    PlainContainer,
    /// An `[object, "method"]` pair.
    CallableReference,
    /// A container already on the current traversal path.
    RecursionMarker,
    /// A summary of a non-array value (object, resource).
    AbstractionMarker,
}

/// One slot of an abstracted container.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Value kept as-is.
    Raw(Value),
    /// Value replaced by its abstraction.
    Abstracted(AbstractedValue),
}

impl Item {
    /// Returns the abstraction if this slot was abstracted.
    #[must_use]
    pub fn as_abstracted(&self) -> Option<&AbstractedValue> {
        match self {
            Item::Abstracted(a) => Some(a),
            Item::Raw(_) => None,
        }
    }

    /// Returns the raw value if this slot was kept as-is.
    #[must_use]
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Item::Raw(v) => Some(v),
            Item::Abstracted(_) => None,
        }
    }

    /// Returns true if this slot is a recursion marker.
    #[must_use]
    pub fn is_recursion(&self) -> bool {
        matches!(self, Item::Abstracted(AbstractedValue::Recursion))
    }
}

/// The result of abstracting a container.
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractedValue {
    /// Walked array, keys and order preserved.
    Array {
        /// Log method that requested the abstraction, when known.
        method: Option<String>,
        /// Entries in original order under their original keys.
        values: Vec<(Key, Item)>,
    },
    /// `[object, "method"]` callable pair.
    Callable {
        /// Class of the bound object.
        class_name: String,
        /// Method name as written in the array.
        method_name: String,
    },
    /// Container rediscovered on its own traversal path.
    Recursion,
    /// Object summary with abstracted properties.
    Object {
        /// Class of the instance.
        class_name: String,
        /// Properties in original order.
        properties: Vec<(Key, Item)>,
    },
    /// Resource summary.
    Resource {
        /// Resource type.
        kind: String,
        /// Handle id.
        id: u64,
    },
}

impl AbstractedValue {
    /// Classifies this abstraction.
    #[must_use]
    pub fn kind(&self) -> AbstractionKind {
        match self {
            AbstractedValue::Array { .. } => AbstractionKind::PlainContainer,
            AbstractedValue::Callable { .. } => AbstractionKind::CallableReference,
            AbstractedValue::Recursion => AbstractionKind::RecursionMarker,
            AbstractedValue::Object { .. } | AbstractedValue::Resource { .. } => {
                AbstractionKind::AbstractionMarker
            }
        }
    }

    /// Entries of a plain container (or properties of an object).
    #[must_use]
    pub fn values(&self) -> &[(Key, Item)] {
        match self {
            AbstractedValue::Array { values, .. } => values,
            AbstractedValue::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Item> {
        self.values().iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

// ============================================================================
// Traversal history
// ============================================================================

/// Identities on the path from the traversal root to the current node.
///
/// This is a path, not a visited set: identities are popped on the way back
/// up, so a container reachable through two sibling branches is abstracted
/// in both.
#[derive(Debug, Default)]
pub struct History {
    path: Vec<Identity>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `identity` is an ancestor of the current node.
    #[must_use]
    pub fn contains(&self, identity: Identity) -> bool {
        self.path.contains(&identity)
    }

    /// Enters a container.
    pub fn push(&mut self, identity: Identity) {
        self.path.push(identity);
    }

    /// Leaves the innermost container.
    pub fn pop(&mut self) -> Option<Identity> {
        self.path.pop()
    }

    /// Current path depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

// ============================================================================
// Abstracter
// ============================================================================

/// Entry point for abstracting values.
pub struct Abstracter {
    policy: Box<dyn NeedsAbstraction>,
    array: AbstractArray,
}

impl Default for Abstracter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Abstracter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Abstracter").finish_non_exhaustive()
    }
}

impl Abstracter {
    /// Creates an abstracter using [`ContainerPolicy`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ContainerPolicy)
    }

    /// Creates an abstracter with a custom "needs abstraction" predicate.
    #[must_use]
    pub fn with_policy(policy: impl NeedsAbstraction + 'static) -> Self {
        Self {
            policy: Box::new(policy),
            array: AbstractArray::new(),
        }
    }

    /// Returns true if `value` should be abstracted.
    #[must_use]
    pub fn needs_abstraction(&self, value: &Value) -> bool {
        self.policy.needs_abstraction(value)
    }

    /// The array abstracter.
    #[must_use]
    pub fn array(&self) -> &AbstractArray {
        &self.array
    }

    /// Abstracts `value` if the policy requires it, with a fresh history.
    #[must_use]
    pub fn get_abstraction(&self, value: &Value, method: Option<&str>) -> Item {
        if !self.needs_abstraction(value) {
            return Item::Raw(value.clone());
        }
        let mut history = History::new();
        self.abstract_value(value, method, &mut history)
    }

    /// Abstracts every value of a list (typically log arguments).
    #[must_use]
    pub fn abstract_args(&self, args: &[Value], method: Option<&str>) -> Vec<Item> {
        args.iter()
            .map(|arg| self.get_abstraction(arg, method))
            .collect()
    }

    /// Abstracts one value that the policy flagged, sharing `history`.
    pub(crate) fn abstract_value(
        &self,
        value: &Value,
        method: Option<&str>,
        history: &mut History,
    ) -> Item {
        match value {
            Value::Array(array) => {
                Item::Abstracted(self.array.get_abstraction(self, array, method, history))
            }
            Value::Object(object) => {
                Item::Abstracted(self.abstract_object(object, method, history))
            }
            Value::Resource(resource) => Item::Abstracted(AbstractedValue::Resource {
                kind: resource.kind.clone(),
                id: resource.id,
            }),
            scalar => Item::Raw(scalar.clone()),
        }
    }

    /// Abstracts a nested slot: flagged values are abstracted, others kept.
    pub(crate) fn abstract_slot(
        &self,
        value: &Value,
        method: Option<&str>,
        history: &mut History,
    ) -> Item {
        if self.needs_abstraction(value) {
            self.abstract_value(value, method, history)
        } else {
            Item::Raw(value.clone())
        }
    }

    fn abstract_object(
        &self,
        object: &ObjectRef,
        method: Option<&str>,
        history: &mut History,
    ) -> AbstractedValue {
        let identity = object.identity();
        if history.contains(identity) {
            log_abstracter!("recursion detected in {} instance", object.class_name());
            return AbstractedValue::Recursion;
        }
        history.push(identity);
        let properties = object
            .properties()
            .iter()
            .map(|(k, v)| (k.clone(), self.abstract_slot(v, method, history)))
            .collect();
        history.pop();
        AbstractedValue::Object {
            class_name: object.class_name().to_string(),
            properties,
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Item::Raw(value) => value.serialize(serializer),
            Item::Abstracted(abs) => abs.serialize(serializer),
        }
    }
}

struct Entries<'a>(&'a [(Key, Item)]);

impl Serialize for Entries<'_> {
    // Lists stay JSON arrays; anything else becomes an object keyed by the
    // stringified key.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let is_list = self
            .0
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64));
        if is_list {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for (_, item) in self.0 {
                seq.serialize_element(item)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (key, item) in self.0 {
                map.serialize_entry(&key.to_string(), item)?;
            }
            map.end()
        }
    }
}

impl Serialize for AbstractedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AbstractedValue::Array { values, .. } => Entries(values).serialize(serializer),
            AbstractedValue::Callable {
                class_name,
                method_name,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "callable")?;
                map.serialize_entry("value", &format!("{class_name}::{method_name}"))?;
                map.end()
            }
            AbstractedValue::Recursion => serializer.serialize_str("*RECURSION*"),
            AbstractedValue::Object {
                class_name,
                properties,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "object")?;
                map.serialize_entry("className", class_name)?;
                map.serialize_entry("properties", &Entries(properties))?;
                map.end()
            }
            AbstractedValue::Resource { kind, id } => {
                serializer.serialize_str(&format!("Resource id #{id}: {kind}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Array, ArrayRef, Resource};

    #[test]
    fn scalars_pass_through() {
        let abs = Abstracter::new();
        assert_eq!(abs.get_abstraction(&Value::Int(3), None), Item::Raw(Value::Int(3)));
        assert_eq!(abs.get_abstraction(&Value::from("s"), None), Item::Raw(Value::from("s")));
    }

    #[test]
    fn object_properties_are_abstracted() {
        let obj = ObjectRef::new("User");
        obj.set_property("name", "ann");
        obj.set_property("tags", Array::list(["a", "b"]));

        let abs = Abstracter::new();
        let item = abs.get_abstraction(&Value::Object(obj), Some("log"));
        let value = item.as_abstracted().unwrap();
        assert_eq!(value.kind(), AbstractionKind::AbstractionMarker);
        assert_eq!(value.get(&Key::from("name")), Some(&Item::Raw(Value::from("ann"))));
        let tags = value.get(&Key::from("tags")).unwrap().as_abstracted().unwrap();
        assert_eq!(tags.kind(), AbstractionKind::PlainContainer);
    }

    #[test]
    fn object_cycle_through_property() {
        let obj = ObjectRef::new("Node");
        obj.set_property("self", Value::Object(obj.clone()));

        let abs = Abstracter::new();
        let item = abs.get_abstraction(&Value::Object(obj), None);
        let value = item.as_abstracted().unwrap();
        assert!(value.get(&Key::from("self")).unwrap().is_recursion());
    }

    #[test]
    fn resource_becomes_marker() {
        let abs = Abstracter::new();
        let item = abs.get_abstraction(
            &Value::Resource(Resource {
                kind: "stream".into(),
                id: 7,
            }),
            None,
        );
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#""Resource id #7: stream""#);
    }

    #[test]
    fn custom_policy_keeps_arrays_raw() {
        let abs = Abstracter::with_policy(|v: &Value| matches!(v, Value::Object(_)));
        let array = Value::list([1, 2]);
        assert_eq!(abs.get_abstraction(&array, None), Item::Raw(array));
    }

    #[test]
    fn history_is_a_path() {
        let a = ArrayRef::new(Array::new());
        let mut history = History::new();
        history.push(a.identity());
        assert!(history.contains(a.identity()));
        history.pop();
        assert!(!history.contains(a.identity()));
        assert_eq!(history.depth(), 0);
    }

    #[test]
    fn serialize_keeps_lists_and_maps() {
        let mut inner = Array::new();
        inner.insert("k", "v");
        inner.insert(3, true);
        let abs = Abstracter::new();
        let item = abs.get_abstraction(&Value::list([Value::Int(1), Value::array(inner)]), None);
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"[1,{"k":"v","3":true}]"#);
    }
}
