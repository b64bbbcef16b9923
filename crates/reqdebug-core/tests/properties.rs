//! End-to-end behaviour of the core through its public API.

use reqdebug_core::{
    AbstractArray, AbstractionKind, Abstracter, Array, ArrayRef, Item, Key, LogEntry, ManualClock,
    Meta, ObjectRef, REQUEST_TIME, StopWatch, Value, meta,
};

fn abstracted(item: &Item) -> &reqdebug_core::AbstractedValue {
    item.as_abstracted().expect("container should be abstracted")
}

// ============================================================================
// Abstraction
// ============================================================================

#[test]
fn test_key_order_and_identity_preserved() {
    let mut array = Array::new();
    array.insert(7, "seven");
    array.insert("name", "x");
    array.insert(0, Value::list([1, 2]));
    let item = Abstracter::new().get_abstraction(&Value::array(array), None);

    let keys: Vec<Key> = abstracted(&item).values().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec![Key::Int(7), Key::from("name"), Key::Int(0)]);
}

#[test]
fn test_direct_and_indirect_cycles_terminate() {
    let direct = ArrayRef::new(Array::new());
    direct.borrow_mut().push(direct.clone());
    let item = Abstracter::new().get_abstraction(&Value::Array(direct), None);
    assert!(abstracted(&item).get(&Key::Int(0)).is_some_and(Item::is_recursion));

    let a = ArrayRef::new(Array::new());
    let b = ArrayRef::new(Array::new());
    a.borrow_mut().push(b.clone());
    b.borrow_mut().push(a.clone());
    let item = Abstracter::new().get_abstraction(&Value::Array(a), None);
    let inner = abstracted(&item).get(&Key::Int(0)).map(abstracted).unwrap();
    assert!(inner.get(&Key::Int(0)).is_some_and(Item::is_recursion));
}

#[test]
fn test_callable_shape_checks() {
    let array = AbstractArray::new();
    let obj = ObjectRef::with_methods("Mailer", ["send"]);

    let good: Array = [(0, Value::from(obj.clone())), (1, Value::from("send"))]
        .into_iter()
        .collect();
    let missing: Array = [(0, Value::from(obj.clone())), (1, Value::from("nope"))]
        .into_iter()
        .collect();
    let scalars: Array = [(0, 1), (1, 2)].into_iter().collect();
    let keyed: Array = [("a", Value::from(obj)), ("b", Value::from("send"))]
        .into_iter()
        .collect();

    assert!(array.is_callable_shaped(&good));
    assert!(!array.is_callable_shaped(&missing));
    assert!(!array.is_callable_shaped(&scalars));
    assert!(!array.is_callable_shaped(&keyed));

    let item = Abstracter::new().get_abstraction(&Value::array(good), Some("log"));
    assert_eq!(abstracted(&item).kind(), AbstractionKind::CallableReference);
}

// ============================================================================
// Timers
// ============================================================================

#[test]
fn test_label_timer_accumulates() {
    let clock = ManualClock::new(0.0);
    let mut sw = StopWatch::new(clock.clone());

    sw.start(Some("x"));
    clock.advance(1.5);
    assert_eq!(sw.stop(Some("x")), Some(1.5));
    clock.advance(10.0);
    sw.start(Some("x"));
    clock.advance(0.5);
    assert_eq!(sw.stop(Some("x")), Some(2.0));
    assert_eq!(sw.get(Some("unknown")), None);
}

#[test]
fn test_anonymous_stack_is_lifo() {
    let clock = ManualClock::new(0.0);
    let mut sw = StopWatch::new(clock.clone());
    sw.start(None);
    clock.advance(1.0);
    sw.start(None);
    clock.advance(0.25);
    assert_eq!(sw.stop(None), Some(0.25));
    assert_eq!(sw.stop(None), Some(1.25));
}

#[test]
fn test_reset_keeps_request_time() {
    let clock = ManualClock::new(50.0);
    let mut sw = StopWatch::with_request_time(clock.clone(), 40.0);
    sw.start(Some("x"));
    sw.reset();
    assert_eq!(sw.get(Some("x")), None);
    assert_eq!(sw.get(None), Some(10.0));
    assert_eq!(sw.get(Some(REQUEST_TIME)), Some(10.0));
}

// ============================================================================
// Log entries
// ============================================================================

#[test]
fn test_embedded_meta_is_extracted() {
    let entry = LogEntry::new(
        "general",
        "log",
        vec![1.into(), meta([("foo", "bar")])],
        Meta::new(),
    );
    let exported = entry.export();
    assert_eq!(exported.args, vec![Value::Int(1)]);
    assert_eq!(exported.meta.get("foo"), Some(&Value::from("bar")));
}

#[test]
fn test_default_args_move_into_meta() {
    let entry = LogEntry::with_defaults(
        "general",
        "log",
        vec!["hello".into(), "warn".into()],
        Meta::new(),
        &[("msg", Value::from("default")), ("level", Value::from("info"))],
        &["level"],
    );
    assert_eq!(entry.args(), &[Value::from("hello")]);
    assert_eq!(entry.get_meta("level"), Some(&Value::from("warn")));
}
