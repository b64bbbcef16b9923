//! Array abstraction with cycle detection.

use crate::abstracter::{AbstractedValue, Abstracter, History};
use crate::log_abstracter;
use crate::value::{Array, ArrayRef, Key, Value};

/// Walks arrays, abstracting nested values that need it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbstractArray;

impl AbstractArray {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Abstracts `array`.
    ///
    /// An array already present in `history` yields
    /// [`AbstractedValue::Recursion`]. A callable-shaped array yields
    /// [`AbstractedValue::Callable`]. Anything else is walked in insertion
    /// order with its keys preserved; `history` is restored before returning.
    pub fn get_abstraction(
        &self,
        abstracter: &Abstracter,
        array: &ArrayRef,
        method: Option<&str>,
        history: &mut History,
    ) -> AbstractedValue {
        let identity = array.identity();
        if history.contains(identity) {
            log_abstracter!("recursion detected at depth {}", history.depth());
            return AbstractedValue::Recursion;
        }

        let borrowed = array.borrow();
        if let Some((class_name, method_name)) = callable_parts(&borrowed) {
            log_abstracter!("callable array {}::{}", class_name, method_name);
            return AbstractedValue::Callable {
                class_name,
                method_name,
            };
        }

        history.push(identity);
        let values = borrowed
            .iter()
            .map(|(k, v)| (k.clone(), abstracter.abstract_slot(v, method, history)))
            .collect();
        history.pop();

        AbstractedValue::Array {
            method: method.map(String::from),
            values,
        }
    }

    /// Returns true if `array` is `[object, "method"]` where the object has
    /// that method.
    #[must_use]
    pub fn is_callable_shaped(&self, array: &Array) -> bool {
        callable_parts(array).is_some()
    }
}

/// Class and method name of a callable-shaped array.
fn callable_parts(array: &Array) -> Option<(String, String)> {
    if array.len() != 2 {
        return None;
    }
    let Some(Value::Object(object)) = array.get(&Key::Int(0)) else {
        return None;
    };
    let Some(Value::String(method_name)) = array.get(&Key::Int(1)) else {
        return None;
    };
    // Keys must be exactly 0 then 1.
    if !array.is_list() || !object.has_method(method_name) {
        return None;
    }
    Some((object.class_name().to_string(), method_name.clone()))
}
