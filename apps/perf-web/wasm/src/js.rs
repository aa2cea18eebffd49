//! Small `Reflect` helpers for reading loosely-typed browser objects

use js_sys::{Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Property `key` of `target`, treating `undefined` and `null` as absent
pub fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

pub fn number(target: &JsValue, key: &str) -> Option<f64> {
    get(target, key).and_then(|value| value.as_f64())
}

pub fn string(target: &JsValue, key: &str) -> Option<String> {
    get(target, key).and_then(|value| value.as_string())
}

pub fn boolean(target: &JsValue, key: &str) -> Option<bool> {
    get(target, key).and_then(|value| value.as_bool())
}

pub fn function(target: &JsValue, key: &str) -> Option<Function> {
    get(target, key).and_then(|value| value.dyn_into::<Function>().ok())
}

/// Call method `name` on `target` with one argument
pub fn call1(target: &JsValue, name: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
    let method = function(target, name)
        .ok_or_else(|| JsValue::from_str(&format!("{} is not a function", name)))?;
    method.call1(target, arg)
}

/// A plain object with the given entries
pub fn object(entries: &[(&str, JsValue)]) -> Result<Object, JsValue> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object)
}

/// Serialize to plain JS objects and arrays (no `Map`s)
pub fn to_plain<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Human-readable text for a thrown JS value
pub fn describe(error: &JsValue) -> String {
    if let Some(text) = error.as_string() {
        return text;
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", error)
}

/// Convert a browser object to JSON, going through `toJSON` when it has one.
///
/// Timeline entries expose their fields as prototype getters, which a plain
/// serde walk would not see.
pub fn to_json(value: &JsValue) -> Option<serde_json::Value> {
    if let Some(array) = value.dyn_ref::<js_sys::Array>() {
        let items = array.iter().filter_map(|item| to_json(&item)).collect();
        return Some(serde_json::Value::Array(items));
    }
    let plain = match function(value, "toJSON") {
        Some(to_json) => to_json.call0(value).ok()?,
        None => value.clone(),
    };
    serde_wasm_bindgen::from_value(plain).ok()
}
