//! Typed access to parsed documents.
//!
//! Catalog definitions arrive as an abstract parsed tree — ordered
//! string-keyed objects, arrays, strings, numbers, booleans — which
//! [`serde_json::Value`] models directly (the `preserve_order` feature
//! keeps object ordering). These helpers extract fields with the errors
//! the loaders expect; constructors stay free of ad-hoc `match` pyramids.

use crate::error::LoadError;
use serde_json::{Map, Value};

/// A parsed document object: ordered string keys to document values.
pub type DocObject = Map<String, Value>;

/// The document root must be an object.
pub fn as_object(doc: &Value) -> Result<&DocObject, LoadError> {
    doc.as_object()
        .ok_or_else(|| LoadError::field_type("<root>", "an object"))
}

/// A required string field.
pub fn str_field<'a>(obj: &'a DocObject, key: &str) -> Result<&'a str, LoadError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(LoadError::field_type(key, "a string")),
        None => Err(LoadError::missing(key)),
    }
}

/// An optional string field; present-but-wrong-type is an error.
pub fn opt_str_field<'a>(obj: &'a DocObject, key: &str) -> Result<Option<&'a str>, LoadError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(LoadError::field_type(key, "a string")),
        None => Ok(None),
    }
}

/// An optional integer field.
pub fn opt_int_field(obj: &DocObject, key: &str) -> Result<Option<i64>, LoadError> {
    match obj.get(key) {
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| LoadError::field_type(key, "an integer")),
        None => Ok(None),
    }
}

/// A required integer field.
pub fn int_field(obj: &DocObject, key: &str) -> Result<i64, LoadError> {
    opt_int_field(obj, key)?.ok_or_else(|| LoadError::missing(key))
}

/// A required array field.
pub fn array_field<'a>(obj: &'a DocObject, key: &str) -> Result<&'a [Value], LoadError> {
    match obj.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(LoadError::field_type(key, "an array")),
        None => Err(LoadError::missing(key)),
    }
}

/// An optional array field.
pub fn opt_array_field<'a>(obj: &'a DocObject, key: &str) -> Result<Option<&'a [Value]>, LoadError> {
    match obj.get(key) {
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(LoadError::field_type(key, "an array")),
        None => Ok(None),
    }
}

/// An optional object field.
pub fn opt_object_field<'a>(
    obj: &'a DocObject,
    key: &str,
) -> Result<Option<&'a DocObject>, LoadError> {
    match obj.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(LoadError::field_type(key, "an object")),
        None => Ok(None),
    }
}

/// Convert an array value to owned strings; any non-string entry fails.
pub fn string_array(items: &[Value], field: &str) -> Result<Vec<String>, LoadError> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(LoadError::field_type(field, "an array of strings")),
        })
        .collect()
}
