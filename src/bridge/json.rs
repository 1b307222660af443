//! Projection between value trees and generic JSON documents.
//!
//! Arrays with only integer keys project to JSON arrays (keys dropped, order
//! kept); associative arrays and objects project to JSON objects whose member
//! order follows the source. Later duplicates overwrite earlier ones.

use serde_json::{Map, Number};

use crate::bridge::{Array, Value};

/// Project a value tree into a JSON document.
///
/// Strings that are not valid UTF-8 are converted lossily; non-finite floats
/// become `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
	match value {
		Value::Null => serde_json::Value::Null,
		Value::Bool(value) => serde_json::Value::Bool(*value),
		Value::Int(value) => serde_json::Value::Number(Number::from(*value)),
		Value::Float(value) => Number::from_f64(*value).map_or(serde_json::Value::Null, serde_json::Value::Number),
		Value::String(bytes) => serde_json::Value::String(bytes.to_str_lossy().into_owned()),
		Value::Array(array) if !array.is_associative() => serde_json::Value::Array(array.iter().map(|item| to_json(&item.value)).collect()),
		Value::Array(array) => {
			let mut out = Map::with_capacity(array.len());
			for item in array {
				out.insert(item.key.to_string(), to_json(&item.value));
			}
			serde_json::Value::Object(out)
		}
		Value::Object(object) => {
			let mut out = Map::with_capacity(object.len());
			for prop in &object.properties {
				out.insert(prop.name.to_str_lossy().into_owned(), to_json(&prop.value));
			}
			serde_json::Value::Object(out)
		}
	}
}

/// Build a value tree from a JSON document.
///
/// JSON arrays become indexed arrays keyed `0..n`; JSON objects become
/// associative arrays. Integers outside `i64` become floats.
pub fn from_json(value: &serde_json::Value) -> Value {
	match value {
		serde_json::Value::Null => Value::Null,
		serde_json::Value::Bool(value) => Value::Bool(*value),
		serde_json::Value::Number(number) => match number.as_i64() {
			Some(value) => Value::Int(value),
			None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
		},
		serde_json::Value::String(text) => Value::new_string(text),
		serde_json::Value::Array(items) => Value::Array(Array::list(items.iter().map(from_json))),
		serde_json::Value::Object(members) => Value::Array(Array::map(members.iter().map(|(key, value)| (key.as_str(), from_json(value))))),
	}
}
