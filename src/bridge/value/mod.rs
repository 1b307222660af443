use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::bridge::{BridgeError, ByteString, Result};

/// Type tag of a [`Value`].
///
/// Discriminants match the numbering used by the host-side glue headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Kind {
	/// Binary-safe string.
	String = 0,
	/// Signed 64-bit integer.
	Int = 1,
	/// 64-bit float.
	Float = 2,
	/// Boolean.
	Bool = 3,
	/// Ordered associative container.
	Array = 4,
	/// Explicit null.
	Null = 5,
	/// Object with optional class name.
	Object = 6,
}

impl Kind {
	/// Stable lowercase name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Int => "int",
			Self::Float => "float",
			Self::Bool => "bool",
			Self::Array => "array",
			Self::Null => "null",
			Self::Object => "object",
		}
	}
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Owned, language-neutral value tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
	/// Binary-safe string with explicit length.
	String(ByteString),
	/// Signed integer.
	Int(i64),
	/// Float.
	Float(f64),
	/// Boolean.
	Bool(bool),
	/// Ordered array.
	Array(Array),
	/// Object.
	Object(Object),
	/// Explicit null; carries no payload.
	Null,
}

impl Value {
	/// Null value.
	pub fn new_null() -> Self {
		Self::Null
	}

	/// Boolean value.
	pub fn new_bool(value: bool) -> Self {
		Self::Bool(value)
	}

	/// Integer value.
	pub fn new_int(value: i64) -> Self {
		Self::Int(value)
	}

	/// Float value.
	pub fn new_float(value: f64) -> Self {
		Self::Float(value)
	}

	/// String value copied from `bytes`.
	pub fn new_string(bytes: impl AsRef<[u8]>) -> Self {
		Self::String(ByteString::new(bytes))
	}

	/// Array value.
	pub fn new_array(array: Array) -> Self {
		Self::Array(array)
	}

	/// Object value.
	pub fn new_object(object: Object) -> Self {
		Self::Object(object)
	}

	/// Type tag of this value.
	pub fn kind(&self) -> Kind {
		match self {
			Self::String(_) => Kind::String,
			Self::Int(_) => Kind::Int,
			Self::Float(_) => Kind::Float,
			Self::Bool(_) => Kind::Bool,
			Self::Array(_) => Kind::Array,
			Self::Object(_) => Kind::Object,
			Self::Null => Kind::Null,
		}
	}

	/// Return whether this is the explicit null kind.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Boolean payload.
	pub fn as_bool(&self) -> Result<bool> {
		match self {
			Self::Bool(value) => Ok(*value),
			other => Err(mismatch(Kind::Bool, other)),
		}
	}

	/// Integer payload.
	pub fn as_int(&self) -> Result<i64> {
		match self {
			Self::Int(value) => Ok(*value),
			other => Err(mismatch(Kind::Int, other)),
		}
	}

	/// Float payload.
	pub fn as_float(&self) -> Result<f64> {
		match self {
			Self::Float(value) => Ok(*value),
			other => Err(mismatch(Kind::Float, other)),
		}
	}

	/// String payload.
	pub fn as_string(&self) -> Result<&ByteString> {
		match self {
			Self::String(value) => Ok(value),
			other => Err(mismatch(Kind::String, other)),
		}
	}

	/// String payload as raw bytes.
	pub fn as_bytes(&self) -> Result<&[u8]> {
		self.as_string().map(ByteString::as_bytes)
	}

	/// Array payload.
	pub fn as_array(&self) -> Result<&Array> {
		match self {
			Self::Array(value) => Ok(value),
			other => Err(mismatch(Kind::Array, other)),
		}
	}

	/// Object payload.
	pub fn as_object(&self) -> Result<&Object> {
		match self {
			Self::Object(value) => Ok(value),
			other => Err(mismatch(Kind::Object, other)),
		}
	}

	/// Take the string payload.
	pub fn into_string(self) -> Result<ByteString> {
		match self {
			Self::String(value) => Ok(value),
			other => Err(mismatch(Kind::String, &other)),
		}
	}

	/// Take the array payload.
	pub fn into_array(self) -> Result<Array> {
		match self {
			Self::Array(value) => Ok(value),
			other => Err(mismatch(Kind::Array, &other)),
		}
	}

	/// Take the object payload.
	pub fn into_object(self) -> Result<Object> {
		match self {
			Self::Object(value) => Ok(value),
			other => Err(mismatch(Kind::Object, &other)),
		}
	}
}

fn mismatch(expected: Kind, got: &Value) -> BridgeError {
	BridgeError::TypeMismatch {
		expected: expected.as_str(),
		got: got.kind(),
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}

impl From<Array> for Value {
	fn from(value: Array) -> Self {
		Self::Array(value)
	}
}

impl From<Object> for Value {
	fn from(value: Object) -> Self {
		Self::Object(value)
	}
}

/// Key form of one array element. Exactly one form is populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayKey {
	/// Integer index.
	Index(i64),
	/// String key.
	Key(ByteString),
}

impl ArrayKey {
	/// Return whether this is a string key.
	pub fn is_string(&self) -> bool {
		matches!(self, Self::Key(_))
	}
}

impl fmt::Display for ArrayKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Index(index) => write!(f, "{index}"),
			Self::Key(key) => write!(f, "{key}"),
		}
	}
}

/// One keyed array element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayElement {
	/// Element key.
	#[serde(flatten)]
	pub key: ArrayKey,
	/// Element value.
	pub value: Value,
}

/// Ordered array of keyed elements.
///
/// `is_associative` is maintained on insert: it becomes true as soon as one
/// string-keyed element is pushed and never reverts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
	elements: Vec<ArrayElement>,
	is_associative: bool,
}

impl Array {
	/// Empty, non-associative array.
	pub fn new() -> Self {
		Self::default()
	}

	/// Build an indexed array keyed `0..n`.
	pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
		let mut out = Self::new();
		for (index, value) in values.into_iter().enumerate() {
			out.push(ArrayKey::Index(index as i64), value);
		}
		out
	}

	/// Build an array from string-keyed pairs, preserving their order.
	pub fn map<K: Into<ByteString>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
		let mut out = Self::new();
		for (key, value) in pairs {
			out.push(ArrayKey::Key(key.into()), value);
		}
		out
	}

	/// Reserve room for `additional` elements, reporting failure instead of aborting.
	pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
		self.elements
			.try_reserve_exact(additional)
			.map_err(|_| BridgeError::AllocationFailure {
				node: "array elements",
				bytes: additional.saturating_mul(std::mem::size_of::<ArrayElement>()),
			})
	}

	/// Append one element.
	pub fn push(&mut self, key: ArrayKey, value: Value) {
		self.is_associative |= key.is_string();
		self.elements.push(ArrayElement { key, value });
	}

	/// Append an integer-keyed element.
	pub fn push_index(&mut self, index: i64, value: Value) {
		self.push(ArrayKey::Index(index), value);
	}

	/// Append a string-keyed element.
	pub fn push_key(&mut self, key: impl Into<ByteString>, value: Value) {
		self.push(ArrayKey::Key(key.into()), value);
	}

	/// Element count.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Return whether there are no elements.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// True iff at least one element carries a string key.
	pub fn is_associative(&self) -> bool {
		self.is_associative
	}

	/// Elements in insertion order.
	pub fn elements(&self) -> &[ArrayElement] {
		&self.elements
	}

	/// Iterate elements in insertion order.
	pub fn iter(&self) -> std::slice::Iter<'_, ArrayElement> {
		self.elements.iter()
	}

	/// First element with the given key.
	pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
		self.elements.iter().find(|item| &item.key == key).map(|item| &item.value)
	}

	/// First element with the given integer index.
	pub fn get_index(&self, index: i64) -> Option<&Value> {
		self.get(&ArrayKey::Index(index))
	}

	/// First element with the given string key.
	pub fn get_key(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
		let key = key.as_ref();
		self.elements
			.iter()
			.find(|item| matches!(&item.key, ArrayKey::Key(candidate) if candidate.as_bytes() == key))
			.map(|item| &item.value)
	}

	pub(crate) fn last_value_mut(&mut self) -> Option<&mut Value> {
		self.elements.last_mut().map(|item| &mut item.value)
	}

	/// Consume into the element list.
	pub fn into_elements(self) -> Vec<ArrayElement> {
		self.elements
	}
}

impl<'a> IntoIterator for &'a Array {
	type Item = &'a ArrayElement;
	type IntoIter = std::slice::Iter<'a, ArrayElement>;

	fn into_iter(self) -> Self::IntoIter {
		self.elements.iter()
	}
}

impl Serialize for Array {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut state = serializer.serialize_struct("Array", 3)?;
		state.serialize_field("length", &self.elements.len())?;
		state.serialize_field("is_associative", &self.is_associative)?;
		state.serialize_field("elements", &self.elements)?;
		state.end()
	}
}

/// Class name used for anonymous objects.
pub const STD_CLASS: &str = "stdClass";

/// One named object property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
	/// Property name.
	pub name: ByteString,
	/// Property value.
	pub value: Value,
}

/// Object with an optional class name and positional properties.
///
/// Duplicate property names are kept in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Object {
	/// Class name; `None` for anonymous objects.
	pub class_name: Option<ByteString>,
	/// Properties in source order.
	pub properties: Vec<Property>,
}

impl Object {
	/// Build an object from a class name and ordered properties.
	pub fn new<K: Into<ByteString>>(class_name: Option<&str>, properties: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self {
			class_name: class_name.map(ByteString::from),
			properties: properties
				.into_iter()
				.map(|(name, value)| Property { name: name.into(), value })
				.collect(),
		}
	}

	/// Class name, falling back to `stdClass` for anonymous objects.
	pub fn class_name_or_std(&self) -> std::borrow::Cow<'_, str> {
		match &self.class_name {
			Some(name) => name.to_str_lossy(),
			None => std::borrow::Cow::Borrowed(STD_CLASS),
		}
	}

	/// First property with the given name.
	pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Value> {
		let name = name.as_ref();
		self.properties
			.iter()
			.find(|prop| prop.name.as_bytes() == name)
			.map(|prop| &prop.value)
	}

	/// Property count.
	pub fn len(&self) -> usize {
		self.properties.len()
	}

	/// Return whether the object has no properties.
	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}
}
