use serde::Serialize;

use crate::bridge::{Array, BridgeError, ByteString, Kind, Object, Result, Value};

/// Type tag of a [`Nullable`]: the six kinds a nullable field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullableKind {
	/// String field.
	String,
	/// Integer field.
	Int,
	/// Float field.
	Float,
	/// Boolean field.
	Bool,
	/// Array field.
	Array,
	/// Object field.
	Object,
}

impl From<NullableKind> for Kind {
	fn from(value: NullableKind) -> Self {
		match value {
			NullableKind::String => Kind::String,
			NullableKind::Int => Kind::Int,
			NullableKind::Float => Kind::Float,
			NullableKind::Bool => Kind::Bool,
			NullableKind::Array => Kind::Array,
			NullableKind::Object => Kind::Object,
		}
	}
}

impl TryFrom<Kind> for NullableKind {
	type Error = BridgeError;

	fn try_from(value: Kind) -> Result<Self> {
		match value {
			Kind::String => Ok(Self::String),
			Kind::Int => Ok(Self::Int),
			Kind::Float => Ok(Self::Float),
			Kind::Bool => Ok(Self::Bool),
			Kind::Array => Ok(Self::Array),
			Kind::Object => Ok(Self::Object),
			Kind::Null => Err(BridgeError::TypeMismatch {
				expected: "non-null",
				got: Kind::Null,
			}),
		}
	}
}

/// Typed field that is either a present value or an explicit null.
///
/// Unlike [`Value::Null`], an explicit null here still advertises the kind the
/// field would have held.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nullable {
	kind: NullableKind,
	is_null: bool,
	value: Option<Box<Value>>,
}

impl Nullable {
	/// Wrap a present value. Fails with `TypeMismatch` for [`Value::Null`],
	/// which has no field kind to advertise.
	pub fn from_value(value: Value) -> Result<Self> {
		let kind = NullableKind::try_from(value.kind())?;
		Ok(Self {
			kind,
			is_null: false,
			value: Some(Box::new(value)),
		})
	}

	/// Explicit null of the given kind.
	pub fn null_of(kind: NullableKind) -> Self {
		Self {
			kind,
			is_null: true,
			value: None,
		}
	}

	/// Declared kind.
	pub fn kind(&self) -> NullableKind {
		self.kind
	}

	/// Return whether this is an explicit null.
	pub fn is_null(&self) -> bool {
		self.is_null
	}

	/// Present value, if any.
	pub fn value(&self) -> Option<&Value> {
		self.value.as_deref()
	}

	/// Consume into the present value, if any.
	pub fn into_value(self) -> Option<Value> {
		self.value.map(|value| *value)
	}

	fn present(&self, expected: Kind) -> Result<&Value> {
		match self.value.as_deref() {
			Some(value) => Ok(value),
			None => Err(BridgeError::TypeMismatch {
				expected: expected.as_str(),
				got: Kind::Null,
			}),
		}
	}

	/// String payload; `TypeMismatch` when null or of another kind.
	pub fn string(&self) -> Result<&ByteString> {
		self.present(Kind::String)?.as_string()
	}

	/// Integer payload; `TypeMismatch` when null or of another kind.
	pub fn int(&self) -> Result<i64> {
		self.present(Kind::Int)?.as_int()
	}

	/// Float payload; `TypeMismatch` when null or of another kind.
	pub fn float(&self) -> Result<f64> {
		self.present(Kind::Float)?.as_float()
	}

	/// Boolean payload; `TypeMismatch` when null or of another kind.
	pub fn bool(&self) -> Result<bool> {
		self.present(Kind::Bool)?.as_bool()
	}

	/// Array payload; `TypeMismatch` when null or of another kind.
	pub fn array(&self) -> Result<&Array> {
		self.present(Kind::Array)?.as_array()
	}

	/// Object payload; `TypeMismatch` when null or of another kind.
	pub fn object(&self) -> Result<&Object> {
		self.present(Kind::Object)?.as_object()
	}

	/// String payload, or `None` when null or of another kind.
	pub fn opt_string(&self) -> Option<&ByteString> {
		self.string().ok()
	}

	/// Integer payload, or `None` when null or of another kind.
	pub fn opt_int(&self) -> Option<i64> {
		self.int().ok()
	}

	/// Float payload, or `None` when null or of another kind.
	pub fn opt_float(&self) -> Option<f64> {
		self.float().ok()
	}

	/// Boolean payload, or `None` when null or of another kind.
	pub fn opt_bool(&self) -> Option<bool> {
		self.bool().ok()
	}

	/// Array payload, or `None` when null or of another kind.
	pub fn opt_array(&self) -> Option<&Array> {
		self.array().ok()
	}

	/// Object payload, or `None` when null or of another kind.
	pub fn opt_object(&self) -> Option<&Object> {
		self.object().ok()
	}
}

impl TryFrom<Value> for Nullable {
	type Error = BridgeError;

	fn try_from(value: Value) -> Result<Self> {
		Self::from_value(value)
	}
}

#[cfg(test)]
mod tests;
