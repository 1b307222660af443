use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

/// Owned, length-delimited byte string.
///
/// Host strings are binary safe: embedded zero bytes are payload, not
/// terminators, and the content need not be UTF-8.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteString(Box<[u8]>);

impl ByteString {
	/// Copy `bytes` into a new owned string.
	pub fn new(bytes: impl AsRef<[u8]>) -> Self {
		Self(bytes.as_ref().into())
	}

	/// Raw bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Explicit byte length.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Return whether the string has no bytes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Borrow as `&str` when the bytes are valid UTF-8.
	pub fn as_str(&self) -> Option<&str> {
		std::str::from_utf8(&self.0).ok()
	}

	/// Lossy UTF-8 view.
	pub fn to_str_lossy(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.0)
	}

	/// Consume into the boxed byte slice.
	pub fn into_boxed_bytes(self) -> Box<[u8]> {
		self.0
	}
}

impl fmt::Debug for ByteString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self.to_str_lossy())
	}
}

impl fmt::Display for ByteString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_str_lossy())
	}
}

impl From<&str> for ByteString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for ByteString {
	fn from(value: String) -> Self {
		Self(value.into_bytes().into_boxed_slice())
	}
}

impl From<&[u8]> for ByteString {
	fn from(value: &[u8]) -> Self {
		Self::new(value)
	}
}

impl From<Vec<u8>> for ByteString {
	fn from(value: Vec<u8>) -> Self {
		Self(value.into_boxed_slice())
	}
}

impl PartialEq<str> for ByteString {
	fn eq(&self, other: &str) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

impl PartialEq<&str> for ByteString {
	fn eq(&self, other: &&str) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

// Text when possible, raw bytes otherwise.
impl Serialize for ByteString {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self.as_str() {
			Some(text) => serializer.serialize_str(text),
			None => serializer.serialize_bytes(&self.0),
		}
	}
}
