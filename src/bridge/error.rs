use thiserror::Error;

use crate::bridge::{Kind, StorageMode};

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors produced while reading host tables and building value trees.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// Slot accessor called past the table's allocated capacity.
	#[error("slot index {index} out of range (capacity={capacity})")]
	IndexOutOfRange {
		/// Requested slot index.
		index: u32,
		/// Allocated slot count of the table.
		capacity: u32,
	},
	/// A packed/hashed read was routed to a table in the other mode.
	#[error("wrong storage mode: expected {expected}, table is {actual}")]
	WrongStorageMode {
		/// Mode the caller routed the read for.
		expected: StorageMode,
		/// Mode the table is actually in.
		actual: StorageMode,
	},
	/// Object property slot without a string key.
	#[error("object property slot {slot} has no string key")]
	InvalidKeyForObject {
		/// Physical slot index of the offending property.
		slot: u32,
	},
	/// Allocator collaborator refused a request.
	#[error("allocation failure: {bytes} bytes for {node}")]
	AllocationFailure {
		/// Node kind the memory was requested for.
		node: &'static str,
		/// Requested byte count.
		bytes: usize,
	},
	/// Typed getter invoked on a value of another kind.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Kind the caller asked for.
		expected: &'static str,
		/// Kind the value actually holds (`Null` for explicit nulls).
		got: Kind,
	},
	/// Host handle does not name a live table or object.
	#[error("invalid {kind} handle {handle}")]
	InvalidHandle {
		/// `"table"` or `"object"`.
		kind: &'static str,
		/// Raw handle value.
		handle: u32,
	},
	/// Host heap has no handle left for another entry.
	#[error("host heap exhausted: no {kind} handle left")]
	HeapExhausted {
		/// `"table"` or `"object"`.
		kind: &'static str,
	},
	/// Conversion nested deeper than the configured limit.
	#[error("conversion depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// A single container holds more elements than permitted.
	#[error("container too large: count={count}, max={max}")]
	TooManyElements {
		/// Live element count of the table.
		count: usize,
		/// Maximum permitted element count.
		max: usize,
	},
	/// A container re-entered itself while being converted.
	#[error("cycle detected at {kind} {handle}")]
	CycleDetected {
		/// `"table"` or `"object"`.
		kind: &'static str,
		/// Raw handle of the re-entered container.
		handle: u32,
	},
}
