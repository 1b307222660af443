mod allocator;
mod bytestr;
mod convert;
mod error;
mod json;
mod nullable;
mod slot;
mod table;
mod value;

/// Allocation primitive and stock allocators.
pub use allocator::{AllocRequest, Allocator, BudgetAllocator, NodeKind, SystemAllocator};
/// Binary-safe owned string.
pub use bytestr::ByteString;
/// Conversion entry points and options.
pub use convert::{ConvertOptions, Converter, CycleMode, convert_array, convert_object, convert_zval};
/// Error and result aliases.
pub use error::{BridgeError, Result};
/// JSON document projection.
pub use json::{from_json, to_json};
/// Explicit-null field wrapper.
pub use nullable::{Nullable, NullableKind};
/// Mode-checked slot accessors.
pub use slot::{SlotIter, SlotKey, SlotReader, SlotRef, StorageMode, get_hashed_slot, get_packed_slot};
/// Host heap model: tables, objects, handles.
pub use table::{Bucket, HASH_FLAG_PACKED, HT_MAX_SIZE, HT_MIN_SIZE, HashTable, HostHeap, HostObject, ObjectHandle, TableHandle, Zval, numeric_key};
/// Owned value tree types.
pub use value::{Array, ArrayElement, ArrayKey, Kind, Object, Property, STD_CLASS, Value};
