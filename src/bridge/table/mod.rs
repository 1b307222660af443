//! In-process model of the host runtime's heap: hash tables in packed or
//! hashed layout, objects, and the handles that name them.
//!
//! The layout mirrors the host's physical representation closely enough for
//! the slot accessor to read it the same way it would read host memory:
//! a flag word, a used-slot count that includes tombstones, an allocated
//! capacity, and either a packed value array or a bucket array.

use std::collections::HashMap;

use crate::bridge::{BridgeError, ByteString, Result};

/// Flag bit marking a table as packed.
pub const HASH_FLAG_PACKED: u32 = 1 << 2;
/// Smallest capacity a table is initialized with.
pub const HT_MIN_SIZE: u32 = 8;
/// Largest capacity a table may grow to.
pub const HT_MAX_SIZE: u32 = 1 << 30;

/// Opaque handle naming a hash table in a [`HostHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableHandle(u32);

/// Opaque handle naming an object in a [`HostHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u32);

impl TableHandle {
	/// Wrap a raw handle value received from the host.
	pub fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	/// Raw handle value.
	pub fn raw(self) -> u32 {
		self.0
	}
}

impl ObjectHandle {
	/// Wrap a raw handle value received from the host.
	pub fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	/// Raw handle value.
	pub fn raw(self) -> u32 {
		self.0
	}
}

/// Host value as stored in a table slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Zval {
	/// Unused or deleted slot.
	Undef,
	/// Null.
	Null,
	/// Boolean.
	Bool(bool),
	/// Integer.
	Long(i64),
	/// Float.
	Double(f64),
	/// Binary-safe string.
	String(ByteString),
	/// Nested array.
	Array(TableHandle),
	/// Object.
	Object(ObjectHandle),
}

impl Zval {
	/// Return whether this slot is unused or deleted.
	pub fn is_undef(&self) -> bool {
		matches!(self, Self::Undef)
	}
}

impl From<&str> for Zval {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}

impl From<i64> for Zval {
	fn from(value: i64) -> Self {
		Self::Long(value)
	}
}

impl From<f64> for Zval {
	fn from(value: f64) -> Self {
		Self::Double(value)
	}
}

impl From<bool> for Zval {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// One hashed-layout slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
	/// Stored value; `Undef` for deleted slots.
	pub val: Zval,
	/// Integer key, or the hash of `key` when a string key is present.
	pub h: i64,
	/// String key; `None` for integer-keyed slots.
	pub key: Option<ByteString>,
}

impl Bucket {
	const EMPTY: Bucket = Bucket {
		val: Zval::Undef,
		h: 0,
		key: None,
	};
}

static UNDEF_SLOT: Zval = Zval::Undef;
static EMPTY_BUCKET: Bucket = Bucket::EMPTY;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LookupKey {
	Int(i64),
	Str(ByteString),
}

/// Host hash table in packed or hashed layout.
#[derive(Debug, Clone)]
pub struct HashTable {
	flags: u32,
	n_num_used: u32,
	n_num_of_elements: u32,
	n_table_size: u32,
	n_next_free_element: i64,
	packed: Vec<Zval>,
	buckets: Vec<Bucket>,
	lookup: HashMap<LookupKey, u32>,
}

impl HashTable {
	/// Initialize an empty packed table sized for `n_size` elements.
	pub fn new(n_size: u32) -> Self {
		Self {
			flags: HASH_FLAG_PACKED,
			n_num_used: 0,
			n_num_of_elements: 0,
			n_table_size: check_size(n_size),
			n_next_free_element: 0,
			packed: Vec::new(),
			buckets: Vec::new(),
			lookup: HashMap::new(),
		}
	}

	/// Initialize an empty hashed table sized for `n_size` elements.
	pub fn new_hashed(n_size: u32) -> Self {
		let mut table = Self::new(n_size);
		table.flags &= !HASH_FLAG_PACKED;
		table
	}

	/// Raw flag word.
	pub fn flags(&self) -> u32 {
		self.flags
	}

	/// Return whether the table uses the packed layout.
	pub fn is_packed(&self) -> bool {
		self.flags & HASH_FLAG_PACKED != 0
	}

	/// Used slot count, tombstones included.
	pub fn len(&self) -> u32 {
		self.n_num_used
	}

	/// Live element count.
	pub fn count(&self) -> u32 {
		self.n_num_of_elements
	}

	/// Return whether no live elements remain.
	pub fn is_empty(&self) -> bool {
		self.n_num_of_elements == 0
	}

	/// Allocated slot count.
	pub fn capacity(&self) -> u32 {
		self.n_table_size
	}

	/// Next integer key `push` will use.
	pub fn next_free_element(&self) -> i64 {
		self.n_next_free_element
	}

	/// Packed slot storage. Slots between `len` and `capacity` read as `Undef`.
	pub(crate) fn packed_slot(&self, index: u32) -> &Zval {
		self.packed.get(index as usize).unwrap_or(&UNDEF_SLOT)
	}

	/// Bucket storage. Slots between `len` and `capacity` read as empty buckets.
	pub(crate) fn bucket_slot(&self, index: u32) -> &Bucket {
		self.buckets.get(index as usize).unwrap_or(&EMPTY_BUCKET)
	}

	/// Append under the next free integer key.
	pub fn push(&mut self, value: Zval) -> i64 {
		let index = self.n_next_free_element;
		self.insert_index(index, value);
		index
	}

	/// Insert or update an integer key.
	pub fn insert_index(&mut self, index: i64, value: Zval) {
		let value = stored(value);
		if index >= self.n_next_free_element {
			self.n_next_free_element = index.saturating_add(1);
		}

		if self.is_packed() {
			// Holes are never refilled in place: a re-inserted key goes last.
			match u32::try_from(index) {
				Ok(slot) if slot < self.n_num_used && !self.packed[slot as usize].is_undef() => {
					self.packed[slot as usize] = value;
					return;
				}
				Ok(slot) if slot == self.n_num_used => {
					self.reserve_slot();
					self.packed.push(value);
					self.n_num_used += 1;
					self.n_num_of_elements += 1;
					return;
				}
				_ => self.packed_to_hash(),
			}
		}

		self.insert_bucket(LookupKey::Int(index), index, None, value);
	}

	/// Insert or update a string key. Canonical decimal integer strings are
	/// stored as integer keys, as the host does for array keys.
	pub fn insert_key(&mut self, key: impl Into<ByteString>, value: Zval) {
		let key = key.into();
		if let Some(index) = numeric_key(key.as_bytes()) {
			self.insert_index(index, value);
			return;
		}
		self.insert_str_key(key, value);
	}

	/// Insert or update a string key verbatim, without integer
	/// canonicalization. Object property tables are filled this way.
	pub fn insert_str_key(&mut self, key: impl Into<ByteString>, value: Zval) {
		let key = key.into();
		if self.is_packed() {
			self.packed_to_hash();
		}
		let h = hash_key(key.as_bytes());
		self.insert_bucket(LookupKey::Str(key.clone()), h, Some(key), stored(value));
	}

	/// Delete an integer key, leaving a tombstone in its slot.
	pub fn remove_index(&mut self, index: i64) -> Option<Zval> {
		if self.is_packed() {
			let slot = usize::try_from(index).ok()?;
			let target = self.packed.get_mut(slot)?;
			if target.is_undef() {
				return None;
			}
			self.n_num_of_elements -= 1;
			return Some(std::mem::replace(target, Zval::Undef));
		}
		self.remove_bucket(&LookupKey::Int(index))
	}

	/// Delete a string key, leaving a tombstone in its slot.
	pub fn remove_key(&mut self, key: impl AsRef<[u8]>) -> Option<Zval> {
		let key = key.as_ref();
		if let Some(index) = numeric_key(key) {
			return self.remove_index(index);
		}
		if self.is_packed() {
			return None;
		}
		self.remove_bucket(&LookupKey::Str(ByteString::new(key)))
	}

	/// Look up an integer key.
	pub fn get_index(&self, index: i64) -> Option<&Zval> {
		if self.is_packed() {
			let slot = usize::try_from(index).ok()?;
			return self.packed.get(slot).filter(|value| !value.is_undef());
		}
		let slot = *self.lookup.get(&LookupKey::Int(index))?;
		Some(&self.buckets[slot as usize].val)
	}

	/// Look up a string key.
	pub fn get_key(&self, key: impl AsRef<[u8]>) -> Option<&Zval> {
		let key = key.as_ref();
		if let Some(index) = numeric_key(key) {
			return self.get_index(index);
		}
		let slot = *self.lookup.get(&LookupKey::Str(ByteString::new(key)))?;
		Some(&self.buckets[slot as usize].val)
	}

	/// Look up a string key verbatim, without integer canonicalization.
	pub fn get_str_key(&self, key: impl AsRef<[u8]>) -> Option<&Zval> {
		let slot = *self.lookup.get(&LookupKey::Str(ByteString::new(key)))?;
		Some(&self.buckets[slot as usize].val)
	}

	fn insert_bucket(&mut self, lookup: LookupKey, h: i64, key: Option<ByteString>, val: Zval) {
		if let Some(&slot) = self.lookup.get(&lookup) {
			self.buckets[slot as usize].val = val;
			return;
		}

		self.reserve_slot();
		let slot = self.n_num_used;
		self.buckets.push(Bucket { val, h, key });
		self.lookup.insert(lookup, slot);
		self.n_num_used += 1;
		self.n_num_of_elements += 1;
	}

	fn remove_bucket(&mut self, lookup: &LookupKey) -> Option<Zval> {
		let slot = self.lookup.remove(lookup)?;
		self.n_num_of_elements -= 1;
		Some(std::mem::replace(&mut self.buckets[slot as usize].val, Zval::Undef))
	}

	fn reserve_slot(&mut self) {
		if self.n_num_used >= self.n_table_size {
			self.n_table_size = self.n_table_size.saturating_mul(2).min(HT_MAX_SIZE);
		}
	}

	// Slot positions are kept, tombstones included, so iteration order survives.
	fn packed_to_hash(&mut self) {
		let packed = std::mem::take(&mut self.packed);
		self.buckets = Vec::with_capacity(packed.len());
		for (slot, val) in packed.into_iter().enumerate() {
			let index = slot as i64;
			if !val.is_undef() {
				self.lookup.insert(LookupKey::Int(index), slot as u32);
			}
			self.buckets.push(Bucket { val, h: index, key: None });
		}
		self.flags &= !HASH_FLAG_PACKED;
	}
}

impl Default for HashTable {
	fn default() -> Self {
		Self::new(HT_MIN_SIZE)
	}
}

fn stored(value: Zval) -> Zval {
	// Undef only ever marks tombstones.
	match value {
		Zval::Undef => Zval::Null,
		other => other,
	}
}

fn check_size(n_size: u32) -> u32 {
	n_size.clamp(HT_MIN_SIZE, HT_MAX_SIZE).next_power_of_two()
}

/// Parse a canonical decimal integer key (`"0"`, `"42"`, `"-7"`).
///
/// Leading zeros, `"-0"`, signs other than a leading `-`, and values outside
/// `i64` are not canonical and stay string keys.
pub fn numeric_key(bytes: &[u8]) -> Option<i64> {
	let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
	match digits {
		[] => return None,
		[b'0'] if digits.len() == bytes.len() => return Some(0),
		[b'0', ..] => return None,
		_ => {}
	}
	if !digits.iter().all(u8::is_ascii_digit) {
		return None;
	}
	std::str::from_utf8(bytes).ok()?.parse().ok()
}

// DJBX33A, the host's string hash.
fn hash_key(bytes: &[u8]) -> i64 {
	let hash = bytes
		.iter()
		.fold(5381_u64, |hash, byte| hash.wrapping_mul(33).wrapping_add(u64::from(*byte)));
	(hash | 0x8000_0000_0000_0000) as i64
}

/// Host object: optional class name plus a property table.
#[derive(Debug, Clone)]
pub struct HostObject {
	/// Class name; `None` for anonymous objects.
	pub class_name: Option<ByteString>,
	/// Property table; every live slot carries a string key.
	pub properties: TableHandle,
}

/// Handle-addressed store of host tables and objects.
///
/// Handles are `u32`, so each store holds at most `u32::MAX + 1` entries;
/// inserting past that fails with `HeapExhausted`.
#[derive(Debug, Default)]
pub struct HostHeap {
	tables: Vec<HashTable>,
	objects: Vec<HostObject>,
}

impl HostHeap {
	/// Empty heap.
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a table and return its handle.
	pub fn insert_table(&mut self, table: HashTable) -> Result<TableHandle> {
		let handle = TableHandle(next_handle(self.tables.len(), "table")?);
		self.tables.push(table);
		Ok(handle)
	}

	/// Resolve a table handle.
	pub fn table(&self, handle: TableHandle) -> Result<&HashTable> {
		self.tables.get(handle.0 as usize).ok_or(BridgeError::InvalidHandle {
			kind: "table",
			handle: handle.0,
		})
	}

	/// Resolve a table handle for mutation.
	pub fn table_mut(&mut self, handle: TableHandle) -> Result<&mut HashTable> {
		self.tables.get_mut(handle.0 as usize).ok_or(BridgeError::InvalidHandle {
			kind: "table",
			handle: handle.0,
		})
	}

	/// Store an object and return its handle.
	pub fn insert_object(&mut self, class_name: Option<&str>, properties: TableHandle) -> Result<ObjectHandle> {
		let handle = ObjectHandle(next_handle(self.objects.len(), "object")?);
		self.objects.push(HostObject {
			class_name: class_name.map(ByteString::from),
			properties,
		});
		Ok(handle)
	}

	/// Resolve an object handle.
	pub fn object(&self, handle: ObjectHandle) -> Result<&HostObject> {
		self.objects.get(handle.0 as usize).ok_or(BridgeError::InvalidHandle {
			kind: "object",
			handle: handle.0,
		})
	}

	/// Store a packed table holding `values` at keys `0..n`.
	pub fn packed(&mut self, values: impl IntoIterator<Item = Zval>) -> Result<TableHandle> {
		let mut table = HashTable::default();
		for value in values {
			table.push(value);
		}
		self.insert_table(table)
	}

	/// Store a hashed table holding `pairs` in order. Numeric string keys
	/// become integer keys.
	pub fn hashed<K: Into<ByteString>>(&mut self, pairs: impl IntoIterator<Item = (K, Zval)>) -> Result<TableHandle> {
		let mut table = HashTable::new_hashed(HT_MIN_SIZE);
		for (key, value) in pairs {
			table.insert_key(key, value);
		}
		self.insert_table(table)
	}

	/// Store a property table holding `pairs` in order. Names are kept as
	/// string keys even when they look numeric.
	pub fn properties<K: Into<ByteString>>(&mut self, pairs: impl IntoIterator<Item = (K, Zval)>) -> Result<TableHandle> {
		let mut table = HashTable::new_hashed(HT_MIN_SIZE);
		for (name, value) in pairs {
			table.insert_str_key(name, value);
		}
		self.insert_table(table)
	}

	/// Store an object whose properties are `pairs` in order.
	pub fn object_with<K: Into<ByteString>>(&mut self, class_name: Option<&str>, pairs: impl IntoIterator<Item = (K, Zval)>) -> Result<ObjectHandle> {
		let properties = self.properties(pairs)?;
		self.insert_object(class_name, properties)
	}
}

fn next_handle(len: usize, kind: &'static str) -> Result<u32> {
	u32::try_from(len).map_err(|_| BridgeError::HeapExhausted { kind })
}

#[cfg(test)]
mod tests;
