use std::fmt;

use crate::bridge::{BridgeError, Bucket, ByteString, HashTable, Result, Zval};

/// Physical storage layout of a hash table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMode {
	/// Dense value array indexed by slot.
	Packed,
	/// Bucket array carrying per-slot keys.
	Hashed,
}

impl StorageMode {
	/// Read the mode from the table's flag word.
	pub fn of(table: &HashTable) -> Self {
		if table.is_packed() { Self::Packed } else { Self::Hashed }
	}
}

impl fmt::Display for StorageMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Packed => "packed",
			Self::Hashed => "hashed",
		})
	}
}

fn check_bounds(table: &HashTable, index: u32) -> Result<()> {
	if index >= table.capacity() {
		return Err(BridgeError::IndexOutOfRange {
			index,
			capacity: table.capacity(),
		});
	}
	Ok(())
}

/// Borrow a packed slot. `None` when the table is hashed.
pub fn get_packed_slot(table: &HashTable, index: u32) -> Result<Option<&Zval>> {
	check_bounds(table, index)?;
	if !table.is_packed() {
		return Ok(None);
	}
	Ok(Some(table.packed_slot(index)))
}

/// Borrow a hashed slot. `None` when the table is packed.
pub fn get_hashed_slot(table: &HashTable, index: u32) -> Result<Option<&Bucket>> {
	check_bounds(table, index)?;
	if table.is_packed() {
		return Ok(None);
	}
	Ok(Some(table.bucket_slot(index)))
}

/// Key carried by a live slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKey<'a> {
	/// No string key: the slot position (packed) or integer key (hashed).
	Index(i64),
	/// String key.
	Key(&'a ByteString),
}

/// Borrowed view of one live slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotRef<'a> {
	/// Physical slot index.
	pub slot: u32,
	/// Slot key.
	pub key: SlotKey<'a>,
	/// Slot value; never `Undef`.
	pub value: &'a Zval,
}

/// Slot reader bound to one table whose storage mode is read once.
#[derive(Debug, Clone, Copy)]
pub struct SlotReader<'a> {
	table: &'a HashTable,
	mode: StorageMode,
}

impl<'a> SlotReader<'a> {
	/// Bind to `table`, fixing its storage mode for all later reads.
	pub fn new(table: &'a HashTable) -> Self {
		Self {
			table,
			mode: StorageMode::of(table),
		}
	}

	/// Bind with a mode recorded earlier by the caller.
	///
	/// Reads report `WrongStorageMode` when the table disagrees.
	pub fn with_mode(table: &'a HashTable, mode: StorageMode) -> Self {
		Self { table, mode }
	}

	/// Storage mode fixed at construction.
	pub fn mode(&self) -> StorageMode {
		self.mode
	}

	/// Used slot count of the bound table.
	pub fn len(&self) -> u32 {
		self.table.len()
	}

	/// Return whether the bound table has no used slots.
	pub fn is_empty(&self) -> bool {
		self.table.len() == 0
	}

	/// Read one slot through the accessor matching the fixed mode.
	///
	/// Returns `None` for tombstones.
	pub fn read(&self, slot: u32) -> Result<Option<SlotRef<'a>>> {
		let (key, value) = match self.mode {
			StorageMode::Packed => {
				let value = get_packed_slot(self.table, slot)?.ok_or_else(|| self.wrong_mode())?;
				(SlotKey::Index(i64::from(slot)), value)
			}
			StorageMode::Hashed => {
				let bucket = get_hashed_slot(self.table, slot)?.ok_or_else(|| self.wrong_mode())?;
				let key = match &bucket.key {
					Some(key) => SlotKey::Key(key),
					None => SlotKey::Index(bucket.h),
				};
				(key, &bucket.val)
			}
		};

		if value.is_undef() {
			return Ok(None);
		}
		Ok(Some(SlotRef { slot, key, value }))
	}

	/// Iterate live slots in physical order.
	pub fn slots(self) -> SlotIter<'a> {
		SlotIter {
			reader: self,
			pos: 0,
			done: false,
		}
	}

	fn wrong_mode(&self) -> BridgeError {
		BridgeError::WrongStorageMode {
			expected: self.mode,
			actual: StorageMode::of(self.table),
		}
	}
}

/// Iterator over the live slots of one table.
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
	reader: SlotReader<'a>,
	pos: u32,
	done: bool,
}

impl<'a> SlotIter<'a> {
	/// Reader this iterator walks.
	pub fn reader(&self) -> SlotReader<'a> {
		self.reader
	}
}

impl<'a> Iterator for SlotIter<'a> {
	type Item = Result<SlotRef<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		while !self.done && self.pos < self.reader.len() {
			let slot = self.pos;
			self.pos += 1;
			match self.reader.read(slot) {
				Ok(Some(item)) => return Some(Ok(item)),
				Ok(None) => continue,
				Err(err) => {
					self.done = true;
					return Some(Err(err));
				}
			}
		}
		self.done = true;
		None
	}
}

#[cfg(test)]
mod tests;
