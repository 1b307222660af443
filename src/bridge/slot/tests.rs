use crate::bridge::{BridgeError, HashTable, SlotKey, SlotReader, StorageMode, Zval, get_hashed_slot, get_packed_slot};

fn packed_ab() -> HashTable {
	let mut table = HashTable::default();
	table.push(Zval::from("a"));
	table.push(Zval::from("b"));
	table
}

fn hashed_xy() -> HashTable {
	let mut table = HashTable::new_hashed(8);
	table.insert_key("x", Zval::Long(1));
	table.insert_key("y", Zval::Long(2));
	table
}

#[test]
fn packed_table_only_answers_packed_reads() {
	let table = packed_ab();
	assert_eq!(StorageMode::of(&table), StorageMode::Packed);
	for index in 0..table.capacity() {
		assert!(get_hashed_slot(&table, index).expect("in range").is_none());
		assert!(get_packed_slot(&table, index).expect("in range").is_some());
	}
	assert_eq!(get_packed_slot(&table, 1).expect("in range"), Some(&Zval::from("b")));
}

#[test]
fn hashed_table_only_answers_hashed_reads() {
	let table = hashed_xy();
	assert_eq!(StorageMode::of(&table), StorageMode::Hashed);
	for index in 0..table.capacity() {
		assert!(get_packed_slot(&table, index).expect("in range").is_none());
		assert!(get_hashed_slot(&table, index).expect("in range").is_some());
	}
}

#[test]
fn slots_past_used_length_read_as_undef() {
	let table = packed_ab();
	let slot = get_packed_slot(&table, table.capacity() - 1).expect("in range").expect("packed");
	assert!(slot.is_undef());
}

#[test]
fn index_at_capacity_is_out_of_range() {
	let table = hashed_xy();
	let err = get_hashed_slot(&table, table.capacity()).expect_err("capacity is exclusive");
	assert!(matches!(err, BridgeError::IndexOutOfRange { index: 8, capacity: 8 }));

	let err = get_packed_slot(&table, 1000).expect_err("far out of range");
	assert!(matches!(err, BridgeError::IndexOutOfRange { index: 1000, .. }));
}

#[test]
fn reader_classifies_keys_and_skips_tombstones() {
	let mut table = hashed_xy();
	table.insert_index(7, Zval::Null);
	table.remove_key("x");

	let reader = SlotReader::new(&table);
	assert_eq!(reader.mode(), StorageMode::Hashed);
	assert!(reader.read(0).expect("in range").is_none(), "tombstone");

	let slots: Vec<_> = reader.slots().collect::<Result<_, _>>().expect("walk succeeds");
	assert_eq!(slots.len(), 2);
	assert_eq!(slots[0].slot, 1);
	assert!(matches!(slots[0].key, SlotKey::Key(key) if key == "y"));
	assert_eq!(slots[1].key, SlotKey::Index(7));
	assert_eq!(slots[1].value, &Zval::Null);
}

#[test]
fn misrouted_reader_reports_wrong_storage_mode() {
	let table = packed_ab();
	let reader = SlotReader::with_mode(&table, StorageMode::Hashed);
	let err = reader.read(0).expect_err("table is packed");
	assert!(matches!(
		err,
		BridgeError::WrongStorageMode {
			expected: StorageMode::Hashed,
			actual: StorageMode::Packed
		}
	));

	let mut slots = reader.slots();
	assert!(matches!(slots.next(), Some(Err(BridgeError::WrongStorageMode { .. }))));
	assert!(slots.next().is_none(), "iteration stops after an error");
}
