use super::next_handle;
use crate::bridge::{BridgeError, HT_MIN_SIZE, HashTable, HostHeap, TableHandle, Zval, numeric_key};

#[test]
fn new_tables_round_capacity_up() {
	assert_eq!(HashTable::new(0).capacity(), HT_MIN_SIZE);
	assert_eq!(HashTable::new(9).capacity(), 16);
	assert!(HashTable::new(4).is_packed());
	assert!(!HashTable::new_hashed(4).is_packed());
}

#[test]
fn packed_push_grows_capacity() {
	let mut table = HashTable::default();
	for value in 0..20 {
		table.push(Zval::Long(value));
	}
	assert!(table.is_packed());
	assert_eq!(table.len(), 20);
	assert_eq!(table.count(), 20);
	assert_eq!(table.capacity(), 32);
	assert_eq!(table.get_index(19), Some(&Zval::Long(19)));
}

#[test]
fn string_key_converts_packed_to_hash_in_order() {
	let mut table = HashTable::default();
	table.push(Zval::from("a"));
	table.push(Zval::from("b"));
	table.insert_key("x", Zval::Long(1));

	assert!(!table.is_packed());
	assert_eq!(table.len(), 3);
	assert_eq!(table.bucket_slot(0).h, 0);
	assert_eq!(table.bucket_slot(1).val, Zval::from("b"));
	assert_eq!(table.bucket_slot(2).key.as_ref().map(|key| key.to_string()), Some("x".to_owned()));
	assert_eq!(table.get_index(1), Some(&Zval::from("b")));
}

#[test]
fn non_sequential_index_converts_to_hash() {
	let mut table = HashTable::default();
	table.insert_index(0, Zval::Long(1));
	table.insert_index(5, Zval::Long(2));
	assert!(!table.is_packed());
	assert_eq!(table.next_free_element(), 6);
	assert_eq!(table.push(Zval::Long(3)), 6);
}

#[test]
fn numeric_string_keys_are_integer_keys() {
	assert_eq!(numeric_key(b"0"), Some(0));
	assert_eq!(numeric_key(b"42"), Some(42));
	assert_eq!(numeric_key(b"-7"), Some(-7));
	assert_eq!(numeric_key(b"-0"), None);
	assert_eq!(numeric_key(b"007"), None);
	assert_eq!(numeric_key(b"1e3"), None);
	assert_eq!(numeric_key(b""), None);
	assert_eq!(numeric_key(b"99999999999999999999"), None);

	let mut table = HashTable::default();
	table.insert_key("0", Zval::Bool(true));
	assert!(table.is_packed(), "\"0\" is index 0");
	assert_eq!(table.get_index(0), Some(&Zval::Bool(true)));
}

#[test]
fn remove_leaves_tombstone_and_update_keeps_position() {
	let mut table = HashTable::new_hashed(8);
	table.insert_key("a", Zval::Long(1));
	table.insert_key("b", Zval::Long(2));
	table.insert_key("c", Zval::Long(3));

	assert_eq!(table.remove_key("b"), Some(Zval::Long(2)));
	assert_eq!(table.len(), 3);
	assert_eq!(table.count(), 2);
	assert!(table.bucket_slot(1).val.is_undef());

	table.insert_key("a", Zval::Long(10));
	assert_eq!(table.bucket_slot(0).val, Zval::Long(10));

	table.insert_key("b", Zval::Long(20));
	assert_eq!(table.len(), 4, "re-added key appends a new slot");
	assert_eq!(table.get_key("b"), Some(&Zval::Long(20)));
}

#[test]
fn packed_remove_leaves_hole() {
	let mut table = HashTable::default();
	table.push(Zval::Long(1));
	table.push(Zval::Long(2));
	assert_eq!(table.remove_index(0), Some(Zval::Long(1)));
	assert!(table.is_packed());
	assert_eq!(table.count(), 1);
	assert!(table.packed_slot(0).is_undef());
	assert_eq!(table.remove_index(0), None);
}

#[test]
fn unknown_handles_are_reported() {
	let heap = HostHeap::new();
	let err = heap.table(TableHandle::from_raw(3)).expect_err("empty heap");
	assert!(matches!(err, BridgeError::InvalidHandle { kind: "table", handle: 3 }));
}

#[test]
fn reinserting_into_packed_hole_moves_key_last() {
	let mut table = HashTable::default();
	table.push(Zval::Long(10));
	table.push(Zval::Long(11));
	table.push(Zval::Long(12));
	table.remove_index(0);
	table.insert_index(0, Zval::Long(99));

	assert!(!table.is_packed(), "a refilled hole leaves packed layout");
	assert_eq!(table.len(), 4);
	assert_eq!(table.count(), 3);
	assert!(table.bucket_slot(0).val.is_undef());
	assert_eq!(table.bucket_slot(3).h, 0);
	assert_eq!(table.bucket_slot(3).val, Zval::Long(99));
	assert_eq!(table.get_index(0), Some(&Zval::Long(99)));
}

#[test]
fn updating_live_packed_slot_stays_in_place() {
	let mut table = HashTable::default();
	table.push(Zval::Long(1));
	table.push(Zval::Long(2));
	table.insert_index(0, Zval::Long(5));

	assert!(table.is_packed());
	assert_eq!(table.len(), 2);
	assert_eq!(table.packed_slot(0), &Zval::Long(5));
}

#[test]
fn verbatim_string_keys_are_not_canonicalized() {
	let mut table = HashTable::new_hashed(8);
	table.insert_str_key("0", Zval::Long(1));
	table.insert_str_key("-7", Zval::Long(2));

	assert_eq!(table.bucket_slot(0).key.as_ref().map(|key| key.to_string()), Some("0".to_owned()));
	assert_eq!(table.get_str_key("0"), Some(&Zval::Long(1)));
	assert_eq!(table.get_str_key("-7"), Some(&Zval::Long(2)));
	assert_eq!(table.get_index(0), None);
}

#[test]
fn property_tables_keep_numeric_names() {
	let mut heap = HostHeap::new();
	let props = heap.properties([("0", Zval::Null), ("1", Zval::Null)]).expect("heap has room");
	let table = heap.table(props).expect("table exists");
	assert!(!table.is_packed());
	assert!(table.bucket_slot(1).key.is_some());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn handles_past_u32_are_refused() {
	assert!(matches!(next_handle(u32::MAX as usize, "table"), Ok(u32::MAX)));
	let err = next_handle(u32::MAX as usize + 1, "object").expect_err("no handle left");
	assert!(matches!(err, BridgeError::HeapExhausted { kind: "object" }));
}
