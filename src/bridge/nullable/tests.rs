use crate::bridge::{BridgeError, Kind, Nullable, NullableKind, Value};

#[test]
fn null_of_int_reports_type_mismatch_on_read() {
	let field = Nullable::null_of(NullableKind::Int);
	assert!(field.is_null());
	assert!(field.value().is_none());
	assert_eq!(field.kind(), NullableKind::Int);

	let err = field.int().expect_err("null has no payload");
	assert!(matches!(
		err,
		BridgeError::TypeMismatch {
			expected: "int",
			got: Kind::Null
		}
	));
	assert_eq!(field.opt_int(), None);
}

#[test]
fn present_value_reads_through() {
	let field = Nullable::from_value(Value::new_float(2.5)).expect("float is nullable");
	assert!(!field.is_null());
	assert_eq!(field.kind(), NullableKind::Float);
	assert_eq!(field.float().expect("float payload"), 2.5);
	assert_eq!(field.opt_bool(), None);
	assert!(matches!(field.bool(), Err(BridgeError::TypeMismatch { got: Kind::Float, .. })));
	assert_eq!(field.into_value(), Some(Value::new_float(2.5)));
}

#[test]
fn plain_null_value_cannot_be_wrapped_as_present() {
	let err = Nullable::try_from(Value::new_null()).expect_err("null value has no field kind");
	assert!(matches!(err, BridgeError::TypeMismatch { got: Kind::Null, .. }));
}

#[test]
fn nullable_kind_maps_to_value_kind() {
	assert_eq!(Kind::from(NullableKind::String), Kind::String);
	assert_eq!(Kind::from(NullableKind::Object), Kind::Object);
	assert_eq!(NullableKind::try_from(Kind::Array).expect("array kind"), NullableKind::Array);
}
