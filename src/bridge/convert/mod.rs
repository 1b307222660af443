use std::collections::HashSet;
use std::mem::size_of;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::bridge::{
	AllocRequest, Allocator, Array, ArrayElement, BridgeError, HostHeap, NodeKind, Object, ObjectHandle, Property, Result, SlotIter, SlotKey,
	SlotReader, SlotRef, SystemAllocator, TableHandle, Value, Zval,
};

const VALUE_SIZE: usize = size_of::<Value>();

/// Action taken when a container is re-entered while it is being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
	/// Abort with `CycleDetected`.
	#[default]
	Error,
	/// Convert the re-entering slot to `Value::Null` and continue.
	Null,
}

/// Runtime limits and behavior switches for conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
	/// Maximum container nesting depth.
	pub max_depth: u32,
	/// Maximum live element count of a single container.
	pub max_elements: usize,
	/// Cycle handling.
	pub on_cycle: CycleMode,
}

impl Default for ConvertOptions {
	fn default() -> Self {
		Self {
			max_depth: 512,
			max_elements: 1 << 20,
			on_cycle: CycleMode::Error,
		}
	}
}

impl ConvertOptions {
	/// Preset that cuts cycles to null instead of failing.
	pub fn lenient() -> Self {
		Self {
			on_cycle: CycleMode::Null,
			..Self::default()
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
	Table(TableHandle),
	Object(ObjectHandle),
}

impl Node {
	fn kind(self) -> &'static str {
		match self {
			Self::Table(_) => "table",
			Self::Object(_) => "object",
		}
	}

	fn raw(self) -> u32 {
		match self {
			Self::Table(handle) => handle.raw(),
			Self::Object(handle) => handle.raw(),
		}
	}
}

enum Visit {
	Leaf(Value),
	Descend(Node),
}

enum Out {
	Array(Array),
	Object(Object),
}

struct Frame<'h> {
	node: Node,
	slots: SlotIter<'h>,
	out: Out,
}

impl<'h> Frame<'h> {
	fn attach(&mut self, slot: &SlotRef<'h>, value: Value) -> Result<()> {
		match (&mut self.out, slot.key) {
			(Out::Array(array), SlotKey::Index(index)) => array.push_index(index, value),
			(Out::Array(array), SlotKey::Key(key)) => array.push_key(key.clone(), value),
			(Out::Object(object), SlotKey::Key(name)) => object.properties.push(Property { name: name.clone(), value }),
			(Out::Object(_), SlotKey::Index(_)) => return Err(BridgeError::InvalidKeyForObject { slot: slot.slot }),
		}
		Ok(())
	}

	// Replaces the null placeholder attached when the walk descended.
	fn fill_last(&mut self, value: Value) {
		let last = match &mut self.out {
			Out::Array(array) => array.last_value_mut(),
			Out::Object(object) => object.properties.last_mut().map(|prop| &mut prop.value),
		};
		if let Some(last) = last {
			*last = value;
		}
	}

	fn len(&self) -> usize {
		match &self.out {
			Out::Array(array) => array.len(),
			Out::Object(object) => object.len(),
		}
	}

	fn finish(self) -> Value {
		match self.out {
			Out::Array(array) => Value::Array(array),
			Out::Object(object) => Value::Object(object),
		}
	}
}

/// Converts host containers on one heap into owned value trees.
///
/// The walk is iterative: nesting depth costs heap frames, not native stack.
/// Containers on the current path are tracked so self-reference is caught;
/// the same container reached through sibling slots is converted each time.
pub struct Converter<'h, A = SystemAllocator> {
	heap: &'h HostHeap,
	options: ConvertOptions,
	alloc: A,
}

impl<'h> Converter<'h> {
	/// Converter backed by the process allocator.
	pub fn new(heap: &'h HostHeap, options: ConvertOptions) -> Self {
		Self::with_allocator(heap, options, SystemAllocator)
	}
}

impl<'h, A: Allocator> Converter<'h, A> {
	/// Converter that requests node memory from `alloc`.
	pub fn with_allocator(heap: &'h HostHeap, options: ConvertOptions, alloc: A) -> Self {
		Self { heap, options, alloc }
	}

	/// Active options.
	pub fn options(&self) -> &ConvertOptions {
		&self.options
	}

	/// Allocator collaborator.
	pub fn allocator(&self) -> &A {
		&self.alloc
	}

	/// Consume the converter, returning its allocator.
	pub fn into_allocator(self) -> A {
		self.alloc
	}

	/// Convert the table behind `handle` into an array.
	pub fn convert_array(&mut self, handle: TableHandle) -> Result<Array> {
		self.walk(Node::Table(handle))?.into_array()
	}

	/// Convert the object behind `handle`; every property slot must carry a string key.
	pub fn convert_object(&mut self, handle: ObjectHandle) -> Result<Object> {
		self.walk(Node::Object(handle))?.into_object()
	}

	/// Convert any host value.
	pub fn convert_zval(&mut self, zval: &Zval) -> Result<Value> {
		match self.visit(zval)? {
			Visit::Leaf(value) => Ok(value),
			Visit::Descend(node) => self.walk(node),
		}
	}

	fn walk(&mut self, root: Node) -> Result<Value> {
		debug!(kind = root.kind(), handle = root.raw(), "converting host container");

		let mut on_path = HashSet::from([root]);
		let mut root_frame = self.open(root, 0)?;
		let mut nested: Vec<Frame<'h>> = Vec::new();

		loop {
			let frame = nested.last_mut().unwrap_or(&mut root_frame);
			let Some(slot) = frame.slots.next().transpose()? else {
				let Some(done) = nested.pop() else {
					break;
				};
				on_path.remove(&done.node);
				let value = done.finish();
				nested.last_mut().unwrap_or(&mut root_frame).fill_last(value);
				continue;
			};

			if let SlotKey::Key(name) = slot.key {
				self.allocate(NodeKind::StringBytes, name.len())?;
			}

			match self.visit(slot.value)? {
				Visit::Leaf(value) => frame.attach(&slot, value)?,
				Visit::Descend(node) if on_path.contains(&node) => match self.options.on_cycle {
					CycleMode::Error => {
						return Err(BridgeError::CycleDetected {
							kind: node.kind(),
							handle: node.raw(),
						});
					}
					CycleMode::Null => {
						warn!(kind = node.kind(), handle = node.raw(), slot = slot.slot, "cycle cut to null");
						self.allocate(NodeKind::Value, VALUE_SIZE)?;
						frame.attach(&slot, Value::Null)?;
					}
				},
				Visit::Descend(node) => {
					frame.attach(&slot, Value::Null)?;
					let depth = nested.len() as u32 + 1;
					let child = self.open(node, depth)?;
					trace!(kind = node.kind(), handle = node.raw(), depth, "descending");
					on_path.insert(node);
					nested.push(child);
				}
			}
		}

		debug!(kind = root.kind(), handle = root.raw(), elements = root_frame.len(), "converted host container");
		Ok(root_frame.finish())
	}

	fn open(&mut self, node: Node, depth: u32) -> Result<Frame<'h>> {
		if depth >= self.options.max_depth {
			return Err(BridgeError::DepthExceeded {
				max_depth: self.options.max_depth,
			});
		}

		let heap = self.heap;
		let (table, mut out) = match node {
			Node::Table(handle) => (heap.table(handle)?, Out::Array(Array::new())),
			Node::Object(handle) => {
				let object = heap.object(handle)?;
				if let Some(name) = &object.class_name {
					self.allocate(NodeKind::StringBytes, name.len())?;
				}
				let out = Out::Object(Object {
					class_name: object.class_name.clone(),
					properties: Vec::new(),
				});
				(heap.table(object.properties)?, out)
			}
		};

		let count = table.count() as usize;
		if count > self.options.max_elements {
			return Err(BridgeError::TooManyElements {
				count,
				max: self.options.max_elements,
			});
		}

		self.allocate(NodeKind::Value, VALUE_SIZE)?;
		match &mut out {
			Out::Array(array) => {
				self.allocate(NodeKind::ArrayElements, count.saturating_mul(size_of::<ArrayElement>()))?;
				array.try_reserve(count)?;
			}
			Out::Object(object) => {
				let bytes = count.saturating_mul(size_of::<Property>());
				self.allocate(NodeKind::Properties, bytes)?;
				object
					.properties
					.try_reserve_exact(count)
					.map_err(|_| BridgeError::AllocationFailure {
						node: NodeKind::Properties.as_str(),
						bytes,
					})?;
			}
		}

		Ok(Frame {
			node,
			slots: SlotReader::new(table).slots(),
			out,
		})
	}

	fn visit(&mut self, zval: &Zval) -> Result<Visit> {
		let value = match zval {
			Zval::Array(handle) => return Ok(Visit::Descend(Node::Table(*handle))),
			Zval::Object(handle) => return Ok(Visit::Descend(Node::Object(*handle))),
			Zval::Undef | Zval::Null => Value::Null,
			Zval::Bool(value) => Value::Bool(*value),
			Zval::Long(value) => Value::Int(*value),
			Zval::Double(value) => Value::Float(*value),
			Zval::String(bytes) => {
				self.allocate(NodeKind::StringBytes, bytes.len())?;
				Value::String(bytes.clone())
			}
		};
		self.allocate(NodeKind::Value, VALUE_SIZE)?;
		Ok(Visit::Leaf(value))
	}

	fn allocate(&mut self, node: NodeKind, bytes: usize) -> Result<()> {
		self.alloc.allocate(AllocRequest { node, bytes })
	}
}

/// Convert the table behind `handle` using the process allocator.
pub fn convert_array(heap: &HostHeap, handle: TableHandle, options: &ConvertOptions) -> Result<Array> {
	Converter::new(heap, options.clone()).convert_array(handle)
}

/// Convert the object behind `handle` using the process allocator.
pub fn convert_object(heap: &HostHeap, handle: ObjectHandle, options: &ConvertOptions) -> Result<Object> {
	Converter::new(heap, options.clone()).convert_object(handle)
}

/// Convert any host value using the process allocator.
pub fn convert_zval(heap: &HostHeap, zval: &Zval, options: &ConvertOptions) -> Result<Value> {
	Converter::new(heap, options.clone()).convert_zval(zval)
}
