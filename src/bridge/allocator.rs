use crate::bridge::{BridgeError, Result};

/// Node kinds the converter requests memory for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// One `Value` node.
	Value,
	/// Element storage of one array.
	ArrayElements,
	/// Property storage of one object.
	Properties,
	/// String, key, or class-name bytes.
	StringBytes,
}

impl NodeKind {
	/// Stable name used in errors and logs.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Value => "value",
			Self::ArrayElements => "array elements",
			Self::Properties => "properties",
			Self::StringBytes => "string bytes",
		}
	}
}

/// One allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocRequest {
	/// What the memory is for.
	pub node: NodeKind,
	/// Requested byte count.
	pub bytes: usize,
}

/// Allocation primitive supplied by the embedding host.
///
/// The converter calls it before building each node and propagates a refusal
/// as `AllocationFailure`.
pub trait Allocator {
	/// Grant or refuse `request`.
	fn allocate(&mut self, request: AllocRequest) -> Result<()>;
}

impl<A: Allocator + ?Sized> Allocator for &mut A {
	fn allocate(&mut self, request: AllocRequest) -> Result<()> {
		(**self).allocate(request)
	}
}

/// Grants every request; the process allocator backs the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
	fn allocate(&mut self, _request: AllocRequest) -> Result<()> {
		Ok(())
	}
}

/// Grants requests until a fixed byte budget is spent.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
	limit: usize,
	used: usize,
}

impl BudgetAllocator {
	/// Budget of `limit` bytes.
	pub fn new(limit: usize) -> Self {
		Self { limit, used: 0 }
	}

	/// Bytes granted so far.
	pub fn used(&self) -> usize {
		self.used
	}

	/// Bytes still available.
	pub fn remaining(&self) -> usize {
		self.limit.saturating_sub(self.used)
	}
}

impl Allocator for BudgetAllocator {
	fn allocate(&mut self, request: AllocRequest) -> Result<()> {
		if request.bytes > self.remaining() {
			return Err(BridgeError::AllocationFailure {
				node: request.node.as_str(),
				bytes: request.bytes,
			});
		}
		self.used += request.bytes;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn budget_refuses_past_limit() {
		let mut budget = BudgetAllocator::new(10);
		budget
			.allocate(AllocRequest {
				node: NodeKind::Value,
				bytes: 8,
			})
			.expect("fits");
		assert_eq!(budget.remaining(), 2);

		let err = budget
			.allocate(AllocRequest {
				node: NodeKind::StringBytes,
				bytes: 3,
			})
			.expect_err("over budget");
		assert!(matches!(
			err,
			BridgeError::AllocationFailure {
				node: "string bytes",
				bytes: 3
			}
		));
		assert_eq!(budget.used(), 8, "refused requests are not charged");
	}
}
