//! Convert host runtime hash tables and objects into owned, tagged value trees.

/// Host heap model, slot accessors, conversion, and the output value model.
pub mod bridge;
