//! # Error Types for the AVL Tree
//!
//! Ordinary boundary cases of the tree (a duplicate key on `add`, a missing key on `remove`, an
//! empty tree on `min`) are not errors: they are reported as `false` or `None` by the operation
//! itself.
//!
//! The only fallible operation is [`Tree::validate`](crate::Tree::validate), which walks the whole
//! structure and reports the first broken invariant it finds. A well-behaved tree never produces
//! one of these; seeing one means a key type with an inconsistent `Ord`, or a bug.

use thiserror::Error;

/// A structural invariant that does not hold.
///
/// `depth` is the distance from the root of the offending node (the root is at depth 0).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// In-order traversal met a key that is not strictly greater than its predecessor.
	///
	/// This only happens if the key type's `Ord` implementation is not a total order, or if it
	/// changed for a key while that key was stored in the tree (for example via interior
	/// mutability).
	#[error("key at depth {depth} is out of order")]
	OutOfOrder {
		depth: usize,
	},

	/// The cached height of a node is not `1 + max(height(left), height(right))`.
	#[error("node at depth {depth} caches height {cached} but its subtree has height {computed}")]
	HeightMismatch {
		depth: usize,
		cached: usize,
		computed: usize,
	},

	/// The balance factor of a node is outside `{-1, 0, 1}`.
	#[error("node at depth {depth} has balance factor {balance}")]
	Unbalanced {
		depth: usize,
		balance: isize,
	},

	/// The element count kept by the tree differs from the number of reachable nodes.
	#[error("tree records {recorded} entries but {reachable} nodes are reachable")]
	LengthMismatch {
		recorded: usize,
		reachable: usize,
	},
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
