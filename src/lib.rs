//! # avltree: An Ordered Map on a Height-Balanced Binary Search Tree
//!
//! This crate provides [`Tree`], an in-memory sorted map backed by an AVL tree. Lookups,
//! insertions and removals are `O(log n)`, and the entries can be walked in either direction,
//! either from one end of the tree or starting at an arbitrary key.
//!
//! ## Design Overview
//!
//! **Balance**: every node caches the height of its subtree, and the heights of the two subtrees
//! of any node differ by at most one. This bounds the height of a tree of `n` entries by roughly
//! `1.44 * log2(n)`.
//!
//! **Ownership**: a node exclusively owns its children and the tree owns the root. There are no
//! parent pointers. Insertion and removal are recursive: each level takes ownership of a subtree,
//! rewrites it, and returns the new subtree root to its caller, repairing heights and rotating on
//! the way back up.
//!
//! **Cursors**: iteration keeps a stack of ancestors still to be yielded instead of recursing,
//! which lets a walk start at any key ([`Tree::upper`], [`Tree::lower`]). Cursors borrow the tree,
//! so the tree cannot be modified while one is alive.
//!
//! ```text
//!   insert 1, 2, 3              rotate left at 1
//!
//!        1                            2
//!         \                          / \
//!          2            ───►        1   3
//!           \
//!            3
//! ```
//!
//! ## Basic Usage
//!
//! ```
//! use avltree::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Insert key-value pairs; present keys are left untouched
//! assert!(tree.add(2, "two"));
//! assert!(tree.add(1, "one"));
//! assert!(!tree.add(1, "uno"));
//!
//! assert_eq!(tree.get(&1), Some(&"one"));
//! assert_eq!(tree.min(), Some((&1, &"one")));
//!
//! // Walk upwards from a key
//! let keys: Vec<_> = tree.upper(&2).map(|(k, _)| *k).collect();
//! assert_eq!(keys, vec![2]);
//!
//! // Remove entries
//! assert_eq!(tree.remove(&1), Some("one"));
//! assert_eq!(tree.len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! The tree has no internal synchronisation. It is `Send` and `Sync` whenever its keys and values
//! are, and the borrow rules give the usual single-writer or many-readers discipline; sharing a
//! tree across threads for mutation needs an external lock.

use std::borrow::Borrow;
use std::fmt;

use tracing::debug;

pub mod alloc;
pub mod error;
pub mod iter;
mod node;
#[cfg(test)]
mod util;

use node::{Link, Node};

// ---------------------------------------------------------------------------
// Configuration Constants
// ---------------------------------------------------------------------------

/// Inline capacity of the ancestor stack kept by cursors.
///
/// One slot per bit of address space. An AVL tree that fits in memory is far shallower than
/// this, so cursors never spill to the heap.
pub const STACK_INLINE: usize = usize::BITS as usize;

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// An ordered map backed by an AVL tree.
///
/// # Type Parameters
///
/// - `K`: The key type. Must implement `Ord` for every operation that compares keys. Keys are
///   unique within a tree.
/// - `V`: The value type. Opaque to the tree.
///
/// # Insertion Policy
///
/// [`add`](Tree::add) inserts only if the key is absent. It never overwrites a stored value; to
/// replace one, remove the key first or go through [`get_mut`](Tree::get_mut).
pub struct Tree<K, V> {
	/// The root subtree, absent when the tree is empty.
	root: Link<K, V>,

	/// Number of entries, always equal to the number of nodes reachable from `root`.
	len: usize,
}

impl<K, V> Default for Tree<K, V> {
	fn default() -> Self {
		Self::new()
	}
}

// ---------------------------------------------------------------------------
// Tree Implementation
// ---------------------------------------------------------------------------

impl<K, V> Tree<K, V> {
	/// Creates an empty tree.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let tree: Tree<i32, &str> = Tree::new();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.height(), 0);
	/// ```
	pub const fn new() -> Self {
		Tree {
			root: None,
			len: 0,
		}
	}

	/// Returns the number of entries in the tree. `O(1)`.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree contains no entries.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the height of the tree: 0 when empty, 1 for a single entry.
	pub fn height(&self) -> usize {
		Node::height(&self.root)
	}

	// -----------------------------------------------------------------------
	// Public API: Read Operations
	// -----------------------------------------------------------------------

	/// Returns a reference to the value corresponding to the key.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree = Tree::new();
	/// tree.add(1, "one");
	///
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// assert_eq!(tree.get(&2), None);
	/// ```
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		Node::get(&self.root, key).map(|node| &node.value)
	}

	/// Returns the stored key and its value.
	pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		Node::get(&self.root, key).map(|node| (&node.key, &node.value))
	}

	/// Returns a mutable reference to the value corresponding to the key.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree = Tree::new();
	/// tree.add(1, 10);
	///
	/// if let Some(v) = tree.get_mut(&1) {
	///     *v += 1;
	/// }
	/// assert_eq!(tree.get(&1), Some(&11));
	/// ```
	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		Node::get_mut(&mut self.root, key).map(|node| &mut node.value)
	}

	/// Returns `true` if the tree contains the key.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		Node::get(&self.root, key).is_some()
	}

	/// Returns the entry with the smallest key, or `None` if the tree is empty.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree = Tree::new();
	/// tree.add(3, "three");
	/// tree.add(1, "one");
	/// tree.add(2, "two");
	///
	/// assert_eq!(tree.min(), Some((&1, &"one")));
	/// ```
	pub fn min(&self) -> Option<(&K, &V)> {
		Node::min(&self.root).map(|node| (&node.key, &node.value))
	}

	/// Returns the entry with the largest key, or `None` if the tree is empty.
	pub fn max(&self) -> Option<(&K, &V)> {
		Node::max(&self.root).map(|node| (&node.key, &node.value))
	}

	// -----------------------------------------------------------------------
	// Public API: Write Operations
	// -----------------------------------------------------------------------

	/// Inserts an entry unless the key is already present.
	///
	/// Returns `true` if a new entry was created. When the key exists, the tree is left exactly as
	/// it was (the stored value is *not* replaced) and `key` and `value` are dropped.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree = Tree::new();
	///
	/// assert!(tree.add(1, "one"));
	/// assert!(!tree.add(1, "uno"));
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// ```
	pub fn add(&mut self, key: K, value: V) -> bool
	where
		K: Ord,
	{
		let (root, inserted) = Node::insert(self.root.take(), key, value);
		self.root = Some(root);
		if inserted {
			self.len += 1;
		}
		inserted
	}

	/// Removes a key from the tree, returning its value if it was present.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree = Tree::new();
	/// tree.add(1, "one");
	///
	/// assert_eq!(tree.remove(&1), Some("one"));
	/// assert_eq!(tree.remove(&1), None); // Already removed
	/// ```
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		self.remove_entry(key).map(|(_, v)| v)
	}

	/// Removes a key from the tree, returning the stored key and value.
	pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let (root, removed) = Node::remove(self.root.take(), key);
		self.root = root;
		if removed.is_some() {
			self.len -= 1;
		}
		removed
	}

	/// Removes and returns the entry with the smallest key.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let mut tree: Tree<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
	///
	/// assert_eq!(tree.remove_min(), Some((1, "a")));
	/// assert_eq!(tree.remove_min(), Some((2, "b")));
	/// assert_eq!(tree.remove_min(), None);
	/// ```
	pub fn remove_min(&mut self) -> Option<(K, V)> {
		let (root, entry) = Node::remove_min(self.root.take()?);
		self.root = root;
		self.len -= 1;
		Some(entry)
	}

	/// Removes and returns the entry with the largest key.
	pub fn remove_max(&mut self) -> Option<(K, V)> {
		let (root, entry) = Node::remove_max(self.root.take()?);
		self.root = root;
		self.len -= 1;
		Some(entry)
	}

	/// Removes all entries from the tree.
	pub fn clear(&mut self) {
		if let Some(root) = self.root.take() {
			debug!(len = self.len, height = root.height, "clearing tree");
		}
		self.len = 0;
	}

	// -----------------------------------------------------------------------
	// Iterator Creation
	// -----------------------------------------------------------------------

	/// Returns a cursor over all entries in ascending key order.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let tree: Tree<i32, i32> = (0..5).map(|i| (i, i * 10)).collect();
	///
	/// for (k, v) in tree.iter() {
	///     assert_eq!(*v, k * 10);
	/// }
	/// ```
	pub fn iter(&self) -> iter::Iter<'_, K, V> {
		iter::Iter::new(&self.root, self.len)
	}

	/// Returns a cursor over all entries in descending key order.
	pub fn reversed(&self) -> iter::RevIter<'_, K, V> {
		iter::RevIter::new(&self.root, self.len)
	}

	/// Returns an ascending cursor that starts at the smallest key greater than or equal to
	/// `key`. It yields nothing if every key is smaller.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let tree: Tree<i32, ()> = [1, 3, 5, 7].into_iter().map(|k| (k, ())).collect();
	///
	/// let keys: Vec<_> = tree.upper(&4).map(|(k, _)| *k).collect();
	/// assert_eq!(keys, vec![5, 7]);
	/// ```
	pub fn upper<Q>(&self, key: &Q) -> iter::Iter<'_, K, V>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		iter::Iter::seek(&self.root, key, self.len)
	}

	/// Returns a descending cursor that starts at the largest key less than or equal to `key`.
	/// It yields nothing if every key is larger.
	///
	/// # Example
	///
	/// ```
	/// use avltree::Tree;
	///
	/// let tree: Tree<i32, ()> = [1, 3, 5, 7].into_iter().map(|k| (k, ())).collect();
	///
	/// let keys: Vec<_> = tree.lower(&4).map(|(k, _)| *k).collect();
	/// assert_eq!(keys, vec![3, 1]);
	/// ```
	pub fn lower<Q>(&self, key: &Q) -> iter::RevIter<'_, K, V>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		iter::RevIter::seek(&self.root, key, self.len)
	}

	// -----------------------------------------------------------------------
	// Validation
	// -----------------------------------------------------------------------

	/// Checks every structural invariant of the tree.
	///
	/// Walks all nodes and reports the first violation found: keys out of order, a stale cached
	/// height, a balance factor outside `{-1, 0, 1}`, or an element count that does not match the
	/// number of nodes. `O(n)`.
	pub fn validate(&self) -> error::Result<()>
	where
		K: Ord,
	{
		let (_, reachable) = Node::check(&self.root, 0, None, None)?;
		if reachable != self.len {
			return Err(error::Error::LengthMismatch {
				recorded: self.len,
				reachable,
			});
		}
		Ok(())
	}
}

// ===========================================================================
// Trait Implementations
// ===========================================================================

impl<'a, K, V> IntoIterator for &'a Tree<K, V> {
	type Item = (&'a K, &'a V);
	type IntoIter = iter::Iter<'a, K, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<K: Ord, V> FromIterator<(K, V)> for Tree<K, V> {
	/// Builds a tree by adding every pair in order. The first value seen for a key is kept.
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut tree = Tree::new();
		tree.extend(iter);
		tree
	}
}

impl<K: Ord, V> Extend<(K, V)> for Tree<K, V> {
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (key, value) in iter {
			self.add(key, value);
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Tree<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

#[cfg(any(test, feature = "test-utils"))]
impl<K: Ord + fmt::Debug, V> Tree<K, V> {
	/// Validates all tree invariants. Panics with diagnostic info if any invariant is violated.
	///
	/// Besides [`validate`](Tree::validate), this checks that both cursor directions agree with
	/// each other and with [`len`](Tree::len).
	pub fn assert_invariants(&self) {
		if let Err(err) = self.validate() {
			panic!("tree invariant violated: {err}");
		}

		let forward: Vec<&K> = self.iter().map(|(k, _)| k).collect();
		let mut backward: Vec<&K> = self.reversed().map(|(k, _)| k).collect();
		backward.reverse();

		assert_eq!(forward.len(), self.len, "ascending walk length differs from len");
		assert_eq!(forward, backward, "descending walk is not the reverse of ascending walk");
		assert_eq!(self.min().map(|(k, _)| k), forward.first().copied(), "min mismatch");
		assert_eq!(self.max().map(|(k, _)| k), forward.last().copied(), "max mismatch");
	}
}
