//! # Tree Vertices and the Recursive Algorithms
//!
//! A [`Node`] owns its two subtrees outright; there are no parent pointers. Every structural
//! algorithm here takes ownership of a subtree root and hands back the (possibly different) root
//! of the rewritten subtree, and the caller one level up links it back in. Heights are repaired
//! and rotations applied on the way back out of the recursion, so a whole insertion or deletion
//! touches exactly the nodes on one root-to-leaf path.
//!
//! ```text
//!         rotate_right(y)                   rotate_left(x)
//!
//!           y                x                x                  y
//!          / \              / \              / \                / \
//!         x   C    ───►    A   y            A   y      ───►    x   C
//!        / \                  / \              / \            / \
//!       A   B                B   C            B   C          A   B
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;

use tracing::trace;

use crate::error::{self, Error};

/// An optional, exclusively owned subtree.
pub(crate) type Link<K, V> = Option<Box<Node<K, V>>>;

/// A single vertex of the tree.
pub(crate) struct Node<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
	pub(crate) left: Link<K, V>,
	pub(crate) right: Link<K, V>,
	/// Height of the subtree rooted here. A leaf has height 1.
	pub(crate) height: usize,
}

// ---------------------------------------------------------------------------
// Rotation, Height and Rebalance Primitives
// ---------------------------------------------------------------------------

impl<K, V> Node<K, V> {
	/// Allocates a new leaf.
	pub(crate) fn leaf(key: K, value: V) -> Box<Self> {
		Box::new(Node {
			key,
			value,
			left: None,
			right: None,
			height: 1,
		})
	}

	/// Height of an optional subtree; an absent subtree has height 0.
	#[inline]
	pub(crate) fn height(link: &Link<K, V>) -> usize {
		link.as_ref().map_or(0, |node| node.height)
	}

	/// Recomputes the cached height from the two children.
	#[inline]
	pub(crate) fn update_height(&mut self) {
		self.height = 1 + Self::height(&self.left).max(Self::height(&self.right));
	}

	/// `height(right) - height(left)`.
	#[inline]
	pub(crate) fn balance_factor(&self) -> isize {
		Self::height(&self.right) as isize - Self::height(&self.left) as isize
	}

	/// Promotes the left child above `self` and returns it as the new subtree root.
	///
	/// The left child must be present.
	pub(crate) fn rotate_right(mut self: Box<Self>) -> Box<Self> {
		let mut pivot = self.left.take().expect("rotate_right requires a left child");
		self.left = pivot.right.take();
		self.update_height();
		pivot.right = Some(self);
		pivot.update_height();
		pivot
	}

	/// Promotes the right child above `self` and returns it as the new subtree root.
	///
	/// The right child must be present.
	pub(crate) fn rotate_left(mut self: Box<Self>) -> Box<Self> {
		let mut pivot = self.right.take().expect("rotate_left requires a right child");
		self.right = pivot.left.take();
		self.update_height();
		pivot.left = Some(self);
		pivot.update_height();
		pivot
	}

	/// Restores the balance invariant at this node, assuming both subtrees already satisfy it and
	/// their heights differ by at most two.
	///
	/// This is the only rebalancing decision in the tree: insertion and deletion both change one
	/// child's height by at most one, and both repair it here.
	pub(crate) fn rebalance(mut self: Box<Self>) -> Box<Self> {
		let balance = self.balance_factor();
		debug_assert!((-2..=2).contains(&balance), "balance factor {balance} out of range");

		if balance > 1 {
			if self.right.as_ref().is_some_and(|right| right.balance_factor() < 0) {
				trace!(balance, "right-left rotation");
				self.right = self.right.take().map(Node::rotate_right);
			} else {
				trace!(balance, "left rotation");
			}
			self.rotate_left()
		} else if balance < -1 {
			if self.left.as_ref().is_some_and(|left| left.balance_factor() > 0) {
				trace!(balance, "left-right rotation");
				self.left = self.left.take().map(Node::rotate_left);
			} else {
				trace!(balance, "right rotation");
			}
			self.rotate_right()
		} else {
			self
		}
	}

	/// Height repair followed by rebalancing, applied to every ancestor of a changed subtree.
	#[inline]
	fn retrace(mut self: Box<Self>) -> Box<Self> {
		self.update_height();
		self.rebalance()
	}

	/// Consumes a detached node, yielding its entry.
	#[inline]
	fn into_entry(self: Box<Self>) -> (K, V) {
		let Node {
			key,
			value,
			..
		} = *self;
		(key, value)
	}
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl<K, V> Node<K, V> {
	/// Iterative descent to the node holding `key`.
	pub(crate) fn get<'a, Q>(mut link: &'a Link<K, V>, key: &Q) -> Option<&'a Self>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		while let Some(node) = link {
			match key.cmp(node.key.borrow()) {
				Ordering::Less => link = &node.left,
				Ordering::Greater => link = &node.right,
				Ordering::Equal => return Some(&**node),
			}
		}
		None
	}

	pub(crate) fn get_mut<'a, Q>(link: &'a mut Link<K, V>, key: &Q) -> Option<&'a mut Self>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let mut node = link.as_deref_mut()?;
		loop {
			match key.cmp(node.key.borrow()) {
				Ordering::Less => node = node.left.as_deref_mut()?,
				Ordering::Greater => node = node.right.as_deref_mut()?,
				Ordering::Equal => return Some(node),
			}
		}
	}

	/// Leftmost node of the subtree.
	pub(crate) fn min(link: &Link<K, V>) -> Option<&Self> {
		let mut node = link.as_deref()?;
		while let Some(left) = node.left.as_deref() {
			node = left;
		}
		Some(node)
	}

	/// Rightmost node of the subtree.
	pub(crate) fn max(link: &Link<K, V>) -> Option<&Self> {
		let mut node = link.as_deref()?;
		while let Some(right) = node.right.as_deref() {
			node = right;
		}
		Some(node)
	}
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

impl<K: Ord, V> Node<K, V> {
	/// Inserts `key` unless it is already present.
	///
	/// Returns the new subtree root and whether a node was created. An existing entry is never
	/// overwritten: on a duplicate key the subtree comes back untouched and `key` and `value` are
	/// dropped.
	pub(crate) fn insert(link: Link<K, V>, key: K, value: V) -> (Box<Self>, bool) {
		let mut node = match link {
			None => return (Node::leaf(key, value), true),
			Some(node) => node,
		};

		let inserted = match key.cmp(&node.key) {
			Ordering::Less => {
				let (left, inserted) = Self::insert(node.left.take(), key, value);
				node.left = Some(left);
				inserted
			}
			Ordering::Greater => {
				let (right, inserted) = Self::insert(node.right.take(), key, value);
				node.right = Some(right);
				inserted
			}
			Ordering::Equal => return (node, false),
		};

		(node.retrace(), inserted)
	}
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

impl<K, V> Node<K, V> {
	/// Detaches the minimum of the subtree rooted at `node`.
	///
	/// Returns the rebalanced remainder of the subtree and the detached node, whose children are
	/// both empty.
	pub(crate) fn pluck_min(mut node: Box<Self>) -> (Link<K, V>, Box<Self>) {
		match node.left.take() {
			Some(left) => {
				let (rest, min) = Self::pluck_min(left);
				node.left = rest;
				(Some(node.retrace()), min)
			}
			None => (node.right.take(), node),
		}
	}

	/// Detaches the maximum of the subtree rooted at `node`. Mirror of [`Node::pluck_min`].
	pub(crate) fn pluck_max(mut node: Box<Self>) -> (Link<K, V>, Box<Self>) {
		match node.right.take() {
			Some(right) => {
				let (rest, max) = Self::pluck_max(right);
				node.right = rest;
				(Some(node.retrace()), max)
			}
			None => (node.left.take(), node),
		}
	}

	/// Removes `node` itself from its position.
	///
	/// With at most one child, that child takes the vacated position as-is. With two children the
	/// in-order successor is detached from the right subtree and spliced in.
	pub(crate) fn pluck(mut node: Box<Self>) -> (Link<K, V>, (K, V)) {
		let replacement = match (node.left.take(), node.right.take()) {
			(None, right) => right,
			(left, None) => left,
			(Some(left), Some(right)) => {
				let (rest, mut successor) = Self::pluck_min(right);
				successor.left = Some(left);
				successor.right = rest;
				Some(successor.retrace())
			}
		};
		(replacement, node.into_entry())
	}

	/// Removes the entry for `key`, if present.
	pub(crate) fn remove<Q>(link: Link<K, V>, key: &Q) -> (Link<K, V>, Option<(K, V)>)
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let mut node = match link {
			None => return (None, None),
			Some(node) => node,
		};

		let removed = match key.cmp(node.key.borrow()) {
			Ordering::Less => {
				let (left, removed) = Self::remove(node.left.take(), key);
				node.left = left;
				removed
			}
			Ordering::Greater => {
				let (right, removed) = Self::remove(node.right.take(), key);
				node.right = right;
				removed
			}
			Ordering::Equal => {
				let (rest, entry) = Self::pluck(node);
				return (rest, Some(entry));
			}
		};

		if removed.is_none() {
			// Nothing below changed
			return (Some(node), None);
		}
		(Some(node.retrace()), removed)
	}

	/// Removes the leftmost entry of a non-empty subtree.
	pub(crate) fn remove_min(node: Box<Self>) -> (Link<K, V>, (K, V)) {
		let (rest, min) = Self::pluck_min(node);
		(rest, min.into_entry())
	}

	/// Removes the rightmost entry of a non-empty subtree.
	pub(crate) fn remove_max(node: Box<Self>) -> (Link<K, V>, (K, V)) {
		let (rest, max) = Self::pluck_max(node);
		(rest, max.into_entry())
	}
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl<K: Ord, V> Node<K, V> {
	/// Checks ordering, cached heights and balance for the whole subtree.
	///
	/// Every key must lie strictly between `lower` and `upper` when those are given. Returns the
	/// computed height and the number of nodes.
	pub(crate) fn check(
		link: &Link<K, V>,
		depth: usize,
		lower: Option<&K>,
		upper: Option<&K>,
	) -> error::Result<(usize, usize)> {
		let Some(node) = link.as_deref() else {
			return Ok((0, 0));
		};

		if lower.is_some_and(|lower| *lower >= node.key)
			|| upper.is_some_and(|upper| node.key >= *upper)
		{
			return Err(Error::OutOfOrder {
				depth,
			});
		}

		let (left_height, left_count) = Self::check(&node.left, depth + 1, lower, Some(&node.key))?;
		let (right_height, right_count) =
			Self::check(&node.right, depth + 1, Some(&node.key), upper)?;

		let computed = 1 + left_height.max(right_height);
		if node.height != computed {
			return Err(Error::HeightMismatch {
				depth,
				cached: node.height,
				computed,
			});
		}

		let balance = right_height as isize - left_height as isize;
		if !(-1..=1).contains(&balance) {
			return Err(Error::Unbalanced {
				depth,
				balance,
			});
		}

		Ok((computed, left_count + right_count + 1))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::{fixture, preorder};

	fn check(link: &Link<u64, u64>) -> error::Result<(usize, usize)> {
		Node::check(link, 0, None, None)
	}

	// -----------------------------------------------------------------------
	// Rotations
	// -----------------------------------------------------------------------

	#[test]
	fn rotate_right_moves_inner_subtree() {
		let root = fixture("left_heavy.json").unwrap();
		assert_eq!(preorder(&Some(root.clone_shape())), vec![(5, 3), (3, 2), (1, 1), (4, 1), (8, 1)]);

		let rotated = root.rotate_right();

		// 4 was the pivot's right child and becomes the old root's left child
		assert_eq!(
			preorder(&Some(rotated)),
			vec![(3, 3), (1, 1), (5, 2), (4, 1), (8, 1)]
		);
	}

	#[test]
	fn rotate_left_moves_inner_subtree() {
		let root = fixture("right_heavy.json").unwrap();
		let rotated = root.rotate_left();

		assert_eq!(
			preorder(&Some(rotated)),
			vec![(7, 3), (3, 2), (1, 1), (5, 1), (9, 1)]
		);
	}

	#[test]
	#[should_panic(expected = "rotate_right requires a left child")]
	fn rotate_right_without_left_child() {
		let _ = Node::leaf(1u64, 10u64).rotate_right();
	}

	// -----------------------------------------------------------------------
	// Rebalance Dispatch
	// -----------------------------------------------------------------------

	#[test]
	fn rebalance_single_and_double_rotations() {
		for name in ["left_chain.json", "left_right.json", "right_chain.json", "right_left.json"] {
			let root = fixture(name).unwrap();
			assert!(check(&Some(root.clone_shape())).is_err(), "{name} should start unbalanced");

			let balanced = Some(root.rebalance());
			assert_eq!(preorder(&balanced), vec![(2, 2), (1, 1), (3, 1)], "{name}");
			assert_eq!(check(&balanced), Ok((2, 3)));
		}
	}

	#[test]
	fn rebalance_leaves_balanced_node_alone() {
		let root = fixture("reference.json").unwrap();
		let before = preorder(&Some(root.clone_shape()));
		let after = preorder(&Some(root.rebalance()));
		assert_eq!(before, after);
	}

	#[test]
	fn rebalance_right_heavy_with_balanced_child_uses_single_rotation() {
		// Only reachable after a deletion: the heavy child has balance factor 0
		let root = fixture("right_heavy_even.json").unwrap();
		let balanced = Some(root.rebalance());

		assert_eq!(preorder(&balanced), vec![(4, 3), (2, 2), (3, 1), (5, 1)]);
		assert_eq!(check(&balanced), Ok((3, 4)));
	}

	// -----------------------------------------------------------------------
	// Insert and Remove
	// -----------------------------------------------------------------------

	#[test]
	fn insert_ignores_duplicate() {
		let (root, inserted) = Node::insert(None, 1u64, 10u64);
		assert!(inserted);

		let (root, inserted) = Node::insert(Some(root), 1, 99);
		assert!(!inserted);
		assert_eq!(root.value, 10);
		assert_eq!(root.height, 1);
	}

	#[test]
	fn insert_ascending_rotates_at_every_third_key() {
		let mut link = None;
		for key in 1u64..=3 {
			let (root, inserted) = Node::insert(link.take(), key, key * 10);
			assert!(inserted);
			link = Some(root);
		}
		assert_eq!(preorder(&link), vec![(2, 2), (1, 1), (3, 1)]);
	}

	#[test]
	fn pluck_two_children_promotes_successor() {
		let root = fixture("reference.json").unwrap();
		let (rest, (key, value)) = Node::pluck(root);

		assert_eq!((key, value), (5, 50));
		assert_eq!(
			preorder(&rest),
			vec![(7, 3), (3, 2), (1, 1), (4, 1), (8, 2), (9, 1)]
		);
		assert_eq!(check(&rest), Ok((3, 6)));
	}

	#[test]
	fn pluck_single_child_lifts_it() {
		let (rest, (key, _)) = Node::pluck(fixture("right_chain.json").unwrap());
		assert_eq!(key, 1);
		assert_eq!(preorder(&rest), vec![(2, 2), (3, 1)]);
	}

	#[test]
	fn remove_missing_key_keeps_shape() {
		let root = fixture("reference.json").unwrap();
		let before = preorder(&Some(root.clone_shape()));
		let (rest, removed) = Node::remove(Some(root), &6);

		assert!(removed.is_none());
		assert_eq!(preorder(&rest), before);
	}

	#[test]
	fn remove_min_and_max_rebalance_ancestors() {
		let root = fixture("reference.json").unwrap();

		let (rest, min) = Node::remove_min(root);
		assert_eq!(min, (1, 10));
		assert_eq!(check(&rest), Ok((3, 6)));

		let (rest, max) = Node::remove_max(rest.unwrap());
		assert_eq!(max, (9, 90));
		assert_eq!(check(&rest), Ok((3, 5)));
	}

	// -----------------------------------------------------------------------
	// Validation
	// -----------------------------------------------------------------------

	#[test]
	fn check_reports_stale_height() {
		let mut root = fixture("reference.json").unwrap();
		root.height = 7;
		assert_eq!(
			check(&Some(root)),
			Err(Error::HeightMismatch {
				depth: 0,
				cached: 7,
				computed: 3
			})
		);
	}

	#[test]
	fn check_reports_misplaced_key() {
		let mut root = fixture("reference.json").unwrap();
		// 4 sits in the left subtree of 5; make it larger than the root
		root.left.as_mut().unwrap().right.as_mut().unwrap().key = 6;
		assert_eq!(
			check(&Some(root)),
			Err(Error::OutOfOrder {
				depth: 2
			})
		);
	}
}
