//! Cursors over the entries of a [`Tree`](crate::Tree)
//!
//! Both cursor kinds keep an explicit stack of ancestors that still have to be yielded, so an
//! in-order walk can be started anywhere and resumed one step at a time without recursion. The
//! stack never holds more entries than the height of the tree.
//!
//! ```text
//! ascending, after construction from the root:     stack = [5, 3, 1]   (1 on top)
//!
//!            5            next() -> 1     stack = [5, 3]
//!          /   \          next() -> 3     stack = [5, 4]      right child 4 and its left spine
//!         3     8         next() -> 4     stack = [5]
//!        / \   / \        next() -> 5     stack = [8, 7]
//!       1   4 7   9       ...
//! ```
use crate::node::{Link, Node};
use crate::STACK_INLINE;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

type Stack<'a, K, V> = SmallVec<[&'a Node<K, V>; STACK_INLINE]>;

/// Ascending cursor over the entries of a tree.
///
/// Created by [`Tree::iter`](crate::Tree::iter) and [`Tree::upper`](crate::Tree::upper).
pub struct Iter<'a, K, V> {
	stack: Stack<'a, K, V>,
	remaining: usize,
}

/// Descending cursor over the entries of a tree.
///
/// Created by [`Tree::reversed`](crate::Tree::reversed) and [`Tree::lower`](crate::Tree::lower).
pub struct RevIter<'a, K, V> {
	stack: Stack<'a, K, V>,
	remaining: usize,
}

// ---------------------------------------------------------------------------
// Ascending
// ---------------------------------------------------------------------------

impl<'a, K, V> Iter<'a, K, V> {
	/// Full traversal: the stack starts out as the left spine of the root.
	pub(crate) fn new(root: &'a Link<K, V>, len: usize) -> Self {
		let mut iter = Iter {
			stack: SmallVec::new(),
			remaining: len,
		};
		iter.push_left_spine(root.as_deref());
		iter
	}

	/// Traversal starting at the smallest key `>= key`.
	///
	/// On the search path, every node that the search passes to the left of is greater than
	/// `key` and must be yielded later, so it is stacked. Nodes passed to the right are smaller and
	/// are skipped along with their left subtrees.
	pub(crate) fn seek<Q>(root: &'a Link<K, V>, key: &Q, len: usize) -> Self
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let mut stack = Stack::new();
		let mut link = root.as_deref();
		while let Some(node) = link {
			match key.cmp(node.key.borrow()) {
				Ordering::Less => {
					stack.push(node);
					link = node.left.as_deref();
				}
				Ordering::Greater => link = node.right.as_deref(),
				Ordering::Equal => {
					stack.push(node);
					break;
				}
			}
		}

		Iter {
			stack,
			remaining: len,
		}
	}

	fn push_left_spine(&mut self, mut link: Option<&'a Node<K, V>>) {
		while let Some(node) = link {
			self.stack.push(node);
			link = node.left.as_deref();
		}
	}
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
	type Item = (&'a K, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.push_left_spine(node.right.as_deref());
		self.remaining = self.remaining.saturating_sub(1);
		Some((&node.key, &node.value))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.stack.len(), Some(self.remaining))
	}
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
	fn clone(&self) -> Self {
		Iter {
			stack: self.stack.clone(),
			remaining: self.remaining,
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.clone()).finish()
	}
}

// ---------------------------------------------------------------------------
// Descending
// ---------------------------------------------------------------------------

impl<'a, K, V> RevIter<'a, K, V> {
	/// Full traversal: the stack starts out as the right spine of the root.
	pub(crate) fn new(root: &'a Link<K, V>, len: usize) -> Self {
		let mut iter = RevIter {
			stack: SmallVec::new(),
			remaining: len,
		};
		iter.push_right_spine(root.as_deref());
		iter
	}

	/// Traversal starting at the largest key `<= key`. Mirror of [`Iter::seek`].
	pub(crate) fn seek<Q>(root: &'a Link<K, V>, key: &Q, len: usize) -> Self
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let mut stack = Stack::new();
		let mut link = root.as_deref();
		while let Some(node) = link {
			match key.cmp(node.key.borrow()) {
				Ordering::Less => link = node.left.as_deref(),
				Ordering::Greater => {
					stack.push(node);
					link = node.right.as_deref();
				}
				Ordering::Equal => {
					stack.push(node);
					break;
				}
			}
		}

		RevIter {
			stack,
			remaining: len,
		}
	}

	fn push_right_spine(&mut self, mut link: Option<&'a Node<K, V>>) {
		while let Some(node) = link {
			self.stack.push(node);
			link = node.right.as_deref();
		}
	}
}

impl<'a, K, V> Iterator for RevIter<'a, K, V> {
	type Item = (&'a K, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.push_right_spine(node.left.as_deref());
		self.remaining = self.remaining.saturating_sub(1);
		Some((&node.key, &node.value))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.stack.len(), Some(self.remaining))
	}
}

impl<K, V> FusedIterator for RevIter<'_, K, V> {}

impl<K, V> Clone for RevIter<'_, K, V> {
	fn clone(&self) -> Self {
		RevIter {
			stack: self.stack.clone(),
			remaining: self.remaining,
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RevIter<'_, K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.clone()).finish()
	}
}
