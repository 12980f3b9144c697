//! Allocation tracking for node reclamation tests.
//!
//! Every entry of a [`Tree`](crate::Tree) lives in its own heap allocation, so the live
//! allocation count of a process is a direct measure of how many nodes are still owned somewhere.
//! This module provides a global allocator that keeps that count.
//!
//! # Usage
//!
//! In a test binary:
//!
//! ```ignore
//! use avltree::alloc::{self, TrackingAllocator};
//!
//! #[global_allocator]
//! static ALLOC: TrackingAllocator = TrackingAllocator;
//!
//! #[test]
//! fn nodes_are_freed() {
//!     let baseline = alloc::snapshot();
//!
//!     let mut tree = avltree::Tree::new();
//!     tree.add(1, 1);
//!     assert_eq!(alloc::snapshot().live_since(&baseline), 1);
//!
//!     drop(tree);
//!     alloc::assert_no_leaks_since(&baseline);
//! }
//! ```
//!
//! # Caveats
//!
//! - Counters are process-wide: allocations made by other threads are counted too, so keep
//!   measuring tests alone in their binary.
//! - Lazily initialised statics (e.g. the `tracing` callsite registry) allocate once and never
//!   free. Exercise the code path once before taking the baseline.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static DEALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static BYTES_ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static BYTES_FREED: AtomicUsize = AtomicUsize::new(0);

/// A global allocator that forwards to [`System`] and counts every call.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		BYTES_ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed);
		System.alloc(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		BYTES_FREED.fetch_add(layout.size(), Ordering::Relaxed);
		System.dealloc(ptr, layout)
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		BYTES_ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed);
		System.alloc_zeroed(layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		// Counted as a free of the old block and an allocation of the new one, so the live count
		// is unchanged
		ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		BYTES_ALLOCATED.fetch_add(new_size, Ordering::Relaxed);
		BYTES_FREED.fetch_add(layout.size(), Ordering::Relaxed);
		System.realloc(ptr, layout, new_size)
	}
}

/// Cumulative allocator counters at one point in time.
///
/// Counters only ever grow, so two snapshots can be subtracted without any reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
	/// Allocations made since process start.
	pub allocations: usize,
	/// Deallocations made since process start.
	pub deallocations: usize,
	/// Bytes handed out since process start.
	pub bytes_allocated: usize,
	/// Bytes returned since process start.
	pub bytes_freed: usize,
}

impl Snapshot {
	/// Number of blocks allocated after `baseline` and not yet freed.
	///
	/// Negative when more was freed than allocated, e.g. after dropping something that existed
	/// before the baseline.
	pub fn live_since(&self, baseline: &Snapshot) -> isize {
		let allocated = (self.allocations - baseline.allocations) as isize;
		let freed = (self.deallocations - baseline.deallocations) as isize;
		allocated - freed
	}

	/// Net bytes allocated after `baseline`.
	pub fn bytes_since(&self, baseline: &Snapshot) -> isize {
		let allocated = (self.bytes_allocated - baseline.bytes_allocated) as isize;
		let freed = (self.bytes_freed - baseline.bytes_freed) as isize;
		allocated - freed
	}
}

/// Reads the current counters.
pub fn snapshot() -> Snapshot {
	Snapshot {
		allocations: ALLOCATIONS.load(Ordering::SeqCst),
		deallocations: DEALLOCATIONS.load(Ordering::SeqCst),
		bytes_allocated: BYTES_ALLOCATED.load(Ordering::SeqCst),
		bytes_freed: BYTES_FREED.load(Ordering::SeqCst),
	}
}

/// Asserts that everything allocated after `baseline` has been freed again.
///
/// # Panics
///
/// Panics if blocks or bytes are still outstanding.
pub fn assert_no_leaks_since(baseline: &Snapshot) {
	let now = snapshot();
	let blocks = now.live_since(baseline);
	let bytes = now.bytes_since(baseline);

	if blocks != 0 || bytes != 0 {
		panic!(
			"Memory leak detected!\n\
             Outstanding blocks: {}\n\
             Outstanding bytes: {}",
			blocks, bytes
		);
	}
}
