//! Test utilities for loading node shapes from JSON fixtures
//!
//! A fixture describes a subtree by nesting, e.g. `{"key": 3, "left": {"key": 1}}`. Shapes need
//! not be balanced, which lets the rotation primitives be tested on exactly the inputs they are
//! meant to repair. Cached heights are computed while loading, and every value is its key times
//! ten.
use crate::node::{Link, Node};
use serde::Deserialize;
use std::path::Path;

type FixtureNode = Node<u64, u64>;

#[derive(Deserialize, Debug)]
struct Shape {
	key: u64,
	#[serde(default)]
	left: Option<Box<Shape>>,
	#[serde(default)]
	right: Option<Box<Shape>>,
}

fn translate(shape: Shape) -> Box<FixtureNode> {
	let mut node = Node::leaf(shape.key, shape.key * 10);
	node.left = shape.left.map(|left| translate(*left));
	node.right = shape.right.map(|right| translate(*right));
	node.update_height();
	node
}

/// Loads `fixtures/<name>` from the crate root.
pub(crate) fn fixture(name: &str) -> serde_json::Result<Box<FixtureNode>> {
	let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name);
	let file = std::fs::File::open(&path).expect("failed to find fixture");
	let shape: Shape = serde_json::from_reader(file)?;
	Ok(translate(shape))
}

/// Pre-order `(key, cached height)` pairs, which pin down the exact shape of a subtree.
pub(crate) fn preorder(link: &Link<u64, u64>) -> Vec<(u64, usize)> {
	fn walk(link: &Link<u64, u64>, out: &mut Vec<(u64, usize)>) {
		if let Some(node) = link {
			out.push((node.key, node.height));
			walk(&node.left, out);
			walk(&node.right, out);
		}
	}

	let mut out = Vec::new();
	walk(link, &mut out);
	out
}

impl FixtureNode {
	/// Deep copy, cached heights included.
	pub(crate) fn clone_shape(&self) -> Box<FixtureNode> {
		Box::new(Node {
			key: self.key,
			value: self.value,
			left: self.left.as_ref().map(|left| left.clone_shape()),
			right: self.right.as_ref().map(|right| right.clone_shape()),
			height: self.height,
		})
	}
}
