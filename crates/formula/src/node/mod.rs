// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Immutable formula tree.
//!
//! A [`Node`] is a cheap, reference counted handle. Nodes are built bottom-up and never change
//! after construction; rewriting a tree always produces new nodes for the changed path and
//! shares every untouched sub-tree with the input.
//!
//! Equality and hashing are structural: position metadata is ignored, and every node caches an
//! xxh3 fingerprint of its content so that hashing a sub-tree is constant time. This makes nodes
//! usable directly as content-addressed cache keys.

mod block;
mod call;
mod display;
mod fork;
mod literal;
mod operator;

use std::{
	fmt::{Debug, Formatter},
	hash::{Hash, Hasher},
	sync::Arc,
	vec,
};

pub use block::{CaseBlock, IfBlock, IfPart, WhenPart};
pub use call::{BeforeFilterBy, FuncCall, Lod, Ordering, SortDirection, WindowFuncCall, WindowGrouping};
pub use fork::{BfbFilterMutation, JoinCondition, JoinType, QueryFork};
pub use literal::Literal;
use lodestar_type::Fragment;
pub use operator::{BinaryOp, UnaryOp};
use xxhash_rust::xxh3::Xxh3;

use crate::error::FormulaError;

/// Marker protecting a grouping construct from being flattened by rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelTag(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
	pub fragment: Fragment,
	pub level_tag: Option<LevelTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Literal(Literal),

	Field {
		name: String,
	},

	Unary {
		op: UnaryOp,
		expr: Node,
	},

	Binary {
		op: BinaryOp,
		left: Node,
		right: Node,
	},

	Call(FuncCall),

	Window(WindowFuncCall),

	If(IfBlock),

	Case(CaseBlock),

	Parenthesized(Node),

	QueryFork(QueryFork),

	/// A diagnostic produced by a rewrite in place of the node it could not lower
	Error(FormulaError),
}

struct NodeInner {
	kind: NodeKind,
	meta: NodeMeta,
	fingerprint: u64,
}

#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
	pub fn new(kind: NodeKind) -> Self {
		Self::with_meta(kind, NodeMeta::default())
	}

	pub fn with_meta(kind: NodeKind, meta: NodeMeta) -> Self {
		let mut hasher = Xxh3::new();
		kind.hash(&mut hasher);
		let fingerprint = hasher.finish();
		Node(Arc::new(NodeInner {
			kind,
			meta,
			fingerprint,
		}))
	}

	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	pub fn meta(&self) -> &NodeMeta {
		&self.0.meta
	}

	pub fn fragment(&self) -> &Fragment {
		&self.0.meta.fragment
	}

	pub fn fingerprint(&self) -> u64 {
		self.0.fingerprint
	}

	/// Same allocation, not just the same content.
	pub fn ptr_eq(left: &Node, right: &Node) -> bool {
		Arc::ptr_eq(&left.0, &right.0)
	}

	/// Copy of this node carrying new metadata.
	pub fn with_fragment(&self, fragment: Fragment) -> Node {
		Node::with_meta(
			self.0.kind.clone(),
			NodeMeta {
				fragment,
				level_tag: self.0.meta.level_tag,
			},
		)
	}

	/// Replaces the kind while keeping this node's metadata.
	pub fn replace_kind(&self, kind: NodeKind) -> Node {
		Node::with_meta(kind, self.0.meta.clone())
	}

	/// Fragment for diagnostics: the original position if known, otherwise the rendered formula.
	pub fn diagnostic_fragment(&self) -> Fragment {
		self.fragment().clone().or(&Fragment::internal(self.to_string()))
	}

	pub fn is_literal(&self) -> bool {
		matches!(self.kind(), NodeKind::Literal(_))
	}

	pub fn as_literal(&self) -> Option<&Literal> {
		match self.kind() {
			NodeKind::Literal(literal) => Some(literal),
			_ => None,
		}
	}

	pub fn field_name(&self) -> Option<&str> {
		match self.kind() {
			NodeKind::Field {
				name,
			} => Some(name),
			_ => None,
		}
	}

	/// Strips any parenthesis wrappers.
	pub fn unwrap_parentheses(&self) -> &Node {
		let mut node = self;
		while let NodeKind::Parenthesized(inner) = node.kind() {
			node = inner;
		}
		node
	}

	/// All direct children in a fixed order, including dimension lists and join conditions.
	pub fn children(&self) -> Vec<&Node> {
		match self.kind() {
			NodeKind::Literal(_)
			| NodeKind::Field {
				..
			}
			| NodeKind::Error(_) => Vec::new(),
			NodeKind::Unary {
				expr,
				..
			} => vec![expr],
			NodeKind::Binary {
				left,
				right,
				..
			} => vec![left, right],
			NodeKind::Call(call) => {
				call.args.iter().chain(call.lod.dimensions()).chain(call.ignore_dimensions.iter()).collect()
			}
			NodeKind::Window(call) => call
				.args
				.iter()
				.chain(call.grouping.dimensions())
				.chain(call.ordering.iter().map(|o| &o.expr))
				.collect(),
			NodeKind::If(block) => {
				let mut children = Vec::with_capacity(block.parts.len() * 2 + 1);
				for part in &block.parts {
					children.push(&part.cond);
					children.push(&part.then);
				}
				children.push(&block.else_expr);
				children
			}
			NodeKind::Case(block) => {
				let mut children = Vec::with_capacity(block.whens.len() * 2 + 2);
				children.push(&block.case_expr);
				for when in &block.whens {
					children.push(&when.value);
					children.push(&when.then);
				}
				children.push(&block.else_expr);
				children
			}
			NodeKind::Parenthesized(expr) => vec![expr],
			NodeKind::QueryFork(fork) => {
				let mut children = vec![&fork.result_expr];
				children.extend(fork.lod.dimensions());
				for condition in &fork.joining {
					children.extend(condition.nodes());
				}
				for mutation in &fork.bfb_filter_mutations {
					children.push(&mutation.original);
					children.push(&mutation.replacement);
				}
				children
			}
		}
	}

	/// Children that take part in the value of this node, as opposed to the dimension lists
	/// that only describe its grouping context.
	pub fn autonomous_children(&self) -> Vec<&Node> {
		match self.kind() {
			NodeKind::Call(call) => call.args.iter().collect(),
			NodeKind::Window(call) => call.args.iter().collect(),
			NodeKind::QueryFork(fork) => vec![&fork.result_expr],
			_ => self.children(),
		}
	}

	/// Rebuilds this node with new children given in [`Node::children`] order.
	///
	/// Missing trailing children fall back to the current ones.
	pub fn with_children(&self, children: Vec<Node>) -> Node {
		let mut refill = Refill {
			iter: children.into_iter(),
		};
		let kind = match self.kind() {
			NodeKind::Literal(_)
			| NodeKind::Field {
				..
			}
			| NodeKind::Error(_) => return self.clone(),
			NodeKind::Unary {
				op,
				expr,
			} => NodeKind::Unary {
				op: *op,
				expr: refill.take(expr),
			},
			NodeKind::Binary {
				op,
				left,
				right,
			} => NodeKind::Binary {
				op: *op,
				left: refill.take(left),
				right: refill.take(right),
			},
			NodeKind::Call(call) => NodeKind::Call(FuncCall {
				name: call.name.clone(),
				args: refill.take_all(&call.args),
				lod: call.lod.with_dimensions(refill.take_all(call.lod.dimensions())),
				ignore_dimensions: refill.take_all(&call.ignore_dimensions),
				before_filter_by: call.before_filter_by.clone(),
			}),
			NodeKind::Window(call) => NodeKind::Window(WindowFuncCall {
				name: call.name.clone(),
				args: refill.take_all(&call.args),
				grouping: call.grouping.with_dimensions(refill.take_all(call.grouping.dimensions())),
				ordering: call
					.ordering
					.iter()
					.map(|o| Ordering {
						expr: refill.take(&o.expr),
						direction: o.direction,
					})
					.collect(),
				before_filter_by: call.before_filter_by.clone(),
			}),
			NodeKind::If(block) => NodeKind::If(IfBlock {
				parts: block
					.parts
					.iter()
					.map(|part| IfPart {
						cond: refill.take(&part.cond),
						then: refill.take(&part.then),
					})
					.collect(),
				else_expr: refill.take(&block.else_expr),
			}),
			NodeKind::Case(block) => NodeKind::Case(CaseBlock {
				case_expr: refill.take(&block.case_expr),
				whens: block
					.whens
					.iter()
					.map(|when| WhenPart {
						value: refill.take(&when.value),
						then: refill.take(&when.then),
					})
					.collect(),
				else_expr: refill.take(&block.else_expr),
			}),
			NodeKind::Parenthesized(expr) => NodeKind::Parenthesized(refill.take(expr)),
			NodeKind::QueryFork(fork) => NodeKind::QueryFork(QueryFork {
				join_type: fork.join_type,
				result_expr: refill.take(&fork.result_expr),
				lod: fork.lod.with_dimensions(refill.take_all(fork.lod.dimensions())),
				joining: fork
					.joining
					.iter()
					.map(|condition| match condition {
						JoinCondition::SelfEquality {
							expr,
						} => JoinCondition::SelfEquality {
							expr: refill.take(expr),
						},
						JoinCondition::Binary {
							expr,
							fork_expr,
						} => JoinCondition::Binary {
							expr: refill.take(expr),
							fork_expr: refill.take(fork_expr),
						},
					})
					.collect(),
				before_filter_by: fork.before_filter_by.clone(),
				bfb_filter_mutations: fork
					.bfb_filter_mutations
					.iter()
					.map(|mutation| BfbFilterMutation {
						original: refill.take(&mutation.original),
						replacement: refill.take(&mutation.replacement),
					})
					.collect(),
			}),
		};
		self.replace_kind(kind)
	}

	/// Pre-order iterator over this node and all its descendants.
	pub fn iter(&self) -> NodeIter<'_> {
		NodeIter {
			stack: vec![self],
		}
	}
}

struct Refill {
	iter: vec::IntoIter<Node>,
}

impl Refill {
	fn take(&mut self, current: &Node) -> Node {
		self.iter.next().unwrap_or_else(|| current.clone())
	}

	fn take_all(&mut self, current: &[Node]) -> Vec<Node> {
		current.iter().map(|node| self.take(node)).collect()
	}
}

pub struct NodeIter<'a> {
	stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
	type Item = &'a Node;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.stack.extend(node.children().into_iter().rev());
		Some(node)
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		Node::ptr_eq(self, other) || (self.0.fingerprint == other.0.fingerprint && self.0.kind == other.0.kind)
	}
}

impl Eq for Node {}

impl Hash for Node {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.0.fingerprint);
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Debug::fmt(&self.0.kind, f)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use lodestar_type::Fragment;

	use super::*;
	use crate::build::{field, func, int, paren};

	#[test]
	fn test_structural_equality_ignores_position() {
		let left = field("Sales").with_fragment(Fragment::statement("[Sales]", 1, 0));
		let right = field("Sales").with_fragment(Fragment::statement("[Sales]", 3, 12));
		assert_eq!(left, right);
		assert_eq!(left.fingerprint(), right.fingerprint());
		assert!(!Node::ptr_eq(&left, &right));
	}

	#[test]
	fn test_distinct_content() {
		assert_ne!(func("sum", vec![field("Sales")]), func("avg", vec![field("Sales")]));
		assert_ne!(func("sum", vec![field("Sales")]), func("sum", vec![field("Profit")]));
	}

	#[test]
	fn test_dedup_in_hash_set() {
		let mut seen = HashSet::new();
		seen.insert(func("sum", vec![field("Sales")]));
		seen.insert(func("sum", vec![field("Sales")]));
		seen.insert(func("sum", vec![int(1)]));
		assert_eq!(seen.len(), 2);
	}

	#[test]
	fn test_with_children_roundtrip() {
		let node = func("if", vec![field("Flag"), int(1), int(2)]);
		let children: Vec<Node> = node.children().into_iter().cloned().collect();
		let rebuilt = node.with_children(children);
		assert_eq!(rebuilt, node);
	}

	#[test]
	fn test_with_children_replaces() {
		let node = func("sum", vec![field("Sales")]);
		let rebuilt = node.with_children(vec![field("Profit")]);
		assert_eq!(rebuilt, func("sum", vec![field("Profit")]));
	}

	#[test]
	fn test_iter_is_preorder() {
		let node = func("sum", vec![paren(field("Sales"))]);
		let names: Vec<String> = node.iter().map(|n| n.to_string()).collect();
		assert_eq!(names, vec!["SUM(([Sales]))", "([Sales])", "[Sales]"]);
	}

	#[test]
	fn test_unwrap_parentheses() {
		let node = paren(paren(field("Sales")));
		assert_eq!(node.unwrap_parentheses(), &field("Sales"));
	}
}
