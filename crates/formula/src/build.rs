// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shorthand constructors for formula trees.

use lodestar_type::{Date, DateTime};

use crate::node::{
	BeforeFilterBy, BinaryOp, CaseBlock, FuncCall, IfBlock, IfPart, Literal, Lod, Node, NodeKind, NodeMeta, Ordering,
	UnaryOp, WhenPart, WindowFuncCall, WindowGrouping,
};

pub fn field(name: impl Into<String>) -> Node {
	Node::new(NodeKind::Field {
		name: name.into(),
	})
}

pub fn literal(literal: Literal) -> Node {
	Node::new(NodeKind::Literal(literal))
}

pub fn null() -> Node {
	literal(Literal::Null)
}

pub fn int(value: i64) -> Node {
	literal(Literal::Integer(value))
}

pub fn float(value: f64) -> Node {
	literal(Literal::Float(value))
}

pub fn boolean(value: bool) -> Node {
	literal(Literal::Boolean(value))
}

pub fn string(value: impl Into<String>) -> Node {
	literal(Literal::String(value.into()))
}

pub fn date(value: Date) -> Node {
	literal(Literal::Date(value))
}

pub fn datetime(value: DateTime) -> Node {
	literal(Literal::Datetime(value))
}

pub fn func(name: impl Into<String>, args: Vec<Node>) -> Node {
	Node::new(NodeKind::Call(FuncCall::new(name, args)))
}

pub fn call(call: FuncCall) -> Node {
	Node::new(NodeKind::Call(call))
}

/// Function call with a level of detail, e.g. `SUM([Sales] FIXED [Region])`.
pub fn func_lod(name: impl Into<String>, args: Vec<Node>, lod: Lod) -> Node {
	call(FuncCall {
		lod,
		..FuncCall::new(name, args)
	})
}

pub fn window(name: impl Into<String>, args: Vec<Node>, grouping: WindowGrouping) -> Node {
	Node::new(NodeKind::Window(WindowFuncCall::new(name, args, grouping)))
}

pub fn window_total(name: impl Into<String>, args: Vec<Node>) -> Node {
	window(name, args, WindowGrouping::Total)
}

pub fn window_within(name: impl Into<String>, args: Vec<Node>, dims: Vec<Node>) -> Node {
	window(name, args, WindowGrouping::Within(dims))
}

pub fn window_among(name: impl Into<String>, args: Vec<Node>, dims: Vec<Node>) -> Node {
	window(name, args, WindowGrouping::Among(dims))
}

pub fn window_ordered(
	name: impl Into<String>,
	args: Vec<Node>,
	grouping: WindowGrouping,
	ordering: Vec<Ordering>,
) -> Node {
	Node::new(NodeKind::Window(WindowFuncCall {
		ordering,
		..WindowFuncCall::new(name, args, grouping)
	}))
}

pub fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
	Node::new(NodeKind::Binary {
		op,
		left,
		right,
	})
}

pub fn add(left: Node, right: Node) -> Node {
	binary(BinaryOp::Add, left, right)
}

pub fn eq(left: Node, right: Node) -> Node {
	binary(BinaryOp::Equal, left, right)
}

pub fn and(left: Node, right: Node) -> Node {
	binary(BinaryOp::And, left, right)
}

pub fn or(left: Node, right: Node) -> Node {
	binary(BinaryOp::Or, left, right)
}

pub fn unary(op: UnaryOp, expr: Node) -> Node {
	Node::new(NodeKind::Unary {
		op,
		expr,
	})
}

pub fn not(expr: Node) -> Node {
	unary(UnaryOp::Not, expr)
}

pub fn paren(expr: Node) -> Node {
	Node::new(NodeKind::Parenthesized(expr))
}

pub fn paren_tagged(expr: Node, meta: NodeMeta) -> Node {
	Node::with_meta(NodeKind::Parenthesized(expr), meta)
}

pub fn if_block(parts: Vec<(Node, Node)>, else_expr: Node) -> Node {
	Node::new(NodeKind::If(IfBlock {
		parts: parts
			.into_iter()
			.map(|(cond, then)| IfPart {
				cond,
				then,
			})
			.collect(),
		else_expr,
	}))
}

pub fn case(case_expr: Node, whens: Vec<(Node, Node)>, else_expr: Node) -> Node {
	Node::new(NodeKind::Case(CaseBlock {
		case_expr,
		whens: whens
			.into_iter()
			.map(|(value, then)| WhenPart {
				value,
				then,
			})
			.collect(),
		else_expr,
	}))
}

/// Copy of a function call with `BEFORE FILTER BY` set to the given field names.
pub fn with_before_filter_by<I, S>(node: &Node, names: I) -> Node
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	match node.kind() {
		NodeKind::Call(call) => node.replace_kind(NodeKind::Call(FuncCall {
			before_filter_by: BeforeFilterBy::new(names),
			..call.clone()
		})),
		NodeKind::Window(call) => node.replace_kind(NodeKind::Window(WindowFuncCall {
			before_filter_by: BeforeFilterBy::new(names),
			..call.clone()
		})),
		_ => node.clone(),
	}
}

/// Copy of a function call with an `IGNORE DIMENSIONS` clause.
pub fn with_ignore_dimensions(node: &Node, dims: Vec<Node>) -> Node {
	match node.kind() {
		NodeKind::Call(call) => node.replace_kind(NodeKind::Call(FuncCall {
			ignore_dimensions: dims,
			..call.clone()
		})),
		_ => node.clone(),
	}
}
