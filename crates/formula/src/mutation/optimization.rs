// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Constant folding.

use crate::{
	mutation::Mutation,
	node::{BinaryOp, FuncCall, Literal, Node, NodeKind, UnaryOp},
};

fn literal_operands(node: &Node) -> Option<(BinaryOp, &Literal, &Literal)> {
	match node.kind() {
		NodeKind::Binary {
			op,
			left,
			right,
		} => Some((*op, left.as_literal()?, right.as_literal()?)),
		_ => None,
	}
}

fn bool_literal(node: &Node) -> Option<bool> {
	node.as_literal().and_then(Literal::as_bool)
}

/// `1 = 1`, `'a' != 'b'`: comparison of two literals of the same type.
pub struct ConstComparisonMutation;

impl ConstComparisonMutation {
	fn fold(node: &Node) -> Option<bool> {
		let (op, left, right) = literal_operands(node)?;
		if !left.same_kind(right) {
			return None;
		}
		let equal = left.value_eq(right)?;
		if op.is_equality() {
			Some(equal)
		} else if op.is_inequality() {
			Some(!equal)
		} else {
			None
		}
	}
}

impl Mutation for ConstComparisonMutation {
	fn name(&self) -> &'static str {
		"const_comparison"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match Self::fold(old) {
			Some(value) => old.replace_kind(NodeKind::Literal(Literal::Boolean(value))),
			None => old.clone(),
		}
	}
}

/// Arithmetic on two numeric literals. Two integers stay an integer except for division, any
/// float operand makes the result a float. Overflow and division by zero are left for the
/// database to report.
pub struct ConstMathMutation;

impl ConstMathMutation {
	fn fold(node: &Node) -> Option<Literal> {
		let (op, left, right) = literal_operands(node)?;
		if let (Literal::Integer(l), Literal::Integer(r)) = (left, right) {
			return match op {
				BinaryOp::Add => l.checked_add(*r).map(Literal::Integer),
				BinaryOp::Sub => l.checked_sub(*r).map(Literal::Integer),
				BinaryOp::Mul => l.checked_mul(*r).map(Literal::Integer),
				BinaryOp::Div if *r != 0 => Some(Literal::Float(*l as f64 / *r as f64)),
				_ => None,
			};
		}
		let (l, r) = (left.as_f64()?, right.as_f64()?);
		let value = match op {
			BinaryOp::Add => l + r,
			BinaryOp::Sub => l - r,
			BinaryOp::Mul => l * r,
			BinaryOp::Div if r != 0.0 => l / r,
			_ => return None,
		};
		value.is_finite().then_some(Literal::Float(value))
	}
}

impl Mutation for ConstMathMutation {
	fn name(&self) -> &'static str {
		"const_math"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match Self::fold(old) {
			Some(literal) => old.replace_kind(NodeKind::Literal(literal)),
			None => old.clone(),
		}
	}
}

/// `NOT TRUE` becomes `FALSE`.
pub struct NotOptimizerMutation;

impl NotOptimizerMutation {
	fn fold(node: &Node) -> Option<bool> {
		match node.kind() {
			NodeKind::Unary {
				op: UnaryOp::Not,
				expr,
			} => bool_literal(expr).map(|value| !value),
			_ => None,
		}
	}
}

impl Mutation for NotOptimizerMutation {
	fn name(&self) -> &'static str {
		"not_optimizer"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match Self::fold(old) {
			Some(value) => old.replace_kind(NodeKind::Literal(Literal::Boolean(value))),
			None => old.clone(),
		}
	}
}

/// Null checks of a literal: `ISNULL(NULL)`, `1 IS NOT NULL`.
pub struct UnaryBoolOptimizerMutation;

impl UnaryBoolOptimizerMutation {
	fn fold(node: &Node) -> Option<bool> {
		match node.kind() {
			NodeKind::Unary {
				op: UnaryOp::IsNull,
				expr,
			} => Some(matches!(expr.as_literal()?, Literal::Null)),
			NodeKind::Unary {
				op: UnaryOp::IsNotNull,
				expr,
			} => Some(!matches!(expr.as_literal()?, Literal::Null)),
			NodeKind::Call(call) if call.name == "isnull" && call.args.len() == 1 => {
				Some(matches!(call.args[0].as_literal()?, Literal::Null))
			}
			_ => None,
		}
	}
}

impl Mutation for UnaryBoolOptimizerMutation {
	fn name(&self) -> &'static str {
		"unary_bool_optimizer"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match Self::fold(old) {
			Some(value) => old.replace_kind(NodeKind::Literal(Literal::Boolean(value))),
			None => old.clone(),
		}
	}
}

/// `AND`/`OR` with a literal operand either short-circuits to a boolean or reduces to the other
/// operand. The literal counts by its truthiness, so `0`, `''` and `NULL` are false.
pub struct AndOrOptimizerMutation;

impl Mutation for AndOrOptimizerMutation {
	fn name(&self) -> &'static str {
		"and_or_optimizer"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		match node.kind() {
			NodeKind::Binary {
				op: BinaryOp::And | BinaryOp::Or,
				left,
				right,
			} => left.is_literal() || right.is_literal(),
			_ => false,
		}
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let NodeKind::Binary {
			op,
			left,
			right,
		} = old.kind()
		else {
			return old.clone();
		};
		let (constant, expr) = match (left.as_literal(), right.as_literal()) {
			(Some(constant), _) => (constant.is_truthy(), right),
			(None, Some(constant)) => (constant.is_truthy(), left),
			(None, None) => return old.clone(),
		};
		match (op, constant) {
			(BinaryOp::And, true) | (BinaryOp::Or, false) => expr.clone(),
			(BinaryOp::And, false) | (BinaryOp::Or, true) => {
				old.replace_kind(NodeKind::Literal(Literal::Boolean(constant)))
			}
			_ => old.clone(),
		}
	}
}

/// Splits `inner = 1`, `0 != inner` and the like into the non-literal side and whether the
/// comparison keeps (`true`) or negates (`false`) its outcome.
fn zero_one_comparison(node: &Node) -> Option<(&Node, bool)> {
	let NodeKind::Binary {
		op,
		left,
		right,
	} = node.kind()
	else {
		return None;
	};
	let positive = match op {
		BinaryOp::Equal => true,
		BinaryOp::NotEqual => false,
		_ => return None,
	};
	let (inner, literal) = match (left.as_literal(), right.as_literal()) {
		(None, Some(literal)) => (left, literal),
		(Some(literal), None) => (right, literal),
		_ => return None,
	};
	Some((inner, positive == literal.as_zero_one()?))
}

/// `(a > b) = 1` becomes `a > b`, `(a > b) = 0` becomes `a <= b`.
pub struct ComparisonZeroOneMutation;

impl ComparisonZeroOneMutation {
	fn fold(node: &Node) -> Option<Node> {
		let (inner, keep) = zero_one_comparison(node)?;
		let NodeKind::Binary {
			op,
			left,
			right,
		} = inner.kind()
		else {
			return None;
		};
		let inverted = op.inverted_comparison()?;
		if keep {
			return Some(inner.clone());
		}
		Some(inner.replace_kind(NodeKind::Binary {
			op: inverted,
			left: left.clone(),
			right: right.clone(),
		}))
	}
}

impl Mutation for ComparisonZeroOneMutation {
	fn name(&self) -> &'static str {
		"comparison_zero_one"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		Self::fold(old).unwrap_or_else(|| old.clone())
	}
}

/// `(a AND b) = 1` becomes `a AND b`, `(a OR b) != 1` becomes `NOT (a OR b)`.
pub struct AndOrZeroOneMutation;

impl AndOrZeroOneMutation {
	fn fold(node: &Node) -> Option<Node> {
		let (inner, keep) = zero_one_comparison(node)?;
		if !matches!(
			inner.kind(),
			NodeKind::Binary {
				op: BinaryOp::And | BinaryOp::Or,
				..
			}
		) {
			return None;
		}
		if keep {
			return Some(inner.clone());
		}
		Some(node.replace_kind(NodeKind::Unary {
			op: UnaryOp::Not,
			expr: inner.clone(),
		}))
	}
}

impl Mutation for AndOrZeroOneMutation {
	fn name(&self) -> &'static str {
		"and_or_zero_one"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::fold(node).is_some()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		Self::fold(old).unwrap_or_else(|| old.clone())
	}
}

/// `if(c1, t1, ..., else)` with literal conditions: false branches are dropped, the first true
/// branch becomes the else value and cuts off everything after it.
pub struct IfOptimizerMutation;

impl IfOptimizerMutation {
	fn call(node: &Node) -> Option<&FuncCall> {
		match node.kind() {
			NodeKind::Call(call) if call.name == "if" && call.args.len() >= 3 && call.args.len() % 2 == 1 => {
				Some(call)
			}
			_ => None,
		}
	}
}

impl Mutation for IfOptimizerMutation {
	fn name(&self) -> &'static str {
		"if_optimizer"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::call(node)
			.map(|call| call.args[..call.args.len() - 1].chunks(2).any(|pair| bool_literal(&pair[0]).is_some()))
			.unwrap_or(false)
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let Some(call) = Self::call(old) else {
			return old.clone();
		};
		let (branches, tail) = call.args.split_at(call.args.len() - 1);
		let mut else_expr = tail[0].clone();
		let mut args = Vec::with_capacity(call.args.len());
		for pair in branches.chunks(2) {
			match bool_literal(&pair[0]) {
				Some(false) => continue,
				Some(true) => {
					else_expr = pair[1].clone();
					break;
				}
				None => args.extend_from_slice(pair),
			}
		}
		if args.is_empty() {
			return else_expr;
		}
		args.push(else_expr);
		old.replace_kind(NodeKind::Call(FuncCall {
			args,
			..call.clone()
		}))
	}
}

/// `case(value, w1, t1, ..., else)` with a literal value: literal branches that cannot match are
/// dropped, the first matching one becomes the else value. Numbers match across integer and
/// float. Literals of a kind that cannot be compared with the value are kept for the database.
pub struct CaseOptimizerMutation;

impl CaseOptimizerMutation {
	fn call(node: &Node) -> Option<(&FuncCall, &Literal)> {
		match node.kind() {
			NodeKind::Call(call) if call.name == "case" && call.args.len() >= 4 && call.args.len() % 2 == 0 => {
				Some((call, call.args[0].as_literal()?))
			}
			_ => None,
		}
	}

	fn branch_match(value: &Literal, when: &Node) -> Option<bool> {
		value.value_eq(when.as_literal()?)
	}
}

impl Mutation for CaseOptimizerMutation {
	fn name(&self) -> &'static str {
		"case_optimizer"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		Self::call(node)
			.map(|(call, value)| {
				call.args[1..call.args.len() - 1]
					.chunks(2)
					.any(|pair| Self::branch_match(value, &pair[0]).is_some())
			})
			.unwrap_or(false)
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let Some((call, value)) = Self::call(old) else {
			return old.clone();
		};
		let last = call.args.len() - 1;
		let mut else_expr = call.args[last].clone();
		let mut whens = Vec::with_capacity(call.args.len());
		for pair in call.args[1..last].chunks(2) {
			match Self::branch_match(value, &pair[0]) {
				Some(true) => {
					else_expr = pair[1].clone();
					break;
				}
				Some(false) => continue,
				None => whens.extend_from_slice(pair),
			}
		}
		if whens.is_empty() {
			return else_expr;
		}
		let mut args = Vec::with_capacity(whens.len() + 2);
		args.push(call.args[0].clone());
		args.extend(whens);
		args.push(else_expr);
		old.replace_kind(NodeKind::Call(FuncCall {
			args,
			..call.clone()
		}))
	}
}
