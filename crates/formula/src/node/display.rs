// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter, Result};

use crate::node::{
	BeforeFilterBy, JoinCondition, Lod, Node, NodeKind, SortDirection, UnaryOp, WindowGrouping,
};

fn write_list(f: &mut Formatter<'_>, nodes: &[Node]) -> Result {
	for (idx, node) in nodes.iter().enumerate() {
		if idx > 0 {
			f.write_str(", ")?;
		}
		Display::fmt(node, f)?;
	}
	Ok(())
}

fn write_lod(f: &mut Formatter<'_>, lod: &Lod) -> Result {
	match lod {
		Lod::Inherited => Ok(()),
		Lod::DefaultAggregation => f.write_str(" FIXED"),
		Lod::Fixed(dims) => {
			f.write_str(" FIXED ")?;
			write_list(f, dims)
		}
		Lod::Include(dims) => {
			f.write_str(" INCLUDE ")?;
			write_list(f, dims)
		}
		Lod::Exclude(dims) => {
			f.write_str(" EXCLUDE ")?;
			write_list(f, dims)
		}
	}
}

fn write_bfb(f: &mut Formatter<'_>, bfb: &BeforeFilterBy) -> Result {
	if bfb.is_empty() {
		return Ok(());
	}
	f.write_str(" BEFORE FILTER BY ")?;
	for (idx, name) in bfb.field_names.iter().enumerate() {
		if idx > 0 {
			f.write_str(", ")?;
		}
		write!(f, "[{}]", name)?;
	}
	Ok(())
}

impl Display for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result {
		match self.kind() {
			NodeKind::Literal(literal) => Display::fmt(literal, f),
			NodeKind::Field {
				name,
			} => write!(f, "[{}]", name),
			NodeKind::Unary {
				op,
				expr,
			} => match op {
				UnaryOp::Neg => write!(f, "-{}", expr),
				UnaryOp::Not => write!(f, "NOT {}", expr),
				UnaryOp::IsNull | UnaryOp::IsNotNull => write!(f, "{} {}", expr, op),
			},
			NodeKind::Binary {
				op,
				left,
				right,
			} => write!(f, "{} {} {}", left, op, right),
			NodeKind::Call(call) => {
				write!(f, "{}(", call.name.to_uppercase())?;
				write_list(f, &call.args)?;
				write_lod(f, &call.lod)?;
				if !call.ignore_dimensions.is_empty() {
					f.write_str(" IGNORE DIMENSIONS ")?;
					write_list(f, &call.ignore_dimensions)?;
				}
				write_bfb(f, &call.before_filter_by)?;
				f.write_str(")")
			}
			NodeKind::Window(call) => {
				write!(f, "{}(", call.name.to_uppercase())?;
				write_list(f, &call.args)?;
				match &call.grouping {
					WindowGrouping::Total => f.write_str(" TOTAL")?,
					WindowGrouping::Within(dims) => {
						f.write_str(" WITHIN ")?;
						write_list(f, dims)?;
					}
					WindowGrouping::Among(dims) => {
						f.write_str(" AMONG ")?;
						write_list(f, dims)?;
					}
				}
				if !call.ordering.is_empty() {
					f.write_str(" ORDER BY ")?;
					for (idx, ordering) in call.ordering.iter().enumerate() {
						if idx > 0 {
							f.write_str(", ")?;
						}
						match ordering.direction {
							SortDirection::Asc => write!(f, "{}", ordering.expr)?,
							SortDirection::Desc => write!(f, "{} DESC", ordering.expr)?,
						}
					}
				}
				write_bfb(f, &call.before_filter_by)?;
				f.write_str(")")
			}
			NodeKind::If(block) => {
				for (idx, part) in block.parts.iter().enumerate() {
					let keyword = if idx == 0 {
						"IF"
					} else {
						" ELSEIF"
					};
					write!(f, "{} {} THEN {}", keyword, part.cond, part.then)?;
				}
				write!(f, " ELSE {} END", block.else_expr)
			}
			NodeKind::Case(block) => {
				write!(f, "CASE {}", block.case_expr)?;
				for when in &block.whens {
					write!(f, " WHEN {} THEN {}", when.value, when.then)?;
				}
				write!(f, " ELSE {} END", block.else_expr)
			}
			NodeKind::Parenthesized(expr) => write!(f, "({})", expr),
			NodeKind::QueryFork(fork) => {
				write!(f, "QUERY_FORK({} JOIN ON ", fork.join_type)?;
				for (idx, condition) in fork.joining.iter().enumerate() {
					if idx > 0 {
						f.write_str(" AND ")?;
					}
					match condition {
						JoinCondition::SelfEquality {
							expr,
						} => write!(f, "{} = {}", expr, expr)?,
						JoinCondition::Binary {
							expr,
							fork_expr,
						} => write!(f, "{} = {}", expr, fork_expr)?,
					}
				}
				write!(f, ": {}", fork.result_expr)?;
				write_lod(f, &fork.lod)?;
				write_bfb(f, &fork.before_filter_by)?;
				f.write_str(")")
			}
			NodeKind::Error(error) => write!(f, "<error: {}>", error),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::build::{
		and, binary, case, field, func, if_block, int, string, window_within,
	};
	use crate::node::BinaryOp;

	#[test]
	fn test_display_call_and_binary() {
		let node = binary(BinaryOp::Add, func("sum", vec![field("Sales")]), field("Region"));
		assert_eq!(node.to_string(), "SUM([Sales]) + [Region]");
	}

	#[test]
	fn test_display_window() {
		let node = window_within("rank", vec![func("sum", vec![field("Sales")])], vec![field("Region")]);
		assert_eq!(node.to_string(), "RANK(SUM([Sales]) WITHIN [Region])");
	}

	#[test]
	fn test_display_blocks() {
		let node = if_block(vec![(and(field("A"), field("B")), int(1))], int(0));
		assert_eq!(node.to_string(), "IF [A] AND [B] THEN 1 ELSE 0 END");

		let node = case(field("Kind"), vec![(string("a"), int(1))], int(0));
		assert_eq!(node.to_string(), "CASE [Kind] WHEN 'a' THEN 1 ELSE 0 END");
	}
}
