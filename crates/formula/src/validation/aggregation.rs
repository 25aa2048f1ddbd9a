// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use tracing::trace;

use super::Checker;
use crate::{
	error::FormulaError,
	function::is_aggregate_function,
	node::{Node, NodeKind},
};

/// Aggregation level of an evaluated sub-tree. Variants are ordered by precedence when
/// operands are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AggregationState {
	Constant,
	Window,
	Dimension,
	Aggregate,
}

#[derive(Debug, Clone)]
struct Report {
	state: AggregationState,
	errors: Vec<FormulaError>,
}

impl Report {
	fn new(state: AggregationState) -> Self {
		Self {
			state,
			errors: Vec::new(),
		}
	}
}

/// Checks that aggregated and non-aggregated values are not mixed.
///
/// Inside the argument of an aggregate, dimensions and aggregates may be combined freely; only
/// the aggregate of an aggregate is reported there.
///
/// Sub-tree results are cached by content and context for the lifetime of the checker, so
/// validating the same formula again (or a formula repeating an expression) reports the same
/// errors without re-evaluating it.
pub struct AggregationChecker {
	global_dimensions: Vec<Node>,
	cache: HashMap<(Node, bool), Report>,
}

impl AggregationChecker {
	pub fn new(global_dimensions: Vec<Node>) -> Self {
		Self {
			global_dimensions,
			cache: HashMap::new(),
		}
	}

	fn evaluate(&mut self, node: &Node, in_aggregate: bool) -> Report {
		let key = (node.clone(), in_aggregate);
		if let Some(report) = self.cache.get(&key) {
			return report.clone();
		}
		let report = self.evaluate_uncached(node, in_aggregate);
		self.cache.insert(key, report.clone());
		report
	}

	fn evaluate_uncached(&mut self, node: &Node, in_aggregate: bool) -> Report {
		match node.kind() {
			NodeKind::Literal(_) | NodeKind::Error(_) => Report::new(AggregationState::Constant),
			NodeKind::Field {
				..
			} => Report::new(AggregationState::Dimension),
			NodeKind::Parenthesized(inner) => self.evaluate(inner, in_aggregate),
			NodeKind::Call(call) if is_aggregate_function(&call.name) => {
				let mut report = Report::new(AggregationState::Aggregate);
				let mut nested = false;
				for arg in &call.args {
					let arg_report = self.evaluate(arg, true);
					nested |= arg_report.state == AggregationState::Aggregate;
					report.errors.extend(arg_report.errors);
				}
				if nested {
					report.errors.push(FormulaError::DoubleAggregation {
						expression: node.to_string(),
						fragment: node.diagnostic_fragment(),
					});
				}
				report
			}
			NodeKind::Window(_) => {
				// grouping and ordering are evaluated in their own context
				let mut report = Report::new(AggregationState::Window);
				for child in node.children() {
					report.errors.extend(self.evaluate(child, false).errors);
				}
				report
			}
			NodeKind::QueryFork(fork) => {
				let mut report = Report::new(AggregationState::Aggregate);
				report.errors.extend(self.evaluate(&fork.result_expr, false).errors);
				report
			}
			_ => self.evaluate_operands(node, in_aggregate),
		}
	}

	fn evaluate_operands(&mut self, node: &Node, in_aggregate: bool) -> Report {
		let operands: Vec<(&Node, Report)> = node
			.autonomous_children()
			.into_iter()
			.map(|child| (child, self.evaluate(child, in_aggregate)))
			.collect();

		let state =
			operands.iter().map(|(_, report)| report.state).max().unwrap_or(AggregationState::Constant);
		let mut errors = Vec::new();
		for (_, report) in &operands {
			errors.extend(report.errors.iter().cloned());
		}

		if state == AggregationState::Aggregate && !in_aggregate {
			for (operand, report) in &operands {
				if report.state == AggregationState::Dimension && !self.is_grouped(operand) {
					errors.push(FormulaError::InconsistentAggregation {
						expression: operand.to_string(),
						fragment: operand.diagnostic_fragment(),
					});
				}
			}
		}

		Report {
			state,
			errors,
		}
	}

	/// A non-aggregated operand may stand next to an aggregate only when it is an expression
	/// the query is grouped by. A bare field never qualifies.
	fn is_grouped(&self, operand: &Node) -> bool {
		let operand = operand.unwrap_parentheses();
		if operand.field_name().is_some() {
			return false;
		}
		self.global_dimensions.iter().any(|dim| dim.unwrap_parentheses() == operand)
	}
}

impl Checker for AggregationChecker {
	fn name(&self) -> &'static str {
		"aggregation"
	}

	fn check(&mut self, tree: &Node) -> Vec<FormulaError> {
		let report = self.evaluate(tree, false);
		trace!(state = ?report.state, errors = report.errors.len(), cached = self.cache.len(), "checked aggregation");
		report.errors
	}
}

#[cfg(test)]
mod tests {
	use lodestar_type::Result;

	use super::*;
	use crate::{
		build::{add, boolean, field, float, func, func_lod, int, paren, string, window_total, window_within},
		node::Lod,
		validation::validate,
	};

	fn make_dims() -> Vec<Node> {
		vec![field("Dim Field"), add(field("Other Field"), func("dim_func", vec![field("Third Field")]))]
	}

	fn check(tree: &Node, collect_errors: bool) -> Result<()> {
		let mut checker = AggregationChecker::new(make_dims());
		validate(tree, &mut [&mut checker], collect_errors)
	}

	fn codes(tree: &Node) -> Vec<String> {
		match check(tree, true) {
			Ok(()) => vec![],
			Err(err) => err.diagnostics().into_iter().map(|d| d.code.clone()).collect(),
		}
	}

	#[test]
	fn test_no_errors() {
		let dims = make_dims();
		let dim1 = dims[0].clone();
		let dim2 = dims[1].clone();

		let valid = vec![
			add(dim2.clone(), float(1.1)),
			func("sum", vec![field("Some Field")]),
			func("sum", vec![string("qwerty")]),
			func("sum", vec![paren(string("qwerty"))]),
			func("sum", vec![add(field("Barley Field"), field("Other Field"))]),
			func("sum", vec![add(dim1.clone(), field("Other Field"))]),
			func("sum", vec![add(dim1, dim2.clone())]),
			func("func", vec![func("sum", vec![add(dim2.clone(), float(1.1))])]),
			func("func", vec![func("sum", vec![add(dim2.clone(), float(1.1))]), dim2.clone()]),
			func("func", vec![boolean(true), func("sum", vec![add(dim2, float(1.1))])]),
		];
		for tree in valid {
			assert!(check(&tree, false).is_ok(), "{} should be valid", tree);
		}
	}

	#[test]
	fn test_double_aggregation() {
		let tree = add(int(8), func("sum", vec![func("avg", vec![field("Barley Field")])]));
		let err = check(&tree, false).unwrap_err();
		assert_eq!(err.code, "AGGREGATION_001");
	}

	#[test]
	fn test_double_aggregation_through_expression() {
		let tree = func("max", vec![add(func("sum", vec![field("Sales")]), int(1))]);
		assert_eq!(codes(&tree), vec!["AGGREGATION_001"]);
	}

	#[test]
	fn test_mixing_inside_aggregate_argument_is_only_double_aggregation() {
		let tree = func("sum", vec![add(func("sum", vec![field("x")]), field("y"))]);
		assert_eq!(codes(&tree), vec!["AGGREGATION_001"]);

		// the same operands outside an aggregate are inconsistent
		let tree = add(func("sum", vec![field("x")]), field("y"));
		assert_eq!(codes(&tree), vec!["AGGREGATION_002"]);
	}

	#[test]
	fn test_context_does_not_leak_through_cache() {
		let mut checker = AggregationChecker::new(vec![]);
		let inner = add(func("sum", vec![field("x")]), field("y"));
		let tree = func("f", vec![func("sum", vec![inner.clone()]), inner]);
		let err = validate(&tree, &mut [&mut checker], true).unwrap_err();
		let codes: Vec<_> = err.diagnostics().into_iter().map(|d| d.code.as_str()).collect();
		assert_eq!(codes, vec!["AGGREGATION_001", "AGGREGATION_002"]);
	}

	#[test]
	fn test_wrapping_in_aggregate_is_double_aggregation() {
		let trees = vec![
			func("sum", vec![field("Sales")]),
			add(func("avg", vec![field("Sales")]), func("max", vec![field("Profit")])),
			func("min", vec![field("Sales")]),
		];
		for tree in trees {
			assert!(check(&tree, false).is_ok());
			for name in ["sum", "avg", "max", "min"] {
				let wrapped = func(name, vec![tree.clone()]);
				assert_eq!(check(&wrapped, false).unwrap_err().code, "AGGREGATION_001", "{}", wrapped);
			}
		}
	}

	#[test]
	fn test_lod_aggregate_of_aggregate_is_double_aggregation() {
		let tree = func_lod("sum", vec![func("sum", vec![field("Sales")])], Lod::Fixed(vec![field("Dim Field")]));
		assert_eq!(codes(&tree), vec!["AGGREGATION_001"]);
	}

	#[test]
	fn test_window_sum_is_not_aggregation() {
		let tree = add(int(8), window_total("sum", vec![func("avg", vec![field("Barley Field")])]));
		assert!(check(&tree, false).is_ok());
	}

	#[test]
	fn test_inconsistent_aggregation() {
		let tree = add(func("sum", vec![field("Some Field")]), field("Rye Field"));
		assert_eq!(check(&tree, false).unwrap_err().code, "AGGREGATION_002");

		let tree = func("some_op", vec![
			func("sum", vec![field("Some Field")]),
			func("some_func", vec![field("Rye Field")]),
			field("Dim Field"),
		]);
		assert_eq!(codes(&tree), vec!["AGGREGATION_002", "AGGREGATION_002"]);
	}

	#[test]
	fn test_global_dimension_field_is_inconsistent() {
		let mut checker = AggregationChecker::new(vec![field("Category"), field("Region")]);
		let tree = add(func("sum", vec![field("Sales")]), field("Region"));
		let err = validate(&tree, &mut [&mut checker], false).unwrap_err();
		assert_eq!(err.code, "AGGREGATION_002");
		assert!(err.message.contains("[Region]"));
	}

	#[test]
	fn test_window_func_of_agg_with_dimensions() {
		let tree = window_within("rank", vec![func("sum", vec![field("Some Field")])], make_dims());
		assert!(check(&tree, false).is_ok());

		let mut checker = AggregationChecker::new(vec![field("Category"), field("Region")]);
		let tree = window_within("rank", vec![func("sum", vec![field("Sales")])], vec![field("Region")]);
		assert!(validate(&tree, &mut [&mut checker], false).is_ok());
	}

	#[test]
	fn test_errors_inside_window_are_reported() {
		let tree = window_total("sum", vec![func("sum", vec![func("avg", vec![field("Sales")])])]);
		assert_eq!(codes(&tree), vec!["AGGREGATION_001"]);
	}

	#[test]
	fn test_multiple_errors() {
		let mut checker = AggregationChecker::new(make_dims());
		let tree = func("do_something", vec![
			func("sum", vec![func("avg", vec![field("Electromagnetic Field")])]),
			func("max", vec![func("min", vec![field("Field of Gold")])]),
			func("sum", vec![func("avg", vec![field("Electromagnetic Field")])]),
			func("min", vec![field("Field of Gold")]),
			field("Field of Gold"),
		]);

		for _ in 0..2 {
			let err = validate(&tree, &mut [&mut checker], true).unwrap_err();
			let codes: Vec<_> = err.diagnostics().into_iter().map(|d| d.code.as_str()).collect();
			assert_eq!(codes, vec!["AGGREGATION_001", "AGGREGATION_001", "AGGREGATION_001", "AGGREGATION_002"]);
		}
	}

	#[test]
	fn test_fail_fast_reports_innermost_first() {
		let tree = add(func("sum", vec![func("avg", vec![field("Sales")])]), field("Region"));
		assert_eq!(check(&tree, false).unwrap_err().code, "AGGREGATION_001");
	}
}
