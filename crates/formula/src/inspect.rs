// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Read-only queries over formula trees.

use std::collections::HashSet;

use lodestar_type::Result;

use crate::{
	error::{FormulaError, into_error},
	function::is_aggregate_function,
	node::{Lod, Node, NodeKind},
};

/// The expression yields a per-group value: it contains an aggregate function, a window
/// function or a query fork outside of any grouping context.
pub fn is_aggregate_expression(node: &Node) -> bool {
	match node.kind() {
		NodeKind::Call(call) if is_aggregate_function(&call.name) => true,
		NodeKind::Window(_) | NodeKind::QueryFork(_) => true,
		_ => node.autonomous_children().into_iter().any(is_aggregate_expression),
	}
}

/// Distinct field references in pre-order.
pub fn used_fields(node: &Node) -> Vec<Node> {
	let mut seen = HashSet::new();
	node.iter()
		.filter(|n| matches!(n.kind(), NodeKind::Field { .. }))
		.filter(|n| seen.insert((*n).clone()))
		.cloned()
		.collect()
}

/// Neither references a field nor aggregates anything.
pub fn is_constant_expression(node: &Node) -> bool {
	!node.iter().any(|n| match n.kind() {
		NodeKind::Field {
			..
		}
		| NodeKind::Window(_)
		| NodeKind::QueryFork(_) => true,
		NodeKind::Call(call) => is_aggregate_function(&call.name),
		_ => false,
	})
}

/// Dimensions in effect at the bottom of `parent_stack`, after applying the level of detail of
/// every enclosing aggregation to the query's global dimensions. Constant dimensions are dropped.
pub fn resolve_dimensions(global_dimensions: &[Node], parent_stack: &[Node]) -> Vec<Node> {
	let mut dims = global_dimensions.to_vec();
	for parent in parent_stack {
		let lod = match parent.kind() {
			NodeKind::Call(call) if is_aggregate_function(&call.name) => &call.lod,
			NodeKind::QueryFork(fork) => &fork.lod,
			_ => continue,
		};
		match lod {
			Lod::Inherited => {}
			Lod::DefaultAggregation => dims.clear(),
			Lod::Fixed(fixed) => dims = fixed.clone(),
			Lod::Include(included) => {
				for dim in included {
					if !dims.contains(dim) {
						dims.push(dim.clone());
					}
				}
			}
			Lod::Exclude(excluded) => dims.retain(|dim| !excluded.contains(dim)),
		}
	}
	dims.retain(|dim| !is_constant_expression(dim));
	dims
}

/// Errors embedded in the tree by rewrites, each distinct error node reported once.
pub fn collect_errors(tree: &Node) -> Vec<FormulaError> {
	let mut seen = HashSet::new();
	let mut errors = Vec::new();
	for node in tree.iter() {
		if let NodeKind::Error(error) = node.kind() {
			if seen.insert(node.clone()) {
				errors.push(error.clone());
			}
		}
	}
	errors
}

/// Fails with every error embedded in the tree.
pub fn raise_for_errors(tree: &Node) -> Result<()> {
	match into_error(collect_errors(tree)) {
		Some(err) => Err(err),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use lodestar_type::Fragment;

	use super::*;
	use crate::build::{add, field, func, func_lod, int, string, window_within};

	fn make_error(count: usize) -> Node {
		Node::new(NodeKind::Error(FormulaError::LookupFunctionArgNumber {
			function: "ago".to_string(),
			count,
			fragment: Fragment::None,
		}))
	}

	#[test]
	fn test_is_aggregate_expression() {
		assert!(is_aggregate_expression(&func("sum", vec![field("Sales")])));
		assert!(is_aggregate_expression(&add(int(1), func("avg", vec![field("Sales")]))));
		assert!(is_aggregate_expression(&window_within("rank", vec![field("Sales")], vec![])));
		assert!(!is_aggregate_expression(&func("upper", vec![field("Region")])));
		assert!(!is_aggregate_expression(&field("Sales")));
	}

	#[test]
	fn test_used_fields_dedup() {
		let node = add(field("Sales"), func("sum", vec![add(field("Sales"), field("Profit"))]));
		assert_eq!(used_fields(&node), vec![field("Sales"), field("Profit")]);
	}

	#[test]
	fn test_is_constant_expression() {
		assert!(is_constant_expression(&add(int(1), int(2))));
		assert!(is_constant_expression(&func("dateadd", vec![string("day")])));
		assert!(!is_constant_expression(&func("upper", vec![field("Region")])));
		assert!(!is_constant_expression(&func("count", vec![])));
	}

	#[test]
	fn test_resolve_dimensions_applies_lod() {
		let global = vec![field("Region"), field("Date"), int(1)];

		let fixed = func_lod("sum", vec![field("Sales")], Lod::Fixed(vec![field("Category")]));
		assert_eq!(resolve_dimensions(&global, &[fixed]), vec![field("Category")]);

		let include = func_lod("sum", vec![field("Sales")], Lod::Include(vec![field("City")]));
		assert_eq!(
			resolve_dimensions(&global, &[include]),
			vec![field("Region"), field("Date"), field("City")]
		);

		let exclude = func_lod("sum", vec![field("Sales")], Lod::Exclude(vec![field("Region")]));
		assert_eq!(resolve_dimensions(&global, &[exclude]), vec![field("Date")]);

		assert_eq!(resolve_dimensions(&global, &[]), vec![field("Region"), field("Date")]);
	}

	#[test]
	fn test_collect_errors_dedup() {
		let tree = func("f", vec![make_error(1), make_error(1), make_error(5)]);
		let errors = collect_errors(&tree);
		assert_eq!(errors.len(), 2);
		assert!(raise_for_errors(&tree).is_err());
		assert!(raise_for_errors(&field("Sales")).is_ok());
	}
}
